//! Performance monitoring for the thinking engine
//!
//! `PerformanceMonitor` records one metric per thinking request, keeps
//! rolling per-provider statistics, samples process memory on a background
//! tick, raises alerts when rolling aggregates cross their thresholds, and
//! produces reports and optimization recommendations. It also owns the
//! optional response cache.

use crate::agent::metrics::record_alert;
use crate::chat_mode::ChatMode;
use crate::config::MonitorConfig;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};
use sysinfo::{Pid, System};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Metrics considered by adaptive timeout, provider stats and threshold checks
const ROLLING_WINDOW: usize = 20;

/// Metrics considered by the cache hit rate
const CACHE_WINDOW: usize = 50;

/// Metrics considered by reports and trends
const REPORT_WINDOW: usize = 100;

/// Entries returned in the alert section of a report
const REPORT_ALERTS: usize = 10;

/// Minimum window size for trend analysis
const MIN_TREND_METRICS: usize = 10;

/// Outcome of one thinking request, as reported by the orchestrator
#[derive(Debug, Clone, Default)]
pub struct ThinkingOperation {
    /// Label of the candidate that produced the reply
    pub provider: String,
    /// Mode in effect
    pub mode: ChatMode,
    /// Wall-clock processing time
    pub processing_time_ms: u64,
    /// Whether a model produced the reply
    pub success: bool,
    /// Failure category, when the request failed
    pub error_type: Option<String>,
    /// Prompt length in characters
    pub input_length: usize,
    /// Reply length in characters
    pub output_length: usize,
    /// Whether the reply came from the response cache
    pub cache_hit: bool,
    /// Failed attempts before the reply
    pub retry_count: u32,
}

/// Completion state of a recorded metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    /// A model answered
    Completed,
    /// The request failed or degraded
    Failed,
}

/// One recorded thinking request
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetric {
    /// Unique id of the form `metric_<uuid>`
    pub id: String,
    /// When the metric was recorded
    pub timestamp: DateTime<Utc>,
    /// Label of the candidate that produced the reply
    pub provider: String,
    /// Mode in effect
    pub mode: ChatMode,
    /// Wall-clock processing time
    pub processing_time_ms: u64,
    /// Whether a model produced the reply
    pub success: bool,
    /// Failure category, when the request failed
    pub error_type: Option<String>,
    /// Prompt length in characters
    pub input_length: usize,
    /// Reply length in characters
    pub output_length: usize,
    /// Whether the reply came from the response cache
    pub cache_hit: bool,
    /// Failed attempts before the reply
    pub retry_count: u32,
    /// Derived from `success`
    pub status: MetricStatus,
}

/// Process memory snapshot in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    /// Resident memory of this process
    pub used: u64,
    /// Total system memory
    pub total: u64,
    /// Memory available to the process
    pub limit: u64,
}

/// One background tick sample
#[derive(Debug, Clone, Serialize)]
pub struct SystemMetric {
    /// When the sample was taken
    pub timestamp: DateTime<Utc>,
    /// Process memory at sample time
    pub memory: MemoryUsage,
    /// Entries in the response cache
    pub cache_size: usize,
    /// Percentage of cache hits over the last 50 metrics
    pub cache_hit_rate: f64,
    /// Thinking requests in flight
    pub active_operations: usize,
    /// Time since the monitor was created
    pub uptime_ms: u64,
}

/// Kind of threshold breach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Rolling average latency above the response-time threshold
    HighResponseTime,
    /// Rolling success rate below the success-rate threshold
    LowSuccessRate,
    /// Process memory above the memory threshold
    HighMemoryUsage,
}

impl AlertType {
    /// Snake-case alert name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighResponseTime => "high_response_time",
            Self::LowSuccessRate => "low_success_rate",
            Self::HighMemoryUsage => "high_memory_usage",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only; no threshold check raises it
    Info,
    /// Threshold crossed
    Warning,
    /// Threshold crossed by a wide margin
    Critical,
}

impl Severity {
    /// Lowercase severity name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// Severity for a measured value against its threshold
    ///
    /// Latency and memory are critical above 1.5x the threshold; success
    /// rate is critical below half of it. `threshold` is the value in
    /// effect at check time, so for latency it may already be widened by
    /// adaptive timeout.
    pub fn for_breach(alert_type: AlertType, current: f64, threshold: f64) -> Self {
        let critical = match alert_type {
            AlertType::HighResponseTime | AlertType::HighMemoryUsage => current > threshold * 1.5,
            AlertType::LowSuccessRate => current < threshold * 0.5,
        };
        if critical {
            Self::Critical
        } else {
            Self::Warning
        }
    }
}

/// A threshold breach
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    /// Unique id of the form `alert_<uuid>`
    pub id: String,
    /// Which threshold was crossed
    pub alert_type: AlertType,
    /// When the alert was raised
    pub timestamp: DateTime<Utc>,
    /// Measured value
    pub current: f64,
    /// Threshold in effect when the alert was raised
    pub threshold: f64,
    /// See [`Severity::for_breach`]
    pub severity: Severity,
    /// Always `false`; alerts age out of the bounded history instead
    pub resolved: bool,
}

/// Rolling statistics for one provider
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderStats {
    /// Metrics attributed to the provider in the rolling window
    pub total: usize,
    /// Of those, how many succeeded
    pub successful: usize,
    /// Sum of processing times
    pub total_time_ms: u64,
    /// Mean processing time over all attributed metrics
    pub avg_time_ms: f64,
    /// Percentage of successful metrics
    pub success_rate: f64,
}

/// Current alert thresholds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thresholds {
    /// Average latency limit; widened by adaptive timeout
    pub response_time_ms: f64,
    /// Minimum success percentage
    pub success_rate: f64,
    /// Process memory limit
    pub memory_usage_bytes: u64,
    /// Maximum error percentage, reported but not checked
    pub error_rate: f64,
}

/// Headline numbers of a report
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    /// Metrics currently retained
    pub total_operations: usize,
    /// Metrics in the report window
    pub recent_operations: usize,
    /// Mean latency of successful requests in the report window
    pub average_response_time_ms: f64,
    /// Success percentage in the report window
    pub success_rate: f64,
    /// Cache hit percentage over the last 50 metrics
    pub cache_hit_rate: f64,
    /// Unresolved alerts retained
    pub active_alerts: usize,
}

/// System section of a report
#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    /// Latest sampled memory, if the tick has run
    pub memory: Option<MemoryUsage>,
    /// Time since the monitor was created
    pub uptime_ms: u64,
    /// Entries in the response cache
    pub cache_size: usize,
    /// Thinking requests in flight
    pub active_operations: usize,
}

/// Optimization settings in effect
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationState {
    /// Whether the response-time threshold widens with load
    pub adaptive_timeout: bool,
    /// Current response-time threshold
    pub current_timeout_ms: f64,
    /// Whether provider statistics are maintained
    pub dynamic_provider_selection: bool,
    /// Whether the orchestrator uses the response cache
    pub cache_enabled: bool,
}

/// Direction of a trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Second half is higher
    Increasing,
    /// Second half is lower or equal
    Decreasing,
}

/// Comparison of the first and second half of a window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    /// Direction of change
    pub trend: TrendDirection,
    /// Absolute difference between the half averages
    pub change: f64,
    /// Signed change relative to the first half; 0 when it was 0
    pub change_percent: f64,
}

impl Trend {
    fn between(first: f64, second: f64) -> Self {
        Self {
            trend: if second > first {
                TrendDirection::Increasing
            } else {
                TrendDirection::Decreasing
            },
            change: (second - first).abs(),
            change_percent: if first > 0.0 {
                (second - first) / first * 100.0
            } else {
                0.0
            },
        }
    }
}

/// Latency and success-rate trends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceTrends {
    /// Average latency of successful requests
    pub response_time: Trend,
    /// Success percentage
    pub success_rate: Trend,
}

/// Full performance report
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    /// Headline numbers
    pub summary: ReportSummary,
    /// Rolling statistics keyed by provider label
    pub providers: BTreeMap<String, ProviderStats>,
    /// Latest system sample
    pub system_health: SystemHealth,
    /// Optimization settings in effect
    pub optimization: OptimizationState,
    /// Most recent alerts, newest last
    pub alerts: Vec<Alert>,
    /// `None` until enough metrics exist to split the window
    pub trends: Option<PerformanceTrends>,
}

/// Area a recommendation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    /// Latency
    Performance,
    /// Success rate
    Reliability,
    /// Caching and configuration
    Optimization,
}

/// Recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Worth doing when convenient
    Medium,
    /// Should be addressed soon
    High,
    /// Needs attention now
    Critical,
}

/// A suggested optimization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    /// Area addressed
    pub kind: RecommendationType,
    /// Urgency
    pub priority: Priority,
    /// What was observed
    pub message: &'static str,
    /// What to do about it
    pub action: &'static str,
}

#[derive(Debug, Default)]
struct ResponseCache {
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

#[derive(Debug)]
struct MonitorState {
    metrics: VecDeque<PerformanceMetric>,
    system_metrics: VecDeque<SystemMetric>,
    alerts: VecDeque<Alert>,
    thresholds: Thresholds,
    provider_stats: BTreeMap<String, ProviderStats>,
    cache: ResponseCache,
}

fn average_response_time<'a>(metrics: impl Iterator<Item = &'a PerformanceMetric>) -> f64 {
    let (count, total) = metrics
        .filter(|m| m.success)
        .fold((0u64, 0u64), |(n, sum), m| (n + 1, sum + m.processing_time_ms));
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

fn success_rate<'a>(metrics: impl Iterator<Item = &'a PerformanceMetric>) -> f64 {
    let (count, ok) = metrics.fold((0usize, 0usize), |(n, ok), m| {
        (n + 1, ok + usize::from(m.success))
    });
    if count == 0 {
        100.0
    } else {
        ok as f64 / count as f64 * 100.0
    }
}

impl MonitorState {
    fn recent(&self, n: usize) -> impl Iterator<Item = &PerformanceMetric> + Clone {
        self.metrics.iter().skip(self.metrics.len().saturating_sub(n))
    }

    fn cache_hit_rate(&self) -> f64 {
        let (count, hits) = self.recent(CACHE_WINDOW).fold((0usize, 0usize), |(n, h), m| {
            (n + 1, h + usize::from(m.cache_hit))
        });
        if count == 0 {
            0.0
        } else {
            (hits as f64 / count as f64 * 100.0).round()
        }
    }

    fn compute_provider_stats(&self) -> BTreeMap<String, ProviderStats> {
        let mut stats: BTreeMap<String, ProviderStats> = BTreeMap::new();
        for metric in self.recent(ROLLING_WINDOW) {
            let entry = stats.entry(metric.provider.clone()).or_default();
            entry.total += 1;
            entry.total_time_ms += metric.processing_time_ms;
            if metric.success {
                entry.successful += 1;
            }
        }
        for entry in stats.values_mut() {
            entry.avg_time_ms = entry.total_time_ms as f64 / entry.total as f64;
            entry.success_rate = entry.successful as f64 / entry.total as f64 * 100.0;
        }
        stats
    }
}

/// Records thinking outcomes and watches rolling performance
///
/// The monitor is shared behind an `Arc`; every method takes `&self`.
///
/// # Examples
///
/// ```
/// use bella::agent::monitor::{PerformanceMonitor, ThinkingOperation};
/// use bella::config::MonitorConfig;
///
/// let monitor = PerformanceMonitor::new(MonitorConfig::default());
/// monitor.record_thinking_metrics(ThinkingOperation {
///     provider: "local".to_string(),
///     processing_time_ms: 120,
///     success: true,
///     ..ThinkingOperation::default()
/// });
/// let report = monitor.get_performance_report();
/// assert_eq!(report.summary.total_operations, 1);
/// assert_eq!(report.summary.success_rate, 100.0);
/// ```
#[derive(Debug)]
pub struct PerformanceMonitor {
    config: MonitorConfig,
    cache_enabled: bool,
    state: Mutex<MonitorState>,
    system: Mutex<System>,
    active_operations: Arc<AtomicUsize>,
    started_at: Instant,
    tick: Mutex<Option<CancellationToken>>,
}

/// Marks one in-flight thinking request; decrements on drop
#[derive(Debug)]
pub struct ActiveOperation {
    counter: Arc<AtomicUsize>,
}

impl Drop for ActiveOperation {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

impl PerformanceMonitor {
    /// Create a monitor; the background tick is not started
    pub fn new(config: MonitorConfig) -> Self {
        let thresholds = Thresholds {
            response_time_ms: config.response_time_threshold_ms,
            success_rate: config.success_rate_threshold,
            memory_usage_bytes: config.memory_usage_threshold_bytes,
            error_rate: config.error_rate_threshold,
        };
        Self {
            state: Mutex::new(MonitorState {
                metrics: VecDeque::new(),
                system_metrics: VecDeque::new(),
                alerts: VecDeque::new(),
                thresholds,
                provider_stats: BTreeMap::new(),
                cache: ResponseCache::default(),
            }),
            system: Mutex::new(System::new()),
            active_operations: Arc::new(AtomicUsize::new(0)),
            started_at: Instant::now(),
            tick: Mutex::new(None),
            cache_enabled: false,
            config,
        }
    }

    /// Report the response cache as enabled
    ///
    /// The orchestrator owns the decision to consult the cache; the monitor
    /// only stores entries and reports the flag.
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    fn state(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the background system-metrics tick
    ///
    /// Does nothing when monitoring is disabled, already running, or no
    /// Tokio runtime is available. The task holds a weak reference and ends
    /// when the monitor is dropped.
    pub fn start(self: &Arc<Self>) {
        if !self.config.enabled {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime; performance monitoring tick not started");
            return;
        };

        let mut slot = self.tick.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }
        let token = CancellationToken::new();
        *slot = Some(token.clone());

        let period = Duration::from_secs(self.config.tick_interval_secs.max(1));
        let weak: Weak<Self> = Arc::downgrade(self);
        handle.spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let Some(monitor) = weak.upgrade() else { break };
                        monitor.collect_system_metrics();
                    }
                }
            }
            tracing::debug!("Performance monitoring tick stopped");
        });

        tracing::info!(
            interval_secs = period.as_secs(),
            "Performance monitoring started"
        );
    }

    /// Stop the background tick
    pub fn stop(&self) {
        let token = self
            .tick
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = token {
            token.cancel();
            tracing::info!("Performance monitoring stopped");
        }
    }

    /// Whether the background tick is running
    pub fn is_monitoring(&self) -> bool {
        self.tick
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Mark a thinking request as in flight until the guard drops
    pub fn begin_operation(&self) -> ActiveOperation {
        self.active_operations.fetch_add(1, Ordering::SeqCst);
        ActiveOperation {
            counter: Arc::clone(&self.active_operations),
        }
    }

    /// Number of in-flight thinking requests
    pub fn active_operations(&self) -> usize {
        self.active_operations.load(Ordering::SeqCst)
    }

    /// Time since the monitor was created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Record a thinking outcome and return the metric id
    pub fn record_thinking_metrics(&self, op: ThinkingOperation) -> String {
        let metric = PerformanceMetric {
            id: format!("metric_{}", Uuid::new_v4().simple()),
            timestamp: Utc::now(),
            status: if op.success {
                MetricStatus::Completed
            } else {
                MetricStatus::Failed
            },
            provider: op.provider,
            mode: op.mode,
            processing_time_ms: op.processing_time_ms,
            success: op.success,
            error_type: op.error_type,
            input_length: op.input_length,
            output_length: op.output_length,
            cache_hit: op.cache_hit,
            retry_count: op.retry_count,
        };
        let id = metric.id.clone();

        let mut state = self.state();
        state.metrics.push_back(metric);
        while state.metrics.len() > self.config.max_metrics_history {
            state.metrics.pop_front();
        }
        self.update_optimization(&mut state);

        id
    }

    fn update_optimization(&self, state: &mut MonitorState) {
        if self.config.adaptive_timeout {
            let average = average_response_time(state.recent(ROLLING_WINDOW));
            let current = state.thresholds.response_time_ms;
            if average > current * 0.8 {
                let widened = (current * 1.2).min(self.config.max_adaptive_timeout_ms);
                if widened > current {
                    tracing::debug!(from = current, to = widened, "Widening response-time threshold");
                    state.thresholds.response_time_ms = widened;
                }
            }
        }

        if self.config.dynamic_provider_selection {
            state.provider_stats = state.compute_provider_stats();
        }
    }

    fn sample_memory(&self) -> MemoryUsage {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        let pid = Pid::from_u32(std::process::id());
        system.refresh_memory();
        system.refresh_process(pid);
        let total = system.total_memory();
        MemoryUsage {
            used: system.process(pid).map(|p| p.memory()).unwrap_or(0),
            total,
            limit: total,
        }
    }

    /// Take one system sample and evaluate thresholds
    ///
    /// Called by the background tick; exposed for on-demand sampling.
    pub fn collect_system_metrics(&self) -> SystemMetric {
        let memory = self.sample_memory();
        let uptime_ms = u64::try_from(self.uptime().as_millis()).unwrap_or(u64::MAX);

        let sample = {
            let mut state = self.state();
            let sample = SystemMetric {
                timestamp: Utc::now(),
                memory,
                cache_size: state.cache.entries.len(),
                cache_hit_rate: state.cache_hit_rate(),
                active_operations: self.active_operations(),
                uptime_ms,
            };
            state.system_metrics.push_back(sample.clone());
            while state.system_metrics.len() > self.config.max_system_metrics {
                state.system_metrics.pop_front();
            }
            sample
        };

        self.check_performance_thresholds(memory.used);
        sample
    }

    /// Evaluate rolling thresholds and raise alerts
    ///
    /// Returns the alerts raised by this check.
    ///
    /// With `adaptive_timeout` on, every recorded metric may already have
    /// widened the response-time threshold by 1.2x before this runs. A
    /// latency up to 1.2x the configured threshold therefore raises no
    /// alert; a sustained higher latency is reported against the widened
    /// value.
    pub fn check_performance_thresholds(&self, memory_used: u64) -> Vec<Alert> {
        let mut state = self.state();
        let average = average_response_time(state.recent(ROLLING_WINDOW));
        let rate = success_rate(state.recent(ROLLING_WINDOW));
        let thresholds = state.thresholds.clone();

        let mut breaches = Vec::new();
        if average > thresholds.response_time_ms {
            breaches.push((AlertType::HighResponseTime, average, thresholds.response_time_ms));
        }
        if rate < thresholds.success_rate {
            breaches.push((AlertType::LowSuccessRate, rate, thresholds.success_rate));
        }
        if memory_used > thresholds.memory_usage_bytes {
            breaches.push((
                AlertType::HighMemoryUsage,
                memory_used as f64,
                thresholds.memory_usage_bytes as f64,
            ));
        }

        let mut raised = Vec::with_capacity(breaches.len());
        for (alert_type, current, threshold) in breaches {
            let alert = Alert {
                id: format!("alert_{}", Uuid::new_v4().simple()),
                alert_type,
                timestamp: Utc::now(),
                current,
                threshold,
                severity: Severity::for_breach(alert_type, current, threshold),
                resolved: false,
            };
            tracing::warn!(
                alert = %alert_type,
                severity = alert.severity.as_str(),
                current,
                threshold,
                "Performance alert"
            );
            record_alert(alert_type.as_str(), alert.severity.as_str());
            state.alerts.push_back(alert.clone());
            raised.push(alert);
        }
        while state.alerts.len() > self.config.max_alerts {
            state.alerts.pop_front();
        }

        raised
    }

    /// Cached reply for `key`, if any
    pub fn cache_lookup(&self, key: &str) -> Option<String> {
        self.state().cache.entries.get(key).cloned()
    }

    /// Store a reply, evicting the oldest entry beyond `max_cache_size`
    pub fn cache_store(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let mut state = self.state();
        let cache = &mut state.cache;
        if cache.entries.insert(key.clone(), value.into()).is_none() {
            cache.order.push_back(key);
        }
        while cache.order.len() > self.config.max_cache_size {
            if let Some(oldest) = cache.order.pop_front() {
                cache.entries.remove(&oldest);
            }
        }
    }

    /// Number of cached replies
    pub fn cache_size(&self) -> usize {
        self.state().cache.entries.len()
    }

    /// Current thresholds, including any adaptive widening
    pub fn thresholds(&self) -> Thresholds {
        self.state().thresholds.clone()
    }

    /// Number of retained metrics
    pub fn metrics_len(&self) -> usize {
        self.state().metrics.len()
    }

    /// Retained metrics, oldest first
    pub fn metrics(&self) -> Vec<PerformanceMetric> {
        self.state().metrics.iter().cloned().collect()
    }

    /// Retained alerts, oldest first
    pub fn alerts(&self) -> Vec<Alert> {
        self.state().alerts.iter().cloned().collect()
    }

    /// Retained system samples, oldest first
    pub fn system_metrics(&self) -> Vec<SystemMetric> {
        self.state().system_metrics.iter().cloned().collect()
    }

    /// Aggregate report over the recent window
    pub fn get_performance_report(&self) -> PerformanceReport {
        let state = self.state();
        let recent: Vec<&PerformanceMetric> = state.recent(REPORT_WINDOW).collect();

        let summary = ReportSummary {
            total_operations: state.metrics.len(),
            recent_operations: recent.len(),
            average_response_time_ms: average_response_time(recent.iter().copied()),
            success_rate: success_rate(recent.iter().copied()),
            cache_hit_rate: state.cache_hit_rate(),
            active_alerts: state.alerts.iter().filter(|a| !a.resolved).count(),
        };

        let trends = (recent.len() >= MIN_TREND_METRICS).then(|| {
            let (first, second) = recent.split_at(recent.len() / 2);
            PerformanceTrends {
                response_time: Trend::between(
                    average_response_time(first.iter().copied()),
                    average_response_time(second.iter().copied()),
                ),
                success_rate: Trend::between(
                    success_rate(first.iter().copied()),
                    success_rate(second.iter().copied()),
                ),
            }
        });

        let alert_start = state.alerts.len().saturating_sub(REPORT_ALERTS);

        PerformanceReport {
            summary,
            providers: state.provider_stats.clone(),
            system_health: SystemHealth {
                memory: state.system_metrics.back().map(|s| s.memory),
                uptime_ms: u64::try_from(self.uptime().as_millis()).unwrap_or(u64::MAX),
                cache_size: state.cache.entries.len(),
                active_operations: self.active_operations(),
            },
            optimization: OptimizationState {
                adaptive_timeout: self.config.adaptive_timeout,
                current_timeout_ms: state.thresholds.response_time_ms,
                dynamic_provider_selection: self.config.dynamic_provider_selection,
                cache_enabled: self.cache_enabled,
            },
            alerts: state.alerts.iter().skip(alert_start).cloned().collect(),
            trends,
        }
    }

    /// Rule-based optimization suggestions
    pub fn get_optimization_recommendations(&self) -> Vec<Recommendation> {
        let report = self.get_performance_report();
        let thresholds = self.thresholds();
        let mut recommendations = Vec::new();

        if report.summary.recent_operations == 0 {
            return recommendations;
        }

        if report.summary.average_response_time_ms > thresholds.response_time_ms * 0.8 {
            recommendations.push(Recommendation {
                kind: RecommendationType::Performance,
                priority: Priority::High,
                message: "Consider enabling response caching or switching to a faster provider",
                action: "optimize_response_time",
            });
        }

        if report.summary.success_rate < thresholds.success_rate {
            recommendations.push(Recommendation {
                kind: RecommendationType::Reliability,
                priority: Priority::Critical,
                message: "Success rate is below threshold. Check provider configurations and error handling",
                action: "improve_reliability",
            });
        }

        if report.summary.cache_hit_rate < 20.0 {
            recommendations.push(Recommendation {
                kind: RecommendationType::Optimization,
                priority: Priority::Medium,
                message: "Low cache hit rate. Consider adjusting cache strategy",
                action: "optimize_caching",
            });
        }

        recommendations
    }

    /// Clear metrics, samples, alerts, cache and provider statistics
    pub fn reset(&self) {
        let mut state = self.state();
        state.metrics.clear();
        state.system_metrics.clear();
        state.alerts.clear();
        state.cache = ResponseCache::default();
        state.provider_stats.clear();
        tracing::info!("Performance monitor reset");
    }
}

impl Drop for PerformanceMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
