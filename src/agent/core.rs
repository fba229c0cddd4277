//! Thinking orchestrator
//!
//! This module implements the request state machine that turns one user
//! utterance into one reply:
//! - Sanitizes the prompt and records it in the conversation
//! - Builds an ordered fallback chain from the current settings
//! - Drives each candidate under its own timeout, inside an overall budget
//! - Cleans the winning reply and records the outcome
//! - Maps every failure onto a canned, user-facing reply

use crate::agent::conversation::{
    ConversationContext, ConversationExport, HistoryEntry, Role, SessionStats, TurnMetadata,
};
use crate::agent::fallback::{build_chain, is_critical_error, retry_delay, Candidate, ChainInputs};
use crate::agent::metrics::{record_provider_failure, ThinkingTelemetry};
use crate::agent::monitor::{
    PerformanceMonitor, PerformanceReport, Recommendation, ThinkingOperation,
};
use crate::agent::responses::{canned_response, emergency_response, ErrorCategory};
use crate::agent::sanitize::{clean_response, sanitize_input};
use crate::chat_mode::ChatMode;
use crate::config::{Config, ThinkingConfig};
use crate::error::{BellaError, Result};
use crate::prompts::enhance_prompt_for_mode;
use crate::providers::{create_local_client, CloudProviderClient, LocalModelClient, ProviderInfo};

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Label recorded for replies served from the response cache
const CACHE_LABEL: &str = "cache";

/// Per-request options for [`ThinkingOrchestrator::think`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ThinkOptions {
    /// Overall budget; the configured `max_processing_time_ms` when `None`
    pub max_processing_time: Option<Duration>,
}

/// Snapshot returned by [`ThinkingOrchestrator::get_current_config`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentConfig {
    /// Cloud is the preferred provider type
    pub use_cloud: bool,
    /// Preferred provider name and model
    pub provider: ProviderInfo,
    /// Active chat mode
    pub mode: ChatMode,
    /// Whether the preferred provider can answer
    pub is_configured: bool,
}

/// Result of walking the fallback chain
struct ChainOutcome {
    text: String,
    provider: &'static str,
    retries: u32,
    /// Category of the last failure, set when the backup answered
    degraded: Option<ErrorCategory>,
}

/// The top-level coordinator for thinking requests
///
/// Owns the conversation, both provider clients, and a shared
/// `PerformanceMonitor`. Construct it once in the application entry point
/// and pass it by reference. The conversation lock is never held across an
/// await, so concurrent calls on one session may interleave their turns.
///
/// # Examples
///
/// ```no_run
/// use bella::agent::{ThinkOptions, ThinkingOrchestrator};
/// use bella::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let orchestrator = ThinkingOrchestrator::new(&Config::default())?;
/// orchestrator.init().await;
/// let reply = orchestrator.think("Hello Bella", ThinkOptions::default()).await;
/// println!("{}", reply);
/// # Ok(())
/// # }
/// ```
pub struct ThinkingOrchestrator {
    context: Mutex<ConversationContext>,
    use_cloud: AtomicBool,
    cloud: CloudProviderClient,
    local: LocalModelClient,
    monitor: Arc<PerformanceMonitor>,
    thinking: ThinkingConfig,
    load_local: bool,
}

impl ThinkingOrchestrator {
    /// Create an orchestrator with the Ollama-backed local model
    ///
    /// # Arguments
    ///
    /// * `config` - Validated application configuration
    ///
    /// # Errors
    ///
    /// Returns `BellaError::Config` if an HTTP client cannot be created
    pub fn new(config: &Config) -> Result<Self> {
        let cloud = CloudProviderClient::new(&config.provider)?;
        let local = create_local_client(&config.provider.ollama)?;
        Ok(Self::with_clients(config, cloud, local))
    }

    /// Create an orchestrator from prebuilt provider clients
    ///
    /// Used when the local model is backed by something other than Ollama.
    pub fn with_clients(
        config: &Config,
        cloud: CloudProviderClient,
        local: LocalModelClient,
    ) -> Self {
        Self {
            context: Mutex::new(ConversationContext::new(&config.conversation)),
            use_cloud: AtomicBool::new(config.provider.use_cloud),
            cloud,
            local,
            monitor: Arc::new(
                PerformanceMonitor::new(config.monitor.clone())
                    .with_cache_enabled(config.thinking.enable_response_cache),
            ),
            thinking: config.thinking.clone(),
            load_local: config.provider.ollama.enabled,
        }
    }

    /// Load the local model and start background monitoring
    ///
    /// A local model that fails to load is dropped from fallback chains;
    /// startup continues.
    pub async fn init(&self) {
        if !self.load_local {
            info!("Local model disabled");
        } else if !self.local.load().await {
            info!("Continuing without local model");
        }
        self.monitor.start();
    }

    fn context(&self) -> MutexGuard<'_, ConversationContext> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Turn one user utterance into a reply
    ///
    /// Always returns non-empty text. Failures are classified and answered
    /// with a canned reply that is also recorded as the assistant turn.
    ///
    /// # Arguments
    ///
    /// * `prompt` - Raw user text
    /// * `options` - Per-request overrides
    ///
    /// # Examples
    ///
    /// With no provider available the emergency backup still answers:
    ///
    /// ```
    /// use bella::agent::{ThinkOptions, ThinkingOrchestrator};
    /// use bella::config::Config;
    ///
    /// # tokio_test::block_on(async {
    /// let bella = ThinkingOrchestrator::new(&Config::default()).unwrap();
    /// let reply = bella.think("hello bella", ThinkOptions::default()).await;
    /// assert!(!reply.is_empty());
    /// assert_eq!(bella.get_session_stats().message_count, 2);
    /// # });
    /// ```
    pub async fn think(&self, prompt: &str, options: ThinkOptions) -> String {
        let started = Instant::now();
        let telemetry = ThinkingTelemetry::start();
        let _active = self.monitor.begin_operation();

        match self.process(prompt, options, started).await {
            Ok(outcome) => {
                let success = outcome.degraded.is_none();
                telemetry.record_outcome(outcome.provider, success);
                outcome.text
            }
            Err(error) => {
                telemetry.record_outcome("none", false);
                self.handle_error(prompt, &error, started)
            }
        }
    }

    async fn process(
        &self,
        prompt: &str,
        options: ThinkOptions,
        started: Instant,
    ) -> Result<ChainOutcome> {
        let sanitized = sanitize_input(prompt)?;

        let (mode, cloud_prompt, local_prompt) = {
            let mut context = self.context();
            context.add_message(Role::User, sanitized.as_str(), TurnMetadata::default());
            let mode = context.mode();
            let bundle = context.get_context_for_thinking(true);
            (
                mode,
                enhance_prompt_for_mode(&sanitized, &bundle, mode, false),
                enhance_prompt_for_mode(&sanitized, &bundle, mode, true),
            )
        };

        let cache_key = format!("{}:{}", mode, sanitized.to_lowercase());
        if self.thinking.enable_response_cache {
            if let Some(cached) = self.monitor.cache_lookup(&cache_key) {
                debug!("Serving reply from response cache");
                self.record_reply(&sanitized, &cached, CACHE_LABEL, mode, started, 0, true);
                return Ok(ChainOutcome {
                    text: cached,
                    provider: CACHE_LABEL,
                    retries: 0,
                    degraded: None,
                });
            }
        }

        let chain = build_chain(&ChainInputs {
            use_cloud: self.use_cloud.load(Ordering::SeqCst),
            current_cloud: self.cloud.current_provider(),
            configured_clouds: self.cloud.configured_providers(),
            local_loaded: self.local.is_loaded(),
        });
        debug!(
            chain = ?chain.iter().map(Candidate::label).collect::<Vec<_>>(),
            "Built fallback chain"
        );

        let budget = options
            .max_processing_time
            .unwrap_or_else(|| Duration::from_millis(self.thinking.max_processing_time_ms));
        let outcome = tokio::time::timeout(
            budget,
            self.execute_chain(&chain, &sanitized, &cloud_prompt, &local_prompt),
        )
        .await
        .map_err(|_| BellaError::Timeout {
            operation: "Processing".to_string(),
            after_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
        })??;

        match outcome.degraded {
            None => {
                self.record_reply(
                    &sanitized,
                    &outcome.text,
                    outcome.provider,
                    mode,
                    started,
                    outcome.retries,
                    false,
                );
                if self.thinking.enable_response_cache {
                    self.monitor.cache_store(cache_key, outcome.text.clone());
                }
            }
            Some(category) => {
                self.record_degraded(&sanitized, &outcome, mode, category, started);
            }
        }

        info!(
            provider = outcome.provider,
            retries = outcome.retries,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Thinking complete"
        );
        Ok(outcome)
    }

    async fn execute_chain(
        &self,
        chain: &[Candidate],
        prompt: &str,
        cloud_prompt: &str,
        local_prompt: &str,
    ) -> Result<ChainOutcome> {
        let mut attempted: Vec<String> = Vec::new();
        let mut last_error: Option<anyhow::Error> = None;

        for (index, candidate) in chain.iter().enumerate() {
            let retries = u32::try_from(attempted.len()).unwrap_or(u32::MAX);

            if *candidate == Candidate::EmergencyBackup {
                let category = last_error
                    .as_ref()
                    .map(ErrorCategory::classify)
                    .unwrap_or(ErrorCategory::Configuration);
                warn!(category = %category, "Falling back to emergency responses");
                return Ok(ChainOutcome {
                    text: emergency_response(prompt, random_seed()).to_string(),
                    provider: candidate.label(),
                    retries,
                    degraded: Some(category),
                });
            }

            debug!(provider = candidate.label(), attempt = index + 1, "Trying provider");
            attempted.push(candidate.label().to_string());

            match self.attempt(*candidate, cloud_prompt, local_prompt).await {
                Ok(text) => {
                    return Ok(ChainOutcome {
                        text,
                        provider: candidate.label(),
                        retries,
                        degraded: None,
                    });
                }
                Err(error) => {
                    if is_critical_error(&error) {
                        warn!(provider = candidate.label(), "Critical error, aborting chain: {:#}", error);
                        return Err(BellaError::InvalidInput(format!("{:#}", error)).into());
                    }

                    let category = ErrorCategory::classify(&error);
                    warn!(
                        provider = candidate.label(),
                        category = %category,
                        "Provider attempt failed: {:#}",
                        error
                    );
                    record_provider_failure(candidate.label(), category.as_str());
                    last_error = Some(error);

                    if index + 1 < chain.len() {
                        let attempt = u32::try_from(index + 1).unwrap_or(u32::MAX);
                        tokio::time::sleep(retry_delay(
                            attempt,
                            Duration::from_millis(self.thinking.retry_base_delay_ms),
                            Duration::from_millis(self.thinking.retry_max_delay_ms),
                        ))
                        .await;
                    }
                }
            }
        }

        Err(BellaError::SystemFailure {
            attempted,
            last_error: last_error
                .map(|e| format!("{:#}", e))
                .unwrap_or_else(|| "no candidates".to_string()),
        }
        .into())
    }

    /// One candidate call under its own timeout, followed by cleaning
    async fn attempt(
        &self,
        candidate: Candidate,
        cloud_prompt: &str,
        local_prompt: &str,
    ) -> Result<String> {
        let raw = match candidate {
            Candidate::Cloud(kind) => {
                let limit = Duration::from_millis(self.thinking.cloud_timeout_ms);
                let messages = self.cloud.build_messages(cloud_prompt);
                tokio::time::timeout(limit, self.cloud.chat(kind, &messages))
                    .await
                    .map_err(|_| BellaError::Timeout {
                        operation: format!("{} request", kind),
                        after_ms: self.thinking.cloud_timeout_ms,
                    })??
            }
            Candidate::Local => {
                let limit = Duration::from_millis(self.thinking.local_timeout_ms);
                tokio::time::timeout(limit, self.local.complete(local_prompt))
                    .await
                    .map_err(|_| BellaError::Timeout {
                        operation: "Local model".to_string(),
                        after_ms: self.thinking.local_timeout_ms,
                    })??
            }
            Candidate::EmergencyBackup => emergency_response(cloud_prompt, 0).to_string(),
        };
        clean_response(&raw)
    }

    #[allow(clippy::too_many_arguments)]
    fn record_reply(
        &self,
        prompt: &str,
        reply: &str,
        provider: &str,
        mode: ChatMode,
        started: Instant,
        retries: u32,
        cache_hit: bool,
    ) {
        let elapsed_ms = elapsed_ms(started);
        self.context().add_message(
            Role::Assistant,
            reply,
            TurnMetadata {
                processing_time_ms: Some(elapsed_ms),
                provider: Some(provider.to_string()),
                mode: Some(mode),
                is_error: false,
            },
        );
        self.monitor.record_thinking_metrics(ThinkingOperation {
            provider: provider.to_string(),
            mode,
            processing_time_ms: elapsed_ms,
            success: true,
            error_type: None,
            input_length: prompt.chars().count(),
            output_length: reply.chars().count(),
            cache_hit,
            retry_count: retries,
        });
    }

    fn record_degraded(
        &self,
        prompt: &str,
        outcome: &ChainOutcome,
        mode: ChatMode,
        category: ErrorCategory,
        started: Instant,
    ) {
        let elapsed_ms = elapsed_ms(started);
        let provider = outcome.provider;
        self.context().add_message(
            Role::Assistant,
            outcome.text.as_str(),
            TurnMetadata {
                processing_time_ms: Some(elapsed_ms),
                provider: Some(provider.to_string()),
                mode: Some(mode),
                is_error: false,
            },
        );
        self.monitor.record_thinking_metrics(ThinkingOperation {
            provider: provider.to_string(),
            mode,
            processing_time_ms: elapsed_ms,
            success: false,
            error_type: Some(category.as_str().to_string()),
            input_length: prompt.chars().count(),
            output_length: outcome.text.chars().count(),
            cache_hit: false,
            retry_count: outcome.retries,
        });
    }

    fn handle_error(&self, prompt: &str, error: &anyhow::Error, started: Instant) -> String {
        let category = ErrorCategory::classify(error);
        warn!(category = %category, "Thinking request failed: {:#}", error);

        let reply = canned_response(category, prompt, random_seed());
        let elapsed_ms = elapsed_ms(started);
        let mode = {
            let mut context = self.context();
            let mode = context.mode();
            context.add_message(
                Role::Assistant,
                reply,
                TurnMetadata {
                    processing_time_ms: Some(elapsed_ms),
                    provider: None,
                    mode: Some(mode),
                    is_error: true,
                },
            );
            mode
        };
        self.monitor.record_thinking_metrics(ThinkingOperation {
            provider: "none".to_string(),
            mode,
            processing_time_ms: elapsed_ms,
            success: false,
            error_type: Some(category.as_str().to_string()),
            input_length: prompt.chars().count(),
            output_length: reply.chars().count(),
            cache_hit: false,
            retry_count: 0,
        });

        reply.to_string()
    }

    /// Change the chat mode; false for unknown names
    pub fn set_chat_mode(&self, mode: &str) -> bool {
        self.context().set_mode(mode)
    }

    /// Active chat mode
    pub fn mode(&self) -> ChatMode {
        self.context().mode()
    }

    /// Select the preferred provider
    ///
    /// `"local"` prefers the local model; a cloud provider name prefers that
    /// provider. Unknown names return false and change nothing.
    pub fn switch_provider(&self, provider: &str) -> bool {
        if provider.eq_ignore_ascii_case("local") {
            self.use_cloud.store(false, Ordering::SeqCst);
            info!("Switched to local model");
            return true;
        }
        if self.cloud.switch_provider(provider) {
            self.use_cloud.store(true, Ordering::SeqCst);
            return true;
        }
        false
    }

    /// Set a cloud provider credential; false for unknown providers
    pub fn set_api_key(&self, provider: &str, key: &str) -> bool {
        self.cloud.set_api_key(provider, key)
    }

    /// Drop the conversation history, keeping the session
    pub fn clear_history(&self) {
        self.context().clear_history();
    }

    /// Current provider preference, mode and readiness
    pub fn get_current_config(&self) -> CurrentConfig {
        let use_cloud = self.use_cloud.load(Ordering::SeqCst);
        let (provider, is_configured) = if use_cloud {
            (self.cloud.current_provider_info(), self.cloud.is_configured())
        } else {
            (
                ProviderInfo {
                    name: "local".to_string(),
                    model: self.local.model_name(),
                },
                self.local.is_loaded(),
            )
        };
        CurrentConfig {
            use_cloud,
            provider,
            mode: self.mode(),
            is_configured,
        }
    }

    /// The last `exchanges` user/assistant pairs
    pub fn get_conversation_history(&self, exchanges: usize) -> Vec<HistoryEntry> {
        self.context().get_recent_history(exchanges)
    }

    /// Session statistics
    pub fn get_session_stats(&self) -> SessionStats {
        self.context().get_session_stats()
    }

    /// Start a fresh session and return its identifier
    pub fn start_new_session(&self) -> String {
        self.context().start_new_session()
    }

    /// Whether the session has been active recently
    pub fn is_context_valid(&self) -> bool {
        self.context().is_context_valid()
    }

    /// Snapshot the session
    pub fn export_conversation(&self) -> ConversationExport {
        self.context().export_conversation()
    }

    /// Restore a session snapshot
    ///
    /// # Errors
    ///
    /// Returns `BellaError::InvalidConversation` for snapshots without a
    /// session id.
    pub fn import_conversation(&self, data: ConversationExport) -> Result<()> {
        self.context().import_conversation(data)
    }

    /// Aggregate performance report
    pub fn get_performance_report(&self) -> PerformanceReport {
        self.monitor.get_performance_report()
    }

    /// Rule-based optimization suggestions
    pub fn get_optimization_recommendations(&self) -> Vec<Recommendation> {
        self.monitor.get_optimization_recommendations()
    }

    /// Clear all recorded performance data
    pub fn reset_metrics(&self) {
        self.monitor.reset();
    }

    /// Shared performance monitor
    pub fn monitor(&self) -> &Arc<PerformanceMonitor> {
        &self.monitor
    }

    /// Stop background monitoring
    pub fn shutdown(&self) {
        self.monitor.stop();
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn random_seed() -> usize {
    rand::random::<u32>() as usize
}
