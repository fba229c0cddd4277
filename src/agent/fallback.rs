//! Fallback chain construction
//!
//! A thinking request walks an ordered list of candidates until one
//! answers. The list is rebuilt from current settings on every request.

use crate::providers::CloudProviderKind;
use std::fmt;
use std::time::Duration;

/// Error text that aborts the chain instead of falling back
const CRITICAL_PATTERNS: &[&str] = &[
    "invalid prompt",
    "malformed input",
    "oversized",
    "prompt too long",
    "security violation",
];

/// One entry in the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Candidate {
    /// A remote provider
    Cloud(CloudProviderKind),
    /// The locally hosted model
    Local,
    /// Canned replies; always succeeds
    EmergencyBackup,
}

impl Candidate {
    /// Label used in logs, metrics and turn metadata
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cloud(kind) => kind.as_str(),
            Self::Local => "local",
            Self::EmergencyBackup => "emergency_backup",
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Provider availability snapshot used to build a chain
#[derive(Debug, Clone)]
pub struct ChainInputs {
    /// Cloud is the preferred provider type
    pub use_cloud: bool,
    /// The selected cloud provider
    pub current_cloud: CloudProviderKind,
    /// Cloud providers holding real credentials, in fallback order
    pub configured_clouds: Vec<CloudProviderKind>,
    /// The local model finished loading
    pub local_loaded: bool,
}

/// Build the ordered fallback chain
///
/// 1. The preferred provider, if admissible.
/// 2. The opposite provider type, if admissible.
/// 3. Every other configured cloud provider, only when cloud is preferred.
/// 4. The emergency backup.
///
/// # Examples
///
/// ```
/// use bella::agent::fallback::{build_chain, Candidate, ChainInputs};
/// use bella::providers::CloudProviderKind;
///
/// let chain = build_chain(&ChainInputs {
///     use_cloud: true,
///     current_cloud: CloudProviderKind::OpenAi,
///     configured_clouds: vec![CloudProviderKind::OpenAi, CloudProviderKind::Glm],
///     local_loaded: true,
/// });
/// assert_eq!(
///     chain,
///     vec![
///         Candidate::Cloud(CloudProviderKind::OpenAi),
///         Candidate::Local,
///         Candidate::Cloud(CloudProviderKind::Glm),
///         Candidate::EmergencyBackup,
///     ]
/// );
/// ```
pub fn build_chain(inputs: &ChainInputs) -> Vec<Candidate> {
    let cloud_ok = inputs.configured_clouds.contains(&inputs.current_cloud);
    let cloud = Candidate::Cloud(inputs.current_cloud);

    let (preferred, secondary) = if inputs.use_cloud {
        ((cloud, cloud_ok), (Candidate::Local, inputs.local_loaded))
    } else {
        ((Candidate::Local, inputs.local_loaded), (cloud, cloud_ok))
    };

    let mut chain = Vec::with_capacity(CloudProviderKind::ALL.len() + 2);
    for (candidate, admissible) in [preferred, secondary] {
        if admissible {
            chain.push(candidate);
        }
    }

    if inputs.use_cloud {
        for kind in &inputs.configured_clouds {
            let candidate = Candidate::Cloud(*kind);
            if !chain.contains(&candidate) {
                chain.push(candidate);
            }
        }
    }

    chain.push(Candidate::EmergencyBackup);
    chain
}

/// Delay before the attempt following attempt number `attempt` (1-based)
///
/// # Examples
///
/// ```
/// use bella::agent::fallback::retry_delay;
/// use std::time::Duration;
///
/// let base = Duration::from_millis(1000);
/// let max = Duration::from_millis(3000);
/// assert_eq!(retry_delay(1, base, max), Duration::from_millis(1000));
/// assert_eq!(retry_delay(5, base, max), Duration::from_millis(3000));
/// ```
pub fn retry_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    base.saturating_mul(attempt).min(max)
}

/// Whether an error must abort the chain instead of falling back
pub fn is_critical_error(error: &anyhow::Error) -> bool {
    let text = format!("{:#}", error).to_lowercase();
    CRITICAL_PATTERNS.iter().any(|p| text.contains(p))
}
