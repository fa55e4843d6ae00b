//! Configuration for the caseworker engine.

use serde::{Deserialize, Serialize};

/// Configuration for a caseworker service instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseworkerConfig {
    /// Service instance ID
    pub service_id: String,
    /// Risk category thresholds
    pub thresholds: RiskThresholds,
    /// Narration settings
    pub narration: NarrationConfig,
}

impl Default for CaseworkerConfig {
    fn default() -> Self {
        Self {
            service_id: uuid::Uuid::new_v4().to_string(),
            thresholds: RiskThresholds::default(),
            narration: NarrationConfig::default(),
        }
    }
}

impl CaseworkerConfig {
    /// Create a new config with a service ID.
    pub fn new(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            ..Default::default()
        }
    }

    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Fixed score thresholds for deriving the risk category.
///
/// Scores live in [0, 1]: below `medium` is low risk, below `high` is
/// medium risk, everything else is high risk. Exposed so the hosting/docs
/// layer can surface them without hardcoding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Lower bound of the medium band
    pub medium: f64,
    /// Lower bound of the high band
    pub high: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: 0.33,
            high: 0.66,
        }
    }
}

/// Narration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// Deadline for a single narration call (ms)
    pub timeout_ms: u64,
    /// Max tokens per narration
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: caseworker_narrate::engine::DEFAULT_TIMEOUT_MS,
            max_tokens: 300,
            temperature: 0.7,
        }
    }
}
