//! Risk classifier adapter.
//!
//! Wraps a pre-trained statistical model distilled to an immutable weight
//! artifact. Scoring is a pure function over the artifact; when the artifact
//! failed to load the classifier stays up in a degraded state and reports
//! unavailability per request instead of crashing.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::RiskThresholds;
use crate::types::{CaseFeatures, EngineError, FeatureContribution, Result, RiskCategory, SchemeType};

/// Feature labels used in contributions and narration prompts.
pub const FEATURE_INCOME: &str = "income";
pub const FEATURE_DOCUMENT_AGE: &str = "months since last document update";
pub const FEATURE_INTERRUPTIONS: &str = "past benefit interruptions";
pub const FEATURE_SCHEME: &str = "scheme type";

/// Immutable model artifact: signal cutoffs and weights distilled from the
/// trained classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskArtifact {
    /// Model artifact version tag
    pub version: String,
    /// Income above this suggests potential fraud
    pub high_income_cutoff: f64,
    /// Income below this suggests potential exclusion
    pub low_income_cutoff: f64,
    /// Weight for the high-income signal
    pub high_income_weight: f64,
    /// Weight for the low-income signal
    pub low_income_weight: f64,
    /// Document age above this is stale
    pub stale_docs_months: f64,
    /// Weight for stale documents
    pub stale_docs_weight: f64,
    /// Document age above this is aging
    pub aging_docs_months: f64,
    /// Weight for aging documents
    pub aging_docs_weight: f64,
    /// Weight per past interruption
    pub interruption_weight: f64,
    /// Interruptions counted beyond this are ignored
    pub max_interruptions: u32,
    /// Pension income above this adds scheme-specific risk
    pub pension_income_cutoff: f64,
    /// Weight for the pension/high-income combination
    pub pension_income_weight: f64,
}

impl Default for RiskArtifact {
    fn default() -> Self {
        Self {
            version: "2026.1".to_string(),
            high_income_cutoff: 30_000.0,
            low_income_cutoff: 8_000.0,
            high_income_weight: 0.30,
            low_income_weight: 0.20,
            stale_docs_months: 12.0,
            stale_docs_weight: 0.28,
            aging_docs_months: 6.0,
            aging_docs_weight: 0.15,
            interruption_weight: 0.09,
            max_interruptions: 5,
            pension_income_cutoff: 25_000.0,
            pension_income_weight: 0.15,
        }
    }
}

impl RiskArtifact {
    /// Load an artifact from its JSON serialization.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::ConfigError(format!("Invalid risk artifact: {}", e)))
    }
}

/// A scored case: score, category, and ranked contributions.
#[derive(Debug, Clone)]
pub struct RiskScore {
    /// Risk score in [0, 1]
    pub score: f64,
    /// Category derived from the score via the configured thresholds
    pub category: RiskCategory,
    /// Contributions ranked by descending absolute weight
    pub contributions: Vec<FeatureContribution>,
}

/// Risk classifier over a loaded artifact.
///
/// Construct via [`RiskClassifier::new`] with a loaded artifact, or
/// [`RiskClassifier::degraded`] when the artifact failed to load at process
/// start; callers detect degradation through [`RiskClassifier::is_loaded`].
pub struct RiskClassifier {
    artifact: Option<RiskArtifact>,
    thresholds: RiskThresholds,
}

impl RiskClassifier {
    /// Create a classifier over a loaded artifact.
    pub fn new(artifact: RiskArtifact, thresholds: RiskThresholds) -> Self {
        debug!(version = %artifact.version, "Risk artifact loaded");
        Self {
            artifact: Some(artifact),
            thresholds,
        }
    }

    /// Create a classifier with the built-in default artifact.
    pub fn with_defaults() -> Self {
        Self::new(RiskArtifact::default(), RiskThresholds::default())
    }

    /// Create a degraded classifier whose scoring is unavailable.
    pub fn degraded(thresholds: RiskThresholds) -> Self {
        error!("Risk classifier running degraded: model artifact not loaded");
        Self {
            artifact: None,
            thresholds,
        }
    }

    /// Load from JSON, falling back to the degraded state on parse failure.
    pub fn from_json(json: &str, thresholds: RiskThresholds) -> Self {
        match RiskArtifact::from_json(json) {
            Ok(artifact) => Self::new(artifact, thresholds),
            Err(e) => {
                error!(error = %e, "Failed to load risk artifact");
                Self::degraded(thresholds)
            }
        }
    }

    /// Replace the thresholds, keeping the artifact.
    pub fn with_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Whether the model artifact is loaded.
    pub fn is_loaded(&self) -> bool {
        self.artifact.is_some()
    }

    /// The thresholds this classifier applies.
    pub fn thresholds(&self) -> RiskThresholds {
        self.thresholds
    }

    /// Score a validated case.
    ///
    /// Pure over the loaded artifact; no side effects. Fails with
    /// `ServiceUnavailable` when the artifact is not loaded.
    pub fn score(&self, features: &CaseFeatures) -> Result<RiskScore> {
        let artifact = self.artifact.as_ref().ok_or_else(|| {
            EngineError::ServiceUnavailable("risk model artifact not loaded".to_string())
        })?;

        let income_weight = if features.income > artifact.high_income_cutoff {
            artifact.high_income_weight
        } else if features.income < artifact.low_income_cutoff {
            artifact.low_income_weight
        } else {
            0.0
        };

        let docs_weight = if features.last_document_update_months > artifact.stale_docs_months {
            artifact.stale_docs_weight
        } else if features.last_document_update_months > artifact.aging_docs_months {
            artifact.aging_docs_weight
        } else {
            0.0
        };

        let interruptions = features
            .past_benefit_interruptions
            .min(artifact.max_interruptions);
        let interruption_weight = artifact.interruption_weight * f64::from(interruptions);

        let scheme_weight = if features.scheme_type == SchemeType::Pension
            && features.income > artifact.pension_income_cutoff
        {
            artifact.pension_income_weight
        } else {
            0.0
        };

        let mut contributions = vec![
            FeatureContribution {
                feature: FEATURE_INCOME.to_string(),
                weight: income_weight,
            },
            FeatureContribution {
                feature: FEATURE_DOCUMENT_AGE.to_string(),
                weight: docs_weight,
            },
            FeatureContribution {
                feature: FEATURE_INTERRUPTIONS.to_string(),
                weight: interruption_weight,
            },
            FeatureContribution {
                feature: FEATURE_SCHEME.to_string(),
                weight: scheme_weight,
            },
        ];
        contributions.sort_by(|a, b| {
            b.weight
                .abs()
                .partial_cmp(&a.weight.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let score = (income_weight + docs_weight + interruption_weight + scheme_weight)
            .clamp(0.0, 1.0);
        let category = self.categorize(score);

        Ok(RiskScore {
            score,
            category,
            contributions,
        })
    }

    /// Apply the fixed thresholds, consistently for any artifact.
    fn categorize(&self, score: f64) -> RiskCategory {
        if score < self.thresholds.medium {
            RiskCategory::Low
        } else if score < self.thresholds.high {
            RiskCategory::Medium
        } else {
            RiskCategory::High
        }
    }
}
