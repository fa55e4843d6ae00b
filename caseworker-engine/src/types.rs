//! Core types for the caseworker engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use caseworker_narrate::NarrativeSource;

/// Recognized welfare scheme types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeType {
    Pension,
    Subsidy,
    Ration,
}

impl SchemeType {
    /// All recognized scheme types, exposed for the hosting/docs layer.
    pub const ALL: [SchemeType; 3] = [SchemeType::Pension, SchemeType::Subsidy, SchemeType::Ration];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeType::Pension => "pension",
            SchemeType::Subsidy => "subsidy",
            SchemeType::Ration => "ration",
        }
    }

    /// Parse from the wire value, case-insensitively.
    pub fn parse(value: &str) -> Option<SchemeType> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pension" => Some(SchemeType::Pension),
            "subsidy" => Some(SchemeType::Subsidy),
            "ration" => Some(SchemeType::Ration),
            _ => None,
        }
    }
}

impl std::fmt::Display for SchemeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal risk classification derived from the continuous score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "low",
            RiskCategory::Medium => "medium",
            RiskCategory::High => "high",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Officer-facing review recommendation derived from the risk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    RoutineReview,
    StandardReview,
    UrgentReview,
}

impl RecommendedAction {
    /// Derive the recommendation from a risk category.
    pub fn for_category(category: RiskCategory) -> Self {
        match category {
            RiskCategory::Low => RecommendedAction::RoutineReview,
            RiskCategory::Medium => RecommendedAction::StandardReview,
            RiskCategory::High => RecommendedAction::UrgentReview,
        }
    }

    /// Human-readable description of the recommended handling.
    pub fn description(&self) -> &'static str {
        match self {
            RecommendedAction::UrgentReview => {
                "Case requires immediate officer review and citizen contact"
            }
            RecommendedAction::StandardReview => {
                "Case requires standard officer review and documentation update request"
            }
            RecommendedAction::RoutineReview => {
                "Case can proceed with routine officer verification"
            }
        }
    }
}

/// Raw case input as received from the hosting layer, prior to validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSubmission {
    /// Opaque citizen identifier
    pub citizen_id: String,
    /// Monthly income
    pub income: f64,
    /// Months since last document update
    pub last_document_update_months: f64,
    /// Welfare scheme name (must be a recognized value)
    pub scheme_type: String,
    /// Number of past benefit interruptions
    pub past_benefit_interruptions: u32,
}

impl CaseSubmission {
    /// Validate and normalize into immutable case features.
    ///
    /// Rejects missing/negative/unrecognized fields before any business
    /// logic runs; nothing is persisted on failure.
    pub fn validate(&self) -> Result<CaseFeatures> {
        let citizen_id = self.citizen_id.trim();
        if citizen_id.is_empty() {
            return Err(EngineError::InvalidFeature(
                "citizen_id must be non-empty".to_string(),
            ));
        }

        if !self.income.is_finite() || self.income < 0.0 {
            return Err(EngineError::InvalidFeature(format!(
                "income must be a non-negative number, got {}",
                self.income
            )));
        }

        if !self.last_document_update_months.is_finite() || self.last_document_update_months < 0.0 {
            return Err(EngineError::InvalidFeature(format!(
                "last_document_update_months must be a non-negative number, got {}",
                self.last_document_update_months
            )));
        }

        let scheme_type = SchemeType::parse(&self.scheme_type).ok_or_else(|| {
            EngineError::InvalidFeature(format!(
                "scheme_type must be one of pension/subsidy/ration, got '{}'",
                self.scheme_type
            ))
        })?;

        Ok(CaseFeatures {
            citizen_id: citizen_id.to_string(),
            income: self.income,
            last_document_update_months: self.last_document_update_months,
            scheme_type,
            past_benefit_interruptions: self.past_benefit_interruptions,
        })
    }
}

/// Validated, normalized case features. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFeatures {
    /// Opaque citizen identifier
    pub citizen_id: String,
    /// Monthly income
    pub income: f64,
    /// Months since last document update
    pub last_document_update_months: f64,
    /// Welfare scheme
    pub scheme_type: SchemeType,
    /// Number of past benefit interruptions
    pub past_benefit_interruptions: u32,
}

/// A single ranked contribution to the risk score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureContribution {
    /// Human-readable feature label
    pub feature: String,
    /// Contribution weight (share of the score driven by this feature)
    pub weight: f64,
}

/// The computed risk assessment for a case. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// Risk score in [0, 1]
    pub risk_score: f64,
    /// Ordinal category derived from the score via fixed thresholds
    pub risk_category: RiskCategory,
    /// Feature contributions ranked by descending absolute weight
    pub contributions: Vec<FeatureContribution>,
    /// Plain-language rationale
    pub narrative: String,
    /// Whether the narrative came from the live service or the fallback
    pub narrative_source: NarrativeSource,
    /// Officer-facing review recommendation
    pub recommended_action: RecommendedAction,
    /// When the assessment was produced
    pub generated_at: DateTime<Utc>,
}

impl Assessment {
    /// True if the narrative was locally generated.
    pub fn narrative_is_fallback(&self) -> bool {
        self.narrative_source == NarrativeSource::Fallback
    }
}

/// Lifecycle status of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    /// Initial state, awaiting a human decision
    PendingReview,
    /// Terminal: approved by an officer
    Approved,
    /// Terminal: rejected by an officer
    Rejected,
}

impl CaseStatus {
    /// Whether no further transition is permitted.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CaseStatus::PendingReview)
    }

    /// Wire-format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::PendingReview => "PENDING_REVIEW",
            CaseStatus::Approved => "APPROVED",
            CaseStatus::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A human officer's decision on a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// The terminal status this decision moves the case into.
    pub fn resulting_status(&self) -> CaseStatus {
        match self {
            Decision::Approve => CaseStatus::Approved,
            Decision::Reject => CaseStatus::Rejected,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Decision::Approve => "APPROVE",
            Decision::Reject => "REJECT",
        })
    }
}

/// A stored case: features, assessment, and lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Unique case identifier
    pub case_id: String,
    /// Submitted features (immutable)
    pub features: CaseFeatures,
    /// Computed assessment (immutable)
    pub assessment: Assessment,
    /// Lifecycle status
    pub status: CaseStatus,
    /// When the case was created
    pub created_at: DateTime<Utc>,
    /// Officer who decided the case, once terminal
    pub officer_id: Option<String>,
    /// Officer notes, once terminal
    pub officer_notes: Option<String>,
    /// When the decision was recorded, once terminal
    pub decided_at: Option<DateTime<Utc>>,
}

/// Immutable audit entry for one human decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRecord {
    /// Unique record identifier
    pub record_id: String,
    /// The decided case
    pub case_id: String,
    /// Officer who made the decision
    pub officer_id: String,
    /// The decision
    pub decision: Decision,
    /// Free-text notes
    pub notes: Option<String>,
    /// When the decision was made
    pub decided_at: DateTime<Utc>,
    /// Citizen snapshot for audit convenience
    pub citizen_id: String,
    /// Risk score at decision time
    pub risk_score: f64,
    /// What the engine had recommended
    pub recommended_action: RecommendedAction,
}

/// Result of a successful case submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseAnalysis {
    /// Newly issued case identifier
    pub case_id: String,
    /// Citizen identifier echoed back
    pub citizen_id: String,
    /// The computed assessment
    pub assessment: Assessment,
    /// Lifecycle status (always PendingReview at submission)
    pub status: CaseStatus,
}

/// Liveness snapshot for the hosting layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Whether the risk model artifact is loaded
    pub classifier_loaded: bool,
    /// Whether a live narration backend is configured
    pub narration_backend_configured: bool,
    /// Cases currently held
    pub case_count: usize,
    /// Approval records currently held
    pub approval_count: usize,
    /// When the report was taken
    pub checked_at: DateTime<Utc>,
}

/// Error types for the caseworker engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Permanent, client-caused: missing/negative/unrecognized field
    #[error("Invalid feature: {0}")]
    InvalidFeature(String),

    /// Transient: classifier or its artifact not loaded
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Reference to a non-existent case
    #[error("Case not found: {0}")]
    CaseNotFound(String),

    /// Decision attempted on a non-pending case
    #[error("Illegal transition: case {case_id} is already {status}")]
    IllegalTransition {
        case_id: String,
        status: CaseStatus,
    },

    /// Configuration or artifact load error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> CaseSubmission {
        CaseSubmission {
            citizen_id: "CIT_000042".to_string(),
            income: 12000.0,
            last_document_update_months: 3.0,
            scheme_type: "subsidy".to_string(),
            past_benefit_interruptions: 1,
        }
    }

    #[test]
    fn test_valid_submission_normalizes() {
        let features = submission().validate().unwrap();
        assert_eq!(features.scheme_type, SchemeType::Subsidy);
        assert_eq!(features.citizen_id, "CIT_000042");
    }

    #[test]
    fn test_negative_income_rejected() {
        let mut s = submission();
        s.income = -1.0;
        assert!(matches!(s.validate(), Err(EngineError::InvalidFeature(_))));
    }

    #[test]
    fn test_nan_income_rejected() {
        let mut s = submission();
        s.income = f64::NAN;
        assert!(matches!(s.validate(), Err(EngineError::InvalidFeature(_))));
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let mut s = submission();
        s.scheme_type = "housing".to_string();
        assert!(matches!(s.validate(), Err(EngineError::InvalidFeature(_))));
    }

    #[test]
    fn test_empty_citizen_id_rejected() {
        let mut s = submission();
        s.citizen_id = "  ".to_string();
        assert!(matches!(s.validate(), Err(EngineError::InvalidFeature(_))));
    }

    #[test]
    fn test_status_machine_terminality() {
        assert!(!CaseStatus::PendingReview.is_terminal());
        assert!(CaseStatus::Approved.is_terminal());
        assert!(CaseStatus::Rejected.is_terminal());
        assert_eq!(Decision::Approve.resulting_status(), CaseStatus::Approved);
        assert_eq!(Decision::Reject.resulting_status(), CaseStatus::Rejected);
    }

    #[test]
    fn test_recommended_action_mapping() {
        assert_eq!(
            RecommendedAction::for_category(RiskCategory::High),
            RecommendedAction::UrgentReview
        );
        assert_eq!(
            RecommendedAction::for_category(RiskCategory::Low),
            RecommendedAction::RoutineReview
        );
    }

    #[test]
    fn test_scheme_parse_case_insensitive() {
        assert_eq!(SchemeType::parse("Pension"), Some(SchemeType::Pension));
        assert_eq!(SchemeType::parse(" ration "), Some(SchemeType::Ration));
        assert_eq!(SchemeType::parse("housing"), None);
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&CaseStatus::PendingReview).unwrap();
        assert_eq!(json, "\"PENDING_REVIEW\"");
    }
}
