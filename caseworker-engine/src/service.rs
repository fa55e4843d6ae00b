//! CaseworkerService - main entry point for case assessment and review.
//!
//! Coordinates validation, risk classification, narration, persistence, and
//! the human decision workflow. This is the single place where
//! cross-component failure policy is decided: feature validation errors are
//! client errors, classifier unavailability is a retryable service error,
//! and narration failure never fails a submission.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use caseworker_narrate::{ExplanationContext, ExplanationEngine};

use crate::config::{CaseworkerConfig, RiskThresholds};
use crate::ledger::{ApprovalFilter, ApprovalLedger};
use crate::risk::RiskClassifier;
use crate::store::{CaseFilter, CaseStore};
use crate::types::{
    ApprovalRecord, Assessment, CaseAnalysis, CaseRecord, CaseSubmission, Decision, HealthReport,
    RecommendedAction, Result, SchemeType,
};

/// Orchestrating service over the classifier, narrator, store, and ledger.
///
/// Constructed once at process start from injected parts; tests build
/// fresh isolated instances. No ambient global state.
pub struct CaseworkerService {
    /// Configuration
    config: CaseworkerConfig,
    /// Risk classifier adapter
    classifier: RiskClassifier,
    /// Narration engine (never fails a request)
    explainer: ExplanationEngine,
    /// Case store
    store: Arc<CaseStore>,
    /// Approval ledger
    ledger: Arc<ApprovalLedger>,
}

impl CaseworkerService {
    /// Create a service from its parts.
    ///
    /// The config is authoritative for tunables: its thresholds replace
    /// whatever the classifier was built with, and its narration section
    /// sets the explainer's timeout, token budget, and temperature.
    pub fn new(
        config: CaseworkerConfig,
        classifier: RiskClassifier,
        explainer: ExplanationEngine,
        store: Arc<CaseStore>,
        ledger: Arc<ApprovalLedger>,
    ) -> Self {
        let classifier = classifier.with_thresholds(config.thresholds);
        let explainer = explainer
            .with_timeout(Duration::from_millis(config.narration.timeout_ms))
            .with_max_tokens(config.narration.max_tokens)
            .with_temperature(config.narration.temperature);
        info!(
            service_id = %config.service_id,
            classifier_loaded = classifier.is_loaded(),
            narration_configured = explainer.is_configured(),
            narration_timeout_ms = config.narration.timeout_ms,
            "CaseworkerService constructed"
        );
        Self {
            config,
            classifier,
            explainer,
            store,
            ledger,
        }
    }

    /// Convenience constructor: default config and artifact, fallback-only
    /// narration, fresh stores.
    pub fn with_defaults() -> Self {
        let store = Arc::new(CaseStore::new());
        let ledger = Arc::new(ApprovalLedger::new(Arc::clone(&store)));
        Self::new(
            CaseworkerConfig::default(),
            RiskClassifier::with_defaults(),
            ExplanationEngine::without_backend(),
            store,
            ledger,
        )
    }

    /// Service instance ID.
    pub fn id(&self) -> &str {
        &self.config.service_id
    }

    /// Thresholds in force, for the hosting/docs layer.
    pub fn thresholds(&self) -> RiskThresholds {
        self.classifier.thresholds()
    }

    /// Recognized scheme types, for the hosting/docs layer.
    pub fn scheme_types(&self) -> &'static [SchemeType] {
        &SchemeType::ALL
    }

    /// Assess a submitted case.
    ///
    /// Validates input (rejects before anything is persisted), scores it,
    /// narrates the result, and stores the case as pending review.
    pub async fn submit_case(&self, submission: CaseSubmission) -> Result<CaseAnalysis> {
        let features = submission.validate()?;
        let scored = self.classifier.score(&features)?;

        debug!(
            citizen_id = %features.citizen_id,
            score = scored.score,
            category = %scored.category,
            "Case scored"
        );

        let top_contributions: Vec<(String, f64)> = scored
            .contributions
            .iter()
            .filter(|c| c.weight > 0.0)
            .take(3)
            .map(|c| (c.feature.clone(), c.weight))
            .collect();

        let narrative = self
            .explainer
            .explain(&ExplanationContext {
                citizen_id: features.citizen_id.clone(),
                income: features.income,
                last_document_update_months: features.last_document_update_months,
                scheme_type: features.scheme_type.to_string(),
                past_benefit_interruptions: features.past_benefit_interruptions,
                risk_score: scored.score,
                risk_category: scored.category.to_string(),
                top_contributions,
            })
            .await;

        let assessment = Assessment {
            risk_score: scored.score,
            risk_category: scored.category,
            contributions: scored.contributions,
            narrative: narrative.text,
            narrative_source: narrative.source,
            recommended_action: RecommendedAction::for_category(scored.category),
            generated_at: Utc::now(),
        };

        let citizen_id = features.citizen_id.clone();
        let case_id = self.store.create(features, assessment).await;
        let record = self.store.get(&case_id).await?;

        info!(
            case_id = %case_id,
            category = %record.assessment.risk_category,
            score = record.assessment.risk_score,
            fallback = record.assessment.narrative_is_fallback(),
            "Case analyzed"
        );

        Ok(CaseAnalysis {
            case_id,
            citizen_id,
            assessment: record.assessment,
            status: record.status,
        })
    }

    /// Fetch a case with its assessment and status.
    pub async fn get_case(&self, case_id: &str) -> Result<CaseRecord> {
        self.store.get(case_id).await
    }

    /// List cases matching a filter, newest first.
    pub async fn list_cases(&self, filter: &CaseFilter) -> Vec<CaseRecord> {
        self.store.list(filter).await
    }

    /// Record a human decision on a pending case.
    pub async fn record_decision(
        &self,
        case_id: &str,
        officer_id: &str,
        decision: Decision,
        notes: Option<String>,
    ) -> Result<ApprovalRecord> {
        self.ledger
            .record_decision(case_id, officer_id, decision, notes)
            .await
    }

    /// List approval records matching a filter, in audit-trail order.
    pub async fn list_approvals(&self, filter: &ApprovalFilter) -> Vec<ApprovalRecord> {
        self.ledger.list(filter).await
    }

    /// Liveness snapshot reflecting real adapter state.
    pub async fn health(&self) -> HealthReport {
        HealthReport {
            classifier_loaded: self.classifier.is_loaded(),
            narration_backend_configured: self.explainer.is_configured(),
            case_count: self.store.count().await,
            approval_count: self.ledger.count().await,
            checked_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CaseStatus, EngineError, RiskCategory};
    use caseworker_narrate::{MockBackend, NarrativeSource};

    fn submission(income: f64, months: f64, scheme: &str, interruptions: u32) -> CaseSubmission {
        CaseSubmission {
            citizen_id: "CIT_000777".to_string(),
            income,
            last_document_update_months: months,
            scheme_type: scheme.to_string(),
            past_benefit_interruptions: interruptions,
        }
    }

    fn service_with_backend(backend: MockBackend) -> CaseworkerService {
        let store = Arc::new(CaseStore::new());
        let ledger = Arc::new(ApprovalLedger::new(Arc::clone(&store)));
        CaseworkerService::new(
            CaseworkerConfig::default(),
            RiskClassifier::with_defaults(),
            ExplanationEngine::new(Arc::new(backend)),
            store,
            ledger,
        )
    }

    #[tokio::test]
    async fn test_submit_valid_case() {
        let service = CaseworkerService::with_defaults();
        let analysis = service
            .submit_case(submission(15000.0, 2.0, "subsidy", 0))
            .await
            .unwrap();

        assert!(analysis.case_id.starts_with("CASE_"));
        assert_eq!(analysis.status, CaseStatus::PendingReview);
        assert_eq!(analysis.assessment.risk_category, RiskCategory::Low);
        assert!(!analysis.assessment.narrative.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_submission_persists_nothing() {
        let service = CaseworkerService::with_defaults();
        let result = service
            .submit_case(submission(-100.0, 2.0, "subsidy", 0))
            .await;

        assert!(matches!(result, Err(EngineError::InvalidFeature(_))));
        assert_eq!(service.health().await.case_count, 0);
    }

    #[tokio::test]
    async fn test_degraded_classifier_is_service_unavailable() {
        let store = Arc::new(CaseStore::new());
        let ledger = Arc::new(ApprovalLedger::new(Arc::clone(&store)));
        let service = CaseworkerService::new(
            CaseworkerConfig::default(),
            RiskClassifier::degraded(RiskThresholds::default()),
            ExplanationEngine::without_backend(),
            store,
            ledger,
        );

        let result = service
            .submit_case(submission(15000.0, 2.0, "subsidy", 0))
            .await;
        assert!(matches!(result, Err(EngineError::ServiceUnavailable(_))));
        assert_eq!(service.health().await.case_count, 0);
        assert!(!service.health().await.classifier_loaded);
    }

    #[tokio::test]
    async fn test_live_narration_tagged_live() {
        let service =
            service_with_backend(MockBackend::default().with_response("Case narrated live."));
        let analysis = service
            .submit_case(submission(15000.0, 18.0, "pension", 5))
            .await
            .unwrap();

        assert_eq!(analysis.assessment.narrative_source, NarrativeSource::Live);
        assert_eq!(analysis.assessment.narrative, "Case narrated live.");
    }

    #[tokio::test]
    async fn test_unreachable_narration_degrades_not_fails() {
        let service = service_with_backend(MockBackend::default().with_available(false));
        let analysis = service
            .submit_case(submission(15000.0, 18.0, "pension", 5))
            .await
            .unwrap();

        assert!(analysis.assessment.narrative_is_fallback());
        assert!(analysis.assessment.narrative.contains("high"));
    }

    #[tokio::test]
    async fn test_configured_narration_timeout_applies() {
        let mut config = CaseworkerConfig::default();
        config.narration.timeout_ms = 10;

        let store = Arc::new(CaseStore::new());
        let ledger = Arc::new(ApprovalLedger::new(Arc::clone(&store)));
        let backend = MockBackend::default()
            .with_response("Slow live narration")
            .with_delay(Duration::from_millis(300));
        let service = CaseworkerService::new(
            config,
            RiskClassifier::with_defaults(),
            ExplanationEngine::new(Arc::new(backend)),
            store,
            ledger,
        );

        let analysis = service
            .submit_case(submission(15000.0, 18.0, "pension", 5))
            .await
            .unwrap();
        assert!(analysis.assessment.narrative_is_fallback());
    }

    #[tokio::test]
    async fn test_configured_thresholds_apply() {
        let mut config = CaseworkerConfig::default();
        config.thresholds = RiskThresholds {
            medium: 0.5,
            high: 0.9,
        };

        let store = Arc::new(CaseStore::new());
        let ledger = Arc::new(ApprovalLedger::new(Arc::clone(&store)));
        let service = CaseworkerService::new(
            config,
            RiskClassifier::with_defaults(),
            ExplanationEngine::without_backend(),
            store,
            ledger,
        );

        assert_eq!(service.thresholds().high, 0.9);
        // Scores 0.73 with the default artifact, below the raised high bound
        let analysis = service
            .submit_case(submission(15000.0, 18.0, "pension", 5))
            .await
            .unwrap();
        assert_eq!(analysis.assessment.risk_category, RiskCategory::Medium);
    }

    #[tokio::test]
    async fn test_high_risk_scenario() {
        let service = CaseworkerService::with_defaults();
        let analysis = service
            .submit_case(submission(15000.0, 18.0, "pension", 5))
            .await
            .unwrap();

        assert_eq!(analysis.assessment.risk_category, RiskCategory::High);
        assert_eq!(
            analysis.assessment.recommended_action,
            RecommendedAction::UrgentReview
        );
        // Rationale mentions at least one driving factor
        let narrative = analysis.assessment.narrative.to_lowercase();
        assert!(
            narrative.contains("document") || narrative.contains("interruption"),
            "narrative should mention a driving factor: {}",
            narrative
        );
    }

    #[tokio::test]
    async fn test_health_reflects_state() {
        let service = CaseworkerService::with_defaults();
        let before = service.health().await;
        assert!(before.classifier_loaded);
        assert!(!before.narration_backend_configured);
        assert_eq!(before.case_count, 0);
        assert_eq!(before.approval_count, 0);

        let analysis = service
            .submit_case(submission(15000.0, 2.0, "ration", 0))
            .await
            .unwrap();
        service
            .record_decision(&analysis.case_id, "OFF_001", Decision::Approve, None)
            .await
            .unwrap();

        let after = service.health().await;
        assert_eq!(after.case_count, 1);
        assert_eq!(after.approval_count, 1);
    }
}
