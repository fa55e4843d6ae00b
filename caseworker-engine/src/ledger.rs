//! Approval ledger - append-only audit trail of human decisions.
//!
//! Each recorded decision is paired with the case status update: the store
//! performs the atomic legality check and transition first, and only a
//! successful transition is appended here. The append itself cannot fail,
//! so the two stores never disagree.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use crate::store::CaseStore;
use crate::types::{ApprovalRecord, Decision, Result};

/// Optional filters for the audit trail, combined with AND semantics.
#[derive(Debug, Clone, Default)]
pub struct ApprovalFilter {
    /// Filter by deciding officer
    pub officer_id: Option<String>,
    /// Filter by decision
    pub decision: Option<Decision>,
    /// Only records decided at or after this instant
    pub decided_after: Option<DateTime<Utc>>,
    /// Only records decided at or before this instant
    pub decided_before: Option<DateTime<Utc>>,
}

impl ApprovalFilter {
    /// Match-all filter.
    pub fn any() -> Self {
        Self::default()
    }

    /// Restrict to an officer.
    pub fn with_officer(mut self, officer_id: impl Into<String>) -> Self {
        self.officer_id = Some(officer_id.into());
        self
    }

    /// Restrict to a decision.
    pub fn with_decision(mut self, decision: Decision) -> Self {
        self.decision = Some(decision);
        self
    }

    /// Restrict to a time range (either bound optional).
    pub fn within(
        mut self,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Self {
        self.decided_after = after;
        self.decided_before = before;
        self
    }

    fn matches(&self, record: &ApprovalRecord) -> bool {
        self.officer_id
            .as_deref()
            .map_or(true, |o| record.officer_id == o)
            && self.decision.map_or(true, |d| record.decision == d)
            && self
                .decided_after
                .map_or(true, |t| record.decided_at >= t)
            && self
                .decided_before
                .map_or(true, |t| record.decided_at <= t)
    }
}

/// Append-only ledger of officer decisions.
pub struct ApprovalLedger {
    /// Case store that owns status transitions
    store: Arc<CaseStore>,
    /// Appended records, one per successful transition
    records: Arc<RwLock<Vec<ApprovalRecord>>>,
}

impl ApprovalLedger {
    /// Create a ledger over a case store.
    pub fn new(store: Arc<CaseStore>) -> Self {
        Self {
            store,
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Record a human decision on a pending case.
    ///
    /// Fails with `CaseNotFound` or `IllegalTransition` without appending
    /// anything; on success the case is terminal and exactly one record
    /// exists for it.
    pub async fn record_decision(
        &self,
        case_id: &str,
        officer_id: &str,
        decision: Decision,
        notes: Option<String>,
    ) -> Result<ApprovalRecord> {
        let updated = self
            .store
            .update_status(case_id, decision, officer_id, notes.clone())
            .await?;

        let record = ApprovalRecord {
            record_id: uuid::Uuid::new_v4().to_string(),
            case_id: updated.case_id.clone(),
            officer_id: officer_id.to_string(),
            decision,
            notes,
            // Same instant the store stamped, so ledger and store agree.
            decided_at: updated.decided_at.unwrap_or_else(Utc::now),
            citizen_id: updated.features.citizen_id.clone(),
            risk_score: updated.assessment.risk_score,
            recommended_action: updated.assessment.recommended_action,
        };

        let mut records = self.records.write().await;
        records.push(record.clone());

        info!(
            case_id = %case_id,
            officer_id = %officer_id,
            decision = %decision,
            record_id = %record.record_id,
            "Decision recorded"
        );

        Ok(record)
    }

    /// List records matching a filter, ascending by decision timestamp.
    ///
    /// Timestamps are stamped under the store lock but appended under this
    /// ledger's own lock, so insertion order can lag decision order under
    /// concurrent decisions. Sorting here keeps the audit-trail contract.
    pub async fn list(&self, filter: &ApprovalFilter) -> Vec<ApprovalRecord> {
        let records = self.records.read().await;
        let mut matched: Vec<ApprovalRecord> =
            records.iter().filter(|r| filter.matches(r)).cloned().collect();
        matched.sort_by(|a, b| {
            a.decided_at
                .cmp(&b.decided_at)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        matched
    }

    /// Number of records held.
    pub async fn count(&self) -> usize {
        let records = self.records.read().await;
        records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskClassifier;
    use crate::types::{
        Assessment, CaseFeatures, CaseStatus, EngineError, RecommendedAction, SchemeType,
    };
    use caseworker_narrate::NarrativeSource;

    async fn pending_case(store: &CaseStore) -> String {
        let features = CaseFeatures {
            citizen_id: "CIT_000009".to_string(),
            income: 15000.0,
            last_document_update_months: 18.0,
            scheme_type: SchemeType::Pension,
            past_benefit_interruptions: 5,
        };
        let scored = RiskClassifier::with_defaults().score(&features).unwrap();
        let assessment = Assessment {
            risk_score: scored.score,
            risk_category: scored.category,
            contributions: scored.contributions,
            narrative: "test".to_string(),
            narrative_source: NarrativeSource::Fallback,
            recommended_action: RecommendedAction::for_category(scored.category),
            generated_at: Utc::now(),
        };
        store.create(features, assessment).await
    }

    #[tokio::test]
    async fn test_decision_updates_case_and_appends() {
        let store = Arc::new(CaseStore::new());
        let ledger = ApprovalLedger::new(Arc::clone(&store));
        let case_id = pending_case(&store).await;

        let record = ledger
            .record_decision(&case_id, "OFF_001", Decision::Approve, Some("verified".to_string()))
            .await
            .unwrap();

        assert_eq!(record.case_id, case_id);
        assert_eq!(record.citizen_id, "CIT_000009");
        assert_eq!(record.recommended_action, RecommendedAction::UrgentReview);

        let case = store.get(&case_id).await.unwrap();
        assert_eq!(case.status, CaseStatus::Approved);
        assert_eq!(case.decided_at, Some(record.decided_at));
        assert_eq!(ledger.count().await, 1);
    }

    #[tokio::test]
    async fn test_illegal_transition_appends_nothing() {
        let store = Arc::new(CaseStore::new());
        let ledger = ApprovalLedger::new(Arc::clone(&store));
        let case_id = pending_case(&store).await;

        ledger
            .record_decision(&case_id, "OFF_001", Decision::Approve, None)
            .await
            .unwrap();

        let second = ledger
            .record_decision(&case_id, "OFF_002", Decision::Reject, None)
            .await;
        assert!(matches!(second, Err(EngineError::IllegalTransition { .. })));
        assert_eq!(ledger.count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_case_appends_nothing() {
        let store = Arc::new(CaseStore::new());
        let ledger = ApprovalLedger::new(Arc::clone(&store));

        let result = ledger
            .record_decision("CASE_MISSING", "OFF_001", Decision::Approve, None)
            .await;
        assert!(matches!(result, Err(EngineError::CaseNotFound(_))));
        assert_eq!(ledger.count().await, 0);
    }

    #[tokio::test]
    async fn test_list_sorted_under_concurrent_decisions() {
        let store = Arc::new(CaseStore::new());
        let ledger = Arc::new(ApprovalLedger::new(Arc::clone(&store)));

        let mut case_ids = Vec::new();
        for _ in 0..8 {
            case_ids.push(pending_case(&store).await);
        }

        let handles: Vec<_> = case_ids
            .into_iter()
            .enumerate()
            .map(|(i, case_id)| {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move {
                    ledger
                        .record_decision(&case_id, &format!("OFF_{:03}", i), Decision::Approve, None)
                        .await
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let all = ledger.list(&ApprovalFilter::any()).await;
        assert_eq!(all.len(), 8);
        for pair in all.windows(2) {
            assert!(pair[0].decided_at <= pair[1].decided_at);
            if pair[0].decided_at == pair[1].decided_at {
                assert!(pair[0].record_id < pair[1].record_id);
            }
        }
    }

    #[tokio::test]
    async fn test_list_filters_and_order() {
        let store = Arc::new(CaseStore::new());
        let ledger = ApprovalLedger::new(Arc::clone(&store));

        let first = pending_case(&store).await;
        let second = pending_case(&store).await;

        ledger
            .record_decision(&first, "OFF_001", Decision::Approve, None)
            .await
            .unwrap();
        ledger
            .record_decision(&second, "OFF_002", Decision::Reject, None)
            .await
            .unwrap();

        let all = ledger.list(&ApprovalFilter::any()).await;
        assert_eq!(all.len(), 2);
        // Audit-trail order: ascending by decision time
        assert!(all[0].decided_at <= all[1].decided_at);
        assert_eq!(all[0].case_id, first);

        let rejects = ledger
            .list(&ApprovalFilter::any().with_decision(Decision::Reject))
            .await;
        assert_eq!(rejects.len(), 1);
        assert_eq!(rejects[0].officer_id, "OFF_002");

        let by_officer = ledger
            .list(&ApprovalFilter::any().with_officer("OFF_001"))
            .await;
        assert_eq!(by_officer.len(), 1);
    }
}
