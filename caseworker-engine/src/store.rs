//! In-memory case store.
//!
//! Process-lifetime keyed collection of case records. Holds cases
//! newest-first and owns case identifier generation; status transitions are
//! check-then-set under the store's write lock so no two concurrent
//! decisions on the same case can both succeed.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::types::{
    Assessment, CaseFeatures, CaseRecord, CaseStatus, Decision, EngineError, Result, RiskCategory,
    SchemeType,
};

/// Optional filters for case listing, combined with AND semantics.
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    /// Filter by lifecycle status
    pub status: Option<CaseStatus>,
    /// Filter by risk category
    pub risk_category: Option<RiskCategory>,
    /// Filter by scheme type
    pub scheme_type: Option<SchemeType>,
}

impl CaseFilter {
    /// Match-all filter.
    pub fn any() -> Self {
        Self::default()
    }

    /// Restrict to a status.
    pub fn with_status(mut self, status: CaseStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to a risk category.
    pub fn with_risk_category(mut self, category: RiskCategory) -> Self {
        self.risk_category = Some(category);
        self
    }

    /// Restrict to a scheme type.
    pub fn with_scheme_type(mut self, scheme: SchemeType) -> Self {
        self.scheme_type = Some(scheme);
        self
    }

    fn matches(&self, record: &CaseRecord) -> bool {
        self.status.map_or(true, |s| record.status == s)
            && self
                .risk_category
                .map_or(true, |c| record.assessment.risk_category == c)
            && self
                .scheme_type
                .map_or(true, |t| record.features.scheme_type == t)
    }
}

/// In-memory store for cases and their assessments.
pub struct CaseStore {
    /// Case records, newest first
    cases: Arc<RwLock<VecDeque<CaseRecord>>>,
    /// Per-process submission sequence for identifier generation
    sequence: AtomicU64,
}

impl CaseStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            cases: Arc::new(RwLock::new(VecDeque::new())),
            sequence: AtomicU64::new(0),
        }
    }

    /// Generate a unique case identifier.
    ///
    /// Timestamp plus an atomically incremented sequence: unique within the
    /// process even under concurrent submissions, roughly monotonic for
    /// traceability.
    fn next_case_id(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        format!("CASE_{}_{:06}", Utc::now().format("%Y%m%d_%H%M%S"), seq)
    }

    /// Persist a new case with its assessment. Returns the issued case ID.
    pub async fn create(&self, features: CaseFeatures, assessment: Assessment) -> String {
        let case_id = self.next_case_id();
        let record = CaseRecord {
            case_id: case_id.clone(),
            features,
            assessment,
            status: CaseStatus::PendingReview,
            created_at: Utc::now(),
            officer_id: None,
            officer_notes: None,
            decided_at: None,
        };

        let mut cases = self.cases.write().await;
        cases.push_front(record);

        debug!(case_id = %case_id, "Case persisted");
        case_id
    }

    /// Fetch a case by ID.
    pub async fn get(&self, case_id: &str) -> Result<CaseRecord> {
        let cases = self.cases.read().await;
        cases
            .iter()
            .find(|c| c.case_id == case_id)
            .cloned()
            .ok_or_else(|| EngineError::CaseNotFound(case_id.to_string()))
    }

    /// List cases matching a filter, newest first.
    pub async fn list(&self, filter: &CaseFilter) -> Vec<CaseRecord> {
        let cases = self.cases.read().await;
        cases.iter().filter(|c| filter.matches(c)).cloned().collect()
    }

    /// Apply a human decision to a pending case.
    ///
    /// The existence and legality checks and the status update happen under
    /// one write-lock acquisition, so exactly one of N concurrent decisions
    /// on the same case can observe `PendingReview`.
    pub async fn update_status(
        &self,
        case_id: &str,
        decision: Decision,
        officer_id: &str,
        notes: Option<String>,
    ) -> Result<CaseRecord> {
        let mut cases = self.cases.write().await;

        let record = cases
            .iter_mut()
            .find(|c| c.case_id == case_id)
            .ok_or_else(|| EngineError::CaseNotFound(case_id.to_string()))?;

        if record.status.is_terminal() {
            return Err(EngineError::IllegalTransition {
                case_id: case_id.to_string(),
                status: record.status,
            });
        }

        record.status = decision.resulting_status();
        record.officer_id = Some(officer_id.to_string());
        record.officer_notes = notes;
        record.decided_at = Some(Utc::now());

        info!(
            case_id = %case_id,
            officer_id = %officer_id,
            decision = %decision,
            "Case status updated"
        );

        Ok(record.clone())
    }

    /// Number of cases held.
    pub async fn count(&self) -> usize {
        let cases = self.cases.read().await;
        cases.len()
    }
}

impl Default for CaseStore {
    fn default() -> Self {
        Self::new()
    }
}
