//! Caseworker Engine - welfare case risk assessment with human oversight
//!
//! Implements the assessment and approval workflow for welfare-benefit
//! cases:
//!
//! - **Risk classification**: score, category, and ranked contributions
//!   from an immutable model artifact
//! - **Plain-language narration**: live backend with deterministic fallback
//! - **Case store**: process-lifetime records with lifecycle status
//! - **Approval ledger**: append-only audit trail of human decisions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   CaseworkerService                         │
//! │                                                             │
//! │  ┌──────────┐  ┌──────────┐  ┌───────────┐  ┌───────────┐  │
//! │  │ Validate │──│ Classify │──│  Narrate  │──│  Persist  │  │
//! │  └──────────┘  └──────────┘  └───────────┘  └───────────┘  │
//! │                                                  │          │
//! │                                         ┌────────▼───────┐  │
//! │                                         │ ApprovalLedger │  │
//! │                                         └────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod ledger;
pub mod risk;
pub mod service;
pub mod store;
pub mod types;

// Re-export main types
pub use config::{CaseworkerConfig, RiskThresholds};
pub use ledger::{ApprovalFilter, ApprovalLedger};
pub use risk::{RiskArtifact, RiskClassifier, RiskScore};
pub use service::CaseworkerService;
pub use store::{CaseFilter, CaseStore};
pub use types::*;
