//! Caseworker Narrate - plain-language narration for risk assessments
//!
//! Provides the infrastructure for turning a computed risk assessment into
//! a citizen-friendly explanation:
//! - Trait-based narration backends (OpenAI-compatible, mock)
//! - Bounded-timeout narration with a deterministic fallback template
//! - Tagged provenance (live vs fallback) so degraded mode is observable
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          ExplanationEngine              │
//! │  (prompt assembly, timeout, fallback)   │
//! └────────────────┬────────────────────────┘
//!                  │
//!                  ▼
//!          ┌───────────────┐
//!          │NarrationBackend│
//!          │ (OpenAI/Mock)  │
//!          └───────────────┘
//! ```

pub mod backend;
pub mod engine;

// Re-export main types for convenience
pub use backend::traits::{CompletionRequest, CompletionResponse, NarrationBackend, NarrationError};
pub use backend::{MockBackend, OpenAiBackend};
pub use engine::{ExplanationContext, ExplanationEngine, Narrative, NarrativeSource};
