//! Narration backend abstraction layer.
//!
//! Provides a trait-based interface for text-generation services:
//! - OpenAI-compatible (Azure OpenAI, OpenAI, vLLM, Ollama, etc.)
//! - Mock backend for testing

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::MockBackend;
pub use openai::OpenAiBackend;
pub use traits::{CompletionRequest, CompletionResponse, NarrationBackend, NarrationError};
