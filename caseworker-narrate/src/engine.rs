//! ExplanationEngine - plain-language narration of risk assessments.
//!
//! Calls a narration backend with a bounded timeout and degrades to a
//! deterministic template when the backend is missing, unreachable, or slow.
//! Narration is an enhancement, not a correctness requirement, so this
//! engine never surfaces an error to its callers.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::traits::{CompletionRequest, NarrationBackend};

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant explaining welfare case decisions in simple, clear language.";

/// Default deadline for a narration call.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Where a narrative came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    /// Generated by the live narration backend
    Live,
    /// Deterministic local template
    Fallback,
}

/// A narrative with its provenance tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narrative {
    /// The narrative text
    pub text: String,
    /// Whether it came from the live service or the fallback
    pub source: NarrativeSource,
}

impl Narrative {
    /// True if this narrative came from the fallback template.
    pub fn is_fallback(&self) -> bool {
        self.source == NarrativeSource::Fallback
    }
}

/// Everything the engine needs to narrate one assessment.
#[derive(Debug, Clone)]
pub struct ExplanationContext {
    /// Citizen identifier
    pub citizen_id: String,
    /// Monthly income
    pub income: f64,
    /// Months since last document update
    pub last_document_update_months: f64,
    /// Welfare scheme name
    pub scheme_type: String,
    /// Past benefit interruptions
    pub past_benefit_interruptions: u32,
    /// Risk score in [0, 1]
    pub risk_score: f64,
    /// Risk category name ("low" / "medium" / "high")
    pub risk_category: String,
    /// Top contributing factors as (label, weight), strongest first
    pub top_contributions: Vec<(String, f64)>,
}

impl ExplanationContext {
    /// Risk score rendered on the 0-100 display scale.
    fn score_display(&self) -> i64 {
        (self.risk_score * 100.0).round() as i64
    }
}

/// Engine for generating citizen-friendly explanations.
pub struct ExplanationEngine {
    /// Narration backend, if one is configured
    backend: Option<Arc<dyn NarrationBackend>>,
    /// Deadline for a single narration call
    timeout: Duration,
    /// Max tokens per narration
    max_tokens: u32,
    /// Sampling temperature
    temperature: f32,
}

impl ExplanationEngine {
    /// Create an engine backed by a narration service.
    pub fn new(backend: Arc<dyn NarrationBackend>) -> Self {
        Self {
            backend: Some(backend),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_tokens: 300,
            temperature: 0.7,
        }
    }

    /// Create an engine with no backend; every narrative is a fallback.
    pub fn without_backend() -> Self {
        Self {
            backend: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_tokens: 300,
            temperature: 0.7,
        }
    }

    /// Set the narration deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set max tokens per narration.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Whether a live backend is configured.
    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Narrate an assessment. Never fails; degrades to the fallback template.
    pub async fn explain(&self, context: &ExplanationContext) -> Narrative {
        let Some(backend) = &self.backend else {
            debug!(citizen_id = %context.citizen_id, "No narration backend configured, using fallback");
            return self.fallback(context);
        };

        let request = CompletionRequest::user(build_prompt(context))
            .with_system(SYSTEM_PROMPT)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        match tokio::time::timeout(self.timeout, backend.complete(request)).await {
            Ok(Ok(response)) if !response.content.trim().is_empty() => {
                debug!(
                    backend = backend.id(),
                    tokens = response.usage.total(),
                    "Narration generated by live backend"
                );
                Narrative {
                    text: response.content.trim().to_string(),
                    source: NarrativeSource::Live,
                }
            }
            Ok(Ok(_)) => {
                warn!(backend = backend.id(), "Backend returned empty narration, using fallback");
                self.fallback(context)
            }
            Ok(Err(e)) => {
                warn!(backend = backend.id(), error = %e, "Narration failed, using fallback");
                self.fallback(context)
            }
            Err(_) => {
                warn!(
                    backend = backend.id(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Narration timed out, using fallback"
                );
                self.fallback(context)
            }
        }
    }

    /// Deterministic template built from locally available data.
    fn fallback(&self, context: &ExplanationContext) -> Narrative {
        let mut text = format!(
            "Your welfare case shows a {} risk score ({} out of 100).",
            context.risk_category,
            context.score_display()
        );

        if !context.top_contributions.is_empty() {
            let factors: Vec<&str> = context
                .top_contributions
                .iter()
                .take(3)
                .map(|(label, _)| label.as_str())
                .collect();
            text.push_str(&format!(" Main factors: {}.", factors.join(", ")));
        }

        let next_steps = match context.risk_category.as_str() {
            "high" => {
                " Please update your documentation within 30 days. \
                 A case officer will review your file and contact you within 15 business days."
            }
            "medium" => {
                " Please verify your income information is up to date. \
                 A case officer will review your application within 10 business days."
            }
            _ => {
                " Your application will proceed to final review. \
                 You should receive a decision within 5-7 business days."
            }
        };
        text.push_str(next_steps);

        Narrative {
            text,
            source: NarrativeSource::Fallback,
        }
    }
}

/// Build the narration prompt for one case.
fn build_prompt(context: &ExplanationContext) -> String {
    let factors = context
        .top_contributions
        .iter()
        .take(3)
        .map(|(label, weight)| format!("- {} (weight {:.2})", label, weight))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Generate a clear, empathetic explanation for a welfare case decision.\n\n\
         Risk Score: {score}/100\n\
         Risk Level: {level}\n\
         Income: {income:.2}\n\
         Last Document Update: {months:.1} months ago\n\
         Scheme Type: {scheme}\n\
         Past Interruptions: {interruptions}\n\
         Top factors:\n{factors}\n\n\
         Write a brief, citizen-friendly explanation (2-3 sentences) that:\n\
         1. Explains what the risk score means in simple terms\n\
         2. Provides clear next steps\n\
         3. Uses respectful, helpful tone\n\
         Avoid technical jargon.",
        score = context.score_display(),
        level = context.risk_category.to_uppercase(),
        income = context.income,
        months = context.last_document_update_months,
        scheme = context.scheme_type,
        interruptions = context.past_benefit_interruptions,
        factors = factors,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    fn context(category: &str, score: f64) -> ExplanationContext {
        ExplanationContext {
            citizen_id: "CIT_000001".to_string(),
            income: 15000.0,
            last_document_update_months: 18.0,
            scheme_type: "pension".to_string(),
            past_benefit_interruptions: 5,
            risk_score: score,
            risk_category: category.to_string(),
            top_contributions: vec![
                ("months since last document update".to_string(), 0.28),
                ("past benefit interruptions".to_string(), 0.45),
            ],
        }
    }

    #[tokio::test]
    async fn test_live_narration() {
        let backend = Arc::new(MockBackend::default().with_response("All looks good."));
        let engine = ExplanationEngine::new(backend);

        let narrative = engine.explain(&context("low", 0.1)).await;
        assert_eq!(narrative.source, NarrativeSource::Live);
        assert_eq!(narrative.text, "All looks good.");
    }

    #[tokio::test]
    async fn test_fallback_when_backend_down() {
        let backend = Arc::new(MockBackend::default().with_available(false));
        let engine = ExplanationEngine::new(backend);

        let narrative = engine.explain(&context("high", 0.73)).await;
        assert!(narrative.is_fallback());
        assert!(narrative.text.contains("high"));
        assert!(narrative.text.contains("73"));
        assert!(narrative.text.contains("interruptions"));
    }

    #[tokio::test]
    async fn test_fallback_without_backend() {
        let engine = ExplanationEngine::without_backend();
        assert!(!engine.is_configured());

        let narrative = engine.explain(&context("medium", 0.45)).await;
        assert!(narrative.is_fallback());
        assert!(narrative.text.contains("medium"));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out_to_fallback() {
        let backend = Arc::new(
            MockBackend::default()
                .with_response("Slow live narration")
                .with_delay(Duration::from_millis(300)),
        );
        let engine = ExplanationEngine::new(backend).with_timeout(Duration::from_millis(10));

        let narrative = engine.explain(&context("high", 0.73)).await;
        assert!(narrative.is_fallback());
        assert!(narrative.text.contains("high"));
    }

    #[tokio::test]
    async fn test_empty_live_response_degrades() {
        let backend = Arc::new(MockBackend::default().with_response("   "));
        let engine = ExplanationEngine::new(backend);

        let narrative = engine.explain(&context("low", 0.05)).await;
        assert!(narrative.is_fallback());
        assert!(narrative.text.contains("low"));
    }

    #[test]
    fn test_prompt_mentions_case_data() {
        let prompt = build_prompt(&context("high", 0.73));
        assert!(prompt.contains("73/100"));
        assert!(prompt.contains("HIGH"));
        assert!(prompt.contains("pension"));
        assert!(prompt.contains("18.0 months"));
    }
}
