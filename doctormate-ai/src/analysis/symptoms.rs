use std::sync::Arc;

use async_trait::async_trait;
use doctormate_directory::Enricher;
use rig::{agent::Agent, client::CompletionClient, completion::Prompt, providers::gemini};
use tracing::{debug, info};

use crate::{
    error::AnalysisError,
    models::{Assessment, SymptomAnalysis},
};

const SYMPTOMS_PROMPT: &str = r#"You are a medical symptom checker assistant.
Analyze the user's symptoms and provide a structured medical assessment.

IMPORTANT: You must respond ONLY with valid JSON in this exact format:
{
  "possible_diagnosis": "string",
  "confidence": number (0-100),
  "severity": "Mild" or "Moderate" or "Severe",
  "description": "string",
  "recommendations": ["string", "string", ...],
  "emergency_care": "string",
  "disclaimer": "This is an AI-generated assessment and not a substitute for professional medical advice. Please consult a healthcare provider for proper diagnosis and treatment."
}

Base your analysis on common medical knowledge. Be cautious and recommend professional consultation when appropriate."#;

/// A hosted language model that answers a single prompt.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Gemini through rig.
pub struct GeminiBackend {
    agent: Agent<gemini::completion::CompletionModel>,
}

impl GeminiBackend {
    pub fn new(api_key: &str, model: &str) -> Self {
        let client = gemini::Client::new(api_key);
        let agent = client.agent(model).temperature(0.3).build();
        Self { agent }
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let response = self.agent.prompt(prompt).await?;
        Ok(response)
    }
}

pub struct SymptomAnalyzer {
    backend: Arc<dyn CompletionBackend>,
    enricher: Enricher,
}

impl SymptomAnalyzer {
    pub fn new(backend: Arc<dyn CompletionBackend>, enricher: Enricher) -> Self {
        Self { backend, enricher }
    }

    pub async fn analyze(
        &self,
        symptoms: &str,
        token: Option<&str>,
    ) -> Result<SymptomAnalysis, AnalysisError> {
        let symptoms = symptoms.trim();
        if symptoms.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "Symptoms description cannot be empty".to_string(),
            ));
        }

        info!(length = symptoms.len(), "Starting symptom analysis");

        let prompt = format!("{SYMPTOMS_PROMPT}\n\nUser symptoms: {symptoms}");
        let reply = self
            .backend
            .complete(&prompt)
            .await
            .map_err(|e| AnalysisError::Provider(format!("{e:#}")))?;

        debug!(reply = %reply, "Model reply");

        let assessment = parse_assessment(&reply)?;

        info!(
            diagnosis = %assessment.possible_diagnosis,
            confidence = assessment.confidence,
            severity = %assessment.severity,
            "Symptom analysis completed"
        );

        let enrichment = self
            .enricher
            .enrich_symptoms(token, symptoms, &assessment.possible_diagnosis)
            .await;

        Ok(SymptomAnalysis {
            assessment,
            enrichment,
        })
    }
}

fn parse_assessment(reply: &str) -> Result<Assessment, AnalysisError> {
    serde_json::from_str(strip_code_fence(reply))
        .map_err(|e| AnalysisError::MalformedReply(e.to_string()))
}

/// Models sometimes wrap JSON in a markdown fence even when told not to.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed;
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
