use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::gemini::{CompletionModel, ModelError};
use crate::models::{BusinessIdea, BusinessModel, GenerateIdeasResponse, GenerationMetadata, GenerationRequest, IdeaType, QualityMetrics, UserProfile};
use crate::parser::{parse_ideas, ParseError, ParseOptions};
use crate::prompts::{build_system_prompt, build_user_prompt};
use crate::validation::request_from_payload;

/// Reported alongside score statistics; the demo and Gemini backends give no
/// per-response confidence of their own.
pub const QUALITY_CONFIDENCE: f64 = 0.85;
pub const DEFAULT_INDUSTRY: &str = "General";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("model call failed: {0}")]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub default_currency: String,
}

pub struct IdeaGenerator {
    config: GeneratorConfig,
    model: Arc<dyn CompletionModel>,
}

impl IdeaGenerator {
    pub fn new(config: GeneratorConfig, model: Arc<dyn CompletionModel>) -> Self {
        Self { config, model }
    }

    pub async fn generate(&self, payload: &Value, profile: Option<&UserProfile>) -> Result<GenerateIdeasResponse, GenerateError> {
        let started = Instant::now();
        let mut request = request_from_payload(payload).map_err(GenerateError::Validation)?;
        if let Some(profile) = profile {
            merge_profile(&mut request, profile);
        }

        let expected = request.count();
        info!("🚀 Generating {} ideas for prompt: {}", expected, request.prompt);

        let user_prompt = build_user_prompt(&request);
        let completion = self.model.complete(build_system_prompt(), &user_prompt).await?;

        let options = self.parse_options(&request, profile);
        let ideas = parse_ideas(&completion.text, expected, &options)?;

        let metadata = GenerationMetadata {
            count: ideas.len(),
            generation_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            model: self.model.model_name().to_string(),
            tokens_used: completion.tokens_used,
            quality_metrics: quality_metrics(&ideas),
        };
        info!("✅ Generated {} ideas in {}ms", metadata.count, metadata.generation_time_ms);

        Ok(GenerateIdeasResponse {
            ideas,
            metadata,
            request_id: new_request_id(),
            generated_at: Utc::now(),
        })
    }

    fn parse_options(&self, request: &GenerationRequest, profile: Option<&UserProfile>) -> ParseOptions {
        let currency = request
            .budget_range
            .as_ref()
            .and_then(|b| b.currency.as_deref())
            .unwrap_or(&self.config.default_currency);
        ParseOptions {
            user_id: profile.map_or_else(|| crate::config::DEFAULT_USER_ID.to_string(), |p| p.user_id.clone()),
            default_industry: request.industries().first().cloned().unwrap_or_else(|| DEFAULT_INDUSTRY.to_string()),
            default_idea_type: request.idea_types().first().copied().unwrap_or(IdeaType::Product),
            default_business_model: request.business_models().first().copied().unwrap_or(BusinessModel::B2c),
            default_currency: currency.to_ascii_uppercase(),
        }
    }
}

/// Profile preferences fill in only what the request left out.
fn merge_profile(request: &mut GenerationRequest, profile: &UserProfile) {
    if request.industries().is_empty() && !profile.preferred_industries.is_empty() {
        request.industries = Some(profile.preferred_industries.clone());
    }
    if request.idea_types().is_empty() && !profile.preferred_idea_types.is_empty() {
        request.idea_types = Some(profile.preferred_idea_types.clone());
    }
}

/// Mean, min and max over all ideas, counting a missing score as 0.
fn quality_metrics(ideas: &[BusinessIdea]) -> Option<QualityMetrics> {
    if ideas.is_empty() {
        return None;
    }
    let scores: Vec<f64> = ideas.iter().map(|i| f64::from(i.score.unwrap_or(0))).collect();
    Some(QualityMetrics {
        average_score: scores.iter().sum::<f64>() / scores.len() as f64,
        min_score: scores.iter().copied().fold(f64::INFINITY, f64::min),
        max_score: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        confidence: QUALITY_CONFIDENCE,
    })
}

fn new_request_id() -> String {
    let suffix: String = rand::thread_rng().sample_iter(&Alphanumeric).take(8).map(char::from).collect();
    format!("req_{}_{}", Utc::now().timestamp_millis(), suffix.to_lowercase())
}
