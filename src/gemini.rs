use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use reqwest::Client;
use tracing::{info, error};

pub const DEMO_KEY: &str = "DEMO_KEY";
pub const DEMO_MODEL_NAME: &str = "demo-template-v1";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("HTTP error: {0}")] Http(String),
    #[error("Other: {0}")] Other(String),
}

/// Raw model output plus the token count when the provider reports one.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub tokens_used: Option<u32>,
}

/// The only thing the generator needs from a text model.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<Completion, ModelError>;
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    pub fn is_demo(&self) -> bool {
        self.api_key == DEMO_KEY
    }

    async fn perform_api_call(&self, system_prompt: &str, user_prompt: &str) -> Result<Completion, ModelError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'), self.model, self.api_key
        );

        info!("🔗 Making request to: {}", url.replace(&self.api_key, "***"));

        let payload = json!({
            "systemInstruction": {
                "parts": [{"text": system_prompt}]
            },
            "contents": [{
                "role": "user",
                "parts": [{"text": user_prompt}]
            }],
            "generationConfig": {
                "temperature": 0.8,
                "topK": 40,
                "topP": 0.95,
                "maxOutputTokens": 4096,
                "responseMimeType": "application/json"
            }
        });

        let response = self.client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ModelError::Http(e.to_string()))?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| ModelError::Http(e.to_string()))?;
        info!("📥 Response status: {}", status);

        if !status.is_success() {
            error!("❌ Gemini API text generation failed with status {}: {}", status, response_text);
            return Err(ModelError::Http(format!("HTTP {}: {}", status, response_text)));
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| ModelError::Other(format!("Failed to parse response: {}", e)))?;

        let tokens_used = parsed.usage_metadata.as_ref().and_then(|u| u.total_token_count);
        let text = extract_text(&parsed).ok_or_else(|| ModelError::Other("No text content found in response".to_string()))?;
        Ok(Completion { text, tokens_used })
    }
}

#[async_trait]
impl CompletionModel for GeminiClient {
    fn model_name(&self) -> &str {
        if self.is_demo() { DEMO_MODEL_NAME } else { &self.model }
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<Completion, ModelError> {
        if self.is_demo() {
            info!("Using demo mode - returning templated ideas");
            return Ok(Completion { text: demo_response(), tokens_used: None });
        }

        info!("Generating ideas with Gemini API...");
        let result = self.perform_api_call(system_prompt, user_prompt).await;
        match &result {
            Ok(completion) => info!("✅ Gemini returned {} chars (tokens: {:?})", completion.text.len(), completion.tokens_used),
            Err(e) => error!("❌ Gemini completion failed: {}", e),
        }
        result
    }
}

struct DemoIdea {
    title: &'static str,
    description: &'static str,
    problem: &'static str,
    solution: &'static str,
    target_market: &'static str,
    industry: &'static str,
    idea_type: &'static str,
    business_model: &'static str,
    score: u8,
}

const DEMO_IDEAS: [DemoIdea; 10] = [
    DemoIdea { title: "Neighborhood Tool Library", description: "A membership service that lends power tools and garden equipment from smart lockers.", problem: "Households buy expensive tools they use a few times a year.", solution: "Shared inventory with app-based reservations and locker pickup.", target_market: "Suburban homeowners and renters", industry: "Home Services", idea_type: "service", business_model: "subscription", score: 82 },
    DemoIdea { title: "Shift Swap Marketplace", description: "A platform where hourly workers trade shifts with manager approval built in.", problem: "Last-minute absences leave retail and hospitality teams understaffed.", solution: "Verified marketplace that matches open shifts with qualified coworkers.", target_market: "Retail and hospitality chains", industry: "Workforce Management", idea_type: "platform", business_model: "b2b", score: 78 },
    DemoIdea { title: "Compost Pickup Club", description: "Weekly curbside compost collection that returns finished soil to members.", problem: "Urban apartments lack space and programs for composting food scraps.", solution: "Route-optimized pickups and partnerships with local farms.", target_market: "Urban households", industry: "Sustainability", idea_type: "service", business_model: "subscription", score: 74 },
    DemoIdea { title: "Menu Insight Analytics", description: "Software that connects to restaurant POS systems and flags unprofitable dishes.", problem: "Independent restaurants price menus by intuition and lose margin.", solution: "Automated recipe costing combined with sales data dashboards.", target_market: "Independent restaurants", industry: "Food & Beverage", idea_type: "software", business_model: "saas", score: 85 },
    DemoIdea { title: "Refill Station Network", description: "Self-service refill kiosks for cleaning and personal care products in grocery stores.", problem: "Single-use plastic packaging dominates household consumables.", solution: "Kiosks with reusable containers and loyalty rewards.", target_market: "Eco-conscious shoppers", industry: "Retail", idea_type: "hardware", business_model: "b2b2c", score: 71 },
    DemoIdea { title: "Skill Swap Classes", description: "A marketplace for neighbors to teach short practical classes to each other.", problem: "Adult learners want hands-on skills without expensive courses.", solution: "Peer-hosted classes with ratings and small booking fees.", target_market: "Adults aged 25-45", industry: "Education", idea_type: "marketplace", business_model: "marketplace", score: 69 },
    DemoIdea { title: "Senior Tech Concierge", description: "On-demand home visits that help older adults set up and use their devices.", problem: "Seniors struggle with smartphones, video calls and online services.", solution: "Vetted tech helpers with patient, repeatable training sessions.", target_market: "Adults over 65 and their families", industry: "Consumer Services", idea_type: "service", business_model: "b2c", score: 80 },
    DemoIdea { title: "Local Maker Box", description: "A curated monthly box featuring goods from regional artisans.", problem: "Small makers lack affordable distribution beyond local markets.", solution: "Subscription box with storytelling content about each maker.", target_market: "Gift buyers and local-first consumers", industry: "E-commerce", idea_type: "product", business_model: "ecommerce", score: 66 },
    DemoIdea { title: "Grant Finder Assistant", description: "A searchable service that matches nonprofits with relevant grants and deadlines.", problem: "Small nonprofits miss funding because grant discovery is manual.", solution: "Curated grant database with eligibility matching and reminders.", target_market: "Small and mid-sized nonprofits", industry: "Nonprofit", idea_type: "social_enterprise", business_model: "freemium", score: 77 },
    DemoIdea { title: "Podcast Clip Studio", description: "A content service that turns long podcast episodes into short social clips.", problem: "Podcasters lack time to promote episodes on social platforms.", solution: "Editor-reviewed clips delivered within a day of publishing.", target_market: "Independent podcasters", industry: "Media", idea_type: "content", business_model: "subscription", score: 73 },
];

/// Fixed response used when no API key is configured. Shaped like what the
/// system prompt asks a real model for, wrapped in a markdown fence.
pub fn demo_response() -> String {
    let ideas: Vec<_> = DEMO_IDEAS.iter().map(|idea| {
        json!({
            "title": idea.title,
            "description": idea.description,
            "problem": idea.problem,
            "solution": idea.solution,
            "targetMarket": idea.target_market,
            "industry": idea.industry,
            "ideaType": idea.idea_type,
            "businessModel": idea.business_model,
            "competitiveAdvantage": format!("First mover focus on {}", idea.target_market.to_lowercase()),
            "tags": [idea.industry.to_lowercase(), idea.idea_type],
            "score": idea.score
        })
    }).collect();
    let body = serde_json::to_string_pretty(&json!({ "ideas": ideas })).unwrap_or_default();
    format!("```json\n{}\n```", body)
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate { #[serde(default)] content: Content }

#[derive(Debug, Deserialize, Default)]
struct Content { #[serde(default)] parts: Vec<Part> }

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Other(serde::de::IgnoredAny)
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u32>,
}

fn extract_text(resp: &GeminiResponse) -> Option<String> {
    let text: String = resp.candidates.iter()
        .flat_map(|c| c.content.parts.iter())
        .filter_map(|p| match p { Part::Text { text } => Some(text.as_str()), Part::Other(_) => None })
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn demo_mode_returns_templated_json() {
        let client = GeminiClient::new(DEMO_KEY.into(), "http://unused".into(), "gemini-1.5-flash".into());
        assert_eq!(client.model_name(), DEMO_MODEL_NAME);
        let completion = client.complete("system", "user").await.unwrap();
        assert!(completion.text.starts_with("```json\n{"));
        assert_eq!(completion.tokens_used, None);
        assert_eq!(completion, client.complete("other", "prompts").await.unwrap());
    }

    #[test]
    fn demo_response_carries_ten_ideas() {
        let text = demo_response();
        let inner = text.trim_start_matches("```json\n").trim_end_matches("\n```");
        let value: serde_json::Value = serde_json::from_str(inner).unwrap();
        assert_eq!(value["ideas"].as_array().unwrap().len(), 10);
        assert_eq!(value["ideas"][0]["title"], "Neighborhood Tool Library");
    }

    #[test]
    fn real_client_reports_configured_model() {
        let client = GeminiClient::new("secret".into(), "http://localhost".into(), "gemini-1.5-pro".into());
        assert!(!client.is_demo());
        assert_eq!(client.model_name(), "gemini-1.5-pro");
    }

    #[test]
    fn extracts_text_and_usage_from_response() {
        let raw = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "{\"ideas\": "}, {"inlineData": {"data": "x"}}, {"text": "[]}"}]}}],
            "usageMetadata": {"promptTokenCount": 10, "totalTokenCount": 42}
        });
        let parsed: GeminiResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(extract_text(&parsed).as_deref(), Some("{\"ideas\": []}"));
        assert_eq!(parsed.usage_metadata.and_then(|u| u.total_token_count), Some(42));
    }

    #[test]
    fn empty_candidates_have_no_text() {
        let parsed: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert_eq!(extract_text(&parsed), None);
    }
}
