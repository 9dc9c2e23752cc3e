use anyhow::Context;

use crate::gemini::DEMO_KEY;
use crate::models::{IdeaType, Tag, UserProfile};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_USER_ID: &str = "anonymous";
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone)]
pub struct Settings {
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub gemini_model: String,
    pub port: u16,
    pub default_currency: String,
    pub profile: UserProfile,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: DEMO_KEY.to_string(),
            gemini_api_base: DEFAULT_API_BASE.to_string(),
            gemini_model: DEFAULT_MODEL.to_string(),
            port: DEFAULT_PORT,
            default_currency: DEFAULT_CURRENCY.to_string(),
            profile: UserProfile { user_id: DEFAULT_USER_ID.to_string(), ..Default::default() },
        }
    }
}

fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

impl Settings {
    /// Read settings from the process environment. Only this function looks
    /// at the environment; everything downstream receives `Settings`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().with_context(|| format!("PORT must be a port number, got '{raw}'"))?,
            None => defaults.port,
        };

        let default_currency = lookup("DEFAULT_CURRENCY").unwrap_or(defaults.default_currency);
        anyhow::ensure!(
            default_currency.len() == 3 && default_currency.chars().all(|c| c.is_ascii_alphabetic()),
            "DEFAULT_CURRENCY must be a 3-letter code, got '{default_currency}'"
        );

        let preferred_idea_types = match lookup("PREFERRED_IDEA_TYPES") {
            Some(raw) => comma_list(&raw)
                .iter()
                .map(|s| IdeaType::parse(s).with_context(|| format!("unknown idea type '{s}' in PREFERRED_IDEA_TYPES, expected one of: {}", IdeaType::legal_values())))
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|k| !k.is_empty()).unwrap_or(defaults.gemini_api_key),
            gemini_api_base: lookup("GEMINI_API_BASE").unwrap_or(defaults.gemini_api_base),
            gemini_model: lookup("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            port,
            default_currency: default_currency.to_ascii_uppercase(),
            profile: UserProfile {
                user_id: lookup("DEFAULT_USER_ID").unwrap_or(defaults.profile.user_id),
                preferred_industries: lookup("PREFERRED_INDUSTRIES").map(|raw| comma_list(&raw)).unwrap_or_default(),
                preferred_idea_types,
            },
        })
    }
}
