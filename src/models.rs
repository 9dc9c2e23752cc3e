use serde::{Serialize, Deserialize, Serializer, Deserializer};
use serde_json::Value;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// A closed set of wire strings. Every enum in the data model implements this
/// so that lenient parsing (case, `-` and spaces) lives in one place.
pub trait Tag: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim().replace(|c: char| c == '-' || c == ' ', "_");
        Self::ALL.iter().copied().find(|t| t.as_str().eq_ignore_ascii_case(&wanted))
    }

    fn legal_values() -> String {
        Self::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
    }
}

/// Coerce a loosely typed JSON value into a tag, falling back to `default`.
pub fn coerce_tag<T: Tag>(value: Option<&Value>, default: T) -> T {
    value.and_then(Value::as_str).and_then(T::parse).unwrap_or(default)
}

macro_rules! tag_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name { $($variant),+ }

        impl Tag for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn as_str(self) -> &'static str {
                match self { $($name::$variant => $wire),+ }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                <$name as Tag>::parse(&raw).ok_or_else(|| {
                    serde::de::Error::custom(format!("unknown value '{}', expected one of: {}", raw, <$name as Tag>::legal_values()))
                })
            }
        }
    };
}

tag_enum!(
    /// Category of a business concept.
    IdeaType {
        Product => "product",
        Service => "service",
        Software => "software",
        Platform => "platform",
        Marketplace => "marketplace",
        Content => "content",
        Hardware => "hardware",
        Franchise => "franchise",
        SocialEnterprise => "social_enterprise",
    }
);

tag_enum!(
    /// Monetization structure.
    BusinessModel {
        B2b => "b2b",
        B2c => "b2c",
        B2b2c => "b2b2c",
        C2c => "c2c",
        Saas => "saas",
        Subscription => "subscription",
        Freemium => "freemium",
        Marketplace => "marketplace",
        Ecommerce => "ecommerce",
        Advertising => "advertising",
    }
);

tag_enum!(
    RevenueType {
        Subscription => "subscription",
        OneTime => "one_time",
        Commission => "commission",
        Advertising => "advertising",
        Licensing => "licensing",
        TransactionFee => "transaction_fee",
        Consulting => "consulting",
        Freemium => "freemium",
    }
);

tag_enum!(
    IdeaStatus {
        Draft => "draft",
        Generated => "generated",
        Refining => "refining",
        Validated => "validated",
        Planning => "planning",
        Archived => "archived",
    }
);

tag_enum!(
    ExperienceLevel {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
);

tag_enum!(
    RiskAppetite {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

impl BusinessModel {
    /// Revenue stream attached to an idea when none could be recovered.
    pub fn default_revenue_stream(self) -> RevenueStream {
        let (stream_type, description) = match self {
            BusinessModel::Saas | BusinessModel::Subscription => (RevenueType::Subscription, "Recurring subscription fees"),
            BusinessModel::Freemium => (RevenueType::Freemium, "Premium upgrades on top of a free tier"),
            BusinessModel::Marketplace | BusinessModel::C2c => (RevenueType::Commission, "Commission on marketplace transactions"),
            BusinessModel::Advertising => (RevenueType::Advertising, "Advertising and sponsorship revenue"),
            BusinessModel::B2b => (RevenueType::Licensing, "Business licensing and service contracts"),
            BusinessModel::B2b2c => (RevenueType::TransactionFee, "Per-transaction fees from partner channels"),
            BusinessModel::B2c | BusinessModel::Ecommerce => (RevenueType::OneTime, "Direct product or service sales"),
        };
        RevenueStream { stream_type, description: description.to_string(), estimated_monthly: None, estimated_annual: None }
    }
}

fn deserialize_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(n) if n.is_finite() && n.fract() == 0.0 && (0.0..=255.0).contains(&n) => Ok(Some(n as u8)),
        Some(n) => Err(serde::de::Error::custom(format!("count must be an integer, got {n}"))),
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
    pub currency: Option<String>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub count: Option<u8>,
    pub industries: Option<Vec<String>>,
    pub interests: Option<Vec<String>>, // only consulted when industries is absent
    pub idea_types: Option<Vec<IdeaType>>,
    pub business_models: Option<Vec<BusinessModel>>,
    pub target_market: Option<String>,
    pub budget_range: Option<BudgetRange>,
    pub experience_level: Option<ExperienceLevel>,
    pub risk_appetite: Option<RiskAppetite>,
    pub geographic_focus: Option<String>,
    pub additional_context: Option<String>,
}

impl GenerationRequest {
    pub const DEFAULT_COUNT: u8 = 3;

    pub fn count(&self) -> usize {
        usize::from(self.count.unwrap_or(Self::DEFAULT_COUNT))
    }

    /// Industries take precedence over the generic interests list.
    pub fn industries(&self) -> &[String] {
        self.industries.as_deref().or(self.interests.as_deref()).unwrap_or(&[])
    }

    pub fn idea_types(&self) -> &[IdeaType] {
        self.idea_types.as_deref().unwrap_or(&[])
    }

    pub fn business_models(&self) -> &[BusinessModel] {
        self.business_models.as_deref().unwrap_or(&[])
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenueStream {
    #[serde(rename = "type")]
    pub stream_type: RevenueType,
    pub description: String,
    pub estimated_monthly: Option<f64>,
    pub estimated_annual: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentRange {
    pub min: f64,
    pub max: f64,
    pub currency: String,
    pub timeframe: String,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenueProjection {
    pub year1: Option<f64>,
    pub year2: Option<f64>,
    pub year3: Option<f64>,
    pub year5: Option<f64>,
    pub currency: String,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusinessIdea {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub problem: String,
    pub solution: String,
    pub target_market: String,
    pub business_model: BusinessModel,
    pub revenue_streams: Vec<RevenueStream>,
    pub competitive_advantage: String,
    pub investment_range: Option<InvestmentRange>,
    pub revenue_projection: Option<RevenueProjection>,
    pub industry: String,
    pub tags: Vec<String>,
    pub idea_type: IdeaType,
    pub status: IdeaStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub score: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub average_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub confidence: f64,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub count: usize,
    pub generation_time_ms: u64,
    pub model: String,
    pub tokens_used: Option<u32>,
    pub quality_metrics: Option<QualityMetrics>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateIdeasResponse {
    pub ideas: Vec<BusinessIdea>,
    pub metadata: GenerationMetadata,
    pub request_id: String,
    pub generated_at: DateTime<Utc>,
}

/// Standing preferences merged into requests that leave them unspecified.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub preferred_industries: Vec<String>,
    #[serde(default)]
    pub preferred_idea_types: Vec<IdeaType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn tags_parse_case_insensitively() {
        assert_eq!(IdeaType::parse("SOFTWARE"), Some(IdeaType::Software));
        assert_eq!(IdeaType::parse("Social Enterprise"), Some(IdeaType::SocialEnterprise));
        assert_eq!(BusinessModel::parse(" SaaS "), Some(BusinessModel::Saas));
        assert_eq!(ExperienceLevel::parse("expert"), None);
    }

    #[test]
    fn coerce_tag_falls_back_to_default() {
        assert_eq!(coerce_tag(Some(&json!("B2B")), BusinessModel::B2c), BusinessModel::B2b);
        assert_eq!(coerce_tag(Some(&json!("barter")), BusinessModel::B2c), BusinessModel::B2c);
        assert_eq!(coerce_tag(Some(&json!(7)), IdeaType::Service), IdeaType::Service);
        assert_eq!(coerce_tag::<IdeaType>(None, IdeaType::Content), IdeaType::Content);
    }

    #[test]
    fn legal_values_lists_every_variant() {
        assert_eq!(ExperienceLevel::legal_values(), "beginner, intermediate, advanced");
        assert_eq!(IdeaType::ALL.len(), 9);
        assert_eq!(BusinessModel::ALL.len(), 10);
    }

    #[test]
    fn request_deserializes_from_camel_case() {
        let req: GenerationRequest = serde_json::from_value(json!({
            "prompt": "eco packaging",
            "count": 2,
            "ideaTypes": ["Product"],
            "budgetRange": {"min": 100, "max": 500},
            "experienceLevel": "Beginner"
        }))
        .unwrap();
        assert_eq!(req.count(), 2);
        assert_eq!(req.idea_types(), &[IdeaType::Product]);
        assert_eq!(req.experience_level, Some(ExperienceLevel::Beginner));
        assert_eq!(req.budget_range.unwrap().currency, None);
    }

    #[test]
    fn industries_take_precedence_over_interests() {
        let req = GenerationRequest {
            prompt: "x".into(),
            industries: Some(vec!["fintech".into()]),
            interests: Some(vec!["gardening".into()]),
            ..Default::default()
        };
        assert_eq!(req.industries(), &["fintech".to_string()]);

        let req = GenerationRequest { industries: None, ..req };
        assert_eq!(req.industries(), &["gardening".to_string()]);
    }

    #[test]
    fn default_revenue_stream_follows_business_model() {
        let stream = BusinessModel::Marketplace.default_revenue_stream();
        assert_eq!(stream.stream_type, RevenueType::Commission);
        let value = serde_json::to_value(&stream).unwrap();
        assert_eq!(value, json!({"type": "commission", "description": "Commission on marketplace transactions"}));
    }
}
