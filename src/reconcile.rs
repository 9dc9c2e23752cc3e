//! Maps loosely shaped JSON objects from model output onto [`BusinessIdea`].
//!
//! Models rename keys, wrap numbers in strings and return scalars where
//! objects were asked for. Each field is resolved on its own; a malformed
//! field falls back to its default and never takes the rest of the idea down.

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::{coerce_tag, BusinessIdea, IdeaStatus, InvestmentRange, RevenueProjection, RevenueStream, RevenueType};
use crate::parser::{ParseOptions, DEFAULT_TARGET_MARKET, UNSPECIFIED};

const TITLE_KEYS: &[&str] = &["title", "name", "heading", "ideaTitle", "idea_title"];
const DESCRIPTION_KEYS: &[&str] = &["description", "summary", "overview"];
const PROBLEM_KEYS: &[&str] = &["problem", "problemStatement", "problem_statement"];
const SOLUTION_KEYS: &[&str] = &["solution", "solutionStatement", "solution_statement"];
const TARGET_MARKET_KEYS: &[&str] = &["targetMarket", "target_market", "targetAudience", "target_audience", "audience"];
const BUSINESS_MODEL_KEYS: &[&str] = &["businessModel", "business_model", "model"];
const IDEA_TYPE_KEYS: &[&str] = &["ideaType", "idea_type", "type", "category"];
const REVENUE_KEYS: &[&str] = &["revenueStreams", "revenue_streams", "revenueModel", "revenue"];
const ADVANTAGE_KEYS: &[&str] = &["competitiveAdvantage", "competitive_advantage", "advantage", "usp"];
const INVESTMENT_KEYS: &[&str] = &["investmentRange", "investment_range", "investment", "startupCosts"];
const PROJECTION_KEYS: &[&str] = &["revenueProjection", "revenue_projection", "projections", "financialProjections"];
const INDUSTRY_KEYS: &[&str] = &["industry", "sector"];
const TAG_KEYS: &[&str] = &["tags", "keywords"];
const SCORE_KEYS: &[&str] = &["score", "qualityScore", "quality_score", "rating"];

fn first_present<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| fields.get(*k)).find(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

fn text(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_present(fields, keys).and_then(Value::as_str).map(|s| s.trim().to_string())
}

fn text_or(fields: &Map<String, Value>, keys: &[&str], default: &str) -> String {
    text(fields, keys).unwrap_or_else(|| default.to_string())
}

/// A JSON number or a numeric string. Non-finite values are rejected.
pub fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').replace(',', "").parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Quality score clamped to 0..=100.
pub fn parse_score(value: &Value) -> Option<u8> {
    parse_number(value).map(|n| n.clamp(0.0, 100.0).round() as u8)
}

fn parse_tags(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_revenue_stream(fields: &Map<String, Value>, default_type: RevenueType) -> RevenueStream {
    RevenueStream {
        stream_type: coerce_tag(first_present(fields, &["type", "streamType", "stream_type"]), default_type),
        description: text_or(fields, &["description", "name", "source"], UNSPECIFIED),
        estimated_monthly: first_present(fields, &["estimatedMonthly", "estimated_monthly", "monthly"]).and_then(parse_number),
        estimated_annual: first_present(fields, &["estimatedAnnual", "estimated_annual", "annual"]).and_then(parse_number),
    }
}

fn parse_investment(fields: &Map<String, Value>, options: &ParseOptions) -> InvestmentRange {
    let bound = |key: &str| fields.get(key).and_then(parse_number).unwrap_or(0.0);
    InvestmentRange {
        min: bound("min"),
        max: bound("max"),
        currency: text_or(fields, &["currency"], &options.default_currency),
        timeframe: text_or(fields, &["timeframe", "timeline", "period"], UNSPECIFIED),
    }
}

fn parse_projection(fields: &Map<String, Value>, options: &ParseOptions) -> RevenueProjection {
    let year = |keys: &[&str]| first_present(fields, keys).and_then(parse_number);
    RevenueProjection {
        year1: year(&["year1", "year_1"]),
        year2: year(&["year2", "year_2"]),
        year3: year(&["year3", "year_3"]),
        year5: year(&["year5", "year_5"]),
        currency: text_or(fields, &["currency"], &options.default_currency),
    }
}

/// Build an idea from one raw element. Returns `None` when there is no usable
/// title; every other field has a default.
pub fn reconcile_idea(raw: &Value, options: &ParseOptions) -> Option<BusinessIdea> {
    let fields = raw.as_object()?;
    let title = text(fields, TITLE_KEYS)?;

    let business_model = coerce_tag(first_present(fields, BUSINESS_MODEL_KEYS), options.default_business_model);
    let default_stream = business_model.default_revenue_stream();

    let mut revenue_streams: Vec<RevenueStream> = match first_present(fields, REVENUE_KEYS) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .map(|stream| parse_revenue_stream(stream, default_stream.stream_type))
            .collect(),
        _ => Vec::new(),
    };
    if revenue_streams.is_empty() {
        revenue_streams.push(default_stream);
    }

    let now = Utc::now();
    Some(BusinessIdea {
        id: Uuid::new_v4(),
        user_id: options.user_id.clone(),
        title,
        description: text_or(fields, DESCRIPTION_KEYS, UNSPECIFIED),
        problem: text_or(fields, PROBLEM_KEYS, UNSPECIFIED),
        solution: text_or(fields, SOLUTION_KEYS, UNSPECIFIED),
        target_market: text_or(fields, TARGET_MARKET_KEYS, DEFAULT_TARGET_MARKET),
        business_model,
        revenue_streams,
        competitive_advantage: text_or(fields, ADVANTAGE_KEYS, UNSPECIFIED),
        investment_range: first_present(fields, INVESTMENT_KEYS)
            .and_then(Value::as_object)
            .map(|inv| parse_investment(inv, options)),
        revenue_projection: first_present(fields, PROJECTION_KEYS)
            .and_then(Value::as_object)
            .map(|proj| parse_projection(proj, options)),
        industry: text_or(fields, INDUSTRY_KEYS, &options.default_industry),
        tags: parse_tags(first_present(fields, TAG_KEYS)),
        idea_type: coerce_tag(first_present(fields, IDEA_TYPE_KEYS), options.default_idea_type),
        status: IdeaStatus::Generated,
        created_at: now,
        updated_at: now,
        score: first_present(fields, SCORE_KEYS).and_then(parse_score),
    })
}
