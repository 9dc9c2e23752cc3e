//! Recovers business ideas from free-form model output.
//!
//! Three strategies are tried in order and the first one that yields at least
//! one idea wins; results are never mixed across strategies.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{BusinessIdea, BusinessModel, IdeaStatus, IdeaType};
use crate::reconcile::reconcile_idea;

pub const UNSPECIFIED: &str = "To be specified";
pub const DEFAULT_TARGET_MARKET: &str = "General market";
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("model response was empty")]
    EmptyResponse,
    /// Every strategy came back empty. The fallback strategy always produces
    /// placeholders, so this only fires if the chain changes.
    #[error("no ideas could be recovered from the model response")]
    NoIdeas,
}

/// Defaults used for fields the model output does not supply.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub user_id: String,
    pub default_industry: String,
    pub default_idea_type: IdeaType,
    pub default_business_model: BusinessModel,
    pub default_currency: String,
}

type Strategy = fn(&str, usize, &ParseOptions) -> Option<Vec<BusinessIdea>>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("json", parse_json),
    ("structured_text", parse_structured_text),
    ("fallback", placeholder_ideas),
];

pub fn parse_ideas(raw: &str, expected_count: usize, options: &ParseOptions) -> Result<Vec<BusinessIdea>, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    for (name, strategy) in STRATEGIES {
        match strategy(raw, expected_count, options) {
            Some(ideas) if !ideas.is_empty() => {
                debug!(strategy = name, count = ideas.len(), "recovered ideas from model response");
                return Ok(ideas);
            }
            _ => debug!(strategy = name, "strategy produced no ideas"),
        }
    }
    Err(ParseError::NoIdeas)
}

// --- JSON ---

static FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^```[A-Za-z]*[ \t]*\r?\n?").unwrap());
static FENCE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n?```\s*$").unwrap());

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let start = FENCE_OPEN.find(trimmed).map_or(0, |m| m.end());
    let inner = &trimmed[start..];
    let end = FENCE_CLOSE.find(inner).map_or(inner.len(), |m| m.start());
    inner[..end].trim()
}

fn parse_json(raw: &str, expected_count: usize, options: &ParseOptions) -> Option<Vec<BusinessIdea>> {
    let value: Value = match serde_json::from_str(strip_code_fence(raw)) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "model response is not JSON");
            return None;
        }
    };

    let elements = match value {
        Value::Array(items) => items,
        Value::Object(mut fields) => match (fields.remove("ideas"), fields.remove("data")) {
            (Some(Value::Array(items)), _) | (_, Some(Value::Array(items))) => items,
            (ideas, data) => {
                // Neither wrapper key holds a list: treat the object itself as one idea.
                if let Some(v) = ideas { fields.insert("ideas".into(), v); }
                if let Some(v) = data { fields.insert("data".into(), v); }
                vec![Value::Object(fields)]
            }
        },
        _ => return None,
    };

    let ideas: Vec<BusinessIdea> = elements
        .iter()
        .take(expected_count)
        .filter_map(|element| reconcile_idea(element, options))
        .collect();
    (!ideas.is_empty()).then_some(ideas)
}

// --- Structured text ---

static IDEA_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?mi)^#{1,6}[ \t]*Idea[ \t]*#?\d+").unwrap());
static NUMBERED_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#{1,6}[ \t]*\d+\.").unwrap());
static NUMBERED_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n[ \t]*(\d+\.[ \t]+[A-Z])").unwrap());
static SEPARATOR_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:-{3,}|={3,})[ \t]*$").unwrap());
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\r?\n[ \t]*)+").unwrap());

static TITLE_FIELD: LazyLock<Regex> = LazyLock::new(|| field_pattern("title|name"));
static DESCRIPTION_FIELD: LazyLock<Regex> = LazyLock::new(|| field_pattern("description|overview"));
static PROBLEM_FIELD: LazyLock<Regex> = LazyLock::new(|| field_pattern("problem statement|problem"));
static SOLUTION_FIELD: LazyLock<Regex> = LazyLock::new(|| field_pattern("solution"));
static TARGET_MARKET_FIELD: LazyLock<Regex> = LazyLock::new(|| field_pattern("target market|target audience"));

/// `keyword: value` up to the end of the line. The keyword may follow list
/// bullets, a list number (`1.`, `2)`), markdown emphasis and qualifying
/// words (`Idea Title:`), but must be a whole word.
fn field_pattern(keywords: &str) -> Regex {
    Regex::new(&format!(
        r"(?im)^[ \t>*#\-]*(?:\d+[.)][ \t]*)?[ \t*]*(?:[a-z][a-z0-9 \t]*?[ \t]+)?\b(?:{keywords})\b[ \t]*\**[ \t]*:[ \t]*\**[ \t]*(.+?)[ \t*]*$"
    ))
    .unwrap()
}

/// Sections starting at each match. Text before the first match is the intro.
fn split_before(text: &str, starts: impl Iterator<Item = usize>) -> (&str, Vec<&str>) {
    let starts: Vec<usize> = starts.collect();
    let Some(&first) = starts.first() else {
        return (text, Vec::new());
    };
    let mut sections = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        sections.push(&text[start..end]);
    }
    (&text[..first], sections)
}

/// Each heuristic returns the introductory text and the idea sections.
fn split_by_delimiters(text: &str) -> Vec<(&'static str, (&str, Vec<&str>))> {
    let separated: Vec<&str> = SEPARATOR_LINE.split(text).collect();
    let separated = match separated.split_first() {
        Some((intro, rest)) if !rest.is_empty() => (*intro, rest.to_vec()),
        _ => (text, Vec::new()),
    };
    vec![
        ("idea_headers", split_before(text, IDEA_HEADER.find_iter(text).map(|m| m.start()))),
        ("numbered_headers", split_before(text, NUMBERED_HEADER.find_iter(text).map(|m| m.start()))),
        (
            "numbered_paragraphs",
            split_before(text, NUMBERED_PARAGRAPH.captures_iter(text).filter_map(|c| c.get(1)).map(|m| m.start())),
        ),
        ("separator_lines", separated),
    ]
}

fn split_sections(text: &str, expected_count: usize) -> Vec<&str> {
    for (name, (_intro, sections)) in split_by_delimiters(text) {
        // The intro counts toward the total before it is dropped.
        if !sections.is_empty() && sections.len() + 1 >= expected_count {
            debug!(heuristic = name, sections = sections.len(), "split structured text");
            return sections;
        }
    }
    BLANK_LINES.split(text).filter(|s| !s.trim().is_empty()).collect()
}

fn capture(pattern: &Regex, section: &str) -> Option<String> {
    pattern
        .captures(section)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn idea_from_section(section: &str, options: &ParseOptions) -> Option<BusinessIdea> {
    let title = capture(&TITLE_FIELD, section)?;
    let description = capture(&DESCRIPTION_FIELD, section)?;
    let now = Utc::now();
    Some(BusinessIdea {
        id: Uuid::new_v4(),
        user_id: options.user_id.clone(),
        title,
        description,
        problem: capture(&PROBLEM_FIELD, section).unwrap_or_else(|| UNSPECIFIED.to_string()),
        solution: capture(&SOLUTION_FIELD, section).unwrap_or_else(|| UNSPECIFIED.to_string()),
        target_market: capture(&TARGET_MARKET_FIELD, section).unwrap_or_else(|| DEFAULT_TARGET_MARKET.to_string()),
        business_model: options.default_business_model,
        revenue_streams: vec![options.default_business_model.default_revenue_stream()],
        competitive_advantage: UNSPECIFIED.to_string(),
        investment_range: None,
        revenue_projection: None,
        industry: options.default_industry.clone(),
        tags: Vec::new(),
        idea_type: options.default_idea_type,
        status: IdeaStatus::Generated,
        created_at: now,
        updated_at: now,
        score: None,
    })
}

fn parse_structured_text(raw: &str, expected_count: usize, options: &ParseOptions) -> Option<Vec<BusinessIdea>> {
    let ideas: Vec<BusinessIdea> = split_sections(raw, expected_count)
        .into_iter()
        .take(expected_count)
        .filter_map(|section| {
            let idea = idea_from_section(section, options);
            if idea.is_none() {
                debug!(preview = %preview(section, 40), "section has no title or description, skipping");
            }
            idea
        })
        .collect();
    (!ideas.is_empty()).then_some(ideas)
}

// --- Fallback ---

fn preview(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect()
}

fn placeholder_ideas(raw: &str, expected_count: usize, options: &ParseOptions) -> Option<Vec<BusinessIdea>> {
    warn!(expected_count, "falling back to placeholder ideas");
    let snippet = preview(raw, PREVIEW_CHARS);
    let now = Utc::now();
    let ideas = (1..=expected_count)
        .map(|n| BusinessIdea {
            id: Uuid::new_v4(),
            user_id: options.user_id.clone(),
            title: format!("Business Idea {n}"),
            description: format!("Generated from model response: {snippet}"),
            problem: UNSPECIFIED.to_string(),
            solution: UNSPECIFIED.to_string(),
            target_market: DEFAULT_TARGET_MARKET.to_string(),
            business_model: options.default_business_model,
            revenue_streams: vec![options.default_business_model.default_revenue_stream()],
            competitive_advantage: UNSPECIFIED.to_string(),
            investment_range: None,
            revenue_projection: None,
            industry: options.default_industry.clone(),
            tags: Vec::new(),
            idea_type: options.default_idea_type,
            status: IdeaStatus::Generated,
            created_at: now,
            updated_at: now,
            score: None,
        })
        .collect();
    Some(ideas)
}
