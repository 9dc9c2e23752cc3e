use crate::models::{ExperienceLevel, GenerationRequest, Tag};

const SYSTEM_PROMPT: &str = "You are an experienced startup advisor and business strategist. \
You generate practical, original business ideas tailored to the preferences you are given. \
Respond ONLY with valid JSON of the form {\"ideas\": [ ... ]} and nothing else. \
Each idea object uses these keys: title, description, problem, solution, targetMarket, industry, \
ideaType, businessModel, revenueStreams (array of {type, description, estimatedMonthly, estimatedAnnual}), \
competitiveAdvantage, investmentRange ({min, max, currency, timeframe}), \
revenueProjection ({year1, year2, year3, year5, currency}), tags (array of strings) and score (0-100).";

const REQUIRED_FIELDS: [&str; 12] = [
    "Title - a short, memorable name for the business",
    "Description - a two to three sentence overview",
    "Problem - the specific pain point being solved",
    "Solution - how the business solves that problem",
    "Target market - who the customers are",
    "Industry - the primary industry",
    "Business model - one of b2b, b2c, b2b2c, c2c, saas, subscription, freemium, marketplace, ecommerce, advertising",
    "Revenue streams - how the business earns money, with monthly and annual estimates",
    "Competitive advantage - why this business can win",
    "Investment range - estimated startup capital with currency and timeframe",
    "Revenue projection - expected revenue for years 1, 2, 3 and 5",
    "Tags - three to five keywords",
];

const QUALITY_DIRECTIVES: [&str; 4] = [
    "Ideas must be realistic and achievable with the stated budget and experience",
    "Each idea must be clearly distinct from the others",
    "Prefer specific, validated customer problems over generic trends",
    "Keep financial estimates conservative and internally consistent",
];

pub fn build_system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

fn join_tags<T: Tag>(tags: &[T]) -> String {
    tags.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
}

/// Render the per-request instructions. Sections appear only for fields that
/// are present, always in the same order, so equal requests give equal text.
pub fn build_user_prompt(request: &GenerationRequest) -> String {
    let mut prompt = format!(
        "Generate {} innovative business ideas based on the following request:\n\"{}\"\n",
        request.count(),
        request.prompt.trim()
    );

    let industries = request.industries();
    if !industries.is_empty() {
        prompt.push_str(&format!("\nIndustries of interest: {}", industries.join(", ")));
    }
    if !request.idea_types().is_empty() {
        prompt.push_str(&format!("\nPreferred idea types: {}", join_tags(request.idea_types())));
    }
    if !request.business_models().is_empty() {
        prompt.push_str(&format!("\nPreferred business models: {}", join_tags(request.business_models())));
    }
    if let Some(market) = &request.target_market {
        prompt.push_str(&format!("\nTarget market: {market}"));
    }
    if let Some(budget) = &request.budget_range {
        let currency = budget.currency.as_deref().unwrap_or("USD");
        prompt.push_str(&format!("\nBudget: {} - {} {}", budget.min, budget.max, currency.to_ascii_uppercase()));
    }
    if let Some(level) = request.experience_level {
        prompt.push_str(&format!("\nExperience level: {level}"));
        match level {
            ExperienceLevel::Beginner => prompt.push_str("\nFavor ideas with low complexity, modest capital needs and a gentle learning curve."),
            ExperienceLevel::Advanced => prompt.push_str("\nAmbitious, technically demanding or capital-intensive ideas are acceptable."),
            ExperienceLevel::Intermediate => {}
        }
    }
    if let Some(risk) = request.risk_appetite {
        prompt.push_str(&format!("\nRisk appetite: {risk}"));
    }
    if let Some(geo) = &request.geographic_focus {
        prompt.push_str(&format!("\nGeographic focus: {geo}"));
    }
    if let Some(context) = &request.additional_context {
        prompt.push_str(&format!("\nAdditional context: {context}"));
    }

    prompt.push_str("\n\nFor each idea provide:");
    for (i, field) in REQUIRED_FIELDS.iter().enumerate() {
        prompt.push_str(&format!("\n{}. {}", i + 1, field));
    }

    prompt.push_str("\n\nQuality requirements:");
    for directive in QUALITY_DIRECTIVES {
        prompt.push_str(&format!("\n- {directive}"));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetRange, BusinessModel, IdeaType, RiskAppetite};
    use pretty_assertions::assert_eq;

    fn full_request() -> GenerationRequest {
        GenerationRequest {
            prompt: "  Tools for remote teams ".into(),
            count: Some(4),
            industries: Some(vec!["software".into(), "hr".into()]),
            interests: None,
            idea_types: Some(vec![IdeaType::Software, IdeaType::Service]),
            business_models: Some(vec![BusinessModel::Saas]),
            target_market: Some("Distributed startups".into()),
            budget_range: Some(BudgetRange { min: 5000.0, max: 20000.0, currency: Some("eur".into()) }),
            experience_level: Some(ExperienceLevel::Beginner),
            risk_appetite: Some(RiskAppetite::Low),
            geographic_focus: Some("Nordics".into()),
            additional_context: Some("Solo founder".into()),
        }
    }

    #[test]
    fn system_prompt_asks_for_json() {
        assert!(build_system_prompt().contains("{\"ideas\""));
    }

    #[test]
    fn user_prompt_is_deterministic() {
        let req = full_request();
        assert_eq!(build_user_prompt(&req), build_user_prompt(&req.clone()));
    }

    #[test]
    fn every_present_field_is_rendered_in_order() {
        let prompt = build_user_prompt(&full_request());
        let markers = [
            "Generate 4 innovative business ideas",
            "\"Tools for remote teams\"",
            "Industries of interest: software, hr",
            "Preferred idea types: software, service",
            "Preferred business models: saas",
            "Target market: Distributed startups",
            "Budget: 5000 - 20000 EUR",
            "Experience level: beginner",
            "Favor ideas with low complexity",
            "Risk appetite: low",
            "Geographic focus: Nordics",
            "Additional context: Solo founder",
            "12. Tags",
            "- Keep financial estimates conservative",
        ];
        let mut cursor = 0;
        for marker in markers {
            let found = prompt[cursor..].find(marker).unwrap_or_else(|| panic!("missing or out of order: {marker}"));
            cursor += found + marker.len();
        }
    }

    #[test]
    fn absent_fields_are_omitted() {
        let req = GenerationRequest { prompt: "pet grooming".into(), ..Default::default() };
        let prompt = build_user_prompt(&req);
        assert!(prompt.starts_with("Generate 3 innovative business ideas"));
        for label in ["Industries", "Preferred", "Target market:", "Budget", "Experience", "Risk", "Geographic", "Additional"] {
            assert!(!prompt.contains(label), "unexpected section {label}");
        }
        assert_eq!(prompt.matches("\n- ").count(), 4);
    }

    #[test]
    fn interests_render_when_industries_absent() {
        let req = GenerationRequest {
            prompt: "weekend projects".into(),
            interests: Some(vec!["woodworking".into()]),
            ..Default::default()
        };
        assert!(build_user_prompt(&req).contains("Industries of interest: woodworking"));
    }

    #[test]
    fn advanced_level_gets_its_own_advice() {
        let req = GenerationRequest {
            prompt: "deep tech".into(),
            experience_level: Some(ExperienceLevel::Advanced),
            ..Default::default()
        };
        let prompt = build_user_prompt(&req);
        assert!(prompt.contains("Ambitious, technically demanding"));
        assert!(!prompt.contains("Favor ideas with low complexity"));
    }
}
