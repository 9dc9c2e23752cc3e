use axum::{Json, Router, extract::{State, rejection::JsonRejection}, routing::{get, post}};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};

use crate::{error::{ApiError, ApiResult}, generator::IdeaGenerator, models::{GenerateIdeasResponse, UserProfile}};

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<IdeaGenerator>,
    pub profile: Arc<UserProfile>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/generate-ideas", post(generate_ideas))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

pub async fn generate_ideas(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<GenerateIdeasResponse>> {
    let Json(payload) = body.map_err(|e| ApiError::BadRequest(format!("Invalid JSON in request body: {}", e.body_text())))?;

    let response = state.generator.generate(&payload, Some(state.profile.as_ref())).await?;
    tracing::info!(request_id = %response.request_id, ideas = response.ideas.len(), "✅ Ideas generated");
    Ok(Json(response))
}
