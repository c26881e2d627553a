use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{GenerateMealPlanRequest, MessageResponse},
    model::{MealHistoryEntry, MealPlan},
    services,
};
use crate::{
    error::AppError,
    extractors::{ApiJson, ApiPath},
    state::AppState,
};

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/meals/generate", post(generate))
        .route("/meals/user/:user_id", get(list_for_user))
        .route("/meals/history/:user_id", get(history))
        .route("/meals/plan/:id", delete(delete_plan))
}

#[instrument(skip(state, payload))]
pub async fn generate(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GenerateMealPlanRequest>,
) -> Result<(StatusCode, Json<MealPlan>), AppError> {
    let plan =
        services::generate_meal_plan(&state, payload.user_id, &payload.additional_instructions)
            .await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

#[instrument(skip(state))]
pub async fn list_for_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<Vec<MealPlan>>, AppError> {
    Ok(Json(services::list_user_plans(&state, user_id).await?))
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<Vec<MealHistoryEntry>>, AppError> {
    Ok(Json(services::user_history(&state, user_id).await?))
}

#[instrument(skip(state))]
pub async fn delete_plan(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    services::delete_meal_plan(&state, id).await?;
    Ok(Json(MessageResponse {
        message: "Meal plan deleted successfully".into(),
    }))
}
