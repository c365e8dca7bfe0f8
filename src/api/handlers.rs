use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    api::models::*,
    assistant::KitchenAssistant,
    db::{self, models::NewUser, DbPool},
    selector::Answer,
    Error, Result,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub assistant: Arc<KitchenAssistant>,
    pub settings: crate::config::Settings,
}

impl AppState {
    // The account CSV mirrors the table after every signup and login
    async fn export_users(&self) {
        if let Err(e) =
            db::users::export_users_csv(&self.pool, &self.settings.database.users_csv_path).await
        {
            warn!("Failed to export users: {}", e.log_safe());
        }
    }
}

/// GET /api/recipe - Best matching recipe for a free-text query
pub async fn find_recipe(
    State(state): State<AppState>,
    Query(params): Query<RecipeParams>,
) -> Answer {
    debug!("Recipe request: {:?}", params);
    state.assistant.answer(&params.q).await
}

/// POST /api/signup - Create an account
pub async fn signup(
    State(state): State<AppState>,
    Json(form): Json<NewUser>,
) -> Result<(StatusCode, Json<AccountResponse>)> {
    db::users::register_user(
        &state.pool,
        &form.username,
        &form.password,
        &form.confirm_password,
    )
    .await?;
    state.export_users().await;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            username: form.username.trim().to_string(),
        }),
    ))
}

/// POST /api/login - Check credentials
pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginRequest>,
) -> Result<Json<AccountResponse>> {
    if !db::users::verify_user(&state.pool, &form.username, &form.password).await? {
        return Err(Error::Unauthorized(
            "Incorrect Username/Password".to_string(),
        ));
    }
    state.export_users().await;

    Ok(Json(AccountResponse {
        username: form.username,
    }))
}

/// GET /health - Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

/// GET /ready - Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> Result<Json<ReadinessResponse>> {
    // Check database connectivity
    let db_healthy = sqlx::query("SELECT 1").fetch_one(&state.pool).await.is_ok();

    // The index loads on the first query
    let index_ready = state.assistant.is_ready();

    Ok(Json(ReadinessResponse {
        ready: db_healthy && index_ready,
        database: if db_healthy { "ok" } else { "error" }.to_string(),
        search_index: if index_ready { "ok" } else { "loading" }.to_string(),
    }))
}
