use crate::selector::{Answer, SelectionResult};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Recipe request parameters
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeParams {
    #[serde(default)]
    pub q: String,
}

/// Recipe response: the selected recipe with its steps in order
pub type RecipeResponse = SelectionResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub username: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub database: String,
    pub search_index: String,
}

impl IntoResponse for Answer {
    fn into_response(self) -> Response {
        match self {
            Answer::Recipe(recipe) => (StatusCode::OK, Json(recipe)).into_response(),
            Answer::InvalidQuery(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
            Answer::RetrievalFailed(error) => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse { error })).into_response()
            }
        }
    }
}
