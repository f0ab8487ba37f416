use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::AppState;
use crate::error::ApiError;

/// GET /users - number of distinct users who have added a movie.
pub async fn user_count(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let total_users = state.movies.count_contributors().await?;
    Ok(Json(json!([{ "totalUsers": total_users }])))
}
