use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::db::Database;
use crate::error::Error;
use crate::models::*;
use crate::query::{PageRequest, View};
use crate::service;

// ============================================================
// Error Handling
// ============================================================

/// Map a domain error to a response. Storage failures are logged in full
/// server-side; clients only see a generic message.
fn error_response(e: Error) -> (StatusCode, String) {
    match e {
        Error::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        Error::Validation(_) => {
            tracing::warn!("Validation error: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        Error::Storage(_) => {
            tracing::error!("Internal error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Dashboard
// ============================================================

pub async fn dashboard(State(db): State<Database>) -> Result<Json<Stats>, (StatusCode, String)> {
    service::stats(&db, Utc::now())
        .map(Json)
        .map_err(error_response)
}

// ============================================================
// Exercises
// ============================================================

/// Query parameters for listing exercises.
#[derive(Debug, Default, Deserialize)]
pub struct ListExercisesQuery {
    /// View name: `pending` (default), `pool`, `reviewed_today` or `total`.
    pub filter: Option<String>,
    /// Substring matched against source id, title, tags and answer.
    pub search: Option<String>,
    /// 1-indexed page number. Defaults to 1.
    pub page: Option<u32>,
}

pub async fn list_exercises(
    State(db): State<Database>,
    Query(query): Query<ListExercisesQuery>,
) -> Result<Json<ExercisePage>, (StatusCode, String)> {
    let view = View::resolve(query.filter.as_deref());
    let page = match query.page {
        Some(page) => PageRequest::new(page).map_err(error_response)?,
        None => PageRequest::first(),
    };

    service::list(&db, view, query.search.as_deref(), page, Utc::now())
        .map(Json)
        .map_err(error_response)
}

pub async fn create_exercise(
    State(db): State<Database>,
    Json(input): Json<CreateExerciseInput>,
) -> Result<(StatusCode, Json<CreatedExercise>), (StatusCode, String)> {
    service::create(&db, input, Utc::now())
        .map(|id| (StatusCode::CREATED, Json(CreatedExercise { id })))
        .map_err(error_response)
}

pub async fn get_exercise(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<Exercise>, (StatusCode, String)> {
    service::get(&db, id).map(Json).map_err(error_response)
}

pub async fn update_exercise(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateExerciseInput>,
) -> Result<Json<Exercise>, (StatusCode, String)> {
    service::update(&db, id, input)
        .map(Json)
        .map_err(error_response)
}

pub async fn delete_exercise(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    service::delete(&db, id)
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(error_response)
}

pub async fn review_exercise(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<Exercise>, (StatusCode, String)> {
    service::review(&db, id, Utc::now())
        .map(Json)
        .map_err(error_response)
}
