use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use gigboard_db::booking::{VenueFields, VenueUpdate};
use gigboard_db::directory::{self, LocalityGroup, SearchResults, VenueDetail};
use gigboard_db::{booking, AppState, StoreError};

use crate::error::{status_for, ApiError};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search_term: String,
}

/// GET /venues
pub async fn list_venues(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LocalityGroup>>, ApiError> {
    let groups = directory::list_venues_grouped(&state.db, Utc::now().naive_utc()).await?;
    Ok(Json(groups))
}

/// POST /venues/search (form field `search_term`)
pub async fn search_venues(
    State(state): State<Arc<AppState>>,
    Form(params): Form<SearchParams>,
) -> Result<Json<SearchResults>, ApiError> {
    let results =
        directory::search_venues(&state.db, &params.search_term, Utc::now().naive_utc()).await?;
    Ok(Json(results))
}

/// GET /venues/{id}
pub async fn get_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<VenueDetail>, ApiError> {
    let detail = directory::venue_detail(&state.db, id, Utc::now().naive_utc()).await?;
    Ok(Json(detail))
}

/// POST /venues/create
pub async fn create_venue(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<VenueFields>,
) -> (StatusCode, Json<Value>) {
    let name = fields.name.clone();
    match booking::create_venue(&state.db, fields).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(json!({
                "id": id,
                "message": format!("Venue {name} was successfully listed!"),
            })),
        ),
        Err(err) => {
            tracing::warn!("venue listing failed: {err}");
            (
                status_for(&err),
                Json(json!({
                    "message": format!("An error occurred. Venue {name} could not be listed."),
                    "error": err.to_string(),
                })),
            )
        }
    }
}

/// POST /venues/{id}/edit
pub async fn update_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(fields): Json<VenueUpdate>,
) -> (StatusCode, Json<Value>) {
    match booking::update_venue(&state.db, id, fields).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Venue successfully updated!" })),
        ),
        Err(err @ StoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Venue not found." , "error": err.to_string() })),
        ),
        Err(err) => {
            tracing::warn!("venue update failed: {err}");
            (
                status_for(&err),
                Json(json!({
                    "message": "An error occurred. Venue could not be updated.",
                    "error": err.to_string(),
                })),
            )
        }
    }
}

/// DELETE /venues/{id}
pub async fn delete_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> (StatusCode, Json<Value>) {
    delete_venue_response(booking::delete_venue(&state.db, id).await)
}

fn delete_venue_response(result: Result<(), StoreError>) -> (StatusCode, Json<Value>) {
    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Venue deleted successfully." })),
        ),
        Err(StoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Venue not found." })),
        ),
        Err(err) => {
            tracing::error!("venue deletion failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "An error occurred. Venue could not be deleted." })),
            )
        }
    }
}
