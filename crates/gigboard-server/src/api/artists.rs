use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use gigboard_db::booking::{ArtistFields, ArtistUpdate};
use gigboard_db::directory::{self, ArtistDetail, ArtistName, SearchResults};
use gigboard_db::{booking, AppState, StoreError};

use super::venues::SearchParams;
use crate::error::{status_for, ApiError};

/// GET /artists
pub async fn list_artists(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ArtistName>>, ApiError> {
    let artists = directory::list_artists(&state.db).await?;
    Ok(Json(artists))
}

/// POST /artists/search (form field `search_term`)
pub async fn search_artists(
    State(state): State<Arc<AppState>>,
    Form(params): Form<SearchParams>,
) -> Result<Json<SearchResults>, ApiError> {
    let results =
        directory::search_artists(&state.db, &params.search_term, Utc::now().naive_utc()).await?;
    Ok(Json(results))
}

/// GET /artists/{id}
pub async fn get_artist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ArtistDetail>, ApiError> {
    let detail = directory::artist_detail(&state.db, id, Utc::now().naive_utc()).await?;
    Ok(Json(detail))
}

/// POST /artists/create
pub async fn create_artist(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<ArtistFields>,
) -> (StatusCode, Json<Value>) {
    let name = fields.name.clone();
    match booking::create_artist(&state.db, fields).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(json!({
                "id": id,
                "message": format!("Artist {name} was successfully listed!"),
            })),
        ),
        Err(err) => {
            tracing::warn!("artist listing failed: {err}");
            (
                status_for(&err),
                Json(json!({
                    "message": format!("An error occurred. Artist {name} could not be listed."),
                    "error": err.to_string(),
                })),
            )
        }
    }
}

/// POST /artists/{id}/edit
pub async fn update_artist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(fields): Json<ArtistUpdate>,
) -> (StatusCode, Json<Value>) {
    match booking::update_artist(&state.db, id, fields).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Artist successfully updated!" })),
        ),
        Err(err @ StoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Artist not found.", "error": err.to_string() })),
        ),
        Err(err) => {
            tracing::warn!("artist update failed: {err}");
            (
                status_for(&err),
                Json(json!({
                    "message": "An error occurred. Artist could not be updated.",
                    "error": err.to_string(),
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use gigboard_db::directory::ArtistName;

    #[test]
    fn test_artist_name_serialization() {
        let artist = ArtistName {
            id: 4,
            name: "Guns N Petals".into(),
        };
        let json = serde_json::to_value(&artist).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["name"], "Guns N Petals");
    }
}
