use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use gigboard_db::booking::{self, ShowFields};
use gigboard_db::directory::{self, ShowListing};
use gigboard_db::AppState;

use crate::error::{status_for, ApiError};

/// GET /shows
pub async fn list_shows(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ShowListing>>, ApiError> {
    let shows = directory::list_shows(&state.db).await?;
    Ok(Json(shows))
}

/// POST /shows/create
pub async fn create_show(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<ShowFields>,
) -> (StatusCode, Json<Value>) {
    match booking::create_show(&state.db, fields, Utc::now().naive_utc()).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(json!({
                "id": id,
                "message": "Show was successfully listed!",
            })),
        ),
        Err(err) => {
            tracing::warn!("show booking failed: {err}");
            (
                status_for(&err),
                Json(json!({
                    "message": "An error occurred. Show could not be listed.",
                    "error": err.to_string(),
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use gigboard_db::directory::ShowListing;

    #[test]
    fn test_show_listing_serialization() {
        let listing = ShowListing {
            venue_id: 1,
            venue_name: "The Fillmore".into(),
            artist_id: 2,
            artist_name: "Guns N Petals".into(),
            artist_image_link: Some("https://img.example.com/gnp.jpg".into()),
            start_time: "2023-06-15T19:30:00.000Z".into(),
        };
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["venue_name"], "The Fillmore");
        assert_eq!(json["artist_name"], "Guns N Petals");
        assert_eq!(json["start_time"], "2023-06-15T19:30:00.000Z");
    }
}
