//! Booking mutations: venue/artist CRUD and show creation.
//!
//! Every mutation runs in a scoped transaction; dropping an uncommitted
//! transaction rolls it back, so every error path unwinds cleanly.
//! NotFound is decided before a transaction is opened.

use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
};
use serde::Deserialize;

use crate::entities::{artist, show, venue};
use crate::shows::{self, ShowParty};
use crate::{phone, StoreError};

#[derive(Debug, Clone, Deserialize)]
pub struct VenueFields {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: String,
    /// Comma-joined, e.g. "Rock,Jazz".
    #[serde(default)]
    pub genres: String,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistFields {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    #[serde(default)]
    pub genres: String,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

/// Partial update payload; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VenueUpdate {
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub genres: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub seeking_talent: Option<bool>,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistUpdate {
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub genres: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub seeking_venue: Option<bool>,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShowFields {
    pub artist_id: i32,
    pub venue_id: i32,
    pub start_time: NaiveDateTime,
}

/// Insert a venue. Duplicate (name, city, state) triples surface as
/// Conflict via the unique index; the loser's transaction rolls back.
pub async fn create_venue(db: &DatabaseConnection, fields: VenueFields) -> Result<i32, StoreError> {
    phone::validate(&fields.phone).map_err(StoreError::Validation)?;

    let txn = db.begin().await.map_err(StoreError::from)?;
    let created = venue::ActiveModel {
        name: Set(fields.name),
        city: Set(fields.city),
        state: Set(fields.state),
        address: Set(fields.address),
        phone: Set(fields.phone),
        genres: Set(fields.genres),
        image_link: Set(fields.image_link),
        facebook_link: Set(fields.facebook_link),
        website: Set(fields.website),
        seeking_talent: Set(fields.seeking_talent),
        seeking_description: Set(fields.seeking_description),
        past_shows_count: Set(0),
        upcoming_shows_count: Set(0),
        created_at: Set(chrono::Utc::now().fixed_offset()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(StoreError::from)?;
    txn.commit().await.map_err(StoreError::from)?;

    Ok(created.id)
}

pub async fn create_artist(
    db: &DatabaseConnection,
    fields: ArtistFields,
) -> Result<i32, StoreError> {
    phone::validate(&fields.phone).map_err(StoreError::Validation)?;

    let txn = db.begin().await.map_err(StoreError::from)?;
    let created = artist::ActiveModel {
        name: Set(fields.name),
        city: Set(fields.city),
        state: Set(fields.state),
        phone: Set(fields.phone),
        genres: Set(fields.genres),
        image_link: Set(fields.image_link),
        facebook_link: Set(fields.facebook_link),
        website: Set(fields.website),
        seeking_venue: Set(fields.seeking_venue),
        seeking_description: Set(fields.seeking_description),
        past_shows_count: Set(0),
        upcoming_shows_count: Set(0),
        created_at: Set(chrono::Utc::now().fixed_offset()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(StoreError::from)?;
    txn.commit().await.map_err(StoreError::from)?;

    Ok(created.id)
}

pub async fn update_venue(
    db: &DatabaseConnection,
    id: i32,
    fields: VenueUpdate,
) -> Result<(), StoreError> {
    let existing = venue::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(StoreError::from)?
        .ok_or(StoreError::NotFound("venue"))?;

    if let Some(phone) = &fields.phone {
        phone::validate(phone).map_err(StoreError::Validation)?;
    }

    let txn = db.begin().await.map_err(StoreError::from)?;
    let mut active: venue::ActiveModel = existing.into();
    if let Some(name) = fields.name {
        active.name = Set(name);
    }
    if let Some(city) = fields.city {
        active.city = Set(city);
    }
    if let Some(state) = fields.state {
        active.state = Set(state);
    }
    if let Some(address) = fields.address {
        active.address = Set(address);
    }
    if let Some(phone) = fields.phone {
        active.phone = Set(phone);
    }
    if let Some(genres) = fields.genres {
        active.genres = Set(genres);
    }
    if let Some(image_link) = fields.image_link {
        active.image_link = Set(Some(image_link));
    }
    if let Some(facebook_link) = fields.facebook_link {
        active.facebook_link = Set(Some(facebook_link));
    }
    if let Some(website) = fields.website {
        active.website = Set(Some(website));
    }
    if let Some(seeking_talent) = fields.seeking_talent {
        active.seeking_talent = Set(seeking_talent);
    }
    if let Some(seeking_description) = fields.seeking_description {
        active.seeking_description = Set(Some(seeking_description));
    }
    active.update(&txn).await.map_err(StoreError::from)?;
    txn.commit().await.map_err(StoreError::from)?;

    Ok(())
}

pub async fn update_artist(
    db: &DatabaseConnection,
    id: i32,
    fields: ArtistUpdate,
) -> Result<(), StoreError> {
    let existing = artist::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(StoreError::from)?
        .ok_or(StoreError::NotFound("artist"))?;

    if let Some(phone) = &fields.phone {
        phone::validate(phone).map_err(StoreError::Validation)?;
    }

    let txn = db.begin().await.map_err(StoreError::from)?;
    let mut active: artist::ActiveModel = existing.into();
    if let Some(name) = fields.name {
        active.name = Set(name);
    }
    if let Some(city) = fields.city {
        active.city = Set(city);
    }
    if let Some(state) = fields.state {
        active.state = Set(state);
    }
    if let Some(phone) = fields.phone {
        active.phone = Set(phone);
    }
    if let Some(genres) = fields.genres {
        active.genres = Set(genres);
    }
    if let Some(image_link) = fields.image_link {
        active.image_link = Set(Some(image_link));
    }
    if let Some(facebook_link) = fields.facebook_link {
        active.facebook_link = Set(Some(facebook_link));
    }
    if let Some(website) = fields.website {
        active.website = Set(Some(website));
    }
    if let Some(seeking_venue) = fields.seeking_venue {
        active.seeking_venue = Set(seeking_venue);
    }
    if let Some(seeking_description) = fields.seeking_description {
        active.seeking_description = Set(Some(seeking_description));
    }
    active.update(&txn).await.map_err(StoreError::from)?;
    txn.commit().await.map_err(StoreError::from)?;

    Ok(())
}

/// Delete a venue; its shows go with it via the FK cascade.
pub async fn delete_venue(db: &DatabaseConnection, id: i32) -> Result<(), StoreError> {
    let existing = venue::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(StoreError::from)?
        .ok_or(StoreError::NotFound("venue"))?;

    let txn = db.begin().await.map_err(StoreError::from)?;
    venue::Entity::delete_by_id(existing.id)
        .exec(&txn)
        .await
        .map_err(StoreError::from)?;
    txn.commit().await.map_err(StoreError::from)?;

    Ok(())
}

/// Delete an artist and, via cascade, every show that references it.
/// Not exposed over HTTP; kept as a booking operation.
pub async fn delete_artist(db: &DatabaseConnection, id: i32) -> Result<(), StoreError> {
    let existing = artist::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(StoreError::from)?
        .ok_or(StoreError::NotFound("artist"))?;

    let txn = db.begin().await.map_err(StoreError::from)?;
    artist::Entity::delete_by_id(existing.id)
        .exec(&txn)
        .await
        .map_err(StoreError::from)?;
    txn.commit().await.map_err(StoreError::from)?;

    Ok(())
}

/// Book a show linking an artist to a venue at a start time.
///
/// Both parents must exist; there is deliberately no double-booking
/// check. Refreshes both parents' cached show counters afterwards.
pub async fn create_show(
    db: &DatabaseConnection,
    fields: ShowFields,
    now: NaiveDateTime,
) -> Result<i32, StoreError> {
    let txn = db.begin().await.map_err(StoreError::from)?;

    if artist::Entity::find_by_id(fields.artist_id)
        .one(&txn)
        .await
        .map_err(StoreError::from)?
        .is_none()
    {
        return Err(StoreError::Validation(format!(
            "artist {} does not exist",
            fields.artist_id
        )));
    }
    if venue::Entity::find_by_id(fields.venue_id)
        .one(&txn)
        .await
        .map_err(StoreError::from)?
        .is_none()
    {
        return Err(StoreError::Validation(format!(
            "venue {} does not exist",
            fields.venue_id
        )));
    }

    let created = show::ActiveModel {
        start_time: Set(fields.start_time),
        artist_id: Set(fields.artist_id),
        venue_id: Set(fields.venue_id),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(StoreError::from)?;
    txn.commit().await.map_err(StoreError::from)?;

    // Keep the cached listing counters warm. Reads never depend on them,
    // so a refresh failure must not surface as a failed booking: the
    // show is already committed at this point.
    if let Err(err) = shows::refresh_show_counts(db, ShowParty::Artist(fields.artist_id), now).await
    {
        tracing::warn!("count refresh after booking failed: {err}");
    }
    if let Err(err) = shows::refresh_show_counts(db, ShowParty::Venue(fields.venue_id), now).await {
        tracing::warn!("count refresh after booking failed: {err}");
    }

    Ok(created.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{artist, venue};
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    fn make_artist(id: i32) -> artist::Model {
        artist::Model {
            id,
            name: "Guns N Petals".into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            phone: "4155550000".into(),
            genres: "Rock".into(),
            image_link: None,
            facebook_link: None,
            website: None,
            seeking_venue: false,
            seeking_description: None,
            past_shows_count: 0,
            upcoming_shows_count: 0,
            created_at: chrono::Utc::now().fixed_offset(),
        }
    }

    fn make_venue(id: i32) -> venue::Model {
        venue::Model {
            id,
            name: "The Fillmore".into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            address: "1805 Geary Blvd".into(),
            phone: "4155551234".into(),
            image_link: None,
            facebook_link: None,
            website: None,
            genres: "Rock,Jazz".into(),
            seeking_talent: false,
            seeking_description: None,
            past_shows_count: 0,
            upcoming_shows_count: 0,
            created_at: chrono::Utc::now().fixed_offset(),
        }
    }

    #[tokio::test]
    async fn test_booked_show_survives_count_refresh_failure() {
        // The show commits before the counter refresh runs; a refresh
        // failure afterwards must not turn the booking into an error.
        let start_time = NaiveDate::from_ymd_opt(2023, 6, 15)
            .unwrap()
            .and_hms_opt(19, 30, 0)
            .unwrap();
        let booked = show::Model {
            id: 9,
            start_time,
            artist_id: 1,
            venue_id: 2,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![make_artist(1)]])
            .append_query_results([vec![make_venue(2)]])
            .append_query_results([vec![booked]])
            .append_query_errors([
                DbErr::Custom("refresh failed".into()),
                DbErr::Custom("refresh failed".into()),
            ])
            .into_connection();

        let id = create_show(
            &db,
            ShowFields {
                artist_id: 1,
                venue_id: 2,
                start_time,
            },
            start_time,
        )
        .await
        .expect("booking must succeed despite the refresh failure");
        assert_eq!(id, 9);
    }

    #[test]
    fn test_venue_fields_full_deserialization() {
        let json = r#"{
            "name": "The Fillmore",
            "city": "San Francisco",
            "state": "CA",
            "address": "1805 Geary Blvd",
            "phone": "4155551234",
            "genres": "Rock,Jazz",
            "image_link": "https://img.example.com/fillmore.jpg",
            "facebook_link": null,
            "website": "https://thefillmore.com",
            "seeking_talent": true,
            "seeking_description": "Always booking"
        }"#;
        let fields: VenueFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.name, "The Fillmore");
        assert_eq!(fields.genres, "Rock,Jazz");
        assert!(fields.seeking_talent);
        assert!(fields.facebook_link.is_none());
    }

    #[test]
    fn test_venue_fields_seeking_defaults_to_false() {
        // absent checkbox field means "not seeking"
        let json = r#"{
            "name": "The Chapel",
            "city": "San Francisco",
            "state": "CA",
            "address": "777 Valencia St",
            "phone": "4155559876"
        }"#;
        let fields: VenueFields = serde_json::from_str(json).unwrap();
        assert!(!fields.seeking_talent);
        assert_eq!(fields.genres, "");
        assert!(fields.seeking_description.is_none());
    }

    #[test]
    fn test_artist_fields_deserialization() {
        let json = r#"{
            "name": "Guns N Petals",
            "city": "San Francisco",
            "state": "CA",
            "phone": "+1 (415) 555-0000",
            "genres": "Rock",
            "seeking_venue": true
        }"#;
        let fields: ArtistFields = serde_json::from_str(json).unwrap();
        assert!(fields.seeking_venue);
        assert_eq!(fields.phone, "+1 (415) 555-0000");
    }

    #[test]
    fn test_update_payload_is_fully_optional() {
        let update: VenueUpdate = serde_json::from_str("{}").unwrap();
        assert!(update.name.is_none());
        assert!(update.seeking_talent.is_none());

        let update: ArtistUpdate =
            serde_json::from_str(r#"{"seeking_venue": false}"#).unwrap();
        assert_eq!(update.seeking_venue, Some(false));
    }

    #[test]
    fn test_show_fields_requires_start_time() {
        let err = serde_json::from_str::<ShowFields>(r#"{"artist_id": 1, "venue_id": 2}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_show_fields_parses_naive_timestamp() {
        let json = r#"{"artist_id": 1, "venue_id": 2, "start_time": "2023-06-15T19:30:00"}"#;
        let fields: ShowFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.artist_id, 1);
        assert_eq!(fields.start_time.to_string(), "2023-06-15 19:30:00");
    }
}
