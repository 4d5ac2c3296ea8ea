//! Show aggregation: past/upcoming classification and cached counters.
//!
//! "Now" is always an explicit parameter; the system clock is only read
//! at the HTTP boundary so the classification logic stays deterministic
//! under test.

use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{artist, show, venue};
use crate::StoreError;

/// The owning side of a show: either parent works symmetrically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowParty {
    Artist(i32),
    Venue(i32),
}

/// A party's shows split around a reference instant.
#[derive(Debug, Clone)]
pub struct ClassifiedShows {
    pub past: Vec<show::Model>,
    pub upcoming: Vec<show::Model>,
}

/// Fetch all shows belonging to `party` and partition them around `now`.
pub async fn classify_shows(
    db: &DatabaseConnection,
    party: ShowParty,
    now: NaiveDateTime,
) -> Result<ClassifiedShows, StoreError> {
    let query = match party {
        ShowParty::Artist(id) => show::Entity::find().filter(show::Column::ArtistId.eq(id)),
        ShowParty::Venue(id) => show::Entity::find().filter(show::Column::VenueId.eq(id)),
    };
    let shows = query
        .order_by_asc(show::Column::StartTime)
        .all(db)
        .await
        .map_err(StoreError::from)?;

    let (past, upcoming) = partition_by_start(shows, now);
    Ok(ClassifiedShows { past, upcoming })
}

/// Partition shows around `now`: strictly earlier starts are past,
/// everything else (including an exact tie) is upcoming. Every show
/// lands in exactly one bucket.
pub fn partition_by_start(
    shows: Vec<show::Model>,
    now: NaiveDateTime,
) -> (Vec<show::Model>, Vec<show::Model>) {
    shows.into_iter().partition(|s| s.start_time < now)
}

/// Count a party's upcoming shows without materialising them.
pub async fn upcoming_count(
    db: &DatabaseConnection,
    party: ShowParty,
    now: NaiveDateTime,
) -> Result<u64, StoreError> {
    let query = match party {
        ShowParty::Artist(id) => show::Entity::find().filter(show::Column::ArtistId.eq(id)),
        ShowParty::Venue(id) => show::Entity::find().filter(show::Column::VenueId.eq(id)),
    };
    query
        .filter(show::Column::StartTime.gte(now))
        .count(db)
        .await
        .map_err(StoreError::from)
}

/// Recompute and persist the cached show counters for one party.
///
/// Idempotent: re-running with no intervening show changes writes the
/// same values. The cached columns exist for listing pages; detail
/// views always classify live and never trust them.
pub async fn refresh_show_counts(
    db: &DatabaseConnection,
    party: ShowParty,
    now: NaiveDateTime,
) -> Result<(), StoreError> {
    let classified = classify_shows(db, party, now).await?;
    let past = classified.past.len() as i32;
    let upcoming = classified.upcoming.len() as i32;
    tracing::debug!(?party, past, upcoming, "refreshing cached show counts");

    match party {
        ShowParty::Artist(id) => {
            let model = artist::Entity::find_by_id(id)
                .one(db)
                .await
                .map_err(StoreError::from)?
                .ok_or(StoreError::NotFound("artist"))?;
            let mut active: artist::ActiveModel = model.into();
            active.past_shows_count = Set(past);
            active.upcoming_shows_count = Set(upcoming);
            active.update(db).await.map_err(StoreError::from)?;
        }
        ShowParty::Venue(id) => {
            let model = venue::Entity::find_by_id(id)
                .one(db)
                .await
                .map_err(StoreError::from)?
                .ok_or(StoreError::NotFound("venue"))?;
            let mut active: venue::ActiveModel = model.into();
            active.past_shows_count = Set(past);
            active.upcoming_shows_count = Set(upcoming);
            active.update(db).await.map_err(StoreError::from)?;
        }
    }
    Ok(())
}

/// Render a start time as an ISO-8601 UTC timestamp with millisecond
/// precision, e.g. `2023-06-15T19:30:00.000Z`.
pub fn format_start_time(start_time: &NaiveDateTime) -> String {
    start_time.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn make_show(id: i32, start_time: NaiveDateTime) -> show::Model {
        show::Model {
            id,
            start_time,
            artist_id: 1,
            venue_id: 1,
        }
    }

    #[test]
    fn test_partition_yesterday_is_past() {
        let now = at(2023, 6, 15, 12);
        let shows = vec![make_show(1, at(2023, 6, 14, 12))];
        let (past, upcoming) = partition_by_start(shows, now);
        assert_eq!(past.len(), 1);
        assert!(upcoming.is_empty());
    }

    #[test]
    fn test_partition_exact_tie_is_upcoming() {
        let now = at(2023, 6, 15, 12);
        let shows = vec![make_show(1, now)];
        let (past, upcoming) = partition_by_start(shows, now);
        assert!(past.is_empty());
        assert_eq!(upcoming.len(), 1);
    }

    #[test]
    fn test_partition_is_total_and_exclusive() {
        let now = at(2023, 6, 15, 12);
        let shows = vec![
            make_show(1, at(2023, 6, 10, 20)),
            make_show(2, at(2023, 6, 15, 12)),
            make_show(3, at(2023, 6, 20, 20)),
            make_show(4, at(2023, 6, 14, 23)),
        ];
        let total = shows.len();
        let (past, upcoming) = partition_by_start(shows, now);
        assert_eq!(past.len() + upcoming.len(), total);
        assert!(past.iter().all(|s| s.start_time < now));
        assert!(upcoming.iter().all(|s| s.start_time >= now));
    }

    #[test]
    fn test_partition_empty_input() {
        let (past, upcoming) = partition_by_start(vec![], at(2023, 1, 1, 0));
        assert!(past.is_empty());
        assert!(upcoming.is_empty());
    }

    #[test]
    fn test_format_start_time_millisecond_precision() {
        let t = at(2023, 6, 15, 19);
        assert_eq!(format_start_time(&t), "2023-06-15T19:00:00.000Z");
    }

    #[test]
    fn test_format_start_time_subsecond() {
        let t = NaiveDate::from_ymd_opt(2023, 6, 15)
            .unwrap()
            .and_hms_milli_opt(19, 30, 5, 250)
            .unwrap();
        assert_eq!(format_start_time(&t), "2023-06-15T19:30:05.250Z");
    }
}
