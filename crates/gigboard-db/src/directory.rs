//! Directory reads: grouped venue listing, keyword search, detail views.

use chrono::NaiveDateTime;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::entities::{artist, show, venue};
use crate::shows::{self, ShowParty};
use crate::StoreError;

#[derive(Debug, Serialize)]
pub struct DirectoryEntry {
    pub id: i32,
    pub name: String,
    pub num_upcoming_shows: u64,
}

#[derive(Debug, Serialize)]
pub struct LocalityGroup {
    pub city: String,
    pub state: String,
    pub venues: Vec<DirectoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub count: usize,
    pub data: Vec<DirectoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct ArtistName {
    pub id: i32,
    pub name: String,
}

/// One show on a venue's detail page, seen from the venue's side.
#[derive(Debug, Serialize)]
pub struct VenueShowEntry {
    pub artist_id: i32,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

/// One show on an artist's detail page, seen from the artist's side.
#[derive(Debug, Serialize)]
pub struct ArtistShowEntry {
    pub venue_id: i32,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub start_time: String,
}

#[derive(Debug, Serialize)]
pub struct VenueDetail {
    pub id: i32,
    pub name: String,
    pub genres: Vec<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
    pub past_shows: Vec<VenueShowEntry>,
    pub upcoming_shows: Vec<VenueShowEntry>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ArtistDetail {
    pub id: i32,
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    pub past_shows: Vec<ArtistShowEntry>,
    pub upcoming_shows: Vec<ArtistShowEntry>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

/// One row of the global shows page, joined with both parties.
#[derive(Debug, Serialize)]
pub struct ShowListing {
    pub venue_id: i32,
    pub venue_name: String,
    pub artist_id: i32,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

/// All venues, clustered by exact (city, state) pair.
///
/// Groups appear in order of first occurrence and venues keep their
/// query order within a group. Upcoming-show counts are computed live,
/// never read from the cached columns.
pub async fn list_venues_grouped(
    db: &DatabaseConnection,
    now: NaiveDateTime,
) -> Result<Vec<LocalityGroup>, StoreError> {
    let venues = venue::Entity::find()
        .order_by_asc(venue::Column::Id)
        .all(db)
        .await
        .map_err(StoreError::from)?;

    let mut entries = Vec::with_capacity(venues.len());
    for v in venues {
        let num_upcoming_shows = shows::upcoming_count(db, ShowParty::Venue(v.id), now).await?;
        entries.push((
            v.city,
            v.state,
            DirectoryEntry {
                id: v.id,
                name: v.name,
                num_upcoming_shows,
            },
        ));
    }
    Ok(group_by_locality(entries))
}

/// Linear-scan grouping that preserves first-seen group order.
pub(crate) fn group_by_locality(
    entries: Vec<(String, String, DirectoryEntry)>,
) -> Vec<LocalityGroup> {
    let mut groups: Vec<LocalityGroup> = Vec::new();
    for (city, state, entry) in entries {
        match groups
            .iter_mut()
            .find(|g| g.city == city && g.state == state)
        {
            Some(group) => group.venues.push(entry),
            None => groups.push(LocalityGroup {
                city,
                state,
                venues: vec![entry],
            }),
        }
    }
    groups
}

/// Case-insensitive substring search over venue names.
///
/// An empty term matches every venue.
pub async fn search_venues(
    db: &DatabaseConnection,
    term: &str,
    now: NaiveDateTime,
) -> Result<SearchResults, StoreError> {
    let venues = venue::Entity::find()
        .filter(Expr::col(venue::Column::Name).ilike(like_pattern(term)))
        .order_by_asc(venue::Column::Name)
        .all(db)
        .await
        .map_err(StoreError::from)?;

    let mut data = Vec::with_capacity(venues.len());
    for v in venues {
        let num_upcoming_shows = shows::upcoming_count(db, ShowParty::Venue(v.id), now).await?;
        data.push(DirectoryEntry {
            id: v.id,
            name: v.name,
            num_upcoming_shows,
        });
    }
    Ok(SearchResults {
        count: data.len(),
        data,
    })
}

/// Case-insensitive substring search over artist names.
pub async fn search_artists(
    db: &DatabaseConnection,
    term: &str,
    now: NaiveDateTime,
) -> Result<SearchResults, StoreError> {
    let artists = artist::Entity::find()
        .filter(Expr::col(artist::Column::Name).ilike(like_pattern(term)))
        .order_by_asc(artist::Column::Name)
        .all(db)
        .await
        .map_err(StoreError::from)?;

    let mut data = Vec::with_capacity(artists.len());
    for a in artists {
        let num_upcoming_shows = shows::upcoming_count(db, ShowParty::Artist(a.id), now).await?;
        data.push(DirectoryEntry {
            id: a.id,
            name: a.name,
            num_upcoming_shows,
        });
    }
    Ok(SearchResults {
        count: data.len(),
        data,
    })
}

/// SECURITY: escape SQL LIKE wildcards to prevent wildcard-abuse DoS.
/// Backslash goes first so literal escapes survive the wildcard passes.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

pub async fn list_artists(db: &DatabaseConnection) -> Result<Vec<ArtistName>, StoreError> {
    let artists = artist::Entity::find()
        .order_by_asc(artist::Column::Id)
        .all(db)
        .await
        .map_err(StoreError::from)?;

    Ok(artists
        .into_iter()
        .map(|a| ArtistName {
            id: a.id,
            name: a.name,
        })
        .collect())
}

/// Full venue record with live past/upcoming show lists.
pub async fn venue_detail(
    db: &DatabaseConnection,
    id: i32,
    now: NaiveDateTime,
) -> Result<VenueDetail, StoreError> {
    let venue = venue::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(StoreError::from)?
        .ok_or(StoreError::NotFound("venue"))?;

    let classified = shows::classify_shows(db, ShowParty::Venue(id), now).await?;

    let artist_ids: Vec<i32> = classified
        .past
        .iter()
        .chain(classified.upcoming.iter())
        .map(|s| s.artist_id)
        .collect();
    let artists = if artist_ids.is_empty() {
        vec![]
    } else {
        artist::Entity::find()
            .filter(artist::Column::Id.is_in(artist_ids))
            .all(db)
            .await
            .map_err(StoreError::from)?
    };

    let entry = |s: &show::Model| {
        artists.iter().find(|a| a.id == s.artist_id).map(|a| VenueShowEntry {
            artist_id: a.id,
            artist_name: a.name.clone(),
            artist_image_link: a.image_link.clone(),
            start_time: shows::format_start_time(&s.start_time),
        })
    };
    let past_shows: Vec<VenueShowEntry> = classified.past.iter().filter_map(entry).collect();
    let upcoming_shows: Vec<VenueShowEntry> =
        classified.upcoming.iter().filter_map(entry).collect();

    Ok(VenueDetail {
        id: venue.id,
        name: venue.name,
        genres: split_genres(&venue.genres),
        address: venue.address,
        city: venue.city,
        state: venue.state,
        phone: venue.phone,
        website: venue.website,
        facebook_link: venue.facebook_link,
        image_link: venue.image_link,
        seeking_talent: venue.seeking_talent,
        seeking_description: venue.seeking_description,
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    })
}

/// Full artist record with live past/upcoming show lists.
pub async fn artist_detail(
    db: &DatabaseConnection,
    id: i32,
    now: NaiveDateTime,
) -> Result<ArtistDetail, StoreError> {
    let artist = artist::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(StoreError::from)?
        .ok_or(StoreError::NotFound("artist"))?;

    let classified = shows::classify_shows(db, ShowParty::Artist(id), now).await?;

    let venue_ids: Vec<i32> = classified
        .past
        .iter()
        .chain(classified.upcoming.iter())
        .map(|s| s.venue_id)
        .collect();
    let venues = if venue_ids.is_empty() {
        vec![]
    } else {
        venue::Entity::find()
            .filter(venue::Column::Id.is_in(venue_ids))
            .all(db)
            .await
            .map_err(StoreError::from)?
    };

    let entry = |s: &show::Model| {
        venues.iter().find(|v| v.id == s.venue_id).map(|v| ArtistShowEntry {
            venue_id: v.id,
            venue_name: v.name.clone(),
            venue_image_link: v.image_link.clone(),
            start_time: shows::format_start_time(&s.start_time),
        })
    };
    let past_shows: Vec<ArtistShowEntry> = classified.past.iter().filter_map(entry).collect();
    let upcoming_shows: Vec<ArtistShowEntry> =
        classified.upcoming.iter().filter_map(entry).collect();

    Ok(ArtistDetail {
        id: artist.id,
        name: artist.name,
        genres: split_genres(&artist.genres),
        city: artist.city,
        state: artist.state,
        phone: artist.phone,
        website: artist.website,
        facebook_link: artist.facebook_link,
        image_link: artist.image_link,
        seeking_venue: artist.seeking_venue,
        seeking_description: artist.seeking_description,
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    })
}

/// Every show joined with both parties, ordered by start time.
pub async fn list_shows(db: &DatabaseConnection) -> Result<Vec<ShowListing>, StoreError> {
    let all_shows = show::Entity::find()
        .order_by_asc(show::Column::StartTime)
        .all(db)
        .await
        .map_err(StoreError::from)?;

    let artist_ids: Vec<i32> = all_shows.iter().map(|s| s.artist_id).collect();
    let venue_ids: Vec<i32> = all_shows.iter().map(|s| s.venue_id).collect();

    let artists = if artist_ids.is_empty() {
        vec![]
    } else {
        artist::Entity::find()
            .filter(artist::Column::Id.is_in(artist_ids))
            .all(db)
            .await
            .map_err(StoreError::from)?
    };
    let venues = if venue_ids.is_empty() {
        vec![]
    } else {
        venue::Entity::find()
            .filter(venue::Column::Id.is_in(venue_ids))
            .all(db)
            .await
            .map_err(StoreError::from)?
    };

    let listings = all_shows
        .iter()
        .filter_map(|s| {
            let a = artists.iter().find(|a| a.id == s.artist_id)?;
            let v = venues.iter().find(|v| v.id == s.venue_id)?;
            Some(ShowListing {
                venue_id: v.id,
                venue_name: v.name.clone(),
                artist_id: a.id,
                artist_name: a.name.clone(),
                artist_image_link: a.image_link.clone(),
                start_time: shows::format_start_time(&s.start_time),
            })
        })
        .collect();

    Ok(listings)
}

/// Split a comma-joined genre string into a list.
///
/// Empty input yields an empty list, not a single empty element.
pub(crate) fn split_genres(genres: &str) -> Vec<String> {
    genres
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i32, name: &str) -> DirectoryEntry {
        DirectoryEntry {
            id,
            name: name.into(),
            num_upcoming_shows: 0,
        }
    }

    #[test]
    fn test_grouping_preserves_first_seen_order() {
        let groups = group_by_locality(vec![
            ("San Francisco".into(), "CA".into(), entry(1, "The Fillmore")),
            ("New York".into(), "NY".into(), entry(2, "Bowery Ballroom")),
            ("San Francisco".into(), "CA".into(), entry(3, "The Chapel")),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].city, "San Francisco");
        assert_eq!(groups[0].venues.len(), 2);
        assert_eq!(groups[0].venues[0].name, "The Fillmore");
        assert_eq!(groups[0].venues[1].name, "The Chapel");
        assert_eq!(groups[1].city, "New York");
    }

    #[test]
    fn test_grouping_distinguishes_same_city_different_state() {
        let groups = group_by_locality(vec![
            ("Springfield".into(), "IL".into(), entry(1, "A")),
            ("Springfield".into(), "MA".into(), entry(2, "B")),
        ]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_grouping_empty_input() {
        assert!(group_by_locality(vec![]).is_empty());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50% off_deal"), "%50\\% off\\_deal%");
    }

    #[test]
    fn test_like_pattern_escapes_backslash_before_wildcards() {
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
        assert_eq!(like_pattern(r"\%"), r"%\\\%%");
    }

    #[test]
    fn test_like_pattern_empty_term_matches_all() {
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn test_split_genres() {
        assert_eq!(split_genres("Rock,Jazz"), vec!["Rock", "Jazz"]);
        assert_eq!(split_genres("Rock, Jazz"), vec!["Rock", "Jazz"]);
        assert_eq!(split_genres("Rock,"), vec!["Rock"]);
    }

    #[test]
    fn test_split_genres_empty_string() {
        assert!(split_genres("").is_empty());
        assert!(split_genres("  ").is_empty());
    }

    #[test]
    fn test_search_results_serialization() {
        let results = SearchResults {
            count: 1,
            data: vec![entry(7, "The Fillmore")],
        };
        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"][0]["id"], 7);
        assert_eq!(json["data"][0]["name"], "The Fillmore");
        assert_eq!(json["data"][0]["num_upcoming_shows"], 0);
    }

    #[test]
    fn test_venue_detail_serialization() {
        let detail = VenueDetail {
            id: 1,
            name: "The Fillmore".into(),
            genres: vec!["Rock".into(), "Jazz".into()],
            address: "1805 Geary Blvd".into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            phone: "4155551234".into(),
            website: None,
            facebook_link: None,
            image_link: Some("https://img.example.com/fillmore.jpg".into()),
            seeking_talent: true,
            seeking_description: Some("Always booking".into()),
            past_shows: vec![],
            upcoming_shows: vec![VenueShowEntry {
                artist_id: 2,
                artist_name: "Guns N Petals".into(),
                artist_image_link: None,
                start_time: "2023-06-15T19:30:00.000Z".into(),
            }],
            past_shows_count: 0,
            upcoming_shows_count: 1,
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["genres"], serde_json::json!(["Rock", "Jazz"]));
        assert_eq!(json["upcoming_shows_count"], 1);
        assert_eq!(
            json["upcoming_shows"][0]["start_time"],
            "2023-06-15T19:30:00.000Z"
        );
    }
}
