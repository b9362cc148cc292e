//! Candidate selection for the discovery feed.
//!
//! Filters the profile universe by requester exclusion, derived-age range,
//! and optional sex, then annotates each card with a great-circle distance
//! when both sides carry coordinates. No scoring or ranking; results come
//! back in natural store order.

use chrono::NaiveDate;
use diesel::prelude::*;

use amora_shared::clients::storage::StorageClient;
use amora_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Profile, ProfileCard};
use crate::schema::profiles;
use crate::services::{credential_service, media};

#[derive(Debug, Clone)]
pub struct CandidateFilter {
    pub age_min: i32,
    pub age_max: i32,
    pub sex: Option<String>,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        // effectively unbounded
        Self {
            age_min: 0,
            age_max: 2000,
            sex: None,
        }
    }
}

/// Haversine distance in km between two (lat, lng) points.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let (lat1, lng1) = a;
    let (lat2, lng2) = b;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_KM * c
}

pub fn distance_between(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(haversine_km(a, b)),
        _ => None,
    }
}

pub(crate) fn passes_filter(
    candidate: &Profile,
    requester_id: i32,
    filter: &CandidateFilter,
    today: NaiveDate,
) -> bool {
    if candidate.id == requester_id {
        return false;
    }
    let age = credential_service::derived_age(candidate.birth, today);
    if age < filter.age_min || age > filter.age_max {
        return false;
    }
    if let Some(sex) = &filter.sex {
        if &candidate.sex != sex {
            return false;
        }
    }
    true
}

/// Assemble the discovery feed for a requester.
pub async fn list_candidates(
    conn: &mut PgConnection,
    storage: &StorageClient,
    presign_ttl: u64,
    requester_id: i32,
    filter: &CandidateFilter,
) -> AppResult<Vec<ProfileCard>> {
    let requester = profiles::table
        .find(requester_id)
        .first::<Profile>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;
    let requester_coords = requester.coordinates();

    let universe = profiles::table
        .filter(profiles::id.ne(requester_id))
        .load::<Profile>(conn)?;

    let today = chrono::Utc::now().date_naive();
    let mut cards = Vec::new();

    for candidate in universe {
        if !passes_filter(&candidate, requester_id, filter, today) {
            continue;
        }

        let avatar = if candidate.avatar {
            storage
                .presigned_url(
                    &storage.avatars_bucket,
                    &media::avatar_key(candidate.id),
                    presign_ttl,
                )
                .await
                .ok()
        } else {
            None
        };

        cards.push(ProfileCard {
            id: candidate.id,
            name: candidate.name.clone(),
            age: credential_service::derived_age(candidate.birth, today),
            status: candidate.status.clone(),
            avatar,
            distance_km: distance_between(candidate.coordinates(), requester_coords),
        });
    }

    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile(id: i32, birth: NaiveDate, sex: &str) -> Profile {
        Profile {
            id,
            name: format!("p{id}"),
            birth,
            sex: sex.to_string(),
            about: String::new(),
            status: String::new(),
            avatar: false,
            latitude: None,
            longitude: None,
            images: vec![],
            uploaded: 0,
            push_token: None,
            created_at: Utc::now(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 23).unwrap()
    }

    #[test]
    fn requester_excluded() {
        let p = profile(5, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), "f");
        assert!(!passes_filter(&p, 5, &CandidateFilter::default(), today()));
        assert!(passes_filter(&p, 6, &CandidateFilter::default(), today()));
    }

    #[test]
    fn age_bounds_inclusive() {
        let p = profile(1, NaiveDate::from_ymd_opt(2000, 8, 23).unwrap(), "f");
        // derived age is 26 on 2026-08-23
        let filter = CandidateFilter { age_min: 26, age_max: 26, sex: None };
        assert!(passes_filter(&p, 2, &filter, today()));
        let filter = CandidateFilter { age_min: 27, age_max: 30, sex: None };
        assert!(!passes_filter(&p, 2, &filter, today()));
        let filter = CandidateFilter { age_min: 18, age_max: 25, sex: None };
        assert!(!passes_filter(&p, 2, &filter, today()));
    }

    #[test]
    fn sex_filter_optional() {
        let p = profile(1, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), "m");
        let mut filter = CandidateFilter::default();
        assert!(passes_filter(&p, 2, &filter, today()));
        filter.sex = Some("m".into());
        assert!(passes_filter(&p, 2, &filter, today()));
        filter.sex = Some("f".into());
        assert!(!passes_filter(&p, 2, &filter, today()));
    }

    #[test]
    fn distance_requires_both_coordinates() {
        assert!(distance_between(Some((48.85, 2.35)), None).is_none());
        assert!(distance_between(None, Some((48.85, 2.35))).is_none());
        assert!(distance_between(None, None).is_none());
        assert!(distance_between(Some((48.85, 2.35)), Some((51.51, -0.13))).is_some());
    }

    #[test]
    fn haversine_sanity() {
        // Paris <-> London is roughly 344 km
        let d = haversine_km((48.8566, 2.3522), (51.5074, -0.1278));
        assert!((300.0..400.0).contains(&d), "unexpected distance {d}");
        // identical points
        assert!(haversine_km((10.0, 10.0), (10.0, 10.0)).abs() < 1e-9);
    }

    #[test]
    fn card_serialization_never_carries_coordinates() {
        let card = ProfileCard {
            id: 1,
            name: "p1".into(),
            age: 26,
            status: String::new(),
            avatar: None,
            distance_km: Some(12.5),
        };
        let json = serde_json::to_value(&card).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert!(!keys.contains(&"latitude"));
        assert!(!keys.contains(&"longitude"));
        assert!(keys.contains(&"distance_km"));
    }
}
