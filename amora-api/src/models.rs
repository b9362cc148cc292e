use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{auth, dislikes, likes, messages, profiles};

// --- Profile ---

// Deliberately not Serialize: raw latitude/longitude must never reach a
// response body. Reads go through the typed projections below.
#[derive(Debug, Queryable, Identifiable, Clone)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: i32,
    pub name: String,
    pub birth: NaiveDate,
    pub sex: String,
    pub about: String,
    pub status: String,
    pub avatar: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Vec<String>,
    pub uploaded: i32,
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub name: String,
    pub birth: NaiveDate,
    pub sex: String,
    pub push_token: Option<String>,
}

#[derive(Debug, AsChangeset, Default)]
#[diesel(table_name = profiles)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub status: Option<String>,
    pub about: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub push_token: Option<String>,
}

// --- Auth ---

#[derive(Debug, Queryable, Identifiable, Clone)]
#[diesel(table_name = auth)]
pub struct Auth {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub profile_id: i32,
    pub verified: bool,
    pub sent: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = auth)]
pub struct NewAuth {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub profile_id: i32,
    pub sent: DateTime<Utc>,
}

// --- Like / Dislike ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = likes)]
pub struct Like {
    pub id: i32,
    pub initiator: i32,
    pub target: i32,
    pub matched: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub initiator: i32,
    pub target: i32,
}

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = dislikes)]
pub struct Dislike {
    pub id: i32,
    pub initiator: i32,
    pub target: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = dislikes)]
pub struct NewDislike {
    pub initiator: i32,
    pub target: i32,
}

// --- Message ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: i32,
    pub sender: i32,
    pub recipient: i32,
    pub body: String,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub sender: i32,
    pub recipient: i32,
    pub body: String,
    pub attachments: Vec<String>,
}

// --- Typed projections ---

/// Discovery-feed entry. Distance is present only when both sides carry
/// coordinates; coordinates themselves are never exposed.
#[derive(Debug, Serialize)]
pub struct ProfileCard {
    pub id: i32,
    pub name: String,
    pub age: i32,
    pub status: String,
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Full profile read (own profile or by id).
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: i32,
    pub name: String,
    pub age: i32,
    pub sex: String,
    pub about: String,
    pub status: String,
    pub avatar: Option<String>,
}

/// "Who likes me" entry.
#[derive(Debug, Serialize)]
pub struct LikeEntry {
    pub initiator: i32,
    pub matched: bool,
    pub created_at: DateTime<Utc>,
}

/// Outstanding dislike issued by the caller.
#[derive(Debug, Serialize)]
pub struct DislikeEntry {
    pub target: i32,
    pub created_at: DateTime<Utc>,
}

/// Message read with attachments resolved to time-limited URLs.
#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: i32,
    pub sender: i32,
    pub recipient: i32,
    pub body: String,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

// --- Request payloads ---

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub status: Option<String>,
    pub about: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub push_token: Option<String>,
}
