use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use amora_shared::errors::{AppError, AppResult};
use amora_shared::middleware::AccessUser;
use amora_shared::types::ApiResponse;

use crate::models::ProfileCard;
use crate::services::discovery::{self, CandidateFilter};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CardsQuery {
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub sex: Option<String>,
}

/// GET /cards — the discovery feed.
pub async fn cards(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
    Query(query): Query<CardsQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProfileCard>>>> {
    let defaults = CandidateFilter::default();
    let filter = CandidateFilter {
        age_min: query.age_min.unwrap_or(defaults.age_min),
        age_max: query.age_max.unwrap_or(defaults.age_max),
        sex: query.sex,
    };

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let cards = discovery::list_candidates(
        &mut conn,
        &state.storage,
        state.config.presign_ttl_secs,
        user.profile_id,
        &filter,
    )
    .await?;

    Ok(Json(ApiResponse::ok(cards)))
}
