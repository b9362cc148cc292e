//! Like/dislike/match state machine.
//!
//! State per ordered profile pair is NONE, LIKED, or DISLIKED; MATCHED is a
//! property of a liked edge, set when both directions hold a like. The
//! engine resolves every call to a plan over the current edges and executes
//! the plan in a single transaction, so after any call sequence at most one
//! directional edge (like XOR dislike) exists per direction.

use axum::http::StatusCode;
use diesel::dsl;
use diesel::prelude::*;
use serde::Serialize;

use amora_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Dislike, DislikeEntry, Like, LikeEntry, NewDislike, NewLike};
use crate::schema::{dislikes, likes, profiles};

/// Externally visible result of a like/dislike call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AffinityOutcome {
    Liked,
    #[serde(rename = "match")]
    Matched,
    Disliked,
    Deleted,
}

impl AffinityOutcome {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Liked | Self::Disliked => StatusCode::CREATED,
            Self::Matched => StatusCode::OK,
            Self::Deleted => StatusCode::ACCEPTED,
        }
    }
}

// --- Pure transition rules ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LikeAction {
    /// Repeat like toggles the edge off.
    RemoveLike,
    /// Reverse like already exists: flag it matched, create nothing.
    MarkReverseMatched,
    CreateLike { remove_dislike: bool },
}

pub(crate) fn resolve_like(
    has_forward_like: bool,
    has_reverse_like: bool,
    has_forward_dislike: bool,
) -> LikeAction {
    if has_forward_like {
        LikeAction::RemoveLike
    } else if has_reverse_like {
        LikeAction::MarkReverseMatched
    } else {
        LikeAction::CreateLike {
            remove_dislike: has_forward_dislike,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DislikeAction {
    RemoveDislike,
    CreateDislike { remove_like: bool },
}

pub(crate) fn resolve_dislike(has_forward_dislike: bool, has_forward_like: bool) -> DislikeAction {
    if has_forward_dislike {
        DislikeAction::RemoveDislike
    } else {
        DislikeAction::CreateDislike {
            remove_like: has_forward_like,
        }
    }
}

// --- Engine ---

/// A profile can never like or dislike itself.
fn ensure_distinct(initiator: i32, target: i32) -> AppResult<()> {
    if initiator == target {
        return Err(AppError::new(ErrorCode::SelfReference, "cannot target yourself"));
    }
    Ok(())
}

pub fn set_like(conn: &mut PgConnection, initiator: i32, target: i32) -> AppResult<AffinityOutcome> {
    ensure_distinct(initiator, target)?;
    match run_like(conn, initiator, target) {
        // Lost an insert race: the edge now exists, rerun as a toggle.
        Err(e) if e.is_unique_violation() => run_like(conn, initiator, target),
        other => other,
    }
}

pub fn set_dislike(
    conn: &mut PgConnection,
    initiator: i32,
    target: i32,
) -> AppResult<AffinityOutcome> {
    ensure_distinct(initiator, target)?;
    match run_dislike(conn, initiator, target) {
        Err(e) if e.is_unique_violation() => run_dislike(conn, initiator, target),
        other => other,
    }
}

fn run_like(conn: &mut PgConnection, initiator: i32, target: i32) -> AppResult<AffinityOutcome> {
    conn.transaction(|conn| {
        lock_pair(conn, initiator, target)?;

        let forward = has_like(conn, initiator, target)?;
        let reverse = has_like(conn, target, initiator)?;
        let forward_dislike = has_dislike(conn, initiator, target)?;

        match resolve_like(forward, reverse, forward_dislike) {
            LikeAction::RemoveLike => {
                diesel::delete(like_edge(initiator, target)).execute(conn)?;
                Ok(AffinityOutcome::Deleted)
            }
            LikeAction::MarkReverseMatched => {
                diesel::update(like_edge(target, initiator))
                    .set(likes::matched.eq(true))
                    .execute(conn)?;
                Ok(AffinityOutcome::Matched)
            }
            LikeAction::CreateLike { remove_dislike } => {
                if remove_dislike {
                    diesel::delete(dislike_edge(initiator, target)).execute(conn)?;
                }
                diesel::insert_into(likes::table)
                    .values(&NewLike { initiator, target })
                    .execute(conn)?;
                Ok(AffinityOutcome::Liked)
            }
        }
    })
}

fn run_dislike(conn: &mut PgConnection, initiator: i32, target: i32) -> AppResult<AffinityOutcome> {
    conn.transaction(|conn| {
        lock_pair(conn, initiator, target)?;

        let forward_dislike = has_dislike(conn, initiator, target)?;
        let forward_like = has_like(conn, initiator, target)?;

        match resolve_dislike(forward_dislike, forward_like) {
            DislikeAction::RemoveDislike => {
                diesel::delete(dislike_edge(initiator, target)).execute(conn)?;
                Ok(AffinityOutcome::Deleted)
            }
            DislikeAction::CreateDislike { remove_like } => {
                if remove_like {
                    diesel::delete(like_edge(initiator, target)).execute(conn)?;
                }
                diesel::insert_into(dislikes::table)
                    .values(&NewDislike { initiator, target })
                    .execute(conn)?;
                Ok(AffinityOutcome::Disliked)
            }
        }
    })
}

/// Lock both profile rows in ascending id order.
///
/// Serializes concurrent like/dislike traffic on the pair (both directions
/// take the same locks), which is what makes the read-resolve-execute plan
/// above race-free, and doubles as the target existence check.
fn lock_pair(conn: &mut PgConnection, initiator: i32, target: i32) -> AppResult<()> {
    let locked: Vec<i32> = profiles::table
        .filter(profiles::id.eq_any(vec![initiator, target]))
        .order(profiles::id.asc())
        .select(profiles::id)
        .for_update()
        .load(conn)?;

    if !locked.contains(&target) {
        return Err(AppError::new(ErrorCode::ProfileNotFound, "target profile not found"));
    }
    if !locked.contains(&initiator) {
        return Err(AppError::new(ErrorCode::ProfileNotFound, "profile not found"));
    }
    Ok(())
}

type LikeEdge = dsl::Filter<likes::table, dsl::And<dsl::Eq<likes::initiator, i32>, dsl::Eq<likes::target, i32>>>;
type DislikeEdge = dsl::Filter<dislikes::table, dsl::And<dsl::Eq<dislikes::initiator, i32>, dsl::Eq<dislikes::target, i32>>>;

/// The directional like edge initiator -> target, as a reusable filter.
fn like_edge(initiator: i32, target: i32) -> LikeEdge {
    likes::table.filter(likes::initiator.eq(initiator).and(likes::target.eq(target)))
}

fn dislike_edge(initiator: i32, target: i32) -> DislikeEdge {
    dislikes::table.filter(dislikes::initiator.eq(initiator).and(dislikes::target.eq(target)))
}

fn has_like(conn: &mut PgConnection, initiator: i32, target: i32) -> AppResult<bool> {
    Ok(diesel::select(dsl::exists(like_edge(initiator, target))).get_result(conn)?)
}

fn has_dislike(conn: &mut PgConnection, initiator: i32, target: i32) -> AppResult<bool> {
    Ok(diesel::select(dsl::exists(dislike_edge(initiator, target))).get_result(conn)?)
}

// --- Queries ---

/// Outstanding likes targeting `id` ("who likes me").
pub fn list_likes(conn: &mut PgConnection, id: i32) -> AppResult<Vec<LikeEntry>> {
    let edges = likes::table
        .filter(likes::target.eq(id))
        .order(likes::created_at.asc())
        .load::<Like>(conn)?;

    Ok(edges
        .into_iter()
        .map(|l| LikeEntry {
            initiator: l.initiator,
            matched: l.matched,
            created_at: l.created_at,
        })
        .collect())
}

/// Outstanding dislikes issued by `id`.
pub fn list_dislikes(conn: &mut PgConnection, id: i32) -> AppResult<Vec<DislikeEntry>> {
    let edges = dislikes::table
        .filter(dislikes::initiator.eq(id))
        .order(dislikes::created_at.asc())
        .load::<Dislike>(conn)?;

    Ok(edges
        .into_iter()
        .map(|d| DislikeEntry {
            target: d.target,
            created_at: d.created_at,
        })
        .collect())
}

/// Remove every like/dislike edge touching `id`, in either direction.
/// Runs inside the account-deletion transaction.
pub fn delete_edges_for(conn: &mut PgConnection, id: i32) -> AppResult<()> {
    diesel::delete(likes::table.filter(likes::initiator.eq(id).or(likes::target.eq(id))))
        .execute(conn)?;
    diesel::delete(dislikes::table.filter(dislikes::initiator.eq(id).or(dislikes::target.eq(id))))
        .execute(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Transition table for the ordered pair (A, B). Columns:
    // forward like, reverse like, forward dislike.

    #[test]
    fn plain_like_on_empty_state() {
        assert_eq!(
            resolve_like(false, false, false),
            LikeAction::CreateLike { remove_dislike: false }
        );
    }

    #[test]
    fn repeat_like_toggles_off() {
        assert_eq!(resolve_like(true, false, false), LikeAction::RemoveLike);
        // toggle-off wins even if the reverse side likes us
        assert_eq!(resolve_like(true, true, false), LikeAction::RemoveLike);
    }

    #[test]
    fn reverse_like_becomes_match() {
        assert_eq!(resolve_like(false, true, false), LikeAction::MarkReverseMatched);
    }

    #[test]
    fn match_is_order_independent() {
        // A likes B first, then B likes A: from B's perspective the reverse
        // edge exists. Swapping the call order gives A the same view, so
        // both orders terminate in MarkReverseMatched with a single flagged
        // edge and no duplicate insert.
        let second_caller = resolve_like(false, true, false);
        assert_eq!(second_caller, LikeAction::MarkReverseMatched);
    }

    #[test]
    fn like_replaces_existing_dislike() {
        assert_eq!(
            resolve_like(false, false, true),
            LikeAction::CreateLike { remove_dislike: true }
        );
    }

    #[test]
    fn repeat_dislike_toggles_off() {
        assert_eq!(resolve_dislike(true, false), DislikeAction::RemoveDislike);
    }

    #[test]
    fn dislike_replaces_existing_like() {
        assert_eq!(
            resolve_dislike(false, true),
            DislikeAction::CreateDislike { remove_like: true }
        );
        assert_eq!(
            resolve_dislike(false, false),
            DislikeAction::CreateDislike { remove_like: false }
        );
    }

    #[test]
    fn directional_exclusivity_holds_across_sequences() {
        // Any sequence of signals for one direction resolves to a plan that
        // leaves at most one edge: every Create* removes the opposite kind.
        for &(fl, fd) in &[(false, false), (true, false), (false, true)] {
            match resolve_like(fl, false, fd) {
                LikeAction::RemoveLike => assert!(fl),
                LikeAction::CreateLike { remove_dislike } => assert_eq!(remove_dislike, fd),
                LikeAction::MarkReverseMatched => unreachable!(),
            }
            match resolve_dislike(fd, fl) {
                DislikeAction::RemoveDislike => assert!(fd),
                DislikeAction::CreateDislike { remove_like } => assert_eq!(remove_like, fl),
            }
        }
    }

    #[test]
    fn self_reference_rejected() {
        let err = ensure_distinct(3, 3).unwrap_err();
        assert!(matches!(
            err,
            AppError::Known { code: ErrorCode::SelfReference, .. }
        ));
        assert!(ensure_distinct(3, 4).is_ok());
    }

    #[test]
    fn outcome_wire_words() {
        assert_eq!(serde_json::to_string(&AffinityOutcome::Liked).unwrap(), r#""liked""#);
        assert_eq!(serde_json::to_string(&AffinityOutcome::Matched).unwrap(), r#""match""#);
        assert_eq!(serde_json::to_string(&AffinityOutcome::Disliked).unwrap(), r#""disliked""#);
        assert_eq!(serde_json::to_string(&AffinityOutcome::Deleted).unwrap(), r#""deleted""#);
    }

    #[test]
    fn outcome_status_contract() {
        assert_eq!(AffinityOutcome::Liked.status_code(), StatusCode::CREATED);
        assert_eq!(AffinityOutcome::Disliked.status_code(), StatusCode::CREATED);
        assert_eq!(AffinityOutcome::Matched.status_code(), StatusCode::OK);
        assert_eq!(AffinityOutcome::Deleted.status_code(), StatusCode::ACCEPTED);
    }
}
