use axum::{Json, extract::State};
use mp_common::matching::{MatchScore, RankedMatch, RankingOptions};
use mp_common::{AthleteProfile, ClubProfile, run_id};
use serde::{Deserialize, Serialize};

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

pub const DEFAULT_RANK_LIMIT: usize = 50;
pub const MAX_RANK_LIMIT: usize = 200;
pub const MAX_CANDIDATES: usize = 5_000;

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub athlete: AthleteProfile,
    pub club: ClubProfile,
}

#[derive(Debug, Deserialize)]
pub struct RankClubsRequest {
    pub athlete: AthleteProfile,
    pub clubs: Vec<ClubProfile>,
    pub limit: Option<usize>,
    pub min_total_score: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct RankAthletesRequest {
    pub club: ClubProfile,
    pub athletes: Vec<AthleteProfile>,
    pub limit: Option<usize>,
    pub min_total_score: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct RankResponse {
    pub matches: Vec<RankedMatch>,
    pub candidates: usize,
    pub match_run_id: &'static str,
}

fn ranking_options(
    limit: Option<usize>,
    min_total_score: Option<u8>,
    candidates: usize,
) -> Result<RankingOptions, ApiError> {
    if candidates > MAX_CANDIDATES {
        return Err(ApiError::BadRequest(format!(
            "at most {MAX_CANDIDATES} candidates can be ranked per request"
        )));
    }

    let min_total_score = min_total_score.unwrap_or(0);
    if min_total_score > 100 {
        return Err(ApiError::BadRequest(
            "min_total_score must be between 0 and 100".into(),
        ));
    }

    Ok(RankingOptions {
        limit: Some(limit.unwrap_or(DEFAULT_RANK_LIMIT).clamp(1, MAX_RANK_LIMIT)),
        min_total_score,
    })
}

pub async fn score_pair(
    State(state): State<SharedState>,
    _user: AuthUser,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<MatchScore>, ApiError> {
    Ok(Json(state.engine.score_pair(&request.athlete, &request.club)))
}

pub async fn rank_clubs(
    State(state): State<SharedState>,
    _user: AuthUser,
    Json(request): Json<RankClubsRequest>,
) -> Result<Json<RankResponse>, ApiError> {
    let candidates = request.clubs.len();
    let options = ranking_options(request.limit, request.min_total_score, candidates)?;
    let engine = state.engine.clone();

    // Ranking fans out on the rayon pool; keep it off the async workers.
    let matches = tokio::task::spawn_blocking(move || {
        engine.rank_clubs_for_athlete(&request.athlete, &request.clubs, &options)
    })
    .await
    .map_err(|err| ApiError::Internal(format!("ranking task failed: {err}")))?;

    Ok(Json(RankResponse {
        matches,
        candidates,
        match_run_id: run_id::get(),
    }))
}

pub async fn rank_athletes(
    State(state): State<SharedState>,
    _user: AuthUser,
    Json(request): Json<RankAthletesRequest>,
) -> Result<Json<RankResponse>, ApiError> {
    let candidates = request.athletes.len();
    let options = ranking_options(request.limit, request.min_total_score, candidates)?;
    let engine = state.engine.clone();

    let matches = tokio::task::spawn_blocking(move || {
        engine.rank_athletes_for_club(&request.club, &request.athletes, &options)
    })
    .await
    .map_err(|err| ApiError::Internal(format!("ranking task failed: {err}")))?;

    Ok(Json(RankResponse {
        matches,
        candidates,
        match_run_id: run_id::get(),
    }))
}
