use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::scoring::{MatchScore, MatchScorer};
use crate::{AthleteProfile, ClubProfile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub candidate_id: String,
    pub score: MatchScore,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankingOptions {
    /// Keep at most this many results after sorting.
    pub limit: Option<usize>,
    /// Drop candidates whose total is below this value.
    pub min_total_score: u8,
}

/// Ranks one side of the market against the other. Each pair is scored
/// independently on the rayon pool.
#[derive(Clone, Default)]
pub struct MatchingEngine {
    scorer: MatchScorer,
}

impl MatchingEngine {
    pub fn new(scorer: MatchScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &MatchScorer {
        &self.scorer
    }

    pub fn score_pair(&self, athlete: &AthleteProfile, club: &ClubProfile) -> MatchScore {
        self.scorer.calculate_match_score(athlete, club)
    }

    /// Clubs not actively recruiting, or playing another sport, are skipped.
    pub fn rank_clubs_for_athlete(
        &self,
        athlete: &AthleteProfile,
        clubs: &[ClubProfile],
        options: &RankingOptions,
    ) -> Vec<RankedMatch> {
        let ranked: Vec<RankedMatch> = clubs
            .par_iter()
            .filter(|club| club.active_recruitment && sports_compatible(athlete, club))
            .map(|club| RankedMatch {
                candidate_id: club.id.clone(),
                score: self.scorer.calculate_match_score(athlete, club),
            })
            .collect();

        let ranked = finalize(ranked, options);
        info!(
            athlete_id = %athlete.id,
            candidates = clubs.len(),
            ranked = ranked.len(),
            "ranked clubs for athlete"
        );
        ranked
    }

    /// Athletes playing another sport are skipped.
    pub fn rank_athletes_for_club(
        &self,
        club: &ClubProfile,
        athletes: &[AthleteProfile],
        options: &RankingOptions,
    ) -> Vec<RankedMatch> {
        let ranked: Vec<RankedMatch> = athletes
            .par_iter()
            .filter(|athlete| sports_compatible(athlete, club))
            .map(|athlete| RankedMatch {
                candidate_id: athlete.id.clone(),
                score: self.scorer.calculate_match_score(athlete, club),
            })
            .collect();

        let ranked = finalize(ranked, options);
        info!(
            club_id = %club.id,
            candidates = athletes.len(),
            ranked = ranked.len(),
            "ranked athletes for club"
        );
        ranked
    }
}

/// Sports only disqualify a pair when both sides declare one and they differ.
pub fn sports_compatible(athlete: &AthleteProfile, club: &ClubProfile) -> bool {
    match (athlete.sport.as_deref(), club.sport.as_deref()) {
        (Some(a), Some(c)) => a.trim().eq_ignore_ascii_case(c.trim()),
        _ => true,
    }
}

fn finalize(mut ranked: Vec<RankedMatch>, options: &RankingOptions) -> Vec<RankedMatch> {
    ranked.retain(|m| m.score.total_score >= options.min_total_score);
    ranked.sort_by(compare_ranked);
    if let Some(limit) = options.limit {
        ranked.truncate(limit);
    }
    ranked
}

/// Total descending, then candidate id ascending.
fn compare_ranked(a: &RankedMatch, b: &RankedMatch) -> Ordering {
    b.score
        .total_score
        .cmp(&a.score.total_score)
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}
