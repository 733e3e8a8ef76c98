use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::matching::{MatchScore, ScoreBreakdown};
use crate::run_id;

/// Where an athlete/club pairing stands in negotiation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    CounterOffered,
}

impl MatchStatus {
    pub fn is_final(self) -> bool {
        matches!(self, MatchStatus::Accepted | MatchStatus::Rejected)
    }

    /// Accepted and rejected are terminal; a counter-offer can be answered
    /// with another one.
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        !self.is_final() && next != MatchStatus::Pending
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("cannot move match from {from} to {to}")]
    InvalidTransition { from: MatchStatus, to: MatchStatus },
}

/// Persisted form of one computed match. Storage is up to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub athlete_id: String,
    pub club_id: String,
    pub total_score: u8,
    pub breakdown: ScoreBreakdown,
    pub reasoning: Vec<String>,
    pub status: MatchStatus,
    pub match_run_id: String,
    pub computed_at: DateTime<Utc>,
}

impl MatchRecord {
    /// Pending record stamped with the current run id and time.
    pub fn new(athlete_id: impl Into<String>, club_id: impl Into<String>, score: MatchScore) -> Self {
        Self {
            athlete_id: athlete_id.into(),
            club_id: club_id.into(),
            total_score: score.total_score,
            breakdown: score.breakdown,
            reasoning: score.reasoning,
            status: MatchStatus::Pending,
            match_run_id: run_id::get().to_string(),
            computed_at: Utc::now(),
        }
    }

    pub fn transition(&mut self, next: MatchStatus) -> Result<(), RecordError> {
        if !self.status.can_transition_to(next) {
            return Err(RecordError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
