//! League match, Side, and the score-derived winner predicate.

use crate::models::participant::{ParticipantId, ParticipantKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// One of the two competing groups in a match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    One,
    Two,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }

    /// The side with the higher score, or None on a tie.
    pub fn from_scores<T: Ord>(score_1: T, score_2: T) -> Option<Side> {
        match score_1.cmp(&score_2) {
            std::cmp::Ordering::Greater => Some(Side::One),
            std::cmp::Ordering::Less => Some(Side::Two),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

/// A single league match between two sides of one or more participants.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LeagueMatch {
    pub id: MatchId,
    #[serde(default)]
    pub kind: ParticipantKind,
    pub side_1: Vec<ParticipantId>,
    pub side_2: Vec<ParticipantId>,
    pub score_1: i32,
    pub score_2: i32,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    /// When the result was recorded; preferred over `created_at` for ordering.
    pub completed_at: Option<DateTime<Utc>>,
    /// Winner as stored by the surrounding system. Never trusted over the score.
    pub declared_winner: Option<Side>,
}

impl LeagueMatch {
    /// A completed match recorded at `completed_at`, with the winner declared from the score.
    pub fn completed(
        side_1: Vec<ParticipantId>,
        side_2: Vec<ParticipantId>,
        score_1: i32,
        score_2: i32,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ParticipantKind::Player,
            side_1,
            side_2,
            score_1,
            score_2,
            status: MatchStatus::Completed,
            created_at: completed_at,
            completed_at: Some(completed_at),
            declared_winner: Side::from_scores(score_1, score_2),
        }
    }

    pub fn with_kind(mut self, kind: ParticipantKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_declared_winner(mut self, winner: Option<Side>) -> Self {
        self.declared_winner = winner;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Chronological ordering key.
    pub fn effective_at(&self) -> DateTime<Utc> {
        self.completed_at.unwrap_or(self.created_at)
    }

    pub fn roster(&self, side: Side) -> &[ParticipantId] {
        match side {
            Side::One => &self.side_1,
            Side::Two => &self.side_2,
        }
    }

    pub fn score(&self, side: Side) -> i32 {
        match side {
            Side::One => self.score_1,
            Side::Two => self.score_2,
        }
    }

    /// Which side the participant played on, if any.
    pub fn side_of(&self, participant_id: ParticipantId) -> Option<Side> {
        if self.side_1.contains(&participant_id) {
            Some(Side::One)
        } else if self.side_2.contains(&participant_id) {
            Some(Side::Two)
        } else {
            None
        }
    }

    /// Winner derived from the scores alone.
    pub fn winning_side(&self) -> Option<Side> {
        Side::from_scores(self.score_1, self.score_2)
    }
}

/// Whether `participant_id` won `game`, derived only from side membership and
/// score comparison. None if they did not play or the scores are tied.
pub fn won_side(game: &LeagueMatch, participant_id: ParticipantId) -> Option<bool> {
    let side = game.side_of(participant_id)?;
    game.winning_side().map(|winner| winner == side)
}
