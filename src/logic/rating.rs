//! ELO-style rating model: per-participant deltas for a single match.
//!
//! Each side is rated by the mean of its members. The outcome is binary
//! (win/loss, not margin of victory) and K is the same for everyone,
//! regardless of games played.

use crate::models::{ParticipantId, ParticipantKind, Side};
use serde::{Deserialize, Serialize};

/// Contract violations: a match reaching the model must have two non-empty
/// sides and two distinct non-negative scores.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum RatingError {
    #[error("Side {0:?} has no participants")]
    EmptySide(Side),
    #[error("Scores are tied at {0}; a rated match needs a winner")]
    EqualScores(i32),
    #[error("Negative score {score} for side {side:?}")]
    NegativeScore { side: Side, score: i32 },
}

/// K-factor and clamp bounds for one rating path.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RatingConfig {
    pub k_factor: u32,
    pub min_rating: i32,
    pub max_rating: i32,
}

/// Individual player ratings.
pub const PLAYER_RATING_CONFIG: RatingConfig = RatingConfig {
    k_factor: 32,
    min_rating: 800,
    max_rating: 2800,
};

/// Team ratings. Same K as players, lower ceiling.
pub const TEAM_RATING_CONFIG: RatingConfig = RatingConfig {
    k_factor: 32,
    min_rating: 800,
    max_rating: 2500,
};

impl RatingConfig {
    pub fn for_kind(kind: ParticipantKind) -> Self {
        match kind {
            ParticipantKind::Player => PLAYER_RATING_CONFIG,
            ParticipantKind::Team => TEAM_RATING_CONFIG,
        }
    }

    pub fn clamp(&self, rating: i32) -> i32 {
        rating.clamp(self.min_rating, self.max_rating)
    }
}

/// A participant with the rating to feed into the model.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RatedParticipant {
    pub id: ParticipantId,
    pub rating: i32,
}

impl RatedParticipant {
    pub fn new(id: ParticipantId, rating: i32) -> Self {
        Self { id, rating }
    }
}

/// One participant's change from a single match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub participant_id: ParticipantId,
    pub side: Side,
    pub old_rating: i32,
    /// `old_rating + delta`, clamped.
    pub new_rating: i32,
    /// Unclamped delta from the model.
    pub delta: i32,
    pub opponent_avg_rating: i32,
    pub won: bool,
}

impl RatingChange {
    /// What actually moved after clamping.
    pub fn applied_delta(&self) -> i32 {
        self.new_rating.saturating_sub(self.old_rating)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRatingResult {
    pub winner: Side,
    pub side_1_rating: f64,
    pub side_2_rating: f64,
    /// Expected score of side one; side two's is the complement.
    pub expected_1: f64,
    /// Side one's members first, then side two's, in roster order.
    pub changes: Vec<RatingChange>,
}

impl MatchRatingResult {
    pub fn change_for(&self, participant_id: ParticipantId) -> Option<&RatingChange> {
        self.changes.iter().find(|c| c.participant_id == participant_id)
    }
}

/// Expected score of a side rated `rating_a` against one rated `rating_b`.
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / 400.0))
}

fn side_rating(side: &[RatedParticipant]) -> f64 {
    let total: i64 = side.iter().map(|p| p.rating as i64).sum();
    total as f64 / side.len() as f64
}

/// Check the model's preconditions and return the winning side.
pub fn validate_result(
    side_1_len: usize,
    side_2_len: usize,
    score_1: i32,
    score_2: i32,
) -> Result<Side, RatingError> {
    if side_1_len == 0 {
        return Err(RatingError::EmptySide(Side::One));
    }
    if side_2_len == 0 {
        return Err(RatingError::EmptySide(Side::Two));
    }
    if score_1 < 0 {
        return Err(RatingError::NegativeScore { side: Side::One, score: score_1 });
    }
    if score_2 < 0 {
        return Err(RatingError::NegativeScore { side: Side::Two, score: score_2 });
    }
    Side::from_scores(score_1, score_2).ok_or(RatingError::EqualScores(score_1))
}

/// Compute every participant's rating change for one match.
///
/// `won` is derived only from side membership and the score comparison. Every
/// member of a side receives the same delta; clamping is applied after the
/// delta is computed.
pub fn compute_match_deltas(
    config: &RatingConfig,
    side_1: &[RatedParticipant],
    side_2: &[RatedParticipant],
    score_1: i32,
    score_2: i32,
) -> Result<MatchRatingResult, RatingError> {
    let winner = validate_result(side_1.len(), side_2.len(), score_1, score_2)?;

    let side_1_rating = side_rating(side_1);
    let side_2_rating = side_rating(side_2);
    let expected_1 = expected_score(side_1_rating, side_2_rating);
    let k = config.k_factor as f64;

    let mut changes = Vec::with_capacity(side_1.len() + side_2.len());
    for (side, members, expected, opponent_rating) in [
        (Side::One, side_1, expected_1, side_2_rating),
        (Side::Two, side_2, 1.0 - expected_1, side_1_rating),
    ] {
        let won = side == winner;
        let actual = if won { 1.0 } else { 0.0 };
        let delta = (k * (actual - expected)).round() as i32;
        for member in members {
            changes.push(RatingChange {
                participant_id: member.id,
                side,
                old_rating: member.rating,
                new_rating: config.clamp(member.rating.saturating_add(delta)),
                delta,
                opponent_avg_rating: opponent_rating.round() as i32,
                won,
            });
        }
    }

    Ok(MatchRatingResult {
        winner,
        side_1_rating,
        side_2_rating,
        expected_1,
        changes,
    })
}
