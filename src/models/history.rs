//! Rating ledger rows.

use crate::models::game::MatchId;
use crate::models::participant::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One participant's rating change for one match. Append-only, unique per
/// `(participant_id, match_id)`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RatingHistoryRecord {
    pub participant_id: ParticipantId,
    pub match_id: MatchId,
    pub old_rating: i32,
    pub new_rating: i32,
    pub delta: i32,
    pub opponent_avg_rating: i32,
    /// Timestamp of the match, so a replay always yields the same row.
    pub created_at: DateTime<Utc>,
}

impl RatingHistoryRecord {
    pub fn key(&self) -> (ParticipantId, MatchId) {
        (self.participant_id, self.match_id)
    }

    /// Same rating transition, ignoring the timestamp.
    pub fn same_change_as(&self, other: &RatingHistoryRecord) -> bool {
        self.old_rating == other.old_rating
            && self.new_rating == other.new_rating
            && self.delta == other.delta
            && self.opponent_avg_rating == other.opponent_avg_rating
    }
}
