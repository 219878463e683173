//! Participant (player or team) and the aggregate update written back after a replay.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player or a team.
pub type ParticipantId = Uuid;

/// Rating given to a participant with no tier and no history.
pub const DEFAULT_RATING: i32 = 1500;

/// Whether a participant is an individual player or a team.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    #[default]
    Player,
    Team,
}

/// Self-declared skill tier. Only used to seed the very first rating.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillTier {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl SkillTier {
    pub fn initial_rating(self) -> i32 {
        match self {
            SkillTier::Advanced => 1800,
            SkillTier::Beginner => 1200,
            SkillTier::Intermediate => DEFAULT_RATING,
        }
    }
}

/// A player or team as stored by the league. The core reads these and writes
/// back ratings and counters, it never creates or deletes them.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default)]
    pub kind: ParticipantKind,
    pub current_rating: i32,
    /// None when the tier was never set; seeds like `Intermediate`.
    #[serde(default)]
    pub skill_tier: Option<SkillTier>,
    #[serde(default)]
    pub matches_played: u32,
    #[serde(default)]
    pub matches_won: u32,
    #[serde(default)]
    pub league_points: u32,
    #[serde(default)]
    pub total_points_scored: u32,
    /// Rated games behind `current_rating`.
    #[serde(default)]
    pub games_played: u32,
}

impl Participant {
    /// Create a new player with the default rating and zeroed counters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: ParticipantKind::Player,
            current_rating: DEFAULT_RATING,
            skill_tier: None,
            matches_played: 0,
            matches_won: 0,
            league_points: 0,
            total_points_scored: 0,
            games_played: 0,
        }
    }

    /// Create a new team with the default rating and zeroed counters.
    pub fn new_team(name: impl Into<String>) -> Self {
        Self {
            kind: ParticipantKind::Team,
            ..Self::new(name)
        }
    }

    pub fn with_rating(mut self, rating: i32) -> Self {
        self.current_rating = rating;
        self
    }

    pub fn with_tier(mut self, tier: SkillTier) -> Self {
        self.skill_tier = Some(tier);
        self.current_rating = tier.initial_rating();
        self
    }

    /// Rating a replay starts from, before any match is applied.
    pub fn seed_rating(&self) -> i32 {
        self.skill_tier.unwrap_or_default().initial_rating()
    }

    /// Overwrite the materialized aggregates with a recomputed update.
    pub fn apply_update(&mut self, update: &ParticipantUpdate) {
        self.current_rating = update.current_rating;
        self.games_played = update.games_played;
        self.matches_played = update.matches_played;
        self.matches_won = update.matches_won;
        self.league_points = update.league_points;
        self.total_points_scored = update.total_points_scored;
    }
}

/// Win or loss from one participant's point of view.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn from_won(won: bool) -> Self {
        if won {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }
}

/// Aggregates recomputed for one participant by a replay (last-writer-wins).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParticipantUpdate {
    pub participant_id: ParticipantId,
    pub current_rating: i32,
    pub games_played: u32,
    pub matches_played: u32,
    pub matches_won: u32,
    pub league_points: u32,
    pub total_points_scored: u32,
    /// Up to the last 10 outcomes, oldest first.
    pub recent_form: Vec<Outcome>,
}
