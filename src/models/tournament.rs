//! Single-elimination bracket: seeded entries, bracket matches, rounds, and the tournament.

use crate::models::game::Side;
use crate::models::participant::{Participant, ParticipantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during bracket operations.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TournamentError {
    #[error("Need at least 2 participants to seed a bracket (got {found})")]
    NotEnoughParticipants { found: usize },
    #[error("Participant {0} is listed more than once")]
    DuplicateParticipant(ParticipantId),
    #[error("A bracket needs a power-of-two number of slots, at least 2 (got {0})")]
    InvalidSlotCount(usize),
    /// A result was submitted for a match that is not pending.
    #[error("Round {round} match {match_index} is {status:?}; only pending matches accept results")]
    InvalidState {
        round: u32,
        match_index: usize,
        status: BracketMatchStatus,
    },
    #[error("Scores must be non-negative and not equal (got {score_1}-{score_2})")]
    InvalidScores { score_1: i32, score_2: i32 },
    #[error("No match at round {round} index {match_index}")]
    MatchNotFound { round: u32, match_index: usize },
    #[error("Tournament {0} not found")]
    TournamentNotFound(TournamentId),
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// A bracket slot: a seeded participant, or a bye padding the field to a power of two.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketParticipant {
    pub participant_id: Option<ParticipantId>,
    pub name: Option<String>,
    pub rating: Option<i32>,
    /// Rank by rating, 1 = highest. Byes have no seed.
    pub seed: Option<u32>,
    pub is_bye: bool,
}

impl BracketParticipant {
    pub fn seeded(participant: &Participant, seed: u32) -> Self {
        Self {
            participant_id: Some(participant.id),
            name: Some(participant.name.clone()),
            rating: Some(participant.current_rating),
            seed: Some(seed),
            is_bye: false,
        }
    }

    pub fn bye() -> Self {
        Self {
            participant_id: None,
            name: None,
            rating: None,
            seed: None,
            is_bye: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketMatchStatus {
    /// At least one feeding match has no winner yet.
    #[default]
    Waiting,
    /// Both sides known; awaiting a result.
    Pending,
    Completed,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub tournament_id: TournamentId,
    /// 1-based.
    pub round: u32,
    /// Position within the round; matches skipped for lack of entrants leave gaps.
    pub match_index: usize,
    /// None until the feeding match completes.
    pub side_1: Option<BracketParticipant>,
    pub side_2: Option<BracketParticipant>,
    pub score_1: Option<i32>,
    pub score_2: Option<i32>,
    pub winner: Option<Side>,
    pub status: BracketMatchStatus,
}

impl BracketMatch {
    pub fn new(tournament_id: TournamentId, round: u32, match_index: usize) -> Self {
        Self {
            tournament_id,
            round,
            match_index,
            side_1: None,
            side_2: None,
            score_1: None,
            score_2: None,
            winner: None,
            status: BracketMatchStatus::Waiting,
        }
    }

    pub fn slot(&self, side: Side) -> Option<&BracketParticipant> {
        match side {
            Side::One => self.side_1.as_ref(),
            Side::Two => self.side_2.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, side: Side) -> &mut Option<BracketParticipant> {
        match side {
            Side::One => &mut self.side_1,
            Side::Two => &mut self.side_2,
        }
    }

    pub fn winner_participant(&self) -> Option<&BracketParticipant> {
        self.winner.and_then(|side| self.slot(side))
    }

    pub fn winner_id(&self) -> Option<ParticipantId> {
        self.winner_participant().and_then(|p| p.participant_id)
    }

    pub fn is_completed(&self) -> bool {
        self.status == BracketMatchStatus::Completed
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub title: String,
    pub matches: Vec<BracketMatch>,
}

impl Round {
    pub fn match_at(&self, match_index: usize) -> Option<&BracketMatch> {
        self.matches.iter().find(|m| m.match_index == match_index)
    }

    pub fn match_at_mut(&mut self, match_index: usize) -> Option<&mut BracketMatch> {
        self.matches.iter_mut().find(|m| m.match_index == match_index)
    }

    pub fn is_completed(&self) -> bool {
        self.matches.iter().all(BracketMatch::is_completed)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentState {
    #[default]
    InProgress,
    /// The final has a result; `champion` is set.
    Completed,
}

/// Full bracket state: seeded slots, every round, and the champion once decided.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    /// Positional slots from seeding (slot 2i meets slot 2i+1 in round 1).
    pub slots: Vec<BracketParticipant>,
    pub rounds: Vec<Round>,
    pub state: TournamentState,
    pub champion: Option<BracketParticipant>,
}

impl Tournament {
    pub fn round(&self, number: u32) -> Option<&Round> {
        self.rounds.iter().find(|r| r.number == number)
    }

    pub fn find_match(&self, round: u32, match_index: usize) -> Option<&BracketMatch> {
        self.round(round).and_then(|r| r.match_at(match_index))
    }

    pub fn find_match_mut(&mut self, round: u32, match_index: usize) -> Option<&mut BracketMatch> {
        self.rounds
            .iter_mut()
            .find(|r| r.number == round)
            .and_then(|r| r.match_at_mut(match_index))
    }

    pub fn total_rounds(&self) -> u32 {
        self.rounds.len() as u32
    }

    pub fn final_match(&self) -> Option<&BracketMatch> {
        self.rounds.last().and_then(|r| r.matches.first())
    }

    /// Lowest round that still has an unfinished match.
    pub fn current_round(&self) -> Option<u32> {
        self.rounds.iter().find(|r| !r.is_completed()).map(|r| r.number)
    }

    /// Matches currently awaiting a result.
    pub fn pending_matches(&self) -> impl Iterator<Item = &BracketMatch> {
        self.rounds
            .iter()
            .flat_map(|r| r.matches.iter())
            .filter(|m| m.status == BracketMatchStatus::Pending)
    }
}
