//! Data structures for the league: participants, matches, rating history, brackets.

mod game;
mod history;
mod participant;
mod tournament;

pub use game::{won_side, LeagueMatch, MatchId, MatchStatus, Side};
pub use history::RatingHistoryRecord;
pub use participant::{
    Outcome, Participant, ParticipantId, ParticipantKind, ParticipantUpdate, SkillTier,
    DEFAULT_RATING,
};
pub use tournament::{
    BracketMatch, BracketMatchStatus, BracketParticipant, Round, Tournament, TournamentError,
    TournamentId, TournamentState,
};
