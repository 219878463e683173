//! League ratings: ELO-style rating engine with full-history reconciliation,
//! and single-elimination brackets seeded by rating.

pub mod config;
pub mod logic;
pub mod models;
pub mod registry;
pub mod store;

pub use logic::{
    advance, compute_match_deltas, create_tournament, record_result, replay, seed,
    ReconciliationResult, ReconciliationRunner, RunSummary, RunnerConfig, SequentialReconciler,
};
pub use models::{
    won_side, BracketMatch, BracketMatchStatus, BracketParticipant, LeagueMatch, MatchId,
    MatchStatus, Participant, ParticipantId, ParticipantKind, RatingHistoryRecord, Side,
    SkillTier, Tournament, TournamentError, TournamentId, TournamentState,
};
pub use registry::TournamentRegistry;
pub use store::{LeagueStore, MemoryStore, StoreError};
