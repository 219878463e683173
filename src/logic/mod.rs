//! League business logic: rating model, history replay, reconciliation runs, brackets.

pub mod bracket;
pub mod rating;
pub mod reconcile;
pub mod runner;
pub mod seeding;

pub use bracket::{advance, create_tournament, record_result, round_title, BYE_WIN_SCORE};
pub use rating::{
    compute_match_deltas, expected_score, MatchRatingResult, RatedParticipant, RatingChange,
    RatingConfig, RatingError, PLAYER_RATING_CONFIG, TEAM_RATING_CONFIG,
};
pub use reconcile::{
    replay, replay_order, ComputationDivergence, Divergence, MatchFailure, MatchRejection,
    ReconcilerState, ReconciliationResult, ReplayContext, SequentialReconciler, RECENT_FORM_LEN,
};
pub use runner::{
    HistoryMismatch, PersistenceFailure, RatingDrift, ReconciliationRunner, RunError,
    RunSummary, RunnerConfig, WriteTarget,
};
pub use seeding::{seed, SeededBracket};
