//! Record store seen by the reconciliation runner, plus an in-memory implementation.

mod csv_import;
mod memory;

pub use csv_import::{load_dataset, read_history, read_matches, read_participants};
pub use memory::MemoryStore;

use crate::models::{
    LeagueMatch, Participant, ParticipantId, ParticipantKind, ParticipantUpdate,
    RatingHistoryRecord,
};
use std::sync::Arc;

/// A failed read or write against the store. Writes are retried by the runner.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Participant {0} not found")]
    ParticipantNotFound(ParticipantId),
    #[error("Invalid record in {file}: {message}")]
    InvalidRecord { file: String, message: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of an idempotent history insert.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InsertOutcome {
    Inserted,
    /// A row for this (participant, match) was already there; it was kept.
    AlreadyExists,
}

/// What the reconciliation core needs from the persistent league store.
pub trait LeagueStore: Send + Sync {
    fn participants(&self, kind: ParticipantKind) -> Result<Vec<Participant>, StoreError>;

    /// Completed matches of `kind`, oldest first by effective timestamp.
    fn completed_matches(&self, kind: ParticipantKind) -> Result<Vec<LeagueMatch>, StoreError>;

    fn history(&self) -> Result<Vec<RatingHistoryRecord>, StoreError>;

    /// Insert unless a row for the same (participant, match) exists (first write wins).
    fn insert_history(&self, record: &RatingHistoryRecord) -> Result<InsertOutcome, StoreError>;

    /// Overwrite a participant's rating and counters.
    fn update_participant(&self, update: &ParticipantUpdate) -> Result<(), StoreError>;
}

impl<T: LeagueStore + ?Sized> LeagueStore for Arc<T> {
    fn participants(&self, kind: ParticipantKind) -> Result<Vec<Participant>, StoreError> {
        (**self).participants(kind)
    }

    fn completed_matches(&self, kind: ParticipantKind) -> Result<Vec<LeagueMatch>, StoreError> {
        (**self).completed_matches(kind)
    }

    fn history(&self) -> Result<Vec<RatingHistoryRecord>, StoreError> {
        (**self).history()
    }

    fn insert_history(&self, record: &RatingHistoryRecord) -> Result<InsertOutcome, StoreError> {
        (**self).insert_history(record)
    }

    fn update_participant(&self, update: &ParticipantUpdate) -> Result<(), StoreError> {
        (**self).update_participant(update)
    }
}
