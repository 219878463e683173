//! In-memory league store behind a single RwLock.

use crate::models::{
    LeagueMatch, MatchId, Participant, ParticipantId, ParticipantKind, ParticipantUpdate,
    RatingHistoryRecord,
};
use crate::store::{InsertOutcome, LeagueStore, StoreError};
use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Inner {
    participants: Vec<Participant>,
    matches: Vec<LeagueMatch>,
    history: Vec<RatingHistoryRecord>,
    history_keys: HashSet<(ParticipantId, MatchId)>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(participants: Vec<Participant>, matches: Vec<LeagueMatch>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                participants,
                matches,
                ..Inner::default()
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    pub fn add_participant(&self, participant: Participant) -> Result<(), StoreError> {
        self.write()?.participants.push(participant);
        Ok(())
    }

    pub fn add_match(&self, game: LeagueMatch) -> Result<(), StoreError> {
        self.write()?.matches.push(game);
        Ok(())
    }

    pub fn participant(&self, id: ParticipantId) -> Result<Participant, StoreError> {
        self.read()?
            .participants
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::ParticipantNotFound(id))
    }

    /// All participants, highest rating first.
    pub fn leaderboard(&self, kind: ParticipantKind) -> Result<Vec<Participant>, StoreError> {
        let mut participants = self.participants(kind)?;
        participants.sort_by(|a, b| b.current_rating.cmp(&a.current_rating));
        Ok(participants)
    }

    /// Seed existing ledger rows, as when loading a stored dataset.
    pub fn import_history(&self, records: Vec<RatingHistoryRecord>) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for record in records {
            if self.insert_history(&record)? == InsertOutcome::Inserted {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// History rows for one participant, in insertion order.
    pub fn history_for(&self, id: ParticipantId) -> Result<Vec<RatingHistoryRecord>, StoreError> {
        Ok(self
            .read()?
            .history
            .iter()
            .filter(|h| h.participant_id == id)
            .cloned()
            .collect())
    }
}

impl LeagueStore for MemoryStore {
    fn participants(&self, kind: ParticipantKind) -> Result<Vec<Participant>, StoreError> {
        Ok(self
            .read()?
            .participants
            .iter()
            .filter(|p| p.kind == kind)
            .cloned()
            .collect())
    }

    fn completed_matches(&self, kind: ParticipantKind) -> Result<Vec<LeagueMatch>, StoreError> {
        let mut matches: Vec<LeagueMatch> = self
            .read()?
            .matches
            .iter()
            .filter(|m| m.kind == kind && m.is_completed())
            .cloned()
            .collect();
        matches.sort_by_key(|m| m.effective_at());
        Ok(matches)
    }

    fn history(&self) -> Result<Vec<RatingHistoryRecord>, StoreError> {
        Ok(self.read()?.history.clone())
    }

    fn insert_history(&self, record: &RatingHistoryRecord) -> Result<InsertOutcome, StoreError> {
        let mut inner = self.write()?;
        if !inner.history_keys.insert(record.key()) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        inner.history.push(record.clone());
        Ok(InsertOutcome::Inserted)
    }

    fn update_participant(&self, update: &ParticipantUpdate) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let participant = inner
            .participants
            .iter_mut()
            .find(|p| p.id == update.participant_id)
            .ok_or(StoreError::ParticipantNotFound(update.participant_id))?;
        participant.apply_update(update);
        Ok(())
    }
}
