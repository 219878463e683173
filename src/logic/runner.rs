//! Reconciliation run against a store: load history, replay, persist idempotently.

use crate::logic::rating::RatingConfig;
use crate::logic::reconcile::{
    replay, ComputationDivergence, Divergence, MatchFailure, ReconciliationResult,
};
use crate::models::{MatchId, ParticipantId, ParticipantKind, RatingHistoryRecord};
use crate::store::{InsertOutcome, LeagueStore, StoreError};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, TryLockError};

/// Errors that abort a whole run before anything is written.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("A reconciliation run is already in progress for this dataset")]
    AlreadyRunning,
    #[error("Failed to load league data: {0}")]
    Load(#[from] StoreError),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub kind: ParticipantKind,
    /// Attempts per write before it counts as a persistence failure (at least 1).
    pub write_attempts: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            kind: ParticipantKind::Player,
            write_attempts: 3,
        }
    }
}

/// A stored ledger row that disagrees with the recomputed one. The stored row is kept.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HistoryMismatch {
    pub participant_id: ParticipantId,
    pub match_id: MatchId,
    pub stored_new_rating: i32,
    pub recomputed_new_rating: i32,
    pub stored_delta: i32,
    pub recomputed_delta: i32,
}

/// A stored current rating that differs from the replayed one although the
/// participant's ledger was already complete.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RatingDrift {
    pub participant_id: ParticipantId,
    pub stored_rating: i32,
    pub recomputed_rating: i32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum WriteTarget {
    History {
        participant_id: ParticipantId,
        match_id: MatchId,
    },
    Participant {
        participant_id: ParticipantId,
    },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PersistenceFailure {
    #[serde(flatten)]
    pub target: WriteTarget,
    pub attempts: u32,
    pub message: String,
}

/// Outcome of one run, for the caller to present.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub kind: ParticipantKind,
    pub matches_processed: usize,
    pub matches_failed: usize,
    pub history_inserted: usize,
    /// Rows already present for their (participant, match).
    pub history_skipped: usize,
    pub participants_updated: usize,
    pub failures: Vec<MatchFailure>,
    pub divergences: Vec<Divergence>,
    pub computation_divergences: Vec<ComputationDivergence>,
    pub history_mismatches: Vec<HistoryMismatch>,
    pub rating_drifts: Vec<RatingDrift>,
    pub persistence_errors: Vec<PersistenceFailure>,
}

impl RunSummary {
    fn from_replay(kind: ParticipantKind, result: &ReconciliationResult) -> Self {
        Self {
            kind,
            matches_processed: result.matches_processed,
            matches_failed: result.matches_failed,
            failures: result.failures.clone(),
            divergences: result.divergences.clone(),
            computation_divergences: result.computation_divergences.clone(),
            ..Self::default()
        }
    }

    /// Nothing to report beyond counts.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
            && self.divergences.is_empty()
            && self.computation_divergences.is_empty()
            && self.history_mismatches.is_empty()
            && self.rating_drifts.is_empty()
            && self.persistence_errors.is_empty()
    }
}

/// Drives a full replay for one dataset and kind. At most one `run` executes
/// at a time on this runner. The lock lives in the runner, not in the store:
/// two runners built over the same store do not exclude each other, so keep
/// exactly one runner per (store, kind).
pub struct ReconciliationRunner<S> {
    store: S,
    config: RunnerConfig,
    running: Mutex<()>,
}

impl<S: LeagueStore> ReconciliationRunner<S> {
    pub fn new(store: S, config: RunnerConfig) -> Self {
        Self {
            store,
            config,
            running: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Load, replay, and persist.
    ///
    /// History rows are inserted only if missing; participant aggregates are
    /// overwritten. A failed write is retried, then recorded in the summary
    /// without undoing other writes.
    pub fn run(&self) -> Result<RunSummary, RunError> {
        let _guard = match self.running.try_lock() {
            Ok(guard) => guard,
            // A panicked previous run leaves nothing to protect.
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Err(RunError::AlreadyRunning),
        };
        let kind = self.config.kind;
        info!("Starting {:?} rating reconciliation", kind);

        let participants = self.store.participants(kind)?;
        let matches = self.store.completed_matches(kind)?;
        let existing: HashMap<_, _> = self
            .store
            .history()?
            .into_iter()
            .map(|h| (h.key(), h))
            .collect();
        info!(
            "Loaded {} participants, {} completed matches, {} history rows",
            participants.len(),
            matches.len(),
            existing.len()
        );

        let result = replay(RatingConfig::for_kind(kind), &matches, &participants);
        let mut summary = RunSummary::from_replay(kind, &result);
        log_replay_findings(&result);

        // Participants with ledger rows missing before this run; their stored
        // rating is expected to lag the replay.
        let mut catching_up = HashSet::new();
        for record in &result.history {
            if let Some(stored) = existing.get(&record.key()) {
                check_history(stored, record, &mut summary);
                summary.history_skipped += 1;
                continue;
            }
            catching_up.insert(record.participant_id);
            match self.with_retries(|| self.store.insert_history(record)) {
                Ok(InsertOutcome::Inserted) => summary.history_inserted += 1,
                Ok(InsertOutcome::AlreadyExists) => summary.history_skipped += 1,
                Err((attempts, e)) => {
                    error!(
                        "Failed to write history for participant {} match {}: {}",
                        record.participant_id, record.match_id, e
                    );
                    summary.persistence_errors.push(PersistenceFailure {
                        target: WriteTarget::History {
                            participant_id: record.participant_id,
                            match_id: record.match_id,
                        },
                        attempts,
                        message: e.to_string(),
                    });
                }
            }
        }

        let stored_ratings: HashMap<_, _> = participants
            .iter()
            .map(|p| (p.id, p.current_rating))
            .collect();
        for update in &result.updates {
            if let Some(&stored) = stored_ratings.get(&update.participant_id) {
                if stored != update.current_rating && !catching_up.contains(&update.participant_id) {
                    warn!(
                        "Participant {} stored rating {} differs from replayed {}",
                        update.participant_id, stored, update.current_rating
                    );
                    summary.rating_drifts.push(RatingDrift {
                        participant_id: update.participant_id,
                        stored_rating: stored,
                        recomputed_rating: update.current_rating,
                    });
                }
            }
            match self.with_retries(|| self.store.update_participant(update)) {
                Ok(()) => summary.participants_updated += 1,
                Err((attempts, e)) => {
                    error!("Failed to update participant {}: {}", update.participant_id, e);
                    summary.persistence_errors.push(PersistenceFailure {
                        target: WriteTarget::Participant {
                            participant_id: update.participant_id,
                        },
                        attempts,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Reconciliation finished: {} processed, {} failed, {} history rows written, {} skipped, {} participants updated, {} write errors",
            summary.matches_processed,
            summary.matches_failed,
            summary.history_inserted,
            summary.history_skipped,
            summary.participants_updated,
            summary.persistence_errors.len()
        );
        Ok(summary)
    }

    fn with_retries<T>(
        &self,
        mut op: impl FnMut() -> Result<T, StoreError>,
    ) -> Result<T, (u32, StoreError)> {
        let attempts = self.config.write_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    debug!("Write attempt {}/{} failed: {}", attempt, attempts, e);
                    attempt += 1;
                }
                Err(e) => return Err((attempt, e)),
            }
        }
    }
}

fn check_history(stored: &RatingHistoryRecord, recomputed: &RatingHistoryRecord, summary: &mut RunSummary) {
    if stored.same_change_as(recomputed) {
        return;
    }
    warn!(
        "Stored history for participant {} match {} ({} -> {}) differs from replay ({} -> {})",
        stored.participant_id,
        stored.match_id,
        stored.old_rating,
        stored.new_rating,
        recomputed.old_rating,
        recomputed.new_rating
    );
    summary.history_mismatches.push(HistoryMismatch {
        participant_id: stored.participant_id,
        match_id: stored.match_id,
        stored_new_rating: stored.new_rating,
        recomputed_new_rating: recomputed.new_rating,
        stored_delta: stored.delta,
        recomputed_delta: recomputed.delta,
    });
}

fn log_replay_findings(result: &ReconciliationResult) {
    for f in &result.failures {
        warn!("Skipped match {}: {}", f.match_id, f.reason);
    }
    for d in &result.divergences {
        warn!(
            "Match {} declares {:?} the winner but the score says {:?}",
            d.match_id, d.declared_winner, d.expected_winner
        );
    }
    for c in &result.computation_divergences {
        error!(
            "Rating engine disagreement on match {}: participant {} won={} delta={}",
            c.match_id, c.participant_id, c.won, c.delta
        );
    }
}
