//! Sequential replay of the match history.
//!
//! Ratings are rebuilt from seed values by applying every completed match in
//! chronological order. Each match is rated against the tracker values left by
//! the previous match, never against what the store currently holds.

use crate::logic::rating::{
    compute_match_deltas, validate_result, RatedParticipant, RatingConfig, RatingError,
};
use crate::models::{
    won_side, LeagueMatch, MatchId, Outcome, Participant, ParticipantId, ParticipantUpdate,
    RatingHistoryRecord, Side,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Outcomes kept for recent-form reporting.
pub const RECENT_FORM_LEN: usize = 10;

const WIN_POINTS: u32 = 3;
const PARTICIPATION_POINTS: u32 = 1;

/// Why a single match was skipped. Fatal for that match only.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum MatchRejection {
    #[error("Participant {0} is not known to this replay")]
    UnknownParticipant(ParticipantId),
    #[error("Participant {0} appears on both sides")]
    ParticipantOnBothSides(ParticipantId),
    #[error("Match is not completed")]
    NotCompleted,
    #[error("Invalid result: {0}")]
    InvalidResult(#[from] RatingError),
    #[error("Replay already finalized")]
    AlreadyFinalized,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilerState {
    /// Trackers seeded, no match applied yet.
    #[default]
    Initialized,
    Replaying,
    Finalized,
}

/// The stored winner disagrees with the score.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Divergence {
    pub match_id: MatchId,
    pub expected_winner: Side,
    pub declared_winner: Side,
}

/// A rating change whose sign or win flag disagrees with the score-derived
/// outcome. Points at a wiring defect in the engine rather than bad data.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ComputationDivergence {
    pub match_id: MatchId,
    pub participant_id: ParticipantId,
    pub won: bool,
    pub delta: i32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchFailure {
    pub match_id: MatchId,
    pub reason: MatchRejection,
}

/// Everything a replay produces.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// One per participant, in input order.
    pub updates: Vec<ParticipantUpdate>,
    /// One per (participant, match), in replay order.
    pub history: Vec<RatingHistoryRecord>,
    pub divergences: Vec<Divergence>,
    pub computation_divergences: Vec<ComputationDivergence>,
    pub failures: Vec<MatchFailure>,
    pub matches_processed: usize,
    pub matches_failed: usize,
}

impl ReconciliationResult {
    pub fn update_for(&self, participant_id: ParticipantId) -> Option<&ParticipantUpdate> {
        self.updates.iter().find(|u| u.participant_id == participant_id)
    }
}

#[derive(Clone, Debug)]
struct Tracker {
    rating: i32,
    games_played: u32,
    matches_played: u32,
    matches_won: u32,
    league_points: u32,
    total_points_scored: u32,
    recent_form: VecDeque<Outcome>,
}

impl Tracker {
    fn seeded(participant: &Participant) -> Self {
        Self {
            rating: participant.seed_rating(),
            games_played: 0,
            matches_played: 0,
            matches_won: 0,
            league_points: 0,
            total_points_scored: 0,
            recent_form: VecDeque::with_capacity(RECENT_FORM_LEN),
        }
    }

    fn record(&mut self, new_rating: i32, won: bool, points_scored: u32) {
        self.rating = new_rating;
        self.games_played += 1;
        self.matches_played += 1;
        if won {
            self.matches_won += 1;
            self.league_points += WIN_POINTS;
        } else {
            self.league_points += PARTICIPATION_POINTS;
        }
        self.total_points_scored += points_scored;
        if self.recent_form.len() == RECENT_FORM_LEN {
            self.recent_form.pop_front();
        }
        self.recent_form.push_back(Outcome::from_won(won));
    }
}

/// Per-run tracker arena. Lives for one replay only.
#[derive(Clone, Debug)]
pub struct ReplayContext {
    config: RatingConfig,
    trackers: HashMap<ParticipantId, Tracker>,
    order: Vec<ParticipantId>,
}

impl ReplayContext {
    pub fn new(config: RatingConfig, participants: &[Participant]) -> Self {
        let mut trackers = HashMap::with_capacity(participants.len());
        let mut order = Vec::with_capacity(participants.len());
        for p in participants {
            if trackers.insert(p.id, Tracker::seeded(p)).is_none() {
                order.push(p.id);
            }
        }
        Self { config, trackers, order }
    }

    pub fn rating_of(&self, participant_id: ParticipantId) -> Option<i32> {
        self.trackers.get(&participant_id).map(|t| t.rating)
    }

    fn rated_side(&self, roster: &[ParticipantId]) -> Result<Vec<RatedParticipant>, MatchRejection> {
        roster
            .iter()
            .map(|&id| {
                self.rating_of(id)
                    .map(|rating| RatedParticipant::new(id, rating))
                    .ok_or(MatchRejection::UnknownParticipant(id))
            })
            .collect()
    }

    fn updates(&self) -> Vec<ParticipantUpdate> {
        self.order
            .iter()
            .filter_map(|id| self.trackers.get(id).map(|t| (id, t)))
            .map(|(&participant_id, t)| ParticipantUpdate {
                participant_id,
                current_rating: t.rating,
                games_played: t.games_played,
                matches_played: t.matches_played,
                matches_won: t.matches_won,
                league_points: t.league_points,
                total_points_scored: t.total_points_scored,
                recent_form: t.recent_form.iter().copied().collect(),
            })
            .collect()
    }
}

/// Replays matches one at a time: `Initialized` -> `Replaying` -> `Finalized`.
#[derive(Clone, Debug)]
pub struct SequentialReconciler {
    ctx: ReplayContext,
    state: ReconcilerState,
    result: ReconciliationResult,
}

impl SequentialReconciler {
    pub fn new(config: RatingConfig, participants: &[Participant]) -> Self {
        Self {
            ctx: ReplayContext::new(config, participants),
            state: ReconcilerState::Initialized,
            result: ReconciliationResult::default(),
        }
    }

    pub fn state(&self) -> ReconcilerState {
        self.state
    }

    pub fn context(&self) -> &ReplayContext {
        &self.ctx
    }

    /// Apply one match. A rejected match is recorded as failed and leaves all
    /// trackers untouched.
    pub fn apply(&mut self, game: &LeagueMatch) -> Result<(), MatchRejection> {
        if self.state == ReconcilerState::Finalized {
            return Err(MatchRejection::AlreadyFinalized);
        }
        self.state = ReconcilerState::Replaying;
        match self.apply_match(game) {
            Ok(()) => {
                self.result.matches_processed += 1;
                Ok(())
            }
            Err(reason) => {
                self.result.matches_failed += 1;
                self.result.failures.push(MatchFailure {
                    match_id: game.id,
                    reason: reason.clone(),
                });
                Err(reason)
            }
        }
    }

    fn apply_match(&mut self, game: &LeagueMatch) -> Result<(), MatchRejection> {
        if !game.is_completed() {
            return Err(MatchRejection::NotCompleted);
        }
        let winner = validate_result(game.side_1.len(), game.side_2.len(), game.score_1, game.score_2)?;
        let side_1: HashSet<_> = game.side_1.iter().collect();
        if let Some(&id) = game.side_2.iter().find(|id| side_1.contains(id)) {
            return Err(MatchRejection::ParticipantOnBothSides(id));
        }

        let rated_1 = self.ctx.rated_side(&game.side_1)?;
        let rated_2 = self.ctx.rated_side(&game.side_2)?;
        let rating = compute_match_deltas(&self.ctx.config, &rated_1, &rated_2, game.score_1, game.score_2)?;

        if let Some(declared) = game.declared_winner {
            if declared != winner {
                self.result.divergences.push(Divergence {
                    match_id: game.id,
                    expected_winner: winner,
                    declared_winner: declared,
                });
            }
        }

        let created_at = game.effective_at();
        for change in &rating.changes {
            let won = won_side(game, change.participant_id) == Some(true);
            // A zero delta at extreme rating gaps is not a disagreement.
            let sign_disagrees = (won && change.delta < 0) || (!won && change.delta > 0);
            if change.won != won || sign_disagrees {
                self.result.computation_divergences.push(ComputationDivergence {
                    match_id: game.id,
                    participant_id: change.participant_id,
                    won: change.won,
                    delta: change.delta,
                });
            }

            let points_scored = game.score(change.side).max(0) as u32;
            if let Some(tracker) = self.ctx.trackers.get_mut(&change.participant_id) {
                tracker.record(change.new_rating, won, points_scored);
            }
            self.result.history.push(RatingHistoryRecord {
                participant_id: change.participant_id,
                match_id: game.id,
                old_rating: change.old_rating,
                new_rating: change.new_rating,
                delta: change.applied_delta(),
                opponent_avg_rating: change.opponent_avg_rating,
                created_at,
            });
        }
        Ok(())
    }

    /// Close the replay and hand back the accumulated result.
    pub fn finalize(&mut self) -> ReconciliationResult {
        self.state = ReconcilerState::Finalized;
        let mut result = std::mem::take(&mut self.result);
        result.updates = self.ctx.updates();
        result
    }
}

/// Completed matches in replay order: ascending effective timestamp, ties in input order.
pub fn replay_order(matches: &[LeagueMatch]) -> Vec<&LeagueMatch> {
    let mut ordered: Vec<&LeagueMatch> = matches.iter().filter(|m| m.is_completed()).collect();
    ordered.sort_by_key(|m| m.effective_at());
    ordered
}

/// Rebuild ratings and statistics for `participants` from the full match history.
pub fn replay(
    config: RatingConfig,
    matches: &[LeagueMatch],
    participants: &[Participant],
) -> ReconciliationResult {
    let mut reconciler = SequentialReconciler::new(config, participants);
    for game in replay_order(matches) {
        // Failures are collected in the result.
        let _ = reconciler.apply(game);
    }
    reconciler.finalize()
}
