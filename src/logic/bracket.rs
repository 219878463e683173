//! Single-elimination rounds: building the bracket, recording results, advancing winners.

use crate::logic::seeding::SeededBracket;
use crate::models::{
    BracketMatch, BracketMatchStatus, BracketParticipant, Round, Side, Tournament,
    TournamentError, TournamentState,
};
use uuid::Uuid;

/// Score credited to the side that advances past a bye.
pub const BYE_WIN_SCORE: i32 = 1;

/// Display title for a round, counted from the final backwards.
pub fn round_title(round: u32, total_rounds: u32) -> String {
    match total_rounds.saturating_sub(round) {
        0 => "Final".to_string(),
        1 => "Semifinals".to_string(),
        2 => "Quarterfinals".to_string(),
        remaining => format!("Round of {}", 1u64 << (remaining + 1)),
    }
}

/// Build a tournament from seeded slots.
///
/// Round 1 pairs adjacent slots: two byes create no match, one bye completes
/// immediately in favour of the real participant. Later rounds start out
/// `Waiting` and are filled by [`advance`]. The slot count must be a power of
/// two, at least 2, as [`seed`](crate::logic::seed) produces.
pub fn create_tournament(seeded: &SeededBracket) -> Result<Tournament, TournamentError> {
    let slot_count = seeded.slot_count();
    if slot_count < 2 || !slot_count.is_power_of_two() {
        return Err(TournamentError::InvalidSlotCount(slot_count));
    }
    let id = Uuid::new_v4();
    let total_rounds = slot_count.trailing_zeros();

    let mut first = Round {
        number: 1,
        title: round_title(1, total_rounds),
        matches: Vec::new(),
    };
    for (index, (a, b)) in seeded.round_one_pairs().enumerate() {
        let mut m = BracketMatch::new(id, 1, index);
        match (a.is_bye, b.is_bye) {
            (true, true) => continue,
            (false, false) => {
                m.side_1 = Some(a.clone());
                m.side_2 = Some(b.clone());
                m.status = BracketMatchStatus::Pending;
            }
            (false, true) => complete_with_bye(&mut m, a.clone(), Side::One),
            (true, false) => complete_with_bye(&mut m, b.clone(), Side::Two),
        }
        first.matches.push(m);
    }

    let mut rounds = vec![first];
    for number in 2..=total_rounds {
        let prev = &rounds[rounds.len() - 1];
        let count = slot_count >> number;
        let matches = (0..count)
            .filter(|i| prev.match_at(2 * i).is_some() || prev.match_at(2 * i + 1).is_some())
            .map(|i| BracketMatch::new(id, number, i))
            .collect();
        rounds.push(Round {
            number,
            title: round_title(number, total_rounds),
            matches,
        });
    }

    let mut tournament = Tournament {
        id,
        slots: seeded.slots.clone(),
        rounds,
        state: TournamentState::InProgress,
        champion: None,
    };
    advance(&mut tournament);
    Ok(tournament)
}

fn complete_with_bye(m: &mut BracketMatch, entrant: BracketParticipant, side: Side) {
    *m.slot_mut(side) = Some(entrant);
    *m.slot_mut(side.opponent()) = Some(BracketParticipant::bye());
    let (score_1, score_2) = match side {
        Side::One => (BYE_WIN_SCORE, 0),
        Side::Two => (0, BYE_WIN_SCORE),
    };
    m.score_1 = Some(score_1);
    m.score_2 = Some(score_2);
    m.winner = Some(side);
    m.status = BracketMatchStatus::Completed;
}

/// What a feeding match contributes to the next round.
enum Feed {
    /// No match was created for this position.
    Empty,
    Unresolved,
    Winner(BracketParticipant),
}

fn feed_from(round: &Round, match_index: usize) -> Feed {
    match round.match_at(match_index) {
        None => Feed::Empty,
        Some(m) => match m.winner_participant() {
            Some(w) if m.is_completed() => Feed::Winner(w.clone()),
            _ => Feed::Unresolved,
        },
    }
}

/// Push completed winners into later rounds. Re-entrant: call after every
/// result; it does nothing when no feeder has newly completed.
///
/// Returns `(round, match_index)` of matches that became pending.
pub fn advance(tournament: &mut Tournament) -> Vec<(u32, usize)> {
    let mut newly_pending = Vec::new();

    for k in 1..tournament.rounds.len() {
        let (done, rest) = tournament.rounds.split_at_mut(k);
        let prev = &done[k - 1];
        let round = &mut rest[0];

        for m in round.matches.iter_mut().filter(|m| m.status == BracketMatchStatus::Waiting) {
            let feeds = [
                (Side::One, feed_from(prev, 2 * m.match_index)),
                (Side::Two, feed_from(prev, 2 * m.match_index + 1)),
            ];
            for (side, feed) in &feeds {
                if let Feed::Winner(w) = feed {
                    *m.slot_mut(*side) = Some(w.clone());
                }
            }
            match feeds {
                [(_, Feed::Winner(_)), (_, Feed::Winner(_))] => {
                    m.status = BracketMatchStatus::Pending;
                    newly_pending.push((m.round, m.match_index));
                }
                [(side, Feed::Winner(w)), (_, Feed::Empty)]
                | [(_, Feed::Empty), (side, Feed::Winner(w))] => complete_with_bye(m, w, side),
                _ => {}
            }
        }
    }

    if let Some(champion) = tournament
        .final_match()
        .filter(|m| m.is_completed())
        .and_then(|m| m.winner_participant().cloned())
    {
        tournament.champion = Some(champion);
        tournament.state = TournamentState::Completed;
    }

    newly_pending
}

/// Record the result of a pending match and advance the winner.
///
/// Rejects matches that are `Waiting` or already `Completed`.
pub fn record_result(
    tournament: &mut Tournament,
    round: u32,
    match_index: usize,
    score_1: i32,
    score_2: i32,
) -> Result<Side, TournamentError> {
    let m = tournament
        .find_match_mut(round, match_index)
        .ok_or(TournamentError::MatchNotFound { round, match_index })?;
    if m.status != BracketMatchStatus::Pending {
        return Err(TournamentError::InvalidState {
            round,
            match_index,
            status: m.status,
        });
    }
    if score_1 < 0 || score_2 < 0 {
        return Err(TournamentError::InvalidScores { score_1, score_2 });
    }
    let winner =
        Side::from_scores(score_1, score_2).ok_or(TournamentError::InvalidScores { score_1, score_2 })?;

    m.score_1 = Some(score_1);
    m.score_2 = Some(score_2);
    m.winner = Some(winner);
    m.status = BracketMatchStatus::Completed;

    advance(tournament);
    Ok(winner)
}
