//! Integration tests for the sequential replay: ordering, statistics, divergences, determinism.

use chrono::{DateTime, Duration, TimeZone, Utc};
use league_ratings::logic::{
    MatchRejection, ReconcilerState, RatingError, PLAYER_RATING_CONFIG, RECENT_FORM_LEN,
    TEAM_RATING_CONFIG,
};
use league_ratings::models::Outcome;
use league_ratings::{
    replay, LeagueMatch, MatchStatus, Participant, ParticipantKind, SequentialReconciler, Side,
    SkillTier,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn singles(a: &Participant, b: &Participant, score_a: i32, score_b: i32, minute: i64) -> LeagueMatch {
    LeagueMatch::completed(vec![a.id], vec![b.id], score_a, score_b, at(minute))
}

#[test]
fn single_match_writes_one_history_row_per_participant() {
    let a = Participant::new("A");
    let b = Participant::new("B");
    let game = singles(&a, &b, 21, 15, 0);
    let result = replay(PLAYER_RATING_CONFIG, &[game.clone()], &[a.clone(), b.clone()]);

    assert_eq!(result.matches_processed, 1);
    assert_eq!(result.matches_failed, 0);
    assert_eq!(result.history.len(), 2);

    let ha = &result.history[0];
    assert_eq!((ha.participant_id, ha.match_id), (a.id, game.id));
    assert_eq!((ha.old_rating, ha.new_rating, ha.delta), (1500, 1516, 16));
    assert_eq!(ha.opponent_avg_rating, 1500);
    assert_eq!(ha.created_at, at(0));

    let hb = &result.history[1];
    assert_eq!((hb.participant_id, hb.old_rating, hb.new_rating, hb.delta), (b.id, 1500, 1484, -16));

    assert_eq!(result.update_for(a.id).unwrap().current_rating, 1516);
    assert_eq!(result.update_for(b.id).unwrap().current_rating, 1484);
    assert!(result.divergences.is_empty());
    assert!(result.computation_divergences.is_empty());
}

#[test]
fn each_match_is_rated_from_the_previous_output() {
    let a = Participant::new("A");
    // Stored ratings are ignored; the replay starts from the tier seed.
    let b = Participant::new("B").with_rating(2100);
    let matches = vec![singles(&a, &b, 21, 10, 0), singles(&a, &b, 21, 19, 5)];
    let result = replay(PLAYER_RATING_CONFIG, &matches, &[a.clone(), b.clone()]);

    let second: Vec<_> = result.history.iter().filter(|h| h.match_id == matches[1].id).collect();
    assert_eq!((second[0].old_rating, second[0].new_rating), (1516, 1531));
    assert_eq!((second[1].old_rating, second[1].new_rating), (1484, 1469));
    assert_eq!(second[0].opponent_avg_rating, 1484);
}

#[test]
fn replay_orders_by_completion_time_not_input_order() {
    let a = Participant::new("A");
    let b = Participant::new("B");
    let mut late = singles(&a, &b, 0, 5, 30);
    // Created first but recorded last.
    late.created_at = at(-60);
    let early = singles(&a, &b, 5, 0, 10);
    let result = replay(PLAYER_RATING_CONFIG, &[late.clone(), early.clone()], &[a.clone(), b.clone()]);

    assert_eq!(result.history[0].match_id, early.id);
    assert_eq!(result.history[2].match_id, late.id);
    let form = &result.update_for(a.id).unwrap().recent_form;
    assert_eq!(form, &[Outcome::Win, Outcome::Loss]);
}

#[test]
fn skill_tier_seeds_the_first_rating() {
    let pro = Participant::new("pro").with_tier(SkillTier::Advanced);
    let rookie = Participant::new("rookie").with_tier(SkillTier::Beginner);
    let result = replay(PLAYER_RATING_CONFIG, &[], &[pro.clone(), rookie.clone()]);

    assert_eq!(result.update_for(pro.id).unwrap().current_rating, 1800);
    assert_eq!(result.update_for(rookie.id).unwrap().current_rating, 1200);
    assert_eq!(result.update_for(pro.id).unwrap().games_played, 0);
    assert!(result.history.is_empty());
}

#[test]
fn statistics_accumulate_per_participant() {
    let a = Participant::new("A");
    let b = Participant::new("B");
    let matches = vec![singles(&a, &b, 21, 15, 0), singles(&a, &b, 12, 21, 1), singles(&a, &b, 21, 3, 2)];
    let result = replay(PLAYER_RATING_CONFIG, &matches, &[a.clone(), b.clone()]);

    let ua = result.update_for(a.id).unwrap();
    assert_eq!(ua.matches_played, 3);
    assert_eq!(ua.games_played, 3);
    assert_eq!(ua.matches_won, 2);
    assert_eq!(ua.league_points, 3 + 1 + 3);
    assert_eq!(ua.total_points_scored, 21 + 12 + 21);

    let ub = result.update_for(b.id).unwrap();
    assert_eq!(ub.matches_won, 1);
    assert_eq!(ub.league_points, 1 + 3 + 1);
    assert_eq!(ub.total_points_scored, 15 + 21 + 3);
}

#[test]
fn recent_form_keeps_the_last_ten() {
    let a = Participant::new("A");
    let b = Participant::new("B");
    let mut matches: Vec<_> = (0..2).map(|i| singles(&a, &b, 0, 1, i)).collect();
    matches.extend((2..12).map(|i| singles(&a, &b, 1, 0, i)));
    let result = replay(PLAYER_RATING_CONFIG, &matches, &[a.clone(), b.clone()]);

    let form = &result.update_for(a.id).unwrap().recent_form;
    assert_eq!(form.len(), RECENT_FORM_LEN);
    assert!(form.iter().all(|o| *o == Outcome::Win));
    assert_eq!(result.update_for(a.id).unwrap().matches_played, 12);
}

#[test]
fn declared_winner_disagreement_is_reported_but_score_wins() {
    let a = Participant::new("A");
    let b = Participant::new("B");
    let game = singles(&a, &b, 21, 15, 0).with_declared_winner(Some(Side::Two));
    let result = replay(PLAYER_RATING_CONFIG, &[game.clone()], &[a.clone(), b.clone()]);

    assert_eq!(result.divergences.len(), 1);
    assert_eq!(result.divergences[0].match_id, game.id);
    assert_eq!(result.divergences[0].expected_winner, Side::One);
    assert_eq!(result.divergences[0].declared_winner, Side::Two);
    assert_eq!(result.update_for(a.id).unwrap().current_rating, 1516);
    assert_eq!(result.matches_processed, 1);
}

#[test]
fn unresolvable_roster_fails_only_that_match() {
    let a = Participant::new("A");
    let b = Participant::new("B");
    let ghost = Participant::new("ghost");
    let matches = vec![
        singles(&a, &ghost, 5, 3, 0),
        singles(&a, &b, 5, 3, 1),
        singles(&a, &b, 4, 4, 2),
    ];
    let result = replay(PLAYER_RATING_CONFIG, &matches, &[a.clone(), b.clone()]);

    assert_eq!(result.matches_processed, 1);
    assert_eq!(result.matches_failed, 2);
    assert_eq!(result.failures[0].match_id, matches[0].id);
    assert_eq!(result.failures[0].reason, MatchRejection::UnknownParticipant(ghost.id));
    assert_eq!(
        result.failures[1].reason,
        MatchRejection::InvalidResult(RatingError::EqualScores(4))
    );
    // The failed first match left A's tracker untouched.
    assert_eq!(result.history[0].old_rating, 1500);
    assert_eq!(result.update_for(a.id).unwrap().matches_played, 1);
}

#[test]
fn participant_on_both_sides_is_rejected() {
    let a = Participant::new("A");
    let b = Participant::new("B");
    let game = LeagueMatch::completed(vec![a.id, b.id], vec![b.id], 3, 1, at(0));
    let result = replay(PLAYER_RATING_CONFIG, &[game], &[a, b.clone()]);
    assert_eq!(result.failures[0].reason, MatchRejection::ParticipantOnBothSides(b.id));
}

#[test]
fn unfinished_matches_are_not_replayed() {
    let a = Participant::new("A");
    let b = Participant::new("B");
    let mut scheduled = singles(&a, &b, 0, 0, 0);
    scheduled.status = MatchStatus::Scheduled;
    let result = replay(PLAYER_RATING_CONFIG, &[scheduled.clone()], &[a, b]);
    assert_eq!(result.matches_processed + result.matches_failed, 0);

    let mut reconciler = SequentialReconciler::new(PLAYER_RATING_CONFIG, &[]);
    assert_eq!(reconciler.apply(&scheduled), Err(MatchRejection::NotCompleted));
}

#[test]
fn reconciler_moves_through_its_states() {
    let a = Participant::new("A");
    let b = Participant::new("B");
    let mut reconciler = SequentialReconciler::new(PLAYER_RATING_CONFIG, &[a.clone(), b.clone()]);
    assert_eq!(reconciler.state(), ReconcilerState::Initialized);

    reconciler.apply(&singles(&a, &b, 2, 1, 0)).unwrap();
    assert_eq!(reconciler.state(), ReconcilerState::Replaying);
    assert_eq!(reconciler.context().rating_of(a.id), Some(1516));

    let result = reconciler.finalize();
    assert_eq!(reconciler.state(), ReconcilerState::Finalized);
    assert_eq!(result.matches_processed, 1);
    assert_eq!(
        reconciler.apply(&singles(&a, &b, 2, 1, 1)),
        Err(MatchRejection::AlreadyFinalized)
    );
}

#[test]
fn team_matches_use_the_team_ceiling() {
    let strong = Participant::new_team("strong").with_tier(SkillTier::Advanced);
    let weak = Participant::new_team("weak");
    let mut matches = Vec::new();
    for i in 0..200 {
        matches.push(
            LeagueMatch::completed(vec![strong.id], vec![weak.id], 3, 1, at(i)).with_kind(ParticipantKind::Team),
        );
    }
    let result = replay(TEAM_RATING_CONFIG, &matches, &[strong.clone(), weak.clone()]);

    assert!(result.update_for(strong.id).unwrap().current_rating <= 2500);
    assert!(result.update_for(weak.id).unwrap().current_rating >= 800);
    assert!(result.computation_divergences.is_empty());
}

fn random_history(rng: &mut StdRng, players: &[Participant], count: i64) -> Vec<LeagueMatch> {
    (0..count)
        .map(|i| {
            let mut ids: Vec<_> = players.iter().map(|p| p.id).collect();
            let size = rng.gen_range(1..=2);
            let mut side_1 = Vec::new();
            let mut side_2 = Vec::new();
            for _ in 0..size {
                side_1.push(ids.swap_remove(rng.gen_range(0..ids.len())));
                side_2.push(ids.swap_remove(rng.gen_range(0..ids.len())));
            }
            let score_1 = rng.gen_range(0..=21);
            let mut score_2 = rng.gen_range(0..=21);
            if score_2 == score_1 {
                score_2 = (score_1 + 1) % 22;
            }
            LeagueMatch::completed(side_1, side_2, score_1, score_2, at(i / 3))
        })
        .collect()
}

#[test]
fn replaying_the_same_history_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(7);
    let players: Vec<_> = (0..6).map(|i| Participant::new(format!("P{i}"))).collect();
    let matches = random_history(&mut rng, &players, 300);

    let first = replay(PLAYER_RATING_CONFIG, &matches, &players);
    let second = replay(PLAYER_RATING_CONFIG, &matches, &players);
    assert_eq!(first, second);
    assert_eq!(first.matches_processed, 300);
    assert!(first.computation_divergences.is_empty());
}

#[test]
fn ratings_stay_inside_the_clamp_range() {
    let mut rng = StdRng::seed_from_u64(11);
    let players: Vec<_> = (0..4)
        .map(|i| Participant::new(format!("P{i}")).with_tier(SkillTier::Beginner))
        .collect();
    let matches = random_history(&mut rng, &players, 500);
    let result = replay(PLAYER_RATING_CONFIG, &matches, &players);
    for h in &result.history {
        assert!((800..=2800).contains(&h.new_rating));
    }

    // A participant who only ever loses bottoms out at the floor.
    let loser = Participant::new("loser").with_tier(SkillTier::Beginner);
    let mut field: Vec<_> = (0..20)
        .map(|i| Participant::new(format!("W{i}")).with_tier(SkillTier::Beginner))
        .collect();
    let losses: Vec<_> = (0..300)
        .map(|i| singles(&field[i as usize % 20], &loser, 2, 0, i))
        .collect();
    field.push(loser.clone());
    let result = replay(PLAYER_RATING_CONFIG, &losses, &field);
    assert_eq!(result.update_for(loser.id).unwrap().current_rating, 800);
    assert!(result.history.iter().all(|h| h.new_rating >= 800));
}

#[test]
fn winners_never_lose_rating() {
    let mut rng = StdRng::seed_from_u64(3);
    let players: Vec<_> = (0..5).map(|i| Participant::new(format!("P{i}"))).collect();
    let matches = random_history(&mut rng, &players, 200);
    let result = replay(PLAYER_RATING_CONFIG, &matches, &players);

    for game in &matches {
        let winner = game.winning_side().unwrap();
        for h in result.history.iter().filter(|h| h.match_id == game.id) {
            if game.side_of(h.participant_id) == Some(winner) {
                assert!(h.delta >= 0);
            } else {
                assert!(h.delta <= 0);
            }
        }
    }
}
