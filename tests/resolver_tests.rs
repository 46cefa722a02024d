//! Resolution tests.
//!
//! The scoring table end to end through the engine, plus properties of the
//! pure rule: exactly one role scores, and resolving twice changes nothing.

use std::sync::Arc;
use std::thread;

use duel_engine::core::config::ScoringConfig;
use duel_engine::{
    judge, CardValue, Choice, DuelEngine, EngineConfig, Guess, MatchId, MemoryStore,
    NullPublisher, Participant, ParticipantId, ResolveOutcome, Role, Seat, Turn, TurnId,
};
use proptest::prelude::*;

fn v(value: u8) -> CardValue {
    CardValue::new(value).unwrap()
}

fn setup() -> (DuelEngine<MemoryStore>, MatchId) {
    setup_with(EngineConfig::default())
}

fn setup_with(config: EngineConfig) -> (DuelEngine<MemoryStore>, MatchId) {
    let engine = DuelEngine::new(Arc::new(MemoryStore::new()), config, Arc::new(NullPublisher)).unwrap();
    let id = engine
        .start_match(
            Participant::human(ParticipantId::new(1)),
            Participant::human(ParticipantId::new(2)),
        )
        .unwrap();
    (engine, id)
}

/// Replace the opening turn's dealer value.
fn deal(engine: &DuelEngine<MemoryStore>, id: MatchId, dealer: u8) {
    engine
        .conditional_update(id, |record| {
            record.current = Turn::open(TurnId::first(), v(dealer));
            Ok(())
        })
        .unwrap();
}

/// Play one turn and return (active seat delta, guesser seat delta).
fn play(dealer: u8, active: u8, guess: Guess) -> (u32, u32) {
    play_with(EngineConfig::default(), dealer, active, guess)
}

fn play_with(config: EngineConfig, dealer: u8, active: u8, guess: Guess) -> (u32, u32) {
    let (engine, id) = setup_with(config);
    deal(&engine, id, dealer);
    let turn = TurnId::first();

    engine
        .submit_decision(id, turn, Role::Active, Choice::Value(v(active)))
        .unwrap();
    engine
        .submit_decision(id, turn, Role::Guesser, Choice::Guess(guess))
        .unwrap();
    assert!(engine.resolve_turn(id, turn).unwrap().applied());

    let scores = engine.snapshot(id).unwrap().scores;
    (scores.total(Seat::A), scores.total(Seat::B))
}

// =============================================================================
// Scoring table
// =============================================================================

#[test]
fn test_exact_match_called_equal() {
    assert_eq!(play(7, 7, Guess::Equal), (0, 10));
}

#[test]
fn test_exact_match_missed_pays_consolation() {
    assert_eq!(play(7, 7, Guess::Higher), (2, 0));
}

#[test]
fn test_higher_called_pays_guesser() {
    assert_eq!(play(3, 8, Guess::Higher), (0, 5));
}

#[test]
fn test_higher_missed_pays_active() {
    assert_eq!(play(3, 8, Guess::Lower), (5, 0));
}

#[test]
fn test_equal_guess_on_distinct_values_pays_active() {
    assert_eq!(play(3, 8, Guess::Equal), (5, 0));
    assert_eq!(play(8, 3, Guess::Equal), (5, 0));
}

#[test]
fn test_lower_called() {
    assert_eq!(play(10, 0, Guess::Lower), (0, 10));
}

#[test]
fn test_custom_scoring_constants_apply() {
    let mut config = EngineConfig::default();
    config.scoring = ScoringConfig { equal_bonus: 25, consolation: 7 };
    assert_eq!(play_with(config.clone(), 4, 4, Guess::Equal), (0, 25));
    assert_eq!(play_with(config, 4, 4, Guess::Lower), (7, 0));
}

#[test]
fn test_zero_scoring_constants_rejected() {
    for scoring in [
        ScoringConfig { equal_bonus: 10, consolation: 0 },
        ScoringConfig { equal_bonus: 0, consolation: 2 },
    ] {
        let mut config = EngineConfig::default();
        config.scoring = scoring;
        let result = DuelEngine::new(Arc::new(MemoryStore::new()), config, Arc::new(NullPublisher));
        assert!(matches!(result, Err(duel_engine::EngineError::InvalidConfig(_))));
    }
}

// =============================================================================
// Side effects
// =============================================================================

#[test]
fn test_resolution_consumes_active_value_only() {
    let (engine, id) = setup();
    deal(&engine, id, 5);
    let turn = TurnId::first();

    engine.submit_decision(id, turn, Role::Active, Choice::Value(v(9))).unwrap();
    let before = engine.snapshot(id).unwrap();
    assert!(before.cards.hand(Seat::A).contains(v(9)), "submission must not shrink the hand");

    engine.submit_decision(id, turn, Role::Guesser, Choice::Guess(Guess::Higher)).unwrap();
    engine.resolve_turn(id, turn).unwrap();

    let after = engine.snapshot(id).unwrap();
    assert!(!after.cards.hand(Seat::A).contains(v(9)));
    assert_eq!(after.cards.hand(Seat::A).len(), 10);
    assert_eq!(after.cards.hand(Seat::B).len(), 11);
    assert_eq!(after.history.len(), 1);
    assert_eq!(after.history[0].winning_seat(), Seat::B);
    assert!(after.current.resolved_at.is_some());
}

#[test]
fn test_resolve_unlocked_turn_is_not_ready() {
    let (engine, id) = setup();
    let before = engine.snapshot(id).unwrap();

    let err = engine.resolve_turn(id, TurnId::first()).unwrap_err();
    assert!(matches!(err, duel_engine::EngineError::TurnNotReady { .. }));
    assert_eq!(engine.snapshot(id).unwrap(), before);
}

#[test]
fn test_concurrent_resolvers_apply_once() {
    let (engine, id) = setup();
    let turn = TurnId::first();
    engine.submit_decision(id, turn, Role::Active, Choice::Value(v(2))).unwrap();
    engine.submit_decision(id, turn, Role::Guesser, Choice::Guess(Guess::Lower)).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || engine.resolve_turn(id, turn))
        })
        .collect();

    let outcomes: Vec<ResolveOutcome> = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter_map(Result::ok)
        .collect();
    let applied = outcomes.iter().filter(|o| o.applied()).count();
    assert_eq!(applied, 1, "exactly one resolver flips the turn");

    let record = engine.snapshot(id).unwrap();
    assert_eq!(record.history.len(), 1);
    assert_eq!(record.turns_resolved, 1);
    let award = record.history[0].award;
    assert_eq!(record.scores.total(Seat::A) + record.scores.total(Seat::B), award.points);
}

// =============================================================================
// Properties
// =============================================================================

fn guess_strategy() -> impl Strategy<Value = Guess> {
    prop_oneof![Just(Guess::Higher), Just(Guess::Lower), Just(Guess::Equal)]
}

fn scoring_strategy() -> impl Strategy<Value = ScoringConfig> {
    (1u32..=100, 1u32..=100).prop_map(|(equal_bonus, consolation)| ScoringConfig { equal_bonus, consolation })
}

proptest! {
    #[test]
    fn prop_exactly_one_role_scores(dealer in 0u8..=10, active in 0u8..=10, guess in guess_strategy()) {
        let award = judge(v(dealer), v(active), guess, &ScoringConfig::default());
        let active_pts = award.points_for(Role::Active);
        let guesser_pts = award.points_for(Role::Guesser);

        prop_assert_eq!(active_pts + guesser_pts, award.points);
        prop_assert!(active_pts == 0 || guesser_pts == 0);
        if dealer != active {
            prop_assert_eq!(award.points, u32::from(dealer.abs_diff(active)));
        }
    }

    #[test]
    fn prop_valid_scoring_always_pays_one_role(
        scoring in scoring_strategy(),
        dealer in 0u8..=10,
        active in 0u8..=10,
        guess in guess_strategy(),
    ) {
        let mut config = EngineConfig::default();
        config.scoring = scoring.clone();
        prop_assert!(config.validate().is_ok());

        let award = judge(v(dealer), v(active), guess, &scoring);
        prop_assert!(award.points > 0);

        let (a, b) = play_with(config, dealer, active, guess);
        prop_assert!(a == 0 || b == 0);
        prop_assert_eq!(a + b, award.points);
    }

    #[test]
    fn prop_resolve_is_idempotent(dealer in 0u8..=10, active in 0u8..=10, guess in guess_strategy()) {
        let (engine, id) = setup();
        deal(&engine, id, dealer);
        let turn = TurnId::first();
        engine.submit_decision(id, turn, Role::Active, Choice::Value(v(active))).unwrap();
        engine.submit_decision(id, turn, Role::Guesser, Choice::Guess(guess)).unwrap();

        let first = engine.resolve_turn(id, turn).unwrap();
        let after_first = engine.snapshot(id).unwrap();
        let second = engine.resolve_turn(id, turn).unwrap();
        let after_second = engine.snapshot(id).unwrap();

        prop_assert!(first.applied());
        prop_assert!(!second.applied());
        prop_assert_eq!(&first.resolution().turn, &second.resolution().turn);
        prop_assert_eq!(after_first, after_second);
    }
}
