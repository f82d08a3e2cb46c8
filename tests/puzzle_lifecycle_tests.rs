//! Puzzle lifecycle integration tests
//!
//! Drives the factory and instances the way the engine does: typed actions
//! in, signals out, outcomes settled into the state store.

use aludel::puzzle::{PuzzleFactory, PuzzleOutcome, PuzzleStatus};
use aludel::signals::SignalHub;
use aludel::state::{GameState, StateStore};
use aludel::types::event::PuzzleAction;
use aludel::types::puzzle::{
    AssemblyConfig, CraftingConfig, Difficulty, PartSpec, PuzzleDefinition, SequenceConfig,
    SlotSpec,
};
use aludel::types::signal::PuzzleSignal;
use aludel::types::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

fn recording_hub() -> (SignalHub, Rc<RefCell<Vec<PuzzleSignal>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut hub = SignalHub::new();
    hub.on_puzzle(move |signal| {
        sink.borrow_mut().push(signal.clone());
        Ok(())
    });
    (hub, seen)
}

fn assembly_def(id: &str, difficulty: Difficulty) -> PuzzleDefinition {
    let mut def = PuzzleDefinition::generic_fallback(id);
    def.kind = "assembly".to_string();
    def.title = "Assemble the lock".to_string();
    def.difficulty = difficulty;
    def.assembly = Some(AssemblyConfig {
        slots: vec![
            SlotSpec { id: "s1".into(), part: "p1".into(), x: 0.0, y: 0.0 },
            SlotSpec { id: "s2".into(), part: "p2".into(), x: 80.0, y: 0.0 },
            SlotSpec { id: "s3".into(), part: "p3".into(), x: 160.0, y: 0.0 },
        ],
        parts: vec![
            PartSpec { id: "p1".into(), label: "Pin".into() },
            PartSpec { id: "p2".into(), label: "Tumbler".into() },
            PartSpec { id: "p3".into(), label: "Cam".into() },
        ],
        snap_threshold: 48.0,
    });
    def
}

fn sequence_def(id: &str) -> PuzzleDefinition {
    let mut def = PuzzleDefinition::generic_fallback(id);
    def.kind = "sequence".to_string();
    def.sequence = Some(SequenceConfig {
        pad_count: 4,
        initial_length: 4,
        max_rounds: 3,
        input_timeout_ms: None,
        step_interval_ms: 600,
    });
    def
}

fn place(factory: &mut PuzzleFactory, hub: &mut SignalHub, part: &str, slot: &str, now: u64) {
    factory.handle_action(
        &PuzzleAction::PlacePart {
            part: part.into(),
            slot: slot.into(),
        },
        now,
        hub,
    );
}

/// Scenario A: a full correct placement auto-submits and completes with the
/// difficulty-scaled full score.
#[test]
fn assembly_full_placement_auto_submits_with_full_score() {
    let (mut hub, _) = recording_hub();
    let mut store = StateStore::new(GameState::new());
    let mut factory = PuzzleFactory::new(vec![assembly_def("lock", Difficulty::Hard)]);

    factory.start_by_id("lock", 1, 0, &mut hub);
    place(&mut factory, &mut hub, "p1", "s1", 10);
    place(&mut factory, &mut hub, "p2", "s2", 20);
    assert_eq!(factory.current().unwrap().status(), PuzzleStatus::Active);
    place(&mut factory, &mut hub, "p3", "s3", 30);

    match factory.settle(&mut store) {
        Some(PuzzleOutcome::Completed { score, .. }) => {
            // 100 base, no attempt or hint penalty, x1.2 for hard
            assert_eq!(score, 120);
        }
        other => panic!("expected completion, got {other:?}"),
    }
    assert!(store.state().has_flag("puzzle_lock_completed"));
    assert_eq!(
        store.state().get_var("puzzle_lock_score"),
        Some(&Value::Int(120))
    );
}

/// Scenario B: a correct first round leaves the puzzle active with the
/// round counter advanced and the target one step longer.
#[test]
fn sequence_round_advances_and_stays_active() {
    let (mut hub, seen) = recording_hub();
    let mut factory = PuzzleFactory::new(vec![sequence_def("pipes")]);
    factory.start_by_id("pipes", 99, 0, &mut hub);

    let shown = |seen: &Rc<RefCell<Vec<PuzzleSignal>>>| {
        seen.borrow()
            .iter()
            .rev()
            .find_map(|s| match s {
                PuzzleSignal::ShowSequence { steps, .. } => Some(steps.clone()),
                _ => None,
            })
            .expect("a sequence was shown")
    };

    let round1 = shown(&seen);
    assert_eq!(round1.len(), 4);

    factory.handle_action(&PuzzleAction::BeginInput, 0, &mut hub);
    for pad in &round1 {
        factory.handle_action(&PuzzleAction::InputStep { pad: *pad }, 0, &mut hub);
    }

    assert_eq!(factory.current().unwrap().status(), PuzzleStatus::Active);
    let round2 = shown(&seen);
    assert_eq!(round2.len(), 5);
    assert_eq!(&round2[..4], &round1[..]);
}

/// Completing every round reaches the terminal completed state.
#[test]
fn sequence_completes_after_all_rounds() {
    let (mut hub, seen) = recording_hub();
    let mut store = StateStore::new(GameState::new());
    let mut factory = PuzzleFactory::new(vec![sequence_def("pipes")]);
    factory.start_by_id("pipes", 5, 0, &mut hub);

    for _ in 0..3 {
        let steps = seen
            .borrow()
            .iter()
            .rev()
            .find_map(|s| match s {
                PuzzleSignal::ShowSequence { steps, .. } => Some(steps.clone()),
                _ => None,
            })
            .unwrap();
        factory.handle_action(&PuzzleAction::BeginInput, 0, &mut hub);
        for pad in steps {
            factory.handle_action(&PuzzleAction::InputStep { pad }, 0, &mut hub);
        }
    }

    match factory.settle(&mut store) {
        Some(PuzzleOutcome::Completed { .. }) => {}
        other => panic!("expected completion, got {other:?}"),
    }
}

/// Scenario C: a timed puzzle fails with "Time's up!" at the first sample
/// past the deadline.
#[test]
fn timed_puzzle_fails_on_expiry() {
    let (mut hub, _) = recording_hub();
    let mut store = StateStore::new(GameState::new());
    let mut def = assembly_def("timed", Difficulty::Normal);
    def.time_limit_ms = Some(5_000);
    let mut factory = PuzzleFactory::new(vec![def]);

    factory.start_by_id("timed", 1, 0, &mut hub);
    factory.tick(4_999, &mut hub);
    assert_eq!(factory.current().unwrap().status(), PuzzleStatus::Active);

    factory.tick(5_001, &mut hub);
    match factory.settle(&mut store) {
        Some(PuzzleOutcome::Failed { reason, .. }) => assert_eq!(reason, "Time's up!"),
        other => panic!("expected timeout failure, got {other:?}"),
    }
    assert_eq!(
        store.state().get_var("puzzle_timed_failures"),
        Some(&Value::Int(1))
    );
}

/// Scenario D: starting B while A is active destroys A; no further signal
/// carries A's id and A never settles.
#[test]
fn replacement_destroys_the_active_instance() {
    let (mut hub, seen) = recording_hub();
    let mut store = StateStore::new(GameState::new());
    let mut factory = PuzzleFactory::new(vec![
        assembly_def("a", Difficulty::Normal),
        assembly_def("b", Difficulty::Normal),
    ]);

    factory.start_by_id("a", 1, 0, &mut hub);
    place(&mut factory, &mut hub, "p1", "s1", 0);

    factory.start_by_id("b", 1, 0, &mut hub);
    let after_replacement = seen.borrow().len();

    // Finish B; every new signal must belong to B.
    place(&mut factory, &mut hub, "p1", "s1", 0);
    place(&mut factory, &mut hub, "p2", "s2", 0);
    place(&mut factory, &mut hub, "p3", "s3", 0);

    for signal in seen.borrow().iter().skip(after_replacement) {
        let id = match signal {
            PuzzleSignal::Started { id, .. }
            | PuzzleSignal::Updated { id, .. }
            | PuzzleSignal::Feedback { id, .. }
            | PuzzleSignal::Notice { id, .. }
            | PuzzleSignal::Hint { id, .. }
            | PuzzleSignal::ShowSequence { id, .. }
            | PuzzleSignal::Completed { id, .. }
            | PuzzleSignal::Failed { id, .. }
            | PuzzleSignal::Reset { id } => id,
        };
        assert_eq!(id, "b", "signal from a destroyed instance: {signal:?}");
    }

    match factory.settle(&mut store) {
        Some(PuzzleOutcome::Completed { id, .. }) => assert_eq!(id, "b"),
        other => panic!("expected B to complete, got {other:?}"),
    }
    assert!(!store.state().has_flag("puzzle_a_completed"));
}

#[test]
fn attempt_cap_fails_with_the_documented_reason() {
    let (mut hub, seen) = recording_hub();
    let mut store = StateStore::new(GameState::new());
    let mut def = PuzzleDefinition::generic_fallback("brew");
    def.kind = "crafting".to_string();
    def.max_attempts = Some(2);
    def.crafting = Some(CraftingConfig {
        ingredients: vec![
            aludel::types::puzzle::IngredientSpec { id: "ash".into(), label: "Ash".into() },
            aludel::types::puzzle::IngredientSpec { id: "dew".into(), label: "Dew".into() },
        ],
        recipe: vec!["ash".into(), "dew".into()],
        max_ingredients: 4,
    });
    let mut factory = PuzzleFactory::new(vec![def]);

    factory.start_by_id("brew", 1, 0, &mut hub);
    // Wrong order twice.
    factory.handle_action(&PuzzleAction::ToggleIngredient { id: "dew".into() }, 0, &mut hub);
    factory.handle_action(&PuzzleAction::ToggleIngredient { id: "ash".into() }, 0, &mut hub);
    factory.handle_action(&PuzzleAction::Submit, 0, &mut hub);

    // First failure is non-terminal feedback.
    assert!(seen
        .borrow()
        .iter()
        .any(|s| matches!(s, PuzzleSignal::Feedback { .. })));
    assert_eq!(factory.current().unwrap().status(), PuzzleStatus::Active);

    factory.handle_action(&PuzzleAction::Submit, 0, &mut hub);
    match factory.settle(&mut store) {
        Some(PuzzleOutcome::Failed { reason, .. }) => {
            assert_eq!(reason, "Maximum attempts reached");
        }
        other => panic!("expected attempt-cap failure, got {other:?}"),
    }
}

#[test]
fn hints_surface_in_order_and_run_out() {
    let (mut hub, seen) = recording_hub();
    let mut def = assembly_def("lock", Difficulty::Normal);
    def.hints = vec!["Look at the pins.".into(), "The cam goes last.".into()];
    let mut factory = PuzzleFactory::new(vec![def]);
    factory.start_by_id("lock", 1, 0, &mut hub);

    for _ in 0..3 {
        factory.handle_action(&PuzzleAction::Hint, 0, &mut hub);
    }

    let hints: Vec<String> = seen
        .borrow()
        .iter()
        .filter_map(|s| match s {
            PuzzleSignal::Hint { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(hints, vec!["Look at the pins.", "The cam goes last."]);
    assert!(seen.borrow().iter().any(
        |s| matches!(s, PuzzleSignal::Notice { message, .. } if message == "No hints available.")
    ));
    assert_eq!(factory.current().unwrap().score_base(), 80);
}

#[test]
fn hints_and_attempts_lower_the_final_score() {
    let (mut hub, _) = recording_hub();
    let mut store = StateStore::new(GameState::new());
    let mut def = assembly_def("lock", Difficulty::Normal);
    def.hints = vec!["hint".into()];
    let mut factory = PuzzleFactory::new(vec![def]);

    factory.start_by_id("lock", 1, 0, &mut hub);
    factory.handle_action(&PuzzleAction::Hint, 0, &mut hub);
    // One wasted submit before solving.
    factory.handle_action(&PuzzleAction::Submit, 0, &mut hub);
    place(&mut factory, &mut hub, "p1", "s1", 0);
    place(&mut factory, &mut hub, "p2", "s2", 0);
    place(&mut factory, &mut hub, "p3", "s3", 0);

    match factory.settle(&mut store) {
        // 100 - 10 (second attempt) - 15 (one hint) = 75
        Some(PuzzleOutcome::Completed { score, .. }) => assert_eq!(score, 75),
        other => panic!("expected completion, got {other:?}"),
    }
}

#[test]
fn timed_completion_earns_a_proportional_bonus() {
    let (mut hub, _) = recording_hub();
    let mut store = StateStore::new(GameState::new());
    let mut def = assembly_def("lock", Difficulty::Normal);
    def.time_limit_ms = Some(10_000);
    let mut factory = PuzzleFactory::new(vec![def]);

    factory.start_by_id("lock", 1, 0, &mut hub);
    place(&mut factory, &mut hub, "p1", "s1", 0);
    place(&mut factory, &mut hub, "p2", "s2", 0);
    // Completes at 5s of 10s: half the 20-point bonus remains.
    place(&mut factory, &mut hub, "p3", "s3", 5_000);

    match factory.settle(&mut store) {
        Some(PuzzleOutcome::Completed { score, .. }) => assert_eq!(score, 110),
        other => panic!("expected completion, got {other:?}"),
    }
}

#[test]
fn reset_returns_a_terminal_puzzle_to_a_fresh_run() {
    let (mut hub, _) = recording_hub();
    let mut def = assembly_def("lock", Difficulty::Normal);
    def.max_attempts = Some(1);
    let mut factory = PuzzleFactory::new(vec![def]);

    factory.start_by_id("lock", 1, 0, &mut hub);
    factory.handle_action(&PuzzleAction::Submit, 0, &mut hub);
    assert_eq!(factory.current().unwrap().status(), PuzzleStatus::Failed);

    factory.handle_action(&PuzzleAction::Reset, 0, &mut hub);
    let instance = factory.current().unwrap();
    assert_eq!(instance.status(), PuzzleStatus::Active);
    assert_eq!(instance.attempts(), 0);
    assert_eq!(instance.hints_used(), 0);
}
