//! Puzzle factory
//!
//! Owns the kind registry, the id → definition map loaded at startup, and
//! the single current-instance slot. Starting a puzzle while another is
//! active abandons the first in place; its pending outcome never settles.
//! Terminal outcomes are translated here into state-store mutations.

use crate::puzzle::{PuzzleInstance, PuzzleOutcome, PuzzleStatus};
use crate::signals::SignalHub;
use crate::state::StateStore;
use crate::types::event::PuzzleAction;
use crate::types::puzzle::{PuzzleDefinition, PuzzleKind};
use crate::types::value::{Operation, Value};
use std::collections::HashMap;

pub struct PuzzleFactory {
    definitions: HashMap<String, PuzzleDefinition>,
    current: Option<PuzzleInstance>,
}

impl PuzzleFactory {
    pub fn new(definitions: Vec<PuzzleDefinition>) -> Self {
        let mut map = HashMap::new();
        for def in definitions {
            let id = def.id.clone();
            if map.insert(id.clone(), def).is_some() {
                log::warn!("duplicate puzzle definition '{id}'; the later one wins");
            }
        }
        Self {
            definitions: map,
            current: None,
        }
    }

    pub fn definition(&self, id: &str) -> Option<&PuzzleDefinition> {
        self.definitions.get(id)
    }

    pub fn current(&self) -> Option<&PuzzleInstance> {
        self.current.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|p| p.status() == PuzzleStatus::Active)
    }

    /// Start the puzzle registered under `id`. An unknown id degrades to a
    /// generic placeholder rather than erroring.
    pub fn start_by_id(&mut self, id: &str, seed: u64, now_ms: u64, hub: &mut SignalHub) {
        let def = match self.definitions.get(id) {
            Some(def) => def.clone(),
            None => {
                log::warn!("unknown puzzle id '{id}'; using a generic placeholder");
                PuzzleDefinition::generic_fallback(id)
            }
        };
        self.start_with_definition(def, seed, now_ms, hub);
    }

    /// Start from an inline definition. Any active instance is torn down
    /// first, unconditionally.
    pub fn start_with_definition(
        &mut self,
        def: PuzzleDefinition,
        seed: u64,
        now_ms: u64,
        hub: &mut SignalHub,
    ) {
        if let Some(prev) = self.current.take() {
            log::info!(
                "abandoning puzzle '{}' (status {:?}) to start '{}'",
                prev.id(),
                prev.status(),
                def.id
            );
        }

        let kind = PuzzleKind::from_tag(&def.kind).unwrap_or_else(|| {
            log::warn!("unknown puzzle type '{}'; falling back to generic", def.kind);
            PuzzleKind::Generic
        });

        let mut instance = PuzzleInstance::new(def, kind, seed);
        instance.start(now_ms, hub);
        self.current = Some(instance);
    }

    /// Forward a player action to the active instance.
    pub fn handle_action(&mut self, action: &PuzzleAction, now_ms: u64, hub: &mut SignalHub) {
        match self.current.as_mut() {
            Some(instance) => instance.handle(action, now_ms, hub),
            None => log::warn!("puzzle action with no active puzzle: {action:?}"),
        }
    }

    /// Sample the wall clock for the active instance.
    pub fn tick(&mut self, now_ms: u64, hub: &mut SignalHub) {
        if let Some(instance) = self.current.as_mut() {
            instance.tick(now_ms, hub);
        }
    }

    /// Drop the current instance without settling, e.g. when a save is
    /// loaded over a running puzzle.
    pub fn abandon(&mut self) {
        if let Some(prev) = self.current.take() {
            log::info!("abandoning puzzle '{}' (status {:?})", prev.id(), prev.status());
        }
    }

    /// Collect a terminal outcome, destroy the instance, and apply the
    /// outcome's mutations: completion sets the per-puzzle flag, records
    /// the score variable and applies every reward; failure increments the
    /// per-puzzle failure counter.
    pub fn settle(&mut self, store: &mut StateStore) -> Option<PuzzleOutcome> {
        let outcome = self.current.as_mut()?.take_outcome()?;
        self.current = None;

        match &outcome {
            PuzzleOutcome::Completed { id, score, rewards } => {
                store.set_flag(&format!("puzzle_{id}_completed"), true);
                store.set_var(&format!("puzzle_{id}_score"), Value::Int(*score as i64));
                for reward in rewards {
                    store.apply_effect(reward);
                }
            }
            PuzzleOutcome::Failed { id, .. } => {
                store.modify_var(
                    &format!("puzzle_{id}_failures"),
                    Operation::Add,
                    &Value::Int(1),
                );
            }
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GameState;
    use crate::types::event::PuzzleAction;

    fn generic_def(id: &str) -> PuzzleDefinition {
        PuzzleDefinition::generic_fallback(id)
    }

    #[test]
    fn unknown_id_falls_back_to_generic() {
        let mut hub = SignalHub::new();
        let mut factory = PuzzleFactory::new(Vec::new());
        factory.start_by_id("missing", 1, 0, &mut hub);
        assert!(factory.is_active());
        assert_eq!(factory.current().unwrap().id(), "missing");
    }

    #[test]
    fn unknown_kind_falls_back_to_generic_contract() {
        let mut hub = SignalHub::new();
        let mut factory = PuzzleFactory::new(Vec::new());
        let mut def = generic_def("odd");
        def.kind = "holographic".to_string();
        factory.start_with_definition(def, 1, 0, &mut hub);

        // The generic contract completes on first submit.
        factory.handle_action(&PuzzleAction::Submit, 0, &mut hub);
        let mut store = StateStore::new(GameState::new());
        let outcome = factory.settle(&mut store).unwrap();
        assert!(matches!(outcome, PuzzleOutcome::Completed { .. }));
    }

    #[test]
    fn starting_a_second_puzzle_abandons_the_first() {
        let mut hub = SignalHub::new();
        let mut factory = PuzzleFactory::new(vec![generic_def("a"), generic_def("b")]);
        factory.start_by_id("a", 1, 0, &mut hub);
        factory.start_by_id("b", 1, 0, &mut hub);

        assert_eq!(factory.current().unwrap().id(), "b");
        // The abandoned instance never settles.
        let mut store = StateStore::new(GameState::new());
        assert!(factory.settle(&mut store).is_none());
        assert!(!store.state().has_flag("puzzle_a_completed"));
    }

    #[test]
    fn completion_applies_flag_score_and_rewards() {
        use crate::types::content::Effect;

        let mut hub = SignalHub::new();
        let mut def = generic_def("rite");
        def.rewards = vec![Effect::GiveItem {
            item: "sigil".into(),
            count: 1,
        }];
        let mut factory = PuzzleFactory::new(vec![def]);
        factory.start_by_id("rite", 1, 0, &mut hub);
        factory.handle_action(&PuzzleAction::Submit, 10, &mut hub);

        let mut store = StateStore::new(GameState::new());
        factory.settle(&mut store).unwrap();
        assert!(store.state().has_flag("puzzle_rite_completed"));
        assert_eq!(
            store.state().get_var("puzzle_rite_score"),
            Some(&Value::Int(100))
        );
        assert_eq!(store.state().item_count("sigil"), 1);
    }
}
