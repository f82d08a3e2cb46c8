//! Game state store and condition evaluation
//!
//! [`GameState`] is the single mutable aggregate the whole game reads and
//! writes: flags, variables, inventory, journal and position. Invariants
//! live in its accessors (inventory never underflows, flags default false,
//! variables default to the caller's fallback). [`StateStore`] wraps it
//! with subscribe/notify so observers see every change without mutation
//! methods emitting ad hoc events all over the codebase.

use crate::types::condition::Condition;
use crate::types::signal::StateChange;
use crate::types::value::{Operation, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// An append-only journal entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    pub title: String,
    pub text: String,
    pub at_playtime_ms: u64,
}

/// Journal records plus discovery sets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Journal {
    pub entries: Vec<JournalEntry>,
    pub characters: BTreeSet<String>,
    pub items: BTreeSet<String>,
}

/// The whole mutable game state, persisted and restored wholesale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GameState {
    pub flags: HashMap<String, bool>,
    pub variables: HashMap<String, Value>,
    /// Item id to count; counts are never negative and zero entries are
    /// dropped
    pub inventory: HashMap<String, u32>,
    pub journal: Journal,
    pub chapter: u32,
    pub scene: String,
    pub playtime_ms: u64,
    /// Seed for deterministic puzzle randomness
    pub rng_seed: u64,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng_seed: seed,
            ..Default::default()
        }
    }

    /// Flags default to false when absent.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.get(flag).copied().unwrap_or(false)
    }

    pub fn set_flag(&mut self, flag: impl Into<String>, value: bool) {
        self.flags.insert(flag.into(), value);
    }

    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Variables default to the caller-supplied fallback when absent.
    pub fn var_or(&self, name: &str, default: Value) -> Value {
        self.variables.get(name).cloned().unwrap_or(default)
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Arithmetic update; absent variables start from 0.
    pub fn modify_var(&mut self, name: &str, op: Operation, value: &Value) -> Result<(), String> {
        let current = self.var_or(name, Value::Int(0));
        let next = current.apply(op, value)?;
        self.variables.insert(name.to_string(), next);
        Ok(())
    }

    pub fn item_count(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    pub fn add_item(&mut self, item: impl Into<String>, count: u32) -> u32 {
        let entry = self.inventory.entry(item.into()).or_insert(0);
        *entry = entry.saturating_add(count);
        *entry
    }

    /// Removal fails rather than underflowing: false and no change when the
    /// held count is short.
    pub fn remove_item(&mut self, item: &str, count: u32) -> bool {
        let held = self.item_count(item);
        if held < count {
            return false;
        }
        let remaining = held - count;
        if remaining == 0 {
            self.inventory.remove(item);
        } else {
            self.inventory.insert(item.to_string(), remaining);
        }
        true
    }

    pub fn add_journal(&mut self, title: impl Into<String>, text: impl Into<String>) {
        self.journal.entries.push(JournalEntry {
            title: title.into(),
            text: text.into(),
            at_playtime_ms: self.playtime_ms,
        });
    }

    /// Evaluate a condition against this state. Pure and synchronous.
    ///
    /// Unknown condition tags evaluate permissively to true; see DESIGN.md.
    pub fn evaluate(&self, condition: &Condition) -> bool {
        match condition {
            Condition::Flag { flag } => self.has_flag(flag),
            Condition::NotFlag { flag } => !self.has_flag(flag),
            Condition::Variable { name, op, value } => {
                self.var_or(name, Value::Int(0)).compare(*op, value)
            }
            Condition::HasItem { item, count } => self.item_count(item) >= *count,
            Condition::Chapter { op, number } => {
                Value::Int(self.chapter as i64).compare(*op, &Value::Int(*number as i64))
            }
            Condition::All { conditions } => conditions.iter().all(|c| self.evaluate(c)),
            Condition::Any { conditions } => conditions.iter().any(|c| self.evaluate(c)),
            Condition::Not { condition } => !self.evaluate(condition),
            Condition::Unknown => {
                log::warn!("unknown condition tag evaluated permissively to true");
                true
            }
        }
    }
}

type Observer = Box<dyn FnMut(&StateChange) -> anyhow::Result<()>>;

/// State aggregate plus observer notification.
///
/// All gameplay mutation goes through this wrapper; every change notifies
/// the subscribed observers synchronously. An observer error is logged and
/// does not affect the others.
pub struct StateStore {
    state: GameState,
    observers: Vec<Observer>,
}

impl StateStore {
    pub fn new(state: GameState) -> Self {
        Self {
            state,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&StateChange) -> anyhow::Result<()> + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Replace the whole state, e.g. after a successful load. Observers are
    /// kept; no change notifications are emitted for the swap.
    pub fn replace(&mut self, state: GameState) {
        self.state = state;
    }

    pub fn evaluate(&self, condition: &Condition) -> bool {
        self.state.evaluate(condition)
    }

    pub fn set_flag(&mut self, flag: &str, value: bool) {
        self.state.set_flag(flag, value);
        self.notify(StateChange::FlagSet {
            flag: flag.to_string(),
            value,
        });
    }

    pub fn set_var(&mut self, name: &str, value: Value) {
        self.state.set_var(name, value.clone());
        self.notify(StateChange::VariableSet {
            name: name.to_string(),
            value,
        });
    }

    pub fn modify_var(&mut self, name: &str, op: Operation, value: &Value) {
        match self.state.modify_var(name, op, value) {
            Ok(()) => {
                let value = self.state.var_or(name, Value::Int(0));
                self.notify(StateChange::VariableSet {
                    name: name.to_string(),
                    value,
                });
            }
            Err(reason) => log::warn!("modify of variable '{name}' skipped: {reason}"),
        }
    }

    pub fn add_item(&mut self, item: &str, count: u32) {
        let total = self.state.add_item(item, count);
        self.state.journal.items.insert(item.to_string());
        self.notify(StateChange::ItemAdded {
            item: item.to_string(),
            count,
            total,
        });
    }

    /// False and no notification when the held count is short.
    pub fn remove_item(&mut self, item: &str, count: u32) -> bool {
        if !self.state.remove_item(item, count) {
            return false;
        }
        let total = self.state.item_count(item);
        self.notify(StateChange::ItemRemoved {
            item: item.to_string(),
            count,
            total,
        });
        true
    }

    pub fn add_journal(&mut self, title: &str, text: &str) {
        self.state.add_journal(title, text);
        self.notify(StateChange::JournalAdded {
            title: title.to_string(),
        });
    }

    /// Apply a typed effect (choice effects, puzzle rewards).
    pub fn apply_effect(&mut self, effect: &crate::types::content::Effect) {
        use crate::types::content::Effect;
        match effect {
            Effect::SetFlag { flag, value } => self.set_flag(flag, *value),
            Effect::SetVar { name, value } => self.set_var(name, value.clone()),
            Effect::GiveItem { item, count } => self.add_item(item, *count),
            Effect::TakeItem { item, count } => {
                if !self.remove_item(item, *count) {
                    log::warn!("effect tried to take {count} '{item}' but only {} held",
                        self.state.item_count(item));
                }
            }
        }
    }

    pub fn discover_character(&mut self, name: &str) {
        self.state.journal.characters.insert(name.to_string());
    }

    pub fn set_position(&mut self, chapter: u32, scene: &str) {
        self.state.chapter = chapter;
        self.state.scene = scene.to_string();
    }

    pub fn add_playtime(&mut self, ms: u64) {
        self.state.playtime_ms += ms;
    }

    fn notify(&mut self, change: StateChange) {
        for observer in &mut self.observers {
            if let Err(err) = observer(&change) {
                log::warn!("state observer failed on {change:?}: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::value::Comparator;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn absent_flag_is_false() {
        let state = GameState::new();
        assert!(!state.has_flag("never_set"));
        assert!(state.evaluate(&Condition::NotFlag {
            flag: "never_set".into()
        }));
    }

    #[test]
    fn inventory_never_underflows() {
        let mut state = GameState::new();
        state.add_item("coin", 3);
        assert!(!state.remove_item("coin", 5));
        assert_eq!(state.item_count("coin"), 3);
        assert!(state.remove_item("coin", 3));
        assert_eq!(state.item_count("coin"), 0);
    }

    #[test]
    fn add_then_remove_restores_prior_count() {
        let mut state = GameState::new();
        state.add_item("herb", 2);
        state.add_item("herb", 4);
        assert!(state.remove_item("herb", 4));
        assert_eq!(state.item_count("herb"), 2);
    }

    #[test]
    fn and_or_not_compose() {
        let mut state = GameState::new();
        state.set_flag("a", true);
        let a = Condition::Flag { flag: "a".into() };
        let b = Condition::Flag { flag: "b".into() };

        assert_eq!(
            state.evaluate(&Condition::All {
                conditions: vec![a.clone(), b.clone()]
            }),
            state.evaluate(&a) && state.evaluate(&b)
        );
        assert_eq!(
            state.evaluate(&Condition::Any {
                conditions: vec![a.clone(), b.clone()]
            }),
            state.evaluate(&a) || state.evaluate(&b)
        );
        assert_eq!(
            state.evaluate(&Condition::Not {
                condition: Box::new(a.clone())
            }),
            !state.evaluate(&a)
        );
    }

    #[test]
    fn variable_comparison_defaults_absent_to_zero() {
        let state = GameState::new();
        assert!(state.evaluate(&Condition::Variable {
            name: "trust".into(),
            op: Comparator::Equal,
            value: Value::Int(0),
        }));
    }

    #[test]
    fn unknown_condition_evaluates_true() {
        // Pins the permissive pass-through so an intentional fix shows up
        // as a test change.
        let state = GameState::new();
        assert!(state.evaluate(&Condition::Unknown));
    }

    #[test]
    fn store_notifies_observers_of_changes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut store = StateStore::new(GameState::new());
        store.subscribe(move |change| {
            sink.borrow_mut().push(change.clone());
            Ok(())
        });

        store.set_flag("lamp_lit", true);
        store.add_item("coin", 2);
        assert!(!store.remove_item("coin", 9));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0], StateChange::FlagSet { .. }));
        assert!(matches!(seen[1], StateChange::ItemAdded { total: 2, .. }));
    }

    #[test]
    fn failing_observer_does_not_block_others() {
        let seen = Rc::new(RefCell::new(0u32));
        let sink = Rc::clone(&seen);

        let mut store = StateStore::new(GameState::new());
        store.subscribe(|_| anyhow::bail!("observer down"));
        store.subscribe(move |_| {
            *sink.borrow_mut() += 1;
            Ok(())
        });

        store.set_flag("x", true);
        assert_eq!(*seen.borrow(), 1);
    }
}
