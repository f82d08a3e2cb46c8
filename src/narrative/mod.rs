//! Narrative sequencer
//!
//! [`SceneRunner`] interprets one scene's command list: commands execute in
//! order until one suspends (dialogue, choice, actor, timer, puzzle), and
//! the runner reports what it is waiting for. Suspension has no timeout;
//! the runner waits indefinitely for the matching event. Branching via
//! choice targets and jumps is the only non-linear control transfer, and it
//! applies only after the current command's effects are done.

use crate::puzzle::PuzzleFactory;
use crate::signals::SignalHub;
use crate::state::StateStore;
use crate::types::content::{ChoiceOption, CommandBody, Scene, Target};
use crate::types::event::PlayerEvent;
use crate::types::signal::NarrativeSignal;
use std::collections::HashMap;

pub mod director;

pub use director::{Director, Progress};

/// What the runner is suspended on, reported to the caller
#[derive(Debug, Clone, PartialEq)]
pub enum SceneStep {
    WaitAdvance,
    WaitChoice,
    WaitActor,
    WaitTimer { ms: u64 },
    WaitPuzzle,
    /// Cursor ran past the last command, or a jump targeted another scene
    SceneEnd { goto: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Waiting {
    None,
    Advance,
    Choice,
    Actor,
    Timer,
    Puzzle,
}

/// Executes one scene's content against the game state
pub struct SceneRunner {
    scene: Scene,
    labels: HashMap<String, usize>,
    pc: usize,
    waiting: Waiting,
    timer_ms: u64,
    /// Condition-filtered options of the pending choice
    pending: Vec<ChoiceOption>,
}

impl SceneRunner {
    pub fn new(scene: Scene) -> Self {
        let labels = scene.labels();
        Self {
            scene,
            labels,
            pc: 0,
            waiting: Waiting::None,
            timer_ms: 0,
            pending: Vec::new(),
        }
    }

    pub fn scene_id(&self) -> &str {
        &self.scene.id
    }

    /// Run until the next suspension point.
    ///
    /// An event that does not match the current suspension is ignored; the
    /// runner re-reports what it is still waiting for.
    pub fn step(
        &mut self,
        event: Option<&PlayerEvent>,
        store: &mut StateStore,
        puzzles: &mut PuzzleFactory,
        hub: &mut SignalHub,
        now_ms: u64,
    ) -> SceneStep {
        if let Some(event) = event
            && let Some(step) = self.absorb(event, store, hub)
        {
            return step;
        }
        if self.waiting != Waiting::None {
            return self.current_wait();
        }
        self.execute(store, puzzles, hub, now_ms)
    }

    /// Resolve the current suspension with an incoming event. Returns a
    /// step when the event settles the whole call (still waiting, or a
    /// choice transferred to another scene).
    fn absorb(
        &mut self,
        event: &PlayerEvent,
        store: &mut StateStore,
        hub: &mut SignalHub,
    ) -> Option<SceneStep> {
        match (self.waiting, event) {
            (Waiting::Advance, PlayerEvent::Advance)
            | (Waiting::Actor, PlayerEvent::ActorDone)
            | (Waiting::Timer, PlayerEvent::TimerElapsed)
            | (Waiting::Puzzle, PlayerEvent::PuzzleDone) => {
                self.waiting = Waiting::None;
                None
            }
            (Waiting::Choice, PlayerEvent::Choose { index }) => self.choose(*index, store, hub),
            (Waiting::None, _) => None,
            (_, PlayerEvent::Puzzle(_)) => None,
            (waiting, event) => {
                log::debug!("event {event:?} ignored while waiting for {waiting:?}");
                Some(self.current_wait())
            }
        }
    }

    fn choose(
        &mut self,
        index: usize,
        store: &mut StateStore,
        hub: &mut SignalHub,
    ) -> Option<SceneStep> {
        let Some(option) = self.pending.get(index).cloned() else {
            log::warn!("choice index {index} out of range; still waiting");
            return Some(SceneStep::WaitChoice);
        };

        hub.narrative(NarrativeSignal::ChoiceMade {
            index,
            text: option.text.clone(),
        });
        for effect in &option.effects {
            store.apply_effect(effect);
        }
        self.waiting = Waiting::None;
        self.pending.clear();

        match option.goto {
            Some(Target::Label { label }) => {
                self.jump_to_label(&label);
                None
            }
            Some(Target::Scene { scene }) => Some(SceneStep::SceneEnd { goto: Some(scene) }),
            None => None,
        }
    }

    fn execute(
        &mut self,
        store: &mut StateStore,
        puzzles: &mut PuzzleFactory,
        hub: &mut SignalHub,
        now_ms: u64,
    ) -> SceneStep {
        loop {
            let Some(command) = self.scene.content.get(self.pc).cloned() else {
                return SceneStep::SceneEnd { goto: None };
            };

            if let Some(when) = &command.when
                && !store.evaluate(when)
            {
                self.pc += 1;
                continue;
            }

            match command.body {
                CommandBody::Dialogue { speaker, text } => {
                    store.discover_character(&speaker);
                    hub.narrative(NarrativeSignal::Dialogue { speaker, text });
                    self.pc += 1;
                    self.waiting = Waiting::Advance;
                    return SceneStep::WaitAdvance;
                }
                CommandBody::Narration { text } => {
                    hub.narrative(NarrativeSignal::Narration { text });
                    self.pc += 1;
                    self.waiting = Waiting::Advance;
                    return SceneStep::WaitAdvance;
                }
                CommandBody::Choice { prompt, options } => {
                    let visible: Vec<ChoiceOption> = options
                        .into_iter()
                        .filter(|o| o.when.as_ref().is_none_or(|c| store.evaluate(c)))
                        .collect();
                    self.pc += 1;
                    if visible.is_empty() {
                        log::warn!("choice with no available options skipped");
                        continue;
                    }
                    hub.narrative(NarrativeSignal::ChoiceShow {
                        prompt,
                        options: visible.iter().map(|o| o.text.clone()).collect(),
                    });
                    self.pending = visible;
                    self.waiting = Waiting::Choice;
                    return SceneStep::WaitChoice;
                }
                CommandBody::Action { actor, action } => {
                    hub.narrative(NarrativeSignal::Action { actor, action });
                    self.pc += 1;
                    self.waiting = Waiting::Actor;
                    return SceneStep::WaitActor;
                }
                CommandBody::Wait { ms } => {
                    hub.narrative(NarrativeSignal::Wait { ms });
                    self.pc += 1;
                    self.waiting = Waiting::Timer;
                    self.timer_ms = ms;
                    return SceneStep::WaitTimer { ms };
                }
                CommandBody::Puzzle { id } => {
                    let seed = puzzle_seed(store.state().rng_seed, &id);
                    puzzles.start_by_id(&id, seed, now_ms, hub);
                    self.pc += 1;
                    self.waiting = Waiting::Puzzle;
                    return SceneStep::WaitPuzzle;
                }
                CommandBody::SetFlag { flag, value } => {
                    store.set_flag(&flag, value);
                    self.pc += 1;
                }
                CommandBody::SetVar { name, value } => {
                    store.set_var(&name, value);
                    self.pc += 1;
                }
                CommandBody::ModifyVar { name, op, value } => {
                    store.modify_var(&name, op, &value);
                    self.pc += 1;
                }
                CommandBody::GiveItem { item, count } => {
                    store.add_item(&item, count);
                    self.pc += 1;
                }
                CommandBody::TakeItem { item, count } => {
                    if !store.remove_item(&item, count) {
                        log::warn!("take of {count} '{item}' skipped; not enough held");
                    }
                    self.pc += 1;
                }
                CommandBody::Journal { title, text } => {
                    store.add_journal(&title, &text);
                    self.pc += 1;
                }
                CommandBody::Jump { target } => match target {
                    Target::Label { label } => self.jump_to_label(&label),
                    Target::Scene { scene } => {
                        return SceneStep::SceneEnd { goto: Some(scene) };
                    }
                },
                CommandBody::Label { .. } => {
                    self.pc += 1;
                }
            }
        }
    }

    fn jump_to_label(&mut self, label: &str) {
        match self.labels.get(label) {
            Some(&index) => self.pc = index,
            None => {
                // Validation catches this at load; degrade to linear advance.
                log::warn!("jump to undefined label '{label}' in scene '{}'", self.scene.id);
                self.pc += 1;
            }
        }
    }

    fn current_wait(&self) -> SceneStep {
        match self.waiting {
            Waiting::Advance => SceneStep::WaitAdvance,
            Waiting::Choice => SceneStep::WaitChoice,
            Waiting::Actor => SceneStep::WaitActor,
            Waiting::Timer => SceneStep::WaitTimer { ms: self.timer_ms },
            Waiting::Puzzle => SceneStep::WaitPuzzle,
            Waiting::None => SceneStep::SceneEnd { goto: None },
        }
    }
}

/// Per-puzzle seed derived from the state seed, so two different puzzles in
/// one playthrough do not share sequences.
fn puzzle_seed(base: u64, id: &str) -> u64 {
    id.bytes()
        .fold(base ^ 0x9e37_79b9_7f4a_7c15, |acc, b| {
            acc.rotate_left(5).wrapping_mul(31) ^ b as u64
        })
}
