//! Typed signal hub
//!
//! One subscriber list per signal category, so producers and consumers are
//! statically known. Fan-out is synchronous: every current subscriber sees
//! the signal before the emitting call returns. A subscriber returning an
//! error is logged and isolated from the rest.
//!
//! State-change notifications have their own channel on
//! [`crate::state::StateStore`]; this hub carries the narrative and puzzle
//! categories.

use crate::types::signal::{NarrativeSignal, PuzzleSignal};

type Handler<T> = Box<dyn FnMut(&T) -> anyhow::Result<()>>;

/// The cross-component signal hub
#[derive(Default)]
pub struct SignalHub {
    narrative: Vec<Handler<NarrativeSignal>>,
    puzzle: Vec<Handler<PuzzleSignal>>,
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_narrative(
        &mut self,
        handler: impl FnMut(&NarrativeSignal) -> anyhow::Result<()> + 'static,
    ) {
        self.narrative.push(Box::new(handler));
    }

    pub fn on_puzzle(
        &mut self,
        handler: impl FnMut(&PuzzleSignal) -> anyhow::Result<()> + 'static,
    ) {
        self.puzzle.push(Box::new(handler));
    }

    pub fn narrative(&mut self, signal: NarrativeSignal) {
        for handler in &mut self.narrative {
            if let Err(err) = handler(&signal) {
                log::warn!("narrative subscriber failed on {signal:?}: {err}");
            }
        }
    }

    pub fn puzzle(&mut self, signal: PuzzleSignal) {
        for handler in &mut self.puzzle {
            if let Err(err) = handler(&signal) {
                log::warn!("puzzle subscriber failed on {signal:?}: {err}");
            }
        }
    }
}
