//! Puzzle state machines
//!
//! One shared lifecycle (ready → active → completed | failed) with scoring,
//! hinting, attempt and timing policy in [`PuzzleCore`], and the five
//! kind-specific working-state machines as a closed sum type behind
//! [`PuzzleInstance`]. The factory owns the single active instance.

use crate::signals::SignalHub;
use crate::types::event::PuzzleAction;
use crate::types::puzzle::{Difficulty, PuzzleDefinition, PuzzleKind};
use crate::types::signal::PuzzleSignal;
use crate::types::Effect;
use serde::{Deserialize, Serialize};

pub mod assembly;
pub mod crafting;
pub mod diagnosis;
pub mod factory;
pub mod resonance;
pub mod sequence;

pub use factory::PuzzleFactory;

use assembly::AssemblyState;
use crafting::CraftingState;
use diagnosis::DiagnosisState;
use resonance::ResonanceState;
use sequence::SequenceState;

const FAIL_ATTEMPTS: &str = "Maximum attempts reached";
const FAIL_TIMEOUT: &str = "Time's up!";
const HINT_PENALTY: i32 = 10;

/// Lifecycle state shared by every puzzle kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PuzzleStatus {
    Ready,
    Active,
    Completed,
    Failed,
}

/// Terminal result of one play-through, settled exactly once by the factory
#[derive(Debug, Clone, PartialEq)]
pub enum PuzzleOutcome {
    Completed {
        id: String,
        score: u32,
        rewards: Vec<Effect>,
    },
    Failed { id: String, reason: String },
}

/// What a variant action asks the shared machinery to do next
pub(crate) enum AfterAction {
    Stay,
    /// Route through the shared submit path (counts an attempt)
    AutoSubmit,
    /// Complete directly, bypassing submit (resonance note lock)
    AutoComplete,
}

/// Shared lifecycle bookkeeping: attempts, hints, running score base, timer
#[derive(Debug, Clone)]
pub struct PuzzleCore {
    status: PuzzleStatus,
    attempts: u32,
    hints_used: u32,
    /// Running display base; hint use deducts from it. The final score is
    /// computed independently by [`compute_score`].
    score_base: i32,
    deadline_ms: Option<u64>,
    time_remaining_ms: Option<u64>,
}

impl PuzzleCore {
    fn new() -> Self {
        Self {
            status: PuzzleStatus::Ready,
            attempts: 0,
            hints_used: 0,
            score_base: 100,
            deadline_ms: None,
            time_remaining_ms: None,
        }
    }

    fn arm(&mut self, now_ms: u64, time_limit_ms: Option<u64>) {
        self.status = PuzzleStatus::Active;
        self.attempts = 0;
        self.hints_used = 0;
        self.score_base = 100;
        self.deadline_ms = time_limit_ms.map(|limit| now_ms + limit);
        self.time_remaining_ms = None;
    }

    fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.deadline_ms.map(|d| d.saturating_sub(now_ms))
    }
}

/// The score formula shared by every kind.
///
/// Base 100, minus 10 per attempt beyond the first and 15 per hint; a timed
/// completion adds up to 20 bonus points proportional to the fraction of
/// time left; the difficulty factor multiplies the lot; clamped at zero and
/// floored.
pub fn compute_score(
    attempts: u32,
    hints_used: u32,
    time_limit_ms: Option<u64>,
    time_remaining_ms: Option<u64>,
    difficulty: Difficulty,
) -> u32 {
    let mut score =
        100.0 - 10.0 * attempts.saturating_sub(1) as f64 - 15.0 * hints_used as f64;
    if let (Some(limit), Some(remaining)) = (time_limit_ms, time_remaining_ms)
        && limit > 0
    {
        score += 20.0 * (remaining as f64 / limit as f64);
    }
    score *= difficulty.factor();
    score.max(0.0).floor() as u32
}

/// Kind-specific working state, one variant per puzzle kind
pub enum Mechanics {
    Assembly(AssemblyState),
    Crafting(CraftingState),
    Diagnosis(DiagnosisState),
    Sequence(SequenceState),
    Resonance(ResonanceState),
    Generic,
}

impl Mechanics {
    fn validate(&self) -> bool {
        match self {
            Mechanics::Assembly(s) => s.validate(),
            Mechanics::Crafting(s) => s.validate(),
            Mechanics::Diagnosis(s) => s.validate(),
            Mechanics::Sequence(s) => s.validate(),
            Mechanics::Resonance(s) => s.validate(),
            // The no-op contract: a generic puzzle completes on submit.
            Mechanics::Generic => true,
        }
    }

    fn solution(&self) -> serde_json::Value {
        match self {
            Mechanics::Assembly(s) => s.solution(),
            Mechanics::Crafting(s) => s.solution(),
            Mechanics::Diagnosis(s) => s.solution(),
            Mechanics::Sequence(s) => s.solution(),
            Mechanics::Resonance(s) => s.solution(),
            Mechanics::Generic => serde_json::Value::Null,
        }
    }

    fn clear(&mut self) {
        match self {
            Mechanics::Assembly(s) => s.clear(),
            Mechanics::Crafting(s) => s.clear(),
            Mechanics::Diagnosis(s) => s.clear(),
            Mechanics::Sequence(s) => s.clear(),
            Mechanics::Resonance(s) => s.clear(),
            Mechanics::Generic => {}
        }
    }

    fn on_start(&mut self, id: &str, hub: &mut SignalHub) {
        if let Mechanics::Sequence(s) = self {
            s.announce_round(id, hub);
        }
    }

    fn tick(&mut self, now_ms: u64, id: &str, hub: &mut SignalHub) {
        if let Mechanics::Sequence(s) = self {
            s.tick(now_ms, id, hub);
        }
    }

    fn handle(
        &mut self,
        action: &PuzzleAction,
        now_ms: u64,
        id: &str,
        hub: &mut SignalHub,
    ) -> AfterAction {
        match self {
            Mechanics::Assembly(s) => s.handle(action, id, hub),
            Mechanics::Crafting(s) => s.handle(action, id, hub),
            Mechanics::Diagnosis(s) => s.handle(action, id, hub),
            Mechanics::Sequence(s) => s.handle(action, now_ms, id, hub),
            Mechanics::Resonance(s) => s.handle(action, id, hub),
            Mechanics::Generic => {
                hub.puzzle(PuzzleSignal::Notice {
                    id: id.to_string(),
                    message: "Nothing to do here.".to_string(),
                });
                AfterAction::Stay
            }
        }
    }
}

/// One stateful play-through of a definition
pub struct PuzzleInstance {
    def: PuzzleDefinition,
    core: PuzzleCore,
    mechanics: Mechanics,
    outcome: Option<PuzzleOutcome>,
}

impl PuzzleInstance {
    /// Build an instance for a resolved kind. A kind whose config section
    /// is missing degrades to the generic contract.
    pub fn new(def: PuzzleDefinition, kind: PuzzleKind, seed: u64) -> Self {
        let mechanics = match kind {
            PuzzleKind::Assembly => def
                .assembly
                .clone()
                .map(|cfg| Mechanics::Assembly(AssemblyState::new(cfg))),
            PuzzleKind::Crafting => def
                .crafting
                .clone()
                .map(|cfg| Mechanics::Crafting(CraftingState::new(cfg))),
            PuzzleKind::Diagnosis => def
                .diagnosis
                .clone()
                .map(|cfg| Mechanics::Diagnosis(DiagnosisState::new(cfg))),
            PuzzleKind::Sequence => def
                .sequence
                .clone()
                .map(|cfg| Mechanics::Sequence(SequenceState::new(cfg, seed))),
            PuzzleKind::Resonance => def
                .resonance
                .clone()
                .map(|cfg| Mechanics::Resonance(ResonanceState::new(cfg))),
            PuzzleKind::Generic => Some(Mechanics::Generic),
        }
        .unwrap_or_else(|| {
            log::warn!(
                "puzzle '{}' is tagged '{}' but has no matching config; using generic",
                def.id,
                def.kind
            );
            Mechanics::Generic
        });

        Self {
            def,
            core: PuzzleCore::new(),
            mechanics,
            outcome: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.def.id
    }

    pub fn status(&self) -> PuzzleStatus {
        self.core.status
    }

    pub fn attempts(&self) -> u32 {
        self.core.attempts
    }

    pub fn hints_used(&self) -> u32 {
        self.core.hints_used
    }

    /// Running display base (hint penalties applied); not the final score.
    pub fn score_base(&self) -> i32 {
        self.core.score_base
    }

    /// The player's current solution in the variant's own shape.
    pub fn current_solution(&self) -> serde_json::Value {
        self.mechanics.solution()
    }

    /// Validate the current working state against the variant's target.
    pub fn validate_solution(&self) -> bool {
        self.mechanics.validate()
    }

    pub fn take_outcome(&mut self) -> Option<PuzzleOutcome> {
        self.outcome.take()
    }

    /// Ready → active; arms the countdown and announces the puzzle.
    pub fn start(&mut self, now_ms: u64, hub: &mut SignalHub) {
        if self.core.status != PuzzleStatus::Ready {
            log::warn!("start ignored for puzzle '{}' not in ready state", self.def.id);
            return;
        }
        self.core.arm(now_ms, self.def.time_limit_ms);
        hub.puzzle(PuzzleSignal::Started {
            id: self.def.id.clone(),
            kind: self.def.kind.clone(),
            title: self.def.title.clone(),
        });
        self.mechanics.on_start(&self.def.id, hub);
    }

    /// Back to a fresh active run: attempts, hints, timer and working state
    /// cleared; any terminal status is undone.
    pub fn reset(&mut self, now_ms: u64, hub: &mut SignalHub) {
        self.core.arm(now_ms, self.def.time_limit_ms);
        self.mechanics.clear();
        self.outcome = None;
        hub.puzzle(PuzzleSignal::Reset {
            id: self.def.id.clone(),
        });
        self.mechanics.on_start(&self.def.id, hub);
    }

    /// Sample the wall clock. Expiry is detected here, at the next sample
    /// after the deadline.
    pub fn tick(&mut self, now_ms: u64, hub: &mut SignalHub) {
        if self.core.status != PuzzleStatus::Active {
            return;
        }
        if let Some(deadline) = self.core.deadline_ms
            && now_ms >= deadline
        {
            self.fail(FAIL_TIMEOUT, hub);
            return;
        }
        self.mechanics.tick(now_ms, &self.def.id, hub);
    }

    /// Dispatch a player action.
    pub fn handle(&mut self, action: &PuzzleAction, now_ms: u64, hub: &mut SignalHub) {
        self.tick(now_ms, hub);
        match action {
            PuzzleAction::Reset => {
                self.reset(now_ms, hub);
                return;
            }
            _ if self.core.status != PuzzleStatus::Active => {
                hub.puzzle(PuzzleSignal::Notice {
                    id: self.def.id.clone(),
                    message: "This puzzle is not active.".to_string(),
                });
                return;
            }
            PuzzleAction::Submit => self.submit(now_ms, hub),
            PuzzleAction::Hint => self.use_hint(hub),
            other => {
                let after = self.mechanics.handle(other, now_ms, &self.def.id, hub);
                match after {
                    AfterAction::Stay => {}
                    AfterAction::AutoSubmit => self.submit(now_ms, hub),
                    AfterAction::AutoComplete => self.complete(now_ms, hub),
                }
            }
        }
    }

    /// The shared submit path: one attempt, validate, then complete, fail
    /// on the attempt cap, or feed back and stay active. An incomplete
    /// working state is simply invalid; there is no separate "not ready"
    /// error.
    pub fn submit(&mut self, now_ms: u64, hub: &mut SignalHub) {
        if self.core.status != PuzzleStatus::Active {
            return;
        }
        self.core.attempts += 1;
        if self.mechanics.validate() {
            self.complete(now_ms, hub);
            return;
        }
        if let Some(cap) = self.def.max_attempts
            && self.core.attempts >= cap
        {
            self.fail(FAIL_ATTEMPTS, hub);
            return;
        }
        hub.puzzle(PuzzleSignal::Feedback {
            id: self.def.id.clone(),
            message: "That's not right. Try again.".to_string(),
        });
    }

    /// Consume one hint slot, deduct the running penalty and surface the
    /// next unused hint.
    pub fn use_hint(&mut self, hub: &mut SignalHub) {
        if self.core.status != PuzzleStatus::Active {
            return;
        }
        let cap = self.def.hint_cap();
        if self.core.hints_used >= cap {
            hub.puzzle(PuzzleSignal::Notice {
                id: self.def.id.clone(),
                message: "No hints available.".to_string(),
            });
            return;
        }
        let text = self.def.hints[self.core.hints_used as usize].clone();
        self.core.hints_used += 1;
        self.core.score_base = (self.core.score_base - HINT_PENALTY).max(0);
        hub.puzzle(PuzzleSignal::Hint {
            id: self.def.id.clone(),
            text,
            used: self.core.hints_used,
            remaining: cap - self.core.hints_used,
        });
    }

    fn complete(&mut self, now_ms: u64, hub: &mut SignalHub) {
        self.core.time_remaining_ms = self.core.remaining_ms(now_ms);
        self.core.status = PuzzleStatus::Completed;
        let score = compute_score(
            self.core.attempts,
            self.core.hints_used,
            self.def.time_limit_ms,
            self.core.time_remaining_ms,
            self.def.difficulty,
        );
        self.outcome = Some(PuzzleOutcome::Completed {
            id: self.def.id.clone(),
            score,
            rewards: self.def.rewards.clone(),
        });
        hub.puzzle(PuzzleSignal::Completed {
            id: self.def.id.clone(),
            score,
            attempts: self.core.attempts,
            hints_used: self.core.hints_used,
            time_remaining_ms: self.core.time_remaining_ms,
            rewards: self.def.rewards.clone(),
        });
    }

    fn fail(&mut self, reason: &str, hub: &mut SignalHub) {
        self.core.status = PuzzleStatus::Failed;
        self.outcome = Some(PuzzleOutcome::Failed {
            id: self.def.id.clone(),
            reason: reason.to_string(),
        });
        hub.puzzle(PuzzleSignal::Failed {
            id: self.def.id.clone(),
            reason: reason.to_string(),
        });
    }
}
