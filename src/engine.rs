//! Game engine - the explicitly constructed context object
//!
//! Wires the state store, puzzle factory, director and signal hub together
//! and exposes the host-facing surface: start, feed an event, sample the
//! clock, save and load. Nothing here is ambient or global; tests build as
//! many independent `Game` values as they like.

use crate::content::{self, ContentError, ContentSet};
use crate::narrative::{Director, Progress};
use crate::puzzle::PuzzleFactory;
use crate::signals::SignalHub;
use crate::state::{GameState, StateStore};
use crate::storage::{self, SaveStore, StoreError, AUTOSAVE_SLOT};
use crate::types::event::PlayerEvent;

/// What the host should do next
#[derive(Debug, Clone, PartialEq)]
pub enum GameStep {
    /// Show the current line and wait for the advance signal
    WaitAdvance,
    /// Present the shown options and wait for a selection
    WaitChoice,
    /// Wait for the character collaborator to report completion
    WaitActor,
    /// Wait the given duration, then send `TimerElapsed`
    WaitTimer { ms: u64 },
    /// Drive the active puzzle until it settles
    WaitPuzzle,
    /// The story is over
    Complete,
}

pub struct Game {
    store: StateStore,
    puzzles: PuzzleFactory,
    director: Director,
    hub: SignalHub,
    content_hash: String,
    saves: Option<Box<dyn SaveStore>>,
    last_tick_ms: Option<u64>,
    last_step: GameStep,
}

impl Game {
    /// Build a game over validated content with a fresh state.
    pub fn new(content: ContentSet) -> Result<Self, ContentError> {
        Self::with_state(content, GameState::new())
    }

    /// Build a game over validated content with a provided state (custom
    /// seed, restored snapshot, test fixture).
    pub fn with_state(content: ContentSet, state: GameState) -> Result<Self, ContentError> {
        content::validate(&content)?;
        let content_hash = content.content_hash();
        Ok(Self {
            store: StateStore::new(state),
            puzzles: PuzzleFactory::new(content.puzzles),
            director: Director::new(content.chapters),
            hub: SignalHub::new(),
            content_hash,
            saves: None,
            last_tick_ms: None,
            last_step: GameStep::Complete,
        })
    }

    /// Attach the save persistence backend; autosaves need one.
    pub fn attach_saves(&mut self, saves: Box<dyn SaveStore>) {
        self.saves = Some(saves);
    }

    /// Subscribe presentation handlers before calling [`Game::start`].
    pub fn hub_mut(&mut self) -> &mut SignalHub {
        &mut self.hub
    }

    pub fn state(&self) -> &GameState {
        self.store.state()
    }

    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    pub fn saves(&self) -> Option<&dyn SaveStore> {
        self.saves.as_deref()
    }

    /// Enter the first chapter and run to the first suspension.
    pub fn start(&mut self, now_ms: u64) -> GameStep {
        self.last_tick_ms = Some(now_ms);
        let progress =
            self.director
                .start(&mut self.store, &mut self.puzzles, &mut self.hub, now_ms);
        self.finish(progress)
    }

    /// Feed one host event.
    pub fn handle(&mut self, event: PlayerEvent, now_ms: u64) -> GameStep {
        self.accrue_playtime(now_ms);

        if let PlayerEvent::Puzzle(action) = &event {
            self.puzzles.handle_action(action, now_ms, &mut self.hub);
            return self.pump_puzzle(now_ms);
        }

        let progress = self.director.step(
            Some(&event),
            &mut self.store,
            &mut self.puzzles,
            &mut self.hub,
            now_ms,
        );
        self.finish(progress)
    }

    /// Sample the wall clock: accrues playtime, advances puzzle countdowns
    /// and settles any terminal puzzle outcome.
    pub fn tick(&mut self, now_ms: u64) -> GameStep {
        self.accrue_playtime(now_ms);
        self.puzzles.tick(now_ms, &mut self.hub);
        self.pump_puzzle(now_ms)
    }

    /// Start a puzzle outside the scripted flow (debug menus, replays).
    pub fn start_puzzle(&mut self, id: &str, now_ms: u64) {
        let seed = self.store.state().rng_seed.wrapping_add(1);
        self.puzzles.start_by_id(id, seed, now_ms, &mut self.hub);
        self.last_step = GameStep::WaitPuzzle;
    }

    /// Save to a numbered slot (or the autosave slot).
    pub fn save(&mut self, slot: u8) -> Result<(), StoreError> {
        let record = self.make_record();
        let saves = self.saves.as_deref_mut().ok_or_else(|| StoreError::Io {
            message: "no save store attached".to_string(),
        })?;
        storage::save_to_slot(saves, &record, slot)
    }

    /// Load a slot and resume at the saved chapter/scene. On failure the
    /// in-memory state is left unchanged.
    pub fn load(&mut self, slot: u8, now_ms: u64) -> Result<GameStep, StoreError> {
        let saves = self.saves.as_deref().ok_or_else(|| StoreError::Io {
            message: "no save store attached".to_string(),
        })?;
        let record = storage::load_slot(saves, slot)?;
        if record.content_hash != self.content_hash {
            log::warn!(
                "save in slot {slot} was made against different chapter content; loading anyway"
            );
        }

        self.puzzles.abandon();
        self.store.replace(record.state);
        self.director
            .jump_to(record.chapter, &record.scene, &mut self.store, &mut self.hub);
        self.last_tick_ms = Some(now_ms);
        let progress = self.director.step(
            None,
            &mut self.store,
            &mut self.puzzles,
            &mut self.hub,
            now_ms,
        );
        Ok(self.finish(progress))
    }

    fn make_record(&self) -> crate::types::save::SaveRecord {
        // Persist the scene-entry checkpoint, not the live state: a load
        // replays the scene from its first command, and mid-scene state
        // would double-apply the scene's item grants and mutations.
        let live = self.store.state();
        let mut snapshot = self
            .director
            .checkpoint()
            .cloned()
            .unwrap_or_else(|| live.clone());
        snapshot.playtime_ms = live.playtime_ms;

        let chapter_title = self
            .director
            .chapters()
            .iter()
            .find(|c| c.number == snapshot.chapter)
            .map(|c| c.title.clone())
            .unwrap_or_default();
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        storage::make_record(&snapshot, &chapter_title, &self.content_hash, timestamp)
    }

    fn accrue_playtime(&mut self, now_ms: u64) {
        if let Some(last) = self.last_tick_ms {
            self.store.add_playtime(now_ms.saturating_sub(last));
        }
        self.last_tick_ms = Some(now_ms);
    }

    /// Settle a terminal puzzle outcome into the state store and resume the
    /// story waiting on it.
    fn pump_puzzle(&mut self, now_ms: u64) -> GameStep {
        if self.puzzles.settle(&mut self.store).is_none() {
            return self.last_step.clone();
        }
        let progress = self.director.step(
            Some(&PlayerEvent::PuzzleDone),
            &mut self.store,
            &mut self.puzzles,
            &mut self.hub,
            now_ms,
        );
        self.finish(progress)
    }

    fn finish(&mut self, progress: Progress) -> GameStep {
        if self.director.take_autosave_pending() {
            self.autosave();
        }
        let step = match progress {
            Progress::WaitAdvance => GameStep::WaitAdvance,
            Progress::WaitChoice => GameStep::WaitChoice,
            Progress::WaitActor => GameStep::WaitActor,
            Progress::WaitTimer { ms } => GameStep::WaitTimer { ms },
            Progress::WaitPuzzle => GameStep::WaitPuzzle,
            Progress::GameComplete => GameStep::Complete,
        };
        self.last_step = step.clone();
        step
    }

    fn autosave(&mut self) {
        if self.saves.is_none() {
            return;
        }
        if let Err(err) = self.save(AUTOSAVE_SLOT) {
            log::warn!("autosave failed: {err}");
        }
    }
}
