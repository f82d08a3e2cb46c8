//! Chapter and scene orchestration
//!
//! Thin coordinator over the scene runner: builds a runner per scene,
//! advances scene and chapter position when content runs out, resolves
//! cross-scene transfers, and reports game completion once the last
//! chapter is exhausted.

use crate::narrative::{SceneRunner, SceneStep};
use crate::puzzle::PuzzleFactory;
use crate::signals::SignalHub;
use crate::state::{GameState, StateStore};
use crate::types::content::Chapter;
use crate::types::event::PlayerEvent;
use crate::types::signal::NarrativeSignal;

/// What the story is waiting on after a director step
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    WaitAdvance,
    WaitChoice,
    WaitActor,
    WaitTimer { ms: u64 },
    WaitPuzzle,
    GameComplete,
}

pub struct Director {
    chapters: Vec<Chapter>,
    chapter_idx: usize,
    scene_idx: usize,
    runner: Option<SceneRunner>,
    complete: bool,
    /// Set when a chapter was just entered; the engine autosaves on it
    autosave_pending: bool,
    /// State snapshot taken at scene entry. Saves persist this checkpoint,
    /// because a load resumes at the scene's first command and mid-scene
    /// state would double-apply the scene's mutations on replay.
    checkpoint: Option<GameState>,
}

impl Director {
    pub fn new(chapters: Vec<Chapter>) -> Self {
        Self {
            chapters,
            chapter_idx: 0,
            scene_idx: 0,
            runner: None,
            complete: false,
            autosave_pending: false,
            checkpoint: None,
        }
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.chapters.get(self.chapter_idx)
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// True once per chapter entry; consumed by the engine's autosave.
    pub fn take_autosave_pending(&mut self) -> bool {
        std::mem::take(&mut self.autosave_pending)
    }

    /// The state as it was when the current scene was entered.
    pub fn checkpoint(&self) -> Option<&GameState> {
        self.checkpoint.as_ref()
    }

    /// Enter the first chapter and run to the first suspension.
    pub fn start(
        &mut self,
        store: &mut StateStore,
        puzzles: &mut PuzzleFactory,
        hub: &mut SignalHub,
        now_ms: u64,
    ) -> Progress {
        if self.chapters.is_empty() {
            log::warn!("no chapter data loaded; the story is already over");
            self.complete = true;
            hub.narrative(NarrativeSignal::GameComplete);
            return Progress::GameComplete;
        }
        self.enter_chapter(0, 0, store, hub);
        self.step(None, store, puzzles, hub, now_ms)
    }

    /// Reposition at a chapter/scene, e.g. after a load. The scene restarts
    /// from its first command.
    pub fn jump_to(
        &mut self,
        chapter_number: u32,
        scene_id: &str,
        store: &mut StateStore,
        hub: &mut SignalHub,
    ) {
        let Some(chapter_idx) = self.chapters.iter().position(|c| c.number == chapter_number)
        else {
            log::warn!("no chapter numbered {chapter_number}; staying put");
            return;
        };
        let scene_idx = self.chapters[chapter_idx]
            .scenes
            .iter()
            .position(|s| s.id == scene_id)
            .unwrap_or_else(|| {
                log::warn!("no scene '{scene_id}' in chapter {chapter_number}; using the first");
                0
            });
        self.complete = false;
        self.enter_chapter(chapter_idx, scene_idx, store, hub);
        // A load is not a chapter boundary; don't autosave over the slot.
        self.autosave_pending = false;
    }

    /// Feed an event (or none) and run until the next suspension.
    pub fn step(
        &mut self,
        event: Option<&PlayerEvent>,
        store: &mut StateStore,
        puzzles: &mut PuzzleFactory,
        hub: &mut SignalHub,
        now_ms: u64,
    ) -> Progress {
        if self.complete {
            return Progress::GameComplete;
        }

        let mut event = event;
        loop {
            let Some(runner) = self.runner.as_mut() else {
                self.complete = true;
                hub.narrative(NarrativeSignal::GameComplete);
                return Progress::GameComplete;
            };

            let step = runner.step(event.take(), store, puzzles, hub, now_ms);
            match step {
                SceneStep::WaitAdvance => return Progress::WaitAdvance,
                SceneStep::WaitChoice => return Progress::WaitChoice,
                SceneStep::WaitActor => return Progress::WaitActor,
                SceneStep::WaitTimer { ms } => return Progress::WaitTimer { ms },
                SceneStep::WaitPuzzle => return Progress::WaitPuzzle,
                SceneStep::SceneEnd { goto } => {
                    if !self.advance(goto, store, hub) {
                        hub.narrative(NarrativeSignal::GameComplete);
                        return Progress::GameComplete;
                    }
                }
            }
        }
    }

    /// Move to the transfer target or the next scene/chapter. False once
    /// the story is exhausted.
    fn advance(
        &mut self,
        goto: Option<String>,
        store: &mut StateStore,
        hub: &mut SignalHub,
    ) -> bool {
        if let Some(target) = goto {
            if let Some((chapter_idx, scene_idx)) = self.find_scene(&target) {
                if chapter_idx != self.chapter_idx {
                    self.emit_chapter_end(hub);
                    self.enter_chapter(chapter_idx, scene_idx, store, hub);
                } else {
                    self.scene_idx = scene_idx;
                    self.enter_scene(store, hub);
                }
                return true;
            }
            log::warn!("transfer to unknown scene '{target}'; advancing linearly");
        }

        if self.scene_idx + 1 < self.chapters[self.chapter_idx].scenes.len() {
            self.scene_idx += 1;
            self.enter_scene(store, hub);
            return true;
        }

        self.emit_chapter_end(hub);
        if self.chapter_idx + 1 < self.chapters.len() {
            self.enter_chapter(self.chapter_idx + 1, 0, store, hub);
            return true;
        }

        self.complete = true;
        self.runner = None;
        false
    }

    fn find_scene(&self, scene_id: &str) -> Option<(usize, usize)> {
        // The current chapter wins when scene ids repeat across chapters.
        let current = &self.chapters[self.chapter_idx];
        if let Some(idx) = current.scenes.iter().position(|s| s.id == scene_id) {
            return Some((self.chapter_idx, idx));
        }
        self.chapters.iter().enumerate().find_map(|(ci, chapter)| {
            chapter
                .scenes
                .iter()
                .position(|s| s.id == scene_id)
                .map(|si| (ci, si))
        })
    }

    fn enter_chapter(
        &mut self,
        chapter_idx: usize,
        scene_idx: usize,
        store: &mut StateStore,
        hub: &mut SignalHub,
    ) {
        self.chapter_idx = chapter_idx;
        self.scene_idx = scene_idx;
        let chapter = &self.chapters[chapter_idx];
        hub.narrative(NarrativeSignal::ChapterStart {
            number: chapter.number,
            title: chapter.title.clone(),
        });
        self.autosave_pending = true;
        self.enter_scene(store, hub);
    }

    fn enter_scene(&mut self, store: &mut StateStore, hub: &mut SignalHub) {
        let chapter = &self.chapters[self.chapter_idx];
        let Some(scene) = chapter.scenes.get(self.scene_idx) else {
            log::warn!(
                "chapter {} has no scene at index {}; ending it",
                chapter.number,
                self.scene_idx
            );
            self.runner = None;
            return;
        };
        store.set_position(chapter.number, &scene.id);
        self.checkpoint = Some(store.state().clone());
        hub.narrative(NarrativeSignal::SceneStart {
            id: scene.id.clone(),
            background: scene.background.clone(),
            music: scene.music.clone(),
            ambience: scene.ambience.clone(),
        });
        self.runner = Some(SceneRunner::new(scene.clone()));
    }

    fn emit_chapter_end(&self, hub: &mut SignalHub) {
        if let Some(chapter) = self.chapters.get(self.chapter_idx) {
            hub.narrative(NarrativeSignal::ChapterEnd {
                number: chapter.number,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GameState;

    fn chapters(json: &str) -> Vec<Chapter> {
        serde_json::from_str(json).unwrap()
    }

    fn fixture() -> (StateStore, PuzzleFactory, SignalHub) {
        (
            StateStore::new(GameState::new()),
            PuzzleFactory::new(Vec::new()),
            SignalHub::new(),
        )
    }

    #[test]
    fn exhausted_scenes_advance_through_chapters_to_completion() {
        let (mut store, mut puzzles, mut hub) = fixture();
        let mut director = Director::new(chapters(
            r#"[
                {"id":"c1","number":1,"title":"One","scenes":[
                    {"id":"a","content":[{"type":"set_flag","flag":"a_done"}]},
                    {"id":"b","content":[{"type":"set_flag","flag":"b_done"}]}
                ]},
                {"id":"c2","number":2,"title":"Two","scenes":[
                    {"id":"c","content":[{"type":"set_flag","flag":"c_done"}]}
                ]}
            ]"#,
        ));

        let progress = director.start(&mut store, &mut puzzles, &mut hub, 0);
        assert_eq!(progress, Progress::GameComplete);
        assert!(store.state().has_flag("a_done"));
        assert!(store.state().has_flag("b_done"));
        assert!(store.state().has_flag("c_done"));
        assert!(director.is_complete());
    }

    #[test]
    fn scene_transfer_reaches_a_named_scene() {
        let (mut store, mut puzzles, mut hub) = fixture();
        let mut director = Director::new(chapters(
            r#"[
                {"id":"c1","number":1,"title":"One","scenes":[
                    {"id":"a","content":[{"type":"jump","target":{"scene":"c"}}]},
                    {"id":"b","content":[{"type":"set_flag","flag":"b_done"}]},
                    {"id":"c","content":[{"type":"set_flag","flag":"c_done"}]}
                ]}
            ]"#,
        ));

        director.start(&mut store, &mut puzzles, &mut hub, 0);
        assert!(store.state().has_flag("c_done"));
        assert!(!store.state().has_flag("b_done"));
    }

    #[test]
    fn position_tracks_the_entered_scene() {
        let (mut store, mut puzzles, mut hub) = fixture();
        let mut director = Director::new(chapters(
            r#"[
                {"id":"c1","number":1,"title":"One","scenes":[
                    {"id":"a","content":[{"type":"dialogue","speaker":"M","text":"hi"}]}
                ]}
            ]"#,
        ));

        let progress = director.start(&mut store, &mut puzzles, &mut hub, 0);
        assert_eq!(progress, Progress::WaitAdvance);
        assert_eq!(store.state().chapter, 1);
        assert_eq!(store.state().scene, "a");
        assert!(director.take_autosave_pending());
        assert!(!director.take_autosave_pending());
    }

    #[test]
    fn jump_to_restores_position_without_autosave() {
        let (mut store, mut puzzles, mut hub) = fixture();
        let mut director = Director::new(chapters(
            r#"[
                {"id":"c1","number":1,"title":"One","scenes":[
                    {"id":"a","content":[{"type":"dialogue","speaker":"M","text":"hi"}]},
                    {"id":"b","content":[{"type":"dialogue","speaker":"M","text":"yo"}]}
                ]}
            ]"#,
        ));

        director.start(&mut store, &mut puzzles, &mut hub, 0);
        director.take_autosave_pending();
        director.jump_to(1, "b", &mut store, &mut hub);
        assert_eq!(store.state().scene, "b");
        assert!(!director.take_autosave_pending());

        let progress = director.step(None, &mut store, &mut puzzles, &mut hub, 0);
        assert_eq!(progress, Progress::WaitAdvance);
    }
}
