//! # aludel
//!
//! The logic core of a chapter/scene narrative adventure with minigame
//! puzzles. The crate is step-based and host-driven: it never renders,
//! plays audio or touches a clock on its own. A host feeds player events
//! and wall-clock samples in, and consumes typed signals out.
//!
//! ## Quick start
//!
//! ```rust
//! use aludel::content::ContentSet;
//! use aludel::engine::{Game, GameStep};
//! use aludel::types::PlayerEvent;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let chapters = serde_json::from_str(
//!     r#"[{"id":"c1","number":1,"title":"Dawn","scenes":[
//!         {"id":"yard","content":[
//!             {"type":"dialogue","speaker":"Mira","text":"You made it."}
//!         ]}
//!     ]}]"#,
//! )?;
//! let mut game = Game::new(ContentSet::new(chapters, Vec::new()))?;
//!
//! // Subscribe presentation handlers before starting.
//! game.hub_mut().on_narrative(|signal| {
//!     println!("{signal:?}");
//!     Ok(())
//! });
//!
//! let mut step = game.start(0);
//! loop {
//!     step = match step {
//!         GameStep::WaitAdvance => game.handle(PlayerEvent::Advance, 0),
//!         GameStep::Complete => break,
//!         other => unreachable!("{other:?}"),
//!     };
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Puzzles run the same way: a `puzzle` command in a scene suspends the
//! story, `PlayerEvent::Puzzle` actions drive the active instance, and the
//! terminal outcome (flags, score variable, rewards) lands in the state
//! store before the story resumes.

pub mod cli;
pub mod content;
pub mod engine;
pub mod narrative;
pub mod puzzle;
pub mod signals;
pub mod state;
pub mod storage;
pub mod types;

pub use content::{ContentError, ContentRepository, ContentSet, FsContentRepository};
pub use engine::{Game, GameStep};
pub use narrative::{Director, Progress, SceneRunner, SceneStep};
pub use puzzle::{PuzzleFactory, PuzzleInstance, PuzzleOutcome, PuzzleStatus};
pub use signals::SignalHub;
pub use state::{GameState, StateStore};
pub use storage::{DirSaveStore, MemorySaveStore, SaveStore, StoreError};
pub use types::{Condition, PlayerEvent, PuzzleAction, PuzzleDefinition, Value};
