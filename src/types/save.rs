//! Save records
//!
//! A save is the whole game state plus enough presentation metadata to
//! render a slot list without deserializing the state itself.

use crate::state::GameState;
use serde::{Deserialize, Serialize};

/// One persisted save: state snapshot plus slot-list preview
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveRecord {
    pub chapter: u32,
    pub scene: String,
    pub playtime_ms: u64,
    /// Seconds since the Unix epoch at save time
    pub timestamp: u64,
    /// md5 of the chapter content this save was made against
    pub content_hash: String,
    pub state: GameState,
    pub preview: SavePreview,
}

/// Human-readable slot metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavePreview {
    pub chapter_text: String,
    pub chapter_title: String,
    pub date_text: String,
    pub playtime_text: String,
}
