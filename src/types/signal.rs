//! Signals emitted by the core for presentation collaborators
//!
//! One enum per channel category. UI, audio and effects layers subscribe on
//! the hub; the core never calls a renderer directly.

use crate::types::content::Effect;
use crate::types::value::Value;
use serde::{Deserialize, Serialize};

/// Story-flow signals: chapters, scenes, lines, choices
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum NarrativeSignal {
    ChapterStart { number: u32, title: String },
    ChapterEnd { number: u32 },
    SceneStart {
        id: String,
        background: Option<String>,
        music: Option<String>,
        ambience: Option<String>,
    },
    Dialogue { speaker: String, text: String },
    Narration { text: String },
    ChoiceShow { prompt: String, options: Vec<String> },
    ChoiceMade { index: usize, text: String },
    Action { actor: String, action: String },
    Wait { ms: u64 },
    GameComplete,
}

/// Puzzle lifecycle and progress signals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PuzzleSignal {
    Started {
        id: String,
        kind: String,
        title: String,
    },
    /// Kind-specific progress payload for the puzzle UI
    Updated {
        id: String,
        info: serde_json::Value,
    },
    /// Non-terminal negative feedback after an invalid submit
    Feedback { id: String, message: String },
    /// Rejected input or other non-error notice
    Notice { id: String, message: String },
    Hint {
        id: String,
        text: String,
        used: u32,
        remaining: u32,
    },
    /// The sequence puzzle wants this pattern shown to the player
    ShowSequence { id: String, steps: Vec<u8> },
    Completed {
        id: String,
        score: u32,
        attempts: u32,
        hints_used: u32,
        time_remaining_ms: Option<u64>,
        rewards: Vec<Effect>,
    },
    Failed { id: String, reason: String },
    Reset { id: String },
}

/// State-store change notifications
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum StateChange {
    FlagSet { flag: String, value: bool },
    VariableSet { name: String, value: Value },
    ItemAdded {
        item: String,
        count: u32,
        total: u32,
    },
    ItemRemoved {
        item: String,
        count: u32,
        total: u32,
    },
    JournalAdded { title: String },
}
