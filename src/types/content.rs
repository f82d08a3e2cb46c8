//! Chapter, scene and command definitions
//!
//! Chapters and scenes are loaded wholesale from external JSON and are
//! read-only during play; only the sequencer's cursor moves. Labels mark
//! named offsets inside a scene's command list for jump targets.

use crate::types::condition::Condition;
use crate::types::value::{Operation, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A chapter: ordered scenes plus presentation metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chapter {
    pub id: String,
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub scenes: Vec<Scene>,
}

/// A scene: an ordered command list plus presentation hints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scene {
    pub id: String,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub music: Option<String>,
    #[serde(default)]
    pub ambience: Option<String>,
    #[serde(default)]
    pub characters: Vec<String>,
    pub content: Vec<SceneCommand>,
}

impl Scene {
    /// Label name to command index, built once per scene entry.
    pub fn labels(&self) -> HashMap<String, usize> {
        let mut labels = HashMap::new();
        for (idx, command) in self.content.iter().enumerate() {
            if let CommandBody::Label { name } = &command.body {
                labels.insert(name.clone(), idx);
            }
        }
        labels
    }
}

/// One command in a scene, with an optional guard condition.
///
/// A command whose `when` evaluates false is skipped entirely: no side
/// effect, no suspension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,
    #[serde(flatten)]
    pub body: CommandBody,
}

/// The command payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandBody {
    /// Spoken line; suspends until the advance signal
    Dialogue { speaker: String, text: String },
    /// Narrator line; suspends until the advance signal
    Narration { text: String },
    /// Present options and suspend until one is selected
    Choice {
        #[serde(default)]
        prompt: String,
        options: Vec<ChoiceOption>,
    },
    /// Dispatch to the character collaborator and await completion
    Action { actor: String, action: String },
    /// Suspend for a duration
    Wait { ms: u64 },
    /// Hand control to the puzzle factory and await the terminal outcome
    Puzzle { id: String },
    /// Set a flag and continue
    SetFlag {
        flag: String,
        #[serde(default = "default_true")]
        value: bool,
    },
    /// Set a variable and continue
    SetVar { name: String, value: Value },
    /// Arithmetic update of a variable
    ModifyVar {
        name: String,
        op: Operation,
        value: Value,
    },
    /// Grant items
    GiveItem {
        item: String,
        #[serde(default = "default_count")]
        count: u32,
    },
    /// Remove items; fails quietly rather than underflowing
    TakeItem {
        item: String,
        #[serde(default = "default_count")]
        count: u32,
    },
    /// Append a journal entry
    Journal { title: String, text: String },
    /// Reposition the cursor (label) or transfer to another scene
    Jump { target: Target },
    /// Jump target marker; no-op during execution
    Label { name: String },
}

/// A jump or choice navigation target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Target {
    Label { label: String },
    Scene { scene: String },
}

/// One selectable option of a choice command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoiceOption {
    pub text: String,
    /// Availability filter evaluated at display time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    /// Supersedes linear advance when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goto: Option<Target>,
}

/// A typed state effect, applied by choice options and puzzle rewards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    SetFlag {
        flag: String,
        #[serde(default = "default_true")]
        value: bool,
    },
    SetVar { name: String, value: Value },
    GiveItem {
        item: String,
        #[serde(default = "default_count")]
        count: u32,
    },
    TakeItem {
        item: String,
        #[serde(default = "default_count")]
        count: u32,
    },
}

fn default_true() -> bool {
    true
}

fn default_count() -> u32 {
    1
}
