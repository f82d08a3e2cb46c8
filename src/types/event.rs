//! Events fed into the core by the host
//!
//! The core never blocks on its own; it suspends and waits for one of
//! these. Dialogue and choices wait indefinitely, timers are driven by the
//! host clock, and puzzle input arrives as typed actions.

use serde::{Deserialize, Serialize};

/// A host-produced event that resumes or feeds the core
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PlayerEvent {
    /// Unblock a waiting dialogue or narration line
    Advance,
    /// Select a visible choice option by index
    Choose { index: usize },
    /// The character collaborator finished its action
    ActorDone,
    /// A requested wait duration has elapsed
    TimerElapsed,
    /// The active puzzle settled; synthesized by the engine, not the host
    PuzzleDone,
    /// Input for the active puzzle
    Puzzle(PuzzleAction),
}

/// Typed input for the active puzzle instance.
///
/// Submit/Reset/Hint are shared across kinds; the rest belong to one kind
/// and are rejected with a notice by the others.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PuzzleAction {
    Submit,
    Reset,
    Hint,
    // assembly
    PlacePart { part: String, slot: String },
    DropPart { part: String, x: f32, y: f32 },
    // crafting
    ToggleIngredient { id: String },
    // diagnosis
    SetTool { tool: String },
    Examine { hotspot: String },
    SelectDiagnosis { id: String },
    // sequence
    BeginInput,
    InputStep { pad: u8 },
    // resonance
    SetDial { dial: String, value: f64 },
    LockNote,
}
