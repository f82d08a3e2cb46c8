//! Puzzle definitions
//!
//! A definition is the immutable configuration a puzzle instance is played
//! from: shared policy (difficulty, attempts, timing, hints, rewards) plus
//! one kind-specific section. Unknown kind tags resolve to the generic
//! fallback at the factory, never here.

use crate::types::content::Effect;
use serde::{Deserialize, Serialize};

/// The closed set of puzzle kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleKind {
    Assembly,
    Crafting,
    Diagnosis,
    Sequence,
    Resonance,
    Generic,
}

impl PuzzleKind {
    /// Resolve a kind tag; `None` for tags this build does not know.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "assembly" => Some(Self::Assembly),
            "crafting" => Some(Self::Crafting),
            "diagnosis" => Some(Self::Diagnosis),
            "sequence" => Some(Self::Sequence),
            "resonance" => Some(Self::Resonance),
            "generic" => Some(Self::Generic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assembly => "assembly",
            Self::Crafting => "crafting",
            Self::Diagnosis => "diagnosis",
            Self::Sequence => "sequence",
            Self::Resonance => "resonance",
            Self::Generic => "generic",
        }
    }
}

/// Difficulty tag with its score multiplier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Expert,
}

impl Difficulty {
    pub fn factor(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.2,
            Difficulty::Expert => 1.5,
        }
    }
}

/// Immutable configuration one or more puzzle instances are created from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PuzzleDefinition {
    pub id: String,
    /// Kind tag; unknown values fall back to generic at resolution time
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Attempt cap; unbounded when absent
    #[serde(default)]
    pub max_attempts: Option<u32>,
    /// Countdown in milliseconds; untimed when absent
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
    #[serde(default)]
    pub hints: Vec<String>,
    /// Cap on hint uses; defaults to the hint list length
    #[serde(default)]
    pub max_hints: Option<u32>,
    #[serde(default)]
    pub rewards: Vec<Effect>,
    #[serde(default)]
    pub assembly: Option<AssemblyConfig>,
    #[serde(default)]
    pub crafting: Option<CraftingConfig>,
    #[serde(default)]
    pub diagnosis: Option<DiagnosisConfig>,
    #[serde(default)]
    pub sequence: Option<SequenceConfig>,
    #[serde(default)]
    pub resonance: Option<ResonanceConfig>,
}

impl PuzzleDefinition {
    /// A minimal generic definition used when a lookup or kind resolution
    /// fails. Play continues against it rather than halting.
    pub fn generic_fallback(id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: "generic".to_string(),
            title: "Puzzle".to_string(),
            description: String::new(),
            difficulty: Difficulty::Normal,
            max_attempts: None,
            time_limit_ms: None,
            hints: Vec::new(),
            max_hints: None,
            rewards: Vec::new(),
            assembly: None,
            crafting: None,
            diagnosis: None,
            sequence: None,
            resonance: None,
        }
    }

    /// Effective hint cap: min(configured max, hint list length).
    pub fn hint_cap(&self) -> u32 {
        let available = self.hints.len() as u32;
        match self.max_hints {
            Some(max) => max.min(available),
            None => available,
        }
    }
}

/// Mechanical assembly: drag parts into slots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssemblyConfig {
    pub slots: Vec<SlotSpec>,
    pub parts: Vec<PartSpec>,
    /// Maximum drop distance for nearest-slot resolution
    #[serde(default = "default_snap_threshold")]
    pub snap_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotSpec {
    pub id: String,
    /// The part this slot must hold in the solution
    pub part: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartSpec {
    pub id: String,
    pub label: String,
}

/// Spell crafting: select ingredients in recipe order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CraftingConfig {
    pub ingredients: Vec<IngredientSpec>,
    /// Ordered solution
    pub recipe: Vec<String>,
    #[serde(default = "default_max_ingredients")]
    pub max_ingredients: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngredientSpec {
    pub id: String,
    pub label: String,
}

/// Diagnosis: examine hotspots with tools, then name the fault
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosisConfig {
    pub tools: Vec<String>,
    pub hotspots: Vec<HotspotSpec>,
    pub options: Vec<DiagnosisOption>,
    /// The correct diagnosis id
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotspotSpec {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Finding text keyed by the tool that reveals it
    #[serde(default)]
    pub findings: std::collections::HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosisOption {
    pub id: String,
    pub label: String,
}

/// Repair sequence: a growing memory pattern over numbered pads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequenceConfig {
    /// Number of distinct pads; steps are indices below this
    pub pad_count: u8,
    pub initial_length: usize,
    pub max_rounds: u32,
    /// Input-phase deadline per round; untimed input when absent
    #[serde(default)]
    pub input_timeout_ms: Option<u64>,
    /// Presentation pacing hint for the show phase
    #[serde(default = "default_step_interval")]
    pub step_interval_ms: u64,
}

/// Resonance tuning: match target notes with the frequency dial
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResonanceConfig {
    pub dials: Vec<DialSpec>,
    /// Which dial is the audible frequency
    pub frequency_dial: String,
    pub notes: Vec<NoteSpec>,
    #[serde(default = "default_tolerance")]
    pub tolerance_hz: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DialSpec {
    pub id: String,
    pub min: f64,
    pub max: f64,
    pub initial: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteSpec {
    pub label: String,
    pub frequency: f64,
}

fn default_snap_threshold() -> f32 {
    48.0
}

fn default_max_ingredients() -> usize {
    8
}

fn default_step_interval() -> u64 {
    600
}

fn default_tolerance() -> f64 {
    3.0
}
