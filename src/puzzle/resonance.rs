//! Resonance tuning puzzle
//!
//! The player turns dials and locks notes one at a time; a lock succeeds
//! when the frequency dial sits within tolerance of the current target
//! note. Matching the last note completes the puzzle on its own, without
//! the generic submit path.

use crate::puzzle::AfterAction;
use crate::signals::SignalHub;
use crate::types::event::PuzzleAction;
use crate::types::puzzle::ResonanceConfig;
use crate::types::signal::PuzzleSignal;
use std::collections::HashMap;

pub struct ResonanceState {
    cfg: ResonanceConfig,
    dials: HashMap<String, f64>,
    matched: Vec<usize>,
}

impl ResonanceState {
    pub fn new(cfg: ResonanceConfig) -> Self {
        if !cfg.dials.iter().any(|d| d.id == cfg.frequency_dial) {
            log::warn!(
                "resonance config names frequency dial '{}' but defines no such dial",
                cfg.frequency_dial
            );
        }
        let dials = cfg.dials.iter().map(|d| (d.id.clone(), d.initial)).collect();
        Self {
            cfg,
            dials,
            matched: Vec::new(),
        }
    }

    pub fn matched_notes(&self) -> &[usize] {
        &self.matched
    }

    pub(crate) fn handle(
        &mut self,
        action: &PuzzleAction,
        id: &str,
        hub: &mut SignalHub,
    ) -> AfterAction {
        match action {
            PuzzleAction::SetDial { dial, value } => {
                self.set_dial(dial, *value, id, hub);
                AfterAction::Stay
            }
            PuzzleAction::LockNote => self.lock_note(id, hub),
            _ => {
                hub.puzzle(PuzzleSignal::Notice {
                    id: id.to_string(),
                    message: "The resonator does not respond to that.".to_string(),
                });
                AfterAction::Stay
            }
        }
    }

    fn set_dial(&mut self, dial: &str, value: f64, id: &str, hub: &mut SignalHub) {
        let Some(spec) = self.cfg.dials.iter().find(|d| d.id == dial) else {
            hub.puzzle(PuzzleSignal::Notice {
                id: id.to_string(),
                message: "No such dial.".to_string(),
            });
            return;
        };
        let clamped = value.clamp(spec.min, spec.max);
        self.dials.insert(dial.to_string(), clamped);
        hub.puzzle(PuzzleSignal::Updated {
            id: id.to_string(),
            info: serde_json::json!({ "dial": dial, "value": clamped }),
        });
    }

    fn lock_note(&mut self, id: &str, hub: &mut SignalHub) -> AfterAction {
        let Some(target) = self.cfg.notes.get(self.matched.len()) else {
            return AfterAction::Stay;
        };
        let Some(frequency) = self.dials.get(&self.cfg.frequency_dial).copied() else {
            hub.puzzle(PuzzleSignal::Notice {
                id: id.to_string(),
                message: "The frequency dial is missing.".to_string(),
            });
            return AfterAction::Stay;
        };

        if (frequency - target.frequency).abs() > self.cfg.tolerance_hz {
            hub.puzzle(PuzzleSignal::Feedback {
                id: id.to_string(),
                message: "Dissonance. The note slips away.".to_string(),
            });
            return AfterAction::Stay;
        }

        self.matched.push(self.matched.len());
        hub.puzzle(PuzzleSignal::Updated {
            id: id.to_string(),
            info: serde_json::json!({
                "matched": self.matched.len(),
                "total": self.cfg.notes.len(),
                "note": target.label,
            }),
        });

        if self.matched.len() == self.cfg.notes.len() {
            AfterAction::AutoComplete
        } else {
            AfterAction::Stay
        }
    }

    /// All target notes matched, in order.
    pub fn validate(&self) -> bool {
        self.matched.len() == self.cfg.notes.len()
    }

    pub fn solution(&self) -> serde_json::Value {
        serde_json::json!({ "matched": self.matched })
    }

    pub fn clear(&mut self) {
        self.dials = self
            .cfg
            .dials
            .iter()
            .map(|d| (d.id.clone(), d.initial))
            .collect();
        self.matched.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::puzzle::{DialSpec, NoteSpec};

    fn cfg() -> ResonanceConfig {
        ResonanceConfig {
            dials: vec![DialSpec {
                id: "freq".into(),
                min: 100.0,
                max: 900.0,
                initial: 100.0,
            }],
            frequency_dial: "freq".into(),
            notes: vec![
                NoteSpec { label: "A".into(), frequency: 440.0 },
                NoteSpec { label: "E".into(), frequency: 659.0 },
            ],
            tolerance_hz: 3.0,
        }
    }

    #[test]
    fn lock_succeeds_only_within_tolerance() {
        let mut hub = SignalHub::new();
        let mut st = ResonanceState::new(cfg());

        st.set_dial("freq", 450.0, "pz", &mut hub);
        st.lock_note("pz", &mut hub);
        assert!(st.matched.is_empty());

        st.set_dial("freq", 442.5, "pz", &mut hub);
        st.lock_note("pz", &mut hub);
        assert_eq!(st.matched, vec![0]);
    }

    #[test]
    fn matching_all_notes_auto_completes() {
        let mut hub = SignalHub::new();
        let mut st = ResonanceState::new(cfg());

        st.set_dial("freq", 440.0, "pz", &mut hub);
        assert!(matches!(st.lock_note("pz", &mut hub), AfterAction::Stay));
        st.set_dial("freq", 660.0, "pz", &mut hub);
        assert!(matches!(st.lock_note("pz", &mut hub), AfterAction::AutoComplete));
        assert!(st.validate());
    }

    #[test]
    fn dial_values_clamp_to_range() {
        let mut hub = SignalHub::new();
        let mut st = ResonanceState::new(cfg());
        st.set_dial("freq", 5_000.0, "pz", &mut hub);
        assert_eq!(st.dials["freq"], 900.0);
    }
}
