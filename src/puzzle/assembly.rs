//! Mechanical assembly puzzle
//!
//! Parts are placed into slots; the target mapping is order-independent.
//! A part already seated cannot be placed again, positional drops resolve
//! to the nearest slot within the snap threshold, and filling the last
//! slot auto-submits through the shared path.

use crate::puzzle::AfterAction;
use crate::signals::SignalHub;
use crate::types::event::PuzzleAction;
use crate::types::puzzle::AssemblyConfig;
use crate::types::signal::PuzzleSignal;
use std::collections::HashMap;

pub struct AssemblyState {
    cfg: AssemblyConfig,
    /// slot id → part id
    placements: HashMap<String, String>,
}

impl AssemblyState {
    pub fn new(cfg: AssemblyConfig) -> Self {
        Self {
            cfg,
            placements: HashMap::new(),
        }
    }

    pub fn placements(&self) -> &HashMap<String, String> {
        &self.placements
    }

    pub(crate) fn handle(
        &mut self,
        action: &PuzzleAction,
        id: &str,
        hub: &mut SignalHub,
    ) -> AfterAction {
        match action {
            PuzzleAction::PlacePart { part, slot } => self.place(part, slot, id, hub),
            PuzzleAction::DropPart { part, x, y } => match self.nearest_slot(*x, *y) {
                Some(slot) => self.place(part, &slot, id, hub),
                None => {
                    notice(hub, id, "There is nowhere to fit that here.");
                    AfterAction::Stay
                }
            },
            _ => {
                notice(hub, id, "That is not part of this assembly.");
                AfterAction::Stay
            }
        }
    }

    fn place(&mut self, part: &str, slot: &str, id: &str, hub: &mut SignalHub) -> AfterAction {
        if !self.cfg.parts.iter().any(|p| p.id == part) {
            notice(hub, id, "Unknown part.");
            return AfterAction::Stay;
        }
        if !self.cfg.slots.iter().any(|s| s.id == slot) {
            notice(hub, id, "Unknown slot.");
            return AfterAction::Stay;
        }
        if self.placements.values().any(|placed| placed == part) {
            notice(hub, id, "That part is already in place.");
            return AfterAction::Stay;
        }
        if self.placements.contains_key(slot) {
            notice(hub, id, "Something already sits in that slot.");
            return AfterAction::Stay;
        }

        self.placements.insert(slot.to_string(), part.to_string());
        hub.puzzle(PuzzleSignal::Updated {
            id: id.to_string(),
            info: serde_json::json!({
                "placed": self.placements.len(),
                "total": self.cfg.slots.len(),
                "slot": slot,
                "part": part,
            }),
        });

        if self.placements.len() == self.cfg.slots.len() {
            AfterAction::AutoSubmit
        } else {
            AfterAction::Stay
        }
    }

    fn nearest_slot(&self, x: f32, y: f32) -> Option<String> {
        let threshold_sq = self.cfg.snap_threshold * self.cfg.snap_threshold;
        self.cfg
            .slots
            .iter()
            .map(|s| {
                let dx = s.x - x;
                let dy = s.y - y;
                (s, dx * dx + dy * dy)
            })
            .filter(|(_, dist_sq)| *dist_sq <= threshold_sq)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(s, _)| s.id.clone())
    }

    /// Every defined slot holds its designated part.
    pub fn validate(&self) -> bool {
        self.cfg
            .slots
            .iter()
            .all(|s| self.placements.get(&s.id) == Some(&s.part))
    }

    pub fn solution(&self) -> serde_json::Value {
        serde_json::json!({ "placements": self.placements })
    }

    pub fn clear(&mut self) {
        self.placements.clear();
    }
}

fn notice(hub: &mut SignalHub, id: &str, message: &str) {
    hub.puzzle(PuzzleSignal::Notice {
        id: id.to_string(),
        message: message.to_string(),
    });
}
