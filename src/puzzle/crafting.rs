//! Spell crafting puzzle
//!
//! Ingredients are toggled into an ordered selection; the recipe must be
//! matched in exact order. Selecting past the limit is rejected with a
//! notice, re-selecting a chosen ingredient removes it.

use crate::puzzle::AfterAction;
use crate::signals::SignalHub;
use crate::types::event::PuzzleAction;
use crate::types::puzzle::CraftingConfig;
use crate::types::signal::PuzzleSignal;

pub struct CraftingState {
    cfg: CraftingConfig,
    selected: Vec<String>,
}

impl CraftingState {
    pub fn new(cfg: CraftingConfig) -> Self {
        Self {
            cfg,
            selected: Vec::new(),
        }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub(crate) fn handle(
        &mut self,
        action: &PuzzleAction,
        id: &str,
        hub: &mut SignalHub,
    ) -> AfterAction {
        match action {
            PuzzleAction::ToggleIngredient { id: ingredient } => {
                self.toggle(ingredient, id, hub);
            }
            _ => {
                hub.puzzle(PuzzleSignal::Notice {
                    id: id.to_string(),
                    message: "That has no place at the crafting bench.".to_string(),
                });
            }
        }
        AfterAction::Stay
    }

    fn toggle(&mut self, ingredient: &str, id: &str, hub: &mut SignalHub) {
        if !self.cfg.ingredients.iter().any(|i| i.id == ingredient) {
            hub.puzzle(PuzzleSignal::Notice {
                id: id.to_string(),
                message: "Unknown ingredient.".to_string(),
            });
            return;
        }

        if let Some(pos) = self.selected.iter().position(|s| s == ingredient) {
            self.selected.remove(pos);
        } else if self.selected.len() >= self.cfg.max_ingredients {
            hub.puzzle(PuzzleSignal::Notice {
                id: id.to_string(),
                message: "The circle can hold no more ingredients.".to_string(),
            });
            return;
        } else {
            self.selected.push(ingredient.to_string());
        }

        hub.puzzle(PuzzleSignal::Updated {
            id: id.to_string(),
            info: serde_json::json!({
                "selected": self.selected,
                "max": self.cfg.max_ingredients,
            }),
        });
    }

    /// Exact sequence equality; order matters.
    pub fn validate(&self) -> bool {
        self.selected == self.cfg.recipe
    }

    pub fn solution(&self) -> serde_json::Value {
        serde_json::json!({ "selected": self.selected })
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}
