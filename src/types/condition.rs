//! Boolean conditions over the game state
//!
//! Conditions gate scene commands and choice options. The grammar is a
//! small closed tagged union; evaluation lives on `GameState`.

use crate::types::value::{Comparator, Value};
use serde::{Deserialize, Serialize};

/// A pure boolean predicate over the game state.
///
/// Unrecognized tags deserialize to [`Condition::Unknown`], which evaluates
/// permissively to true. That quirk is load-bearing for shipped content;
/// every evaluation of it is logged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// True when the named flag is set
    Flag { flag: String },
    /// True when the named flag is unset or absent
    NotFlag { flag: String },
    /// Compare a variable against a value
    Variable {
        name: String,
        op: Comparator,
        value: Value,
    },
    /// True when the inventory holds at least `count` of the item
    HasItem {
        item: String,
        #[serde(default = "default_item_count")]
        count: u32,
    },
    /// Compare the current chapter number
    Chapter { op: Comparator, number: u32 },
    /// All sub-conditions hold
    All { conditions: Vec<Condition> },
    /// At least one sub-condition holds
    Any { conditions: Vec<Condition> },
    /// Negation
    Not { condition: Box<Condition> },
    /// Catch-all for tags this build does not know about
    #[serde(other)]
    Unknown,
}

fn default_item_count() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_forms() {
        let c: Condition = serde_json::from_str(r#"{"type":"flag","flag":"met_elder"}"#).unwrap();
        assert_eq!(
            c,
            Condition::Flag {
                flag: "met_elder".to_string()
            }
        );

        let c: Condition =
            serde_json::from_str(r#"{"type":"has_item","item":"iron_key"}"#).unwrap();
        assert_eq!(
            c,
            Condition::HasItem {
                item: "iron_key".to_string(),
                count: 1
            }
        );
    }

    #[test]
    fn unknown_tag_deserializes_to_unknown() {
        let c: Condition = serde_json::from_str(r#"{"type":"moon_phase"}"#).unwrap();
        assert_eq!(c, Condition::Unknown);
    }

    #[test]
    fn nested_logical_forms_round_trip() {
        let c = Condition::All {
            conditions: vec![
                Condition::Flag {
                    flag: "door_open".into(),
                },
                Condition::Not {
                    condition: Box::new(Condition::Chapter {
                        op: Comparator::Less,
                        number: 2,
                    }),
                },
            ],
        };
        let json = serde_json::to_string(&c).unwrap();
        let back: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
