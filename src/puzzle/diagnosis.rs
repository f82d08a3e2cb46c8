//! Diagnosis puzzle
//!
//! Hotspots are examined with a selected tool; each hotspot's finding is
//! keyed per tool, and the wrong tool reveals nothing and changes nothing.
//! Findings inform the player but only the chosen diagnosis is validated.

use crate::puzzle::AfterAction;
use crate::signals::SignalHub;
use crate::types::event::PuzzleAction;
use crate::types::puzzle::DiagnosisConfig;
use crate::types::signal::PuzzleSignal;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Finding {
    pub hotspot: String,
    pub tool: String,
    pub text: String,
}

pub struct DiagnosisState {
    cfg: DiagnosisConfig,
    tool: Option<String>,
    examined: BTreeSet<String>,
    findings: Vec<Finding>,
    selected: Option<String>,
}

impl DiagnosisState {
    pub fn new(cfg: DiagnosisConfig) -> Self {
        Self {
            cfg,
            tool: None,
            examined: BTreeSet::new(),
            findings: Vec::new(),
            selected: None,
        }
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub(crate) fn handle(
        &mut self,
        action: &PuzzleAction,
        id: &str,
        hub: &mut SignalHub,
    ) -> AfterAction {
        match action {
            PuzzleAction::SetTool { tool } => self.set_tool(tool, id, hub),
            PuzzleAction::Examine { hotspot } => self.examine(hotspot, id, hub),
            PuzzleAction::SelectDiagnosis { id: diagnosis } => {
                self.select_diagnosis(diagnosis, id, hub)
            }
            _ => notice(hub, id, "That won't help the examination."),
        }
        AfterAction::Stay
    }

    fn set_tool(&mut self, tool: &str, id: &str, hub: &mut SignalHub) {
        if !self.cfg.tools.iter().any(|t| t == tool) {
            notice(hub, id, "No such tool on the bench.");
            return;
        }
        self.tool = Some(tool.to_string());
        hub.puzzle(PuzzleSignal::Updated {
            id: id.to_string(),
            info: serde_json::json!({ "tool": tool }),
        });
    }

    fn examine(&mut self, hotspot: &str, id: &str, hub: &mut SignalHub) {
        let Some(spec) = self.cfg.hotspots.iter().find(|h| h.id == hotspot) else {
            notice(hub, id, "There is nothing to examine there.");
            return;
        };
        let Some(tool) = self.tool.clone() else {
            notice(hub, id, "Pick a tool first.");
            return;
        };

        match spec.findings.get(&tool) {
            Some(text) => {
                self.examined.insert(hotspot.to_string());
                let already = self
                    .findings
                    .iter()
                    .any(|f| f.hotspot == hotspot && f.tool == tool);
                if !already {
                    self.findings.push(Finding {
                        hotspot: hotspot.to_string(),
                        tool: tool.clone(),
                        text: text.clone(),
                    });
                }
                hub.puzzle(PuzzleSignal::Updated {
                    id: id.to_string(),
                    info: serde_json::json!({
                        "hotspot": hotspot,
                        "finding": text,
                        "findings": self.findings.len(),
                    }),
                });
            }
            // Wrong tool: no finding, no state change.
            None => notice(hub, id, "The tool shows nothing unusual."),
        }
    }

    fn select_diagnosis(&mut self, diagnosis: &str, id: &str, hub: &mut SignalHub) {
        if !self.cfg.options.iter().any(|o| o.id == diagnosis) {
            notice(hub, id, "That is not one of the possible diagnoses.");
            return;
        }
        self.selected = Some(diagnosis.to_string());
        hub.puzzle(PuzzleSignal::Updated {
            id: id.to_string(),
            info: serde_json::json!({ "diagnosis": diagnosis }),
        });
    }

    /// The selected diagnosis must equal the configured answer; findings
    /// are informational.
    pub fn validate(&self) -> bool {
        self.selected.as_deref() == Some(self.cfg.answer.as_str())
    }

    pub fn solution(&self) -> serde_json::Value {
        serde_json::json!({
            "diagnosis": self.selected,
            "findings": self.findings,
        })
    }

    pub fn clear(&mut self) {
        self.tool = None;
        self.examined.clear();
        self.findings.clear();
        self.selected = None;
    }
}

fn notice(hub: &mut SignalHub, id: &str, message: &str) {
    hub.puzzle(PuzzleSignal::Notice {
        id: id.to_string(),
        message: message.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::puzzle::{DiagnosisOption, HotspotSpec};
    use std::collections::HashMap;

    fn cfg() -> DiagnosisConfig {
        let mut findings = HashMap::new();
        findings.insert("lens".to_string(), "Hairline crack".to_string());
        DiagnosisConfig {
            tools: vec!["lens".into(), "probe".into()],
            hotspots: vec![HotspotSpec {
                id: "casing".into(),
                label: "Casing".into(),
                findings,
            }],
            options: vec![
                DiagnosisOption { id: "cracked_casing".into(), label: "Cracked casing".into() },
                DiagnosisOption { id: "worn_gear".into(), label: "Worn gear".into() },
            ],
            answer: "cracked_casing".into(),
        }
    }

    #[test]
    fn wrong_tool_changes_nothing() {
        let mut hub = SignalHub::new();
        let mut st = DiagnosisState::new(cfg());
        st.set_tool("probe", "pz", &mut hub);
        st.examine("casing", "pz", &mut hub);
        assert!(st.findings.is_empty());
        assert!(st.examined.is_empty());
    }

    #[test]
    fn right_tool_records_finding_once() {
        let mut hub = SignalHub::new();
        let mut st = DiagnosisState::new(cfg());
        st.set_tool("lens", "pz", &mut hub);
        st.examine("casing", "pz", &mut hub);
        st.examine("casing", "pz", &mut hub);
        assert_eq!(st.findings.len(), 1);
        assert_eq!(st.findings[0].text, "Hairline crack");
    }

    #[test]
    fn only_the_diagnosis_is_validated() {
        let mut hub = SignalHub::new();
        let mut st = DiagnosisState::new(cfg());
        assert!(!st.validate());
        st.select_diagnosis("cracked_casing", "pz", &mut hub);
        assert!(st.validate());
        st.select_diagnosis("worn_gear", "pz", &mut hub);
        assert!(!st.validate());
    }
}
