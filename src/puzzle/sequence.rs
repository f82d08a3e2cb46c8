//! Repair sequence puzzle
//!
//! A memory game over numbered pads. Each round shows a target pattern and
//! waits for the player to replay it; a correct round appends one seeded
//! random step and repeats, the final round completes the puzzle. A wrong
//! pad or an input timeout replays only the current round; the terminal
//! attempt counter is untouched by the round loop.

use crate::puzzle::AfterAction;
use crate::signals::SignalHub;
use crate::types::event::PuzzleAction;
use crate::types::puzzle::SequenceConfig;
use crate::types::signal::PuzzleSignal;

/// xorshift64*, seeded from the game state so replays are deterministic
struct XorShift(u64);

impl XorShift {
    fn new(seed: u64) -> Self {
        Self(seed | 1)
    }

    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    fn step(&mut self, pads: u8) -> u8 {
        (self.next() % pads.max(1) as u64) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Showing,
    Input,
}

pub struct SequenceState {
    cfg: SequenceConfig,
    rng: XorShift,
    round: u32,
    target: Vec<u8>,
    input: Vec<u8>,
    phase: Phase,
    input_deadline_ms: Option<u64>,
}

impl SequenceState {
    pub fn new(cfg: SequenceConfig, seed: u64) -> Self {
        let mut rng = XorShift::new(seed);
        let target = (0..cfg.initial_length)
            .map(|_| rng.step(cfg.pad_count))
            .collect();
        Self {
            cfg,
            rng,
            round: 1,
            target,
            input: Vec::new(),
            phase: Phase::Showing,
            input_deadline_ms: None,
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn target_len(&self) -> usize {
        self.target.len()
    }

    /// Emit the current round's pattern for the presentation layer.
    pub(crate) fn announce_round(&mut self, id: &str, hub: &mut SignalHub) {
        self.phase = Phase::Showing;
        self.input.clear();
        self.input_deadline_ms = None;
        hub.puzzle(PuzzleSignal::Updated {
            id: id.to_string(),
            info: serde_json::json!({
                "round": self.round,
                "rounds": self.cfg.max_rounds,
                "length": self.target.len(),
                "step_interval_ms": self.cfg.step_interval_ms,
            }),
        });
        hub.puzzle(PuzzleSignal::ShowSequence {
            id: id.to_string(),
            steps: self.target.clone(),
        });
    }

    pub(crate) fn tick(&mut self, now_ms: u64, id: &str, hub: &mut SignalHub) {
        if self.phase == Phase::Input
            && let Some(deadline) = self.input_deadline_ms
            && now_ms >= deadline
        {
            hub.puzzle(PuzzleSignal::Feedback {
                id: id.to_string(),
                message: "Too slow. The mechanism resets.".to_string(),
            });
            self.announce_round(id, hub);
        }
    }

    pub(crate) fn handle(
        &mut self,
        action: &PuzzleAction,
        now_ms: u64,
        id: &str,
        hub: &mut SignalHub,
    ) -> AfterAction {
        match action {
            PuzzleAction::BeginInput => {
                self.phase = Phase::Input;
                self.input.clear();
                self.input_deadline_ms = self.cfg.input_timeout_ms.map(|t| now_ms + t);
                hub.puzzle(PuzzleSignal::Updated {
                    id: id.to_string(),
                    info: serde_json::json!({ "round": self.round, "awaiting": self.target.len() }),
                });
                AfterAction::Stay
            }
            PuzzleAction::InputStep { pad } => self.input_step(*pad, id, hub),
            _ => {
                hub.puzzle(PuzzleSignal::Notice {
                    id: id.to_string(),
                    message: "The pads ignore that.".to_string(),
                });
                AfterAction::Stay
            }
        }
    }

    fn input_step(&mut self, pad: u8, id: &str, hub: &mut SignalHub) -> AfterAction {
        if self.phase != Phase::Input {
            hub.puzzle(PuzzleSignal::Notice {
                id: id.to_string(),
                message: "Watch the sequence first.".to_string(),
            });
            return AfterAction::Stay;
        }
        if pad >= self.cfg.pad_count {
            hub.puzzle(PuzzleSignal::Notice {
                id: id.to_string(),
                message: "No such pad.".to_string(),
            });
            return AfterAction::Stay;
        }

        let Some(&expected) = self.target.get(self.input.len()) else {
            // An empty target (degenerate config) has nothing to replay.
            return AfterAction::AutoSubmit;
        };
        if pad != expected {
            // Wrong input aborts only this round; replay the same pattern.
            hub.puzzle(PuzzleSignal::Feedback {
                id: id.to_string(),
                message: "The mechanism grinds to a halt.".to_string(),
            });
            self.announce_round(id, hub);
            return AfterAction::Stay;
        }

        self.input.push(pad);
        if self.input.len() < self.target.len() {
            hub.puzzle(PuzzleSignal::Updated {
                id: id.to_string(),
                info: serde_json::json!({
                    "round": self.round,
                    "entered": self.input.len(),
                    "length": self.target.len(),
                }),
            });
            return AfterAction::Stay;
        }

        // Full round replayed correctly.
        if self.round >= self.cfg.max_rounds {
            return AfterAction::AutoSubmit;
        }
        self.round += 1;
        let next = self.rng.step(self.cfg.pad_count);
        self.target.push(next);
        self.announce_round(id, hub);
        AfterAction::Stay
    }

    /// Position-wise equality with the current round's target.
    pub fn validate(&self) -> bool {
        self.input == self.target
    }

    pub fn solution(&self) -> serde_json::Value {
        serde_json::json!({ "input": self.input })
    }

    pub fn clear(&mut self) {
        self.round = 1;
        self.target = (0..self.cfg.initial_length)
            .map(|_| self.rng.step(self.cfg.pad_count))
            .collect();
        self.input.clear();
        self.phase = Phase::Showing;
        self.input_deadline_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SequenceConfig {
        SequenceConfig {
            pad_count: 4,
            initial_length: 3,
            max_rounds: 2,
            input_timeout_ms: Some(4_000),
            step_interval_ms: 600,
        }
    }

    fn play_round(st: &mut SequenceState, hub: &mut SignalHub) -> AfterAction {
        st.handle(&PuzzleAction::BeginInput, 0, "pz", hub);
        let steps = st.target.clone();
        let mut last = AfterAction::Stay;
        for pad in steps {
            last = st.input_step(pad, "pz", hub);
        }
        last
    }

    #[test]
    fn correct_round_grows_the_sequence() {
        let mut hub = SignalHub::new();
        let mut st = SequenceState::new(cfg(), 7);
        assert_eq!(st.round(), 1);
        assert_eq!(st.target_len(), 3);

        play_round(&mut st, &mut hub);
        assert_eq!(st.round(), 2);
        assert_eq!(st.target_len(), 4);
    }

    #[test]
    fn final_round_auto_submits() {
        let mut hub = SignalHub::new();
        let mut st = SequenceState::new(cfg(), 7);
        play_round(&mut st, &mut hub);
        let last = play_round(&mut st, &mut hub);
        assert!(matches!(last, AfterAction::AutoSubmit));
        assert!(st.validate());
    }

    #[test]
    fn wrong_input_replays_the_same_round() {
        let mut hub = SignalHub::new();
        let mut st = SequenceState::new(cfg(), 7);
        st.handle(&PuzzleAction::BeginInput, 0, "pz", &mut hub);

        let wrong = (st.target[0] + 1) % st.cfg.pad_count;
        st.input_step(wrong, "pz", &mut hub);

        assert_eq!(st.round(), 1);
        assert_eq!(st.target_len(), 3);
        assert_eq!(st.phase, Phase::Showing);
        assert!(st.input.is_empty());
    }

    #[test]
    fn input_timeout_replays_the_round() {
        let mut hub = SignalHub::new();
        let mut st = SequenceState::new(cfg(), 7);
        st.handle(&PuzzleAction::BeginInput, 1_000, "pz", &mut hub);
        st.input_step(st.target[0], "pz", &mut hub);

        st.tick(5_100, "pz", &mut hub);
        assert_eq!(st.phase, Phase::Showing);
        assert!(st.input.is_empty());
        assert_eq!(st.round(), 1);
    }

    #[test]
    fn same_seed_same_sequence() {
        let a = SequenceState::new(cfg(), 42);
        let b = SequenceState::new(cfg(), 42);
        assert_eq!(a.target, b.target);
    }
}
