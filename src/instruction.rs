//! Timed instruction execution against the bridge link.
//!
//! An [`Instruction`] is a batch of keyboard actions followed by mouse
//! actions, each carrying a relative delay. [`Sequencer`] walks the batch
//! strictly in order, sleeping each action's delay before encoding and
//! sending it, and tallies failures instead of aborting the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ch9329_link::Link;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::report::{self, KeyboardReport, MouseButton, MouseReport};

/// Gap between the press and release halves of a click. The bridge samples
/// reports at a fixed interval, so a zero-duration click can be dropped.
pub const DEFAULT_CLICK_GAP: Duration = Duration::from_millis(50);

/// A batch of timed input actions, normally deserialized from JSON.
/// Consumed once, then discarded — the sequencer keeps no state between
/// runs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Instruction {
    #[serde(default)]
    pub keyboard: Vec<KeyCommand>,
    #[serde(default)]
    pub mouse: Vec<MouseCommand>,
}

/// One keyboard action.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyCommand {
    /// Key name, validated against the outbound table at encode time.
    pub key: String,
    pub action: KeyState,
    /// Delay before this action, relative to the previous action in the
    /// same list finishing.
    #[serde(default, alias = "delayMs", alias = "delay")]
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyState {
    Press,
    Release,
}

/// One mouse action. A tagged sum type so `move` carries its deltas as
/// structured integers and bad shapes are rejected at the deserialization
/// boundary.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum MouseCommand {
    Move {
        dx: i32,
        dy: i32,
        #[serde(default, alias = "delayMs", alias = "delay")]
        delay_ms: u64,
    },
    Press {
        button: MouseButton,
        #[serde(default, alias = "delayMs", alias = "delay")]
        delay_ms: u64,
    },
    Release {
        button: MouseButton,
        #[serde(default, alias = "delayMs", alias = "delay")]
        delay_ms: u64,
    },
    Click {
        button: MouseButton,
        #[serde(default, alias = "delayMs", alias = "delay")]
        delay_ms: u64,
    },
}

impl MouseCommand {
    fn delay_ms(&self) -> u64 {
        match self {
            Self::Move { delay_ms, .. }
            | Self::Press { delay_ms, .. }
            | Self::Release { delay_ms, .. }
            | Self::Click { delay_ms, .. } => *delay_ms,
        }
    }
}

/// Outcome tally of one instruction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Reports acknowledged by the bridge.
    pub sent: usize,
    /// Actions that failed to encode or send.
    pub failed: usize,
    /// Run stopped early by cancellation.
    pub cancelled: bool,
}

/// Executes instructions over a [`Link`].
///
/// Single-threaded and blocking: each send waits for the bridge ACK, each
/// delay sleeps the calling thread.
pub struct Sequencer<'a, L: Link> {
    link: &'a mut L,
    click_gap: Duration,
    fail_fast: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a, L: Link> Sequencer<'a, L> {
    pub fn new(link: &'a mut L) -> Self {
        Self {
            link,
            click_gap: DEFAULT_CLICK_GAP,
            fail_fast: false,
            cancel: None,
        }
    }

    pub fn with_click_gap(mut self, gap: Duration) -> Self {
        self.click_gap = gap;
        self
    }

    /// Stop at the first failed action instead of tallying and continuing.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Cooperative cancellation flag, polled between actions (never
    /// mid-send).
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Execute the batch: keyboard actions first, then mouse actions,
    /// each list strictly in order.
    pub fn run(mut self, instruction: &Instruction) -> RunSummary {
        let mut summary = RunSummary::default();

        for cmd in &instruction.keyboard {
            if self.cancelled() {
                return self.stop_cancelled(summary);
            }
            sleep_ms(cmd.delay_ms);
            match report::key_report(&cmd.key, cmd.action == KeyState::Press) {
                Ok(rep) => self.send(rep.as_bytes(), &mut summary),
                Err(e) => {
                    warn!(key = %cmd.key, "skipping action: {e}");
                    summary.failed += 1;
                }
            }
            if self.fail_fast && summary.failed > 0 {
                return summary;
            }
        }

        for cmd in &instruction.mouse {
            if self.cancelled() {
                return self.stop_cancelled(summary);
            }
            sleep_ms(cmd.delay_ms());
            match cmd {
                MouseCommand::Move { dx, dy, .. } => {
                    self.send(report::mouse_move(*dx, *dy).as_bytes(), &mut summary);
                }
                MouseCommand::Press { button, .. } => {
                    self.send(report::mouse_button(*button, true).as_bytes(), &mut summary);
                }
                MouseCommand::Release { button, .. } => {
                    self.send(report::mouse_button(*button, false).as_bytes(), &mut summary);
                }
                MouseCommand::Click { button, .. } => {
                    self.send(report::mouse_button(*button, true).as_bytes(), &mut summary);
                    thread::sleep(self.click_gap);
                    self.send(report::mouse_button(*button, false).as_bytes(), &mut summary);
                }
            }
            if self.fail_fast && summary.failed > 0 {
                return summary;
            }
        }

        summary
    }

    fn send(&mut self, bytes: &[u8], summary: &mut RunSummary) {
        match self.link.send_report(bytes) {
            Ok(()) => summary.sent += 1,
            Err(e) => {
                warn!("send failed: {e}");
                summary.failed += 1;
            }
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Aborting with a key latched would leave the host in a held-down
    /// state, so a cancelled run releases everything before stopping.
    fn stop_cancelled(&mut self, mut summary: RunSummary) -> RunSummary {
        debug!("run cancelled, releasing all inputs");
        if let Err(e) = self.link.send_report(KeyboardReport::RELEASE_ALL.as_bytes()) {
            warn!("release-all keyboard report failed: {e}");
        }
        if let Err(e) = self.link.send_report(MouseReport::RELEASE_ALL.as_bytes()) {
            warn!("release-all mouse report failed: {e}");
        }
        summary.cancelled = true;
        summary
    }
}

fn sleep_ms(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keyboard_commands() {
        let instruction: Instruction = serde_json::from_str(
            r#"{"keyboard": [
                {"key": "W", "action": "press", "delay_ms": 0},
                {"key": "W", "action": "release", "delay_ms": 1000}
            ]}"#,
        )
        .unwrap();
        assert_eq!(instruction.keyboard.len(), 2);
        assert_eq!(instruction.keyboard[0].action, KeyState::Press);
        assert_eq!(instruction.keyboard[1].delay_ms, 1000);
        assert!(instruction.mouse.is_empty());
    }

    #[test]
    fn parse_tagged_mouse_commands() {
        let instruction: Instruction = serde_json::from_str(
            r#"{"mouse": [
                {"action": "move", "dx": -30, "dy": 0, "delay_ms": 600},
                {"action": "click", "button": "left", "delay_ms": 200}
            ]}"#,
        )
        .unwrap();
        assert_eq!(instruction.mouse.len(), 2);
        assert!(matches!(
            instruction.mouse[0],
            MouseCommand::Move { dx: -30, dy: 0, delay_ms: 600 }
        ));
        assert!(matches!(
            instruction.mouse[1],
            MouseCommand::Click { button: MouseButton::Left, delay_ms: 200 }
        ));
    }

    #[test]
    fn delay_defaults_to_zero() {
        let instruction: Instruction =
            serde_json::from_str(r#"{"keyboard": [{"key": "A", "action": "press"}]}"#).unwrap();
        assert_eq!(instruction.keyboard[0].delay_ms, 0);
    }

    #[test]
    fn legacy_delay_field_accepted() {
        let instruction: Instruction = serde_json::from_str(
            r#"{"keyboard": [{"key": "A", "action": "press", "delay": 500}]}"#,
        )
        .unwrap();
        assert_eq!(instruction.keyboard[0].delay_ms, 500);
    }

    #[test]
    fn unknown_mouse_action_rejected() {
        let result: Result<Instruction, _> = serde_json::from_str(
            r#"{"mouse": [{"action": "teleport", "dx": 1, "dy": 1}]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn move_requires_structured_deltas() {
        // The old free-form "(dx:N, dy:N)" string shape must not parse.
        let result: Result<Instruction, _> = serde_json::from_str(
            r#"{"mouse": [{"action": "move", "parameter": "(dx:50, dy:0)"}]}"#,
        );
        assert!(result.is_err());
    }
}
