//! Send pacing
//!
//! The messaging network throttles accounts that behave like bots, so every
//! send is preceded by a randomized wait and, optionally, presence and typing
//! signals. How long and how chatty is a named profile.

use std::time::Duration;

use eyre::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Timing and signalling used around each send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingProfile {
    /// Lower bound of the pre-send wait
    #[serde(rename = "delay-min-ms")]
    pub delay_min_ms: u64,

    /// Upper bound of the pre-send wait (inclusive)
    #[serde(rename = "delay-max-ms")]
    pub delay_max_ms: u64,

    /// Mark the account available before each record and unavailable after a failure
    pub presence: bool,

    /// Number of typing indicators shown before sending
    #[serde(rename = "typing-pulses")]
    pub typing_pulses: u32,

    /// Wait after each typing indicator
    #[serde(rename = "typing-pulse-ms")]
    pub typing_pulse_ms: u64,
}

impl Default for PacingProfile {
    fn default() -> Self {
        Self::quick()
    }
}

impl PacingProfile {
    pub const BUILTIN_NAMES: [&'static str; 2] = ["quick", "cautious"];

    /// Short 2-5s window, no signalling
    pub fn quick() -> Self {
        Self {
            delay_min_ms: 2_000,
            delay_max_ms: 5_000,
            presence: false,
            typing_pulses: 0,
            typing_pulse_ms: 0,
        }
    }

    /// Long 140-200s window plus two 25s typing indicators
    pub fn cautious() -> Self {
        Self {
            delay_min_ms: 140_000,
            delay_max_ms: 200_000,
            presence: true,
            typing_pulses: 2,
            typing_pulse_ms: 25_000,
        }
    }

    /// No waiting at all; for tests and dry runs
    pub fn immediate() -> Self {
        Self {
            delay_min_ms: 0,
            delay_max_ms: 0,
            presence: false,
            typing_pulses: 0,
            typing_pulse_ms: 0,
        }
    }

    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "quick" => Some(Self::quick()),
            "cautious" => Some(Self::cautious()),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.delay_min_ms > self.delay_max_ms {
            return Err(eyre::eyre!(
                "delay-min-ms ({}) is greater than delay-max-ms ({})",
                self.delay_min_ms,
                self.delay_max_ms
            ));
        }
        Ok(())
    }

    /// Pick the wait before the next send, uniformly from the window
    pub fn pre_send_delay(&self) -> Duration {
        let ms = if self.delay_min_ms >= self.delay_max_ms {
            self.delay_min_ms
        } else {
            rand::rng().random_range(self.delay_min_ms..=self.delay_max_ms)
        };
        debug!(ms, "pre_send_delay: picked");
        Duration::from_millis(ms)
    }

    pub fn typing_pulse(&self) -> Duration {
        Duration::from_millis(self.typing_pulse_ms)
    }

    /// Worst-case time spent pacing one record
    pub fn max_total(&self) -> Duration {
        Duration::from_millis(self.delay_max_ms + u64::from(self.typing_pulses) * self.typing_pulse_ms)
    }
}
