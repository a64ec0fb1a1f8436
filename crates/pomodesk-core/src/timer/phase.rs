use serde::{Deserialize, Serialize};

use crate::storage::Settings;

/// Every `LONG_BREAK_INTERVAL`-th completed work phase is followed by a long break.
pub const LONG_BREAK_INTERVAL: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Work,
    Break,
    LongBreak,
}

impl Phase {
    /// Configured length of this phase in minutes.
    pub fn duration_min(self, settings: &Settings) -> u64 {
        let min = match self {
            Phase::Work => settings.work_time,
            Phase::Break => settings.break_time,
            Phase::LongBreak => settings.long_break_time,
        };
        u64::from(min)
    }

    /// Configured length of this phase in seconds.
    ///
    /// Uses saturating arithmetic to prevent overflow with large values.
    pub fn duration_secs(self, settings: &Settings) -> u64 {
        self.duration_min(settings).saturating_mul(60)
    }

    /// The phase that follows this one, given the number of work phases
    /// completed so far (including this one when it is `Work`).
    pub fn next(self, completed_work_cycles: u32) -> Phase {
        match self {
            Phase::Work => {
                if completed_work_cycles > 0 && completed_work_cycles % LONG_BREAK_INTERVAL == 0 {
                    Phase::LongBreak
                } else {
                    Phase::Break
                }
            }
            Phase::Break | Phase::LongBreak => Phase::Work,
        }
    }

    /// Message shown when this phase runs out.
    pub fn completion_message(self) -> &'static str {
        match self {
            Phase::Work => "Time to take a break!",
            Phase::Break => "Break's over! Back to work.",
            Phase::LongBreak => "Long break over! Ready to start again?",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work Time",
            Phase::Break => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Work => f.write_str("work"),
            Phase::Break => f.write_str("break"),
            Phase::LongBreak => f.write_str("longBreak"),
        }
    }
}
