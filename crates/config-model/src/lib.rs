use std::time::Duration;

use anyhow::{Result, ensure};
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

pub use hours::WorkHours;
pub use settings::{KeepAwakeConfig, LockPriority};

mod settings {
    use super::*;

    /// Decides whether a locked desktop or forced mode wins when both apply.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum LockPriority {
        /// A locked desktop always allows normal standby.
        #[default]
        LockFirst,
        /// Forced mode keeps the machine awake even while locked.
        ForcedFirst,
    }

    /// Contents of `config.json`. Missing keys fall back to their defaults.
    #[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(default)]
    pub struct KeepAwakeConfig {
        pub start_hour: u32,
        pub end_hour: u32,
        pub sleep_after_min: u32,
        pub check_interval_sec: u64,
        pub disable_if_workstation_locked: bool,
        pub lock_priority: LockPriority,
    }

    impl KeepAwakeConfig {
        pub const DEFAULT_START_HOUR: u32 = 8;
        pub const DEFAULT_END_HOUR: u32 = 18;
        pub const DEFAULT_SLEEP_AFTER_MIN: u32 = 30;
        pub const DEFAULT_CHECK_INTERVAL_SEC: u64 = 300;

        /// Validate invariants serde defaults cannot express.
        pub fn validated(self) -> Result<Self> {
            ensure!(
                self.start_hour <= 23,
                "start_hour must be between 0 and 23 (got {})",
                self.start_hour
            );
            ensure!(
                self.end_hour <= 23,
                "end_hour must be between 0 and 23 (got {})",
                self.end_hour
            );
            ensure!(
                self.check_interval_sec > 0,
                "check_interval_sec must be greater than zero"
            );
            Ok(self)
        }

        pub fn work_hours(&self) -> WorkHours {
            WorkHours::new(self.start_hour, self.end_hour)
        }

        pub fn check_interval(&self) -> Duration {
            Duration::from_secs(self.check_interval_sec)
        }

        /// Whether the lock probe should be consulted at all.
        pub fn lock_aware(&self) -> bool {
            self.disable_if_workstation_locked
        }
    }

    impl Default for KeepAwakeConfig {
        fn default() -> Self {
            Self {
                start_hour: Self::DEFAULT_START_HOUR,
                end_hour: Self::DEFAULT_END_HOUR,
                sleep_after_min: Self::DEFAULT_SLEEP_AFTER_MIN,
                check_interval_sec: Self::DEFAULT_CHECK_INTERVAL_SEC,
                disable_if_workstation_locked: false,
                lock_priority: LockPriority::default(),
            }
        }
    }
}

mod hours {
    use super::*;

    /// Weekday working window `[start_hour, end_hour)` in local wall-clock hours.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WorkHours {
        start_hour: u32,
        end_hour: u32,
    }

    impl WorkHours {
        pub fn new(start_hour: u32, end_hour: u32) -> Self {
            Self {
                start_hour,
                end_hour,
            }
        }

        pub fn start_hour(&self) -> u32 {
            self.start_hour
        }

        pub fn end_hour(&self) -> u32 {
            self.end_hour
        }

        /// An inverted or zero-width window never matches.
        pub fn is_empty(&self) -> bool {
            self.start_hour >= self.end_hour
        }

        pub fn is_workday(weekday: Weekday) -> bool {
            !matches!(weekday, Weekday::Sat | Weekday::Sun)
        }

        pub fn contains(&self, at: NaiveDateTime) -> bool {
            Self::is_workday(at.weekday()) && (self.start_hour..self.end_hour).contains(&at.hour())
        }
    }
}
