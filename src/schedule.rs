use chrono::{Local, NaiveDateTime};
use config_model::{LockPriority, WorkHours};

use crate::status::{Mode, PowerState};

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Decide which power state the machine should be in right now.
///
/// `locked` must already account for `disable_if_workstation_locked`; callers
/// pass `false` when lock awareness is off.
pub fn evaluate(
    now: NaiveDateTime,
    hours: WorkHours,
    mode: Mode,
    locked: bool,
    priority: LockPriority,
) -> PowerState {
    if locked && priority == LockPriority::LockFirst {
        return PowerState::Normal;
    }
    match mode {
        Mode::Forced => PowerState::Awake,
        Mode::Stopped => PowerState::Normal,
        Mode::Active if locked => PowerState::Normal,
        Mode::Active if hours.contains(now) => PowerState::Awake,
        Mode::Active => PowerState::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, NaiveDate, Timelike};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        // January 2025: the 6th is a Monday.
        NaiveDate::from_ymd_opt(2025, 1, day)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    fn hours() -> WorkHours {
        WorkHours::new(8, 18)
    }

    #[test]
    fn active_mode_follows_weekday_window_all_week() {
        let start = at(6, 0);
        for step in 0..(7 * 24 * 4) {
            let now = start + Duration::minutes(15 * step);
            let expected = if now.weekday().num_days_from_monday() < 5
                && (8..18).contains(&now.hour())
            {
                PowerState::Awake
            } else {
                PowerState::Normal
            };
            assert_eq!(
                evaluate(now, hours(), Mode::Active, false, LockPriority::LockFirst),
                expected,
                "at {now}"
            );
        }
    }

    #[test]
    fn tuesday_morning_is_awake_and_saturday_is_normal() {
        let tuesday = at(7, 10);
        let saturday = at(4, 10);
        assert_eq!(
            evaluate(tuesday, hours(), Mode::Active, false, LockPriority::LockFirst),
            PowerState::Awake
        );
        assert_eq!(
            evaluate(saturday, hours(), Mode::Active, false, LockPriority::LockFirst),
            PowerState::Normal
        );
    }

    #[test]
    fn stopped_is_always_normal_and_forced_always_awake() {
        for day in 4..=10 {
            for hour in 0..24 {
                let now = at(day, hour);
                assert_eq!(
                    evaluate(now, hours(), Mode::Stopped, false, LockPriority::LockFirst),
                    PowerState::Normal
                );
                assert_eq!(
                    evaluate(now, hours(), Mode::Forced, false, LockPriority::LockFirst),
                    PowerState::Awake
                );
            }
        }
    }

    #[test]
    fn forced_outside_window_is_awake() {
        assert_eq!(
            evaluate(at(7, 22), hours(), Mode::Forced, false, LockPriority::LockFirst),
            PowerState::Awake
        );
    }

    #[test]
    fn lock_first_overrides_every_mode() {
        for mode in [Mode::Active, Mode::Forced, Mode::Stopped] {
            assert_eq!(
                evaluate(at(7, 10), hours(), mode, true, LockPriority::LockFirst),
                PowerState::Normal,
                "{mode:?}"
            );
        }
    }

    #[test]
    fn forced_first_keeps_forced_awake_while_locked() {
        assert_eq!(
            evaluate(at(7, 10), hours(), Mode::Forced, true, LockPriority::ForcedFirst),
            PowerState::Awake
        );
        assert_eq!(
            evaluate(at(7, 10), hours(), Mode::Active, true, LockPriority::ForcedFirst),
            PowerState::Normal
        );
    }
}
