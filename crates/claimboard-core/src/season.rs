//! Season day numbering. Day 1 begins at the season start and every day rolls
//! over 24 hours later (02:00 UTC for the default season).

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonCalendar {
    pub start: DateTime<Utc>,
}

impl Default for SeasonCalendar {
    fn default() -> Self {
        Self {
            start: Utc
                .with_ymd_and_hms(2025, 11, 17, 2, 0, 0)
                .single()
                .unwrap_or(DateTime::UNIX_EPOCH),
        }
    }
}

impl SeasonCalendar {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { start }
    }

    /// Day number containing `at`. Instants before the start give day 0 or
    /// below.
    pub fn day_at(&self, at: DateTime<Utc>) -> i64 {
        let elapsed = at - self.start;
        elapsed.num_milliseconds().div_euclid(Duration::days(1).num_milliseconds()) + 1
    }

    pub fn day_start(&self, day: i64) -> DateTime<Utc> {
        self.start + Duration::days(day - 1)
    }

    pub fn time_until_next_day(&self, at: DateTime<Utc>) -> Duration {
        self.day_start(self.day_at(at) + 1) - at
    }
}

/// `HH:MM:SS`, hours not wrapped at 24. Non-positive spans read `00:00:00`.
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Which past day a viewer is looking at. Only the current day is editable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DaySelection {
    current: i64,
    selected: i64,
}

impl DaySelection {
    pub fn new(current: i64) -> Self {
        Self {
            current,
            selected: current,
        }
    }

    /// Restore a remembered day, falling back to today when out of range.
    pub fn restore(current: i64, remembered: Option<i64>) -> Self {
        let mut selection = Self::new(current);
        if let Some(day) = remembered {
            selection.go_to(day);
        }
        selection
    }

    pub fn current(&self) -> i64 {
        self.current
    }

    pub fn selected(&self) -> i64 {
        self.selected
    }

    /// Returns false and leaves the selection alone outside `1..=current`.
    pub fn go_to(&mut self, day: i64) -> bool {
        if (1..=self.current).contains(&day) {
            self.selected = day;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        self.go_to(self.selected - 1)
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.selected + 1)
    }

    pub fn today(&mut self) {
        self.selected = self.current;
    }

    pub fn is_viewing_past(&self) -> bool {
        self.selected < self.current
    }

    pub fn can_edit(&self) -> bool {
        self.selected == self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single().expect("valid instant")
    }

    #[test]
    fn day_rolls_over_at_two_utc() {
        let calendar = SeasonCalendar::default();
        assert_eq!(calendar.day_at(utc(2025, 11, 17, 2, 0, 0)), 1);
        assert_eq!(calendar.day_at(utc(2025, 11, 18, 1, 59, 59)), 1);
        assert_eq!(calendar.day_at(utc(2025, 11, 18, 2, 0, 0)), 2);
        assert_eq!(calendar.day_at(utc(2025, 11, 17, 1, 0, 0)), 0);
    }

    #[test]
    fn countdown_to_rollover() {
        let calendar = SeasonCalendar::default();
        let remaining = calendar.time_until_next_day(utc(2025, 11, 20, 0, 30, 15));
        assert_eq!(format_countdown(remaining), "01:29:45");
        assert_eq!(format_countdown(Duration::seconds(-5)), "00:00:00");
    }

    #[test]
    fn selection_stays_within_season() {
        let mut selection = DaySelection::restore(4, Some(9));
        assert_eq!(selection.selected(), 4);
        assert!(!selection.next());
        assert!(selection.previous());
        assert!(selection.is_viewing_past());
        assert!(!selection.can_edit());
        assert!(selection.go_to(1));
        assert!(!selection.previous());
        selection.today();
        assert!(selection.can_edit());
    }
}
