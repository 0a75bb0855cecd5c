//! Typed timetable produced from the upstream's rendered markup.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One scheduled period of one class.
///
/// This type is not constructed directly, but gotten via [`Session::timetable()`](super::Session::timetable()).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodEntry {
    pub(super) grade: u8,
    pub(super) class_number: u8,
    pub(super) weekday: u8,
    pub(super) weekday_label: String,
    pub(super) period: u8,
    pub(super) subject: String,
    pub(super) teacher: String,
}

impl PeriodEntry {
    /// Grade of the class this period belongs to.
    #[must_use]
    pub fn grade(&self) -> u8 {
        self.grade
    }

    /// Number of the class within its grade.
    #[must_use]
    pub fn class_number(&self) -> u8 {
        self.class_number
    }

    /// Index of the weekday slot in the rendered table, `0` being the first school day (Monday).
    #[must_use]
    pub fn weekday_index(&self) -> u8 {
        self.weekday
    }

    /// The weekday as a [`chrono::Weekday`].
    #[must_use]
    pub fn weekday(&self) -> Weekday {
        // `weekday` is always a table column minus one, so at most 5.
        Weekday::try_from(self.weekday).unwrap_or(Weekday::Mon)
    }

    /// Korean short label of the weekday, e.g. `월`.
    #[must_use]
    pub fn weekday_label(&self) -> &str {
        &self.weekday_label
    }

    /// 1-based period of the day.
    #[must_use]
    pub fn period(&self) -> u8 {
        self.period
    }

    /// Subject taught in this period.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Teacher of this period. Equal to [`subject()`](PeriodEntry::subject()) when the cell had a single line.
    #[must_use]
    pub fn teacher(&self) -> &str {
        &self.teacher
    }
}

/// One class's week, indexed `[weekday][period - 1]`.
///
/// Periods with nothing scheduled are `None`.
pub type Week = Vec<Vec<Option<PeriodEntry>>>;

/// Every class of every grade: `grade → class → week`.
pub type Timetable = BTreeMap<u8, BTreeMap<u8, Week>>;

/// Period start and end times, exactly as the service sends them.
pub type ClassTimeInfo = serde_json::Value;
