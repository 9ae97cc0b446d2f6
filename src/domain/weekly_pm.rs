//! Weekly PM records and their status lifecycle.
//!
//! A weekly PM is one visit to one site in one ISO week. The intended design
//! is exactly one record per (site, week); the store enforces that on insert.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::domain::tasks::TaskResult;

/// ISO week identifier, rendered as `YYYY-Wnn`.
///
/// Ordering is chronological (year first, then week), which the plan composer
/// relies on when ranking least-recently-scheduled sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekId {
    pub year: i32,
    pub week: u32,
}

impl WeekId {
    pub fn new(year: i32, week: u32) -> Option<Self> {
        if (1..=53).contains(&week) {
            Some(Self { year, week })
        } else {
            None
        }
    }

    /// Week containing the given date, per ISO-8601 week numbering.
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid week identifier '{0}', expected YYYY-Wnn")]
pub struct ParseWeekIdError(String);

impl FromStr for WeekId {
    type Err = ParseWeekIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseWeekIdError(s.to_string());
        let (year, week) = s.split_once("-W").ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;
        if week.len() != 2 {
            return Err(err());
        }
        let week: u32 = week.parse().map_err(|_| err())?;
        WeekId::new(year, week).ok_or_else(err)
    }
}

impl Serialize for WeekId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Weekly PM status state machine.
///
/// Pending -> InProgress -> Completed -> Reviewed, with Cancelled reachable
/// from any non-terminal state. Reviewed requires an explicit manager action;
/// nothing leaves Completed automatically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PmStatus {
    Pending,
    InProgress,
    Completed,
    Reviewed,
    Cancelled,
}

impl PmStatus {
    /// States a manager may still cancel from.
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    pub fn can_transition_to(self, next: PmStatus) -> bool {
        use PmStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Completed)
                | (InProgress, Completed)
                | (Pending, Cancelled)
                | (InProgress, Cancelled)
                | (Completed, Reviewed)
        )
    }
}

/// Append-only comment on a PM or tech request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub user_id: Uuid,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Weekly PM entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyPm {
    pub id: Uuid,
    pub week: WeekId,
    pub site_id: Uuid,
    /// Copied from the site's technician at creation time; None means the
    /// site had no technician assigned when the PM was planned.
    pub assigned_technician_id: Option<Uuid>,
    pub status: PmStatus,
    /// One entry per catalog task, in catalog order.
    pub tasks: Vec<TaskResult>,
    /// Free-text change-request reference.
    #[serde(default)]
    pub cr_number: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl WeeklyPm {
    pub fn all_tasks_completed(&self) -> bool {
        self.tasks.iter().all(|t| t.is_completed)
    }

    /// Status after a technician submit: Completed only when every task
    /// result is done, otherwise the PM stays open as InProgress.
    pub fn status_after_submit(&self) -> PmStatus {
        if self.all_tasks_completed() {
            PmStatus::Completed
        } else {
            PmStatus::InProgress
        }
    }
}

/// Request DTO for a manager creating a single PM.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWeeklyPmRequest {
    pub site_id: Uuid,
    pub week: WeekId,
}

/// Request DTO for appending a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
}

/// Request DTO for setting the CR reference on a PM.
#[derive(Debug, Clone, Deserialize)]
pub struct SetCrNumberRequest {
    pub cr_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_id_round_trips_through_display_and_parse() {
        let week = WeekId::new(2024, 7).unwrap();
        assert_eq!(week.to_string(), "2024-W07");
        assert_eq!("2024-W07".parse::<WeekId>().unwrap(), week);
    }

    #[test]
    fn week_id_rejects_malformed_input() {
        for bad in ["2024-7", "2024W07", "2024-W00", "2024-W54", "24-W07x"] {
            assert!(bad.parse::<WeekId>().is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn week_id_orders_chronologically() {
        let w = |y, wk| WeekId::new(y, wk).unwrap();
        assert!(w(2023, 52) < w(2024, 1));
        assert!(w(2024, 10) < w(2024, 11));
    }

    #[test]
    fn week_id_from_date_uses_iso_numbering() {
        // 2021-01-01 falls in ISO week 53 of 2020.
        let d = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_eq!(WeekId::from_date(d), WeekId::new(2020, 53).unwrap());
    }

    #[test]
    fn status_machine_allows_documented_transitions_only() {
        use PmStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Cancelled));
        assert!(Completed.can_transition_to(Reviewed));

        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Reviewed.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Pending));
    }

    #[test]
    fn submit_completes_only_when_every_task_is_done() {
        use crate::domain::tasks::{default_catalog, TaskResult};

        let catalog = default_catalog();
        let mut pm = WeeklyPm {
            id: Uuid::new_v4(),
            week: WeekId::new(2024, 15).unwrap(),
            site_id: Uuid::new_v4(),
            assigned_technician_id: None,
            status: PmStatus::Pending,
            tasks: catalog.iter().map(TaskResult::blank_for).collect(),
            cr_number: None,
            comments: Vec::new(),
        };
        assert_eq!(pm.status_after_submit(), PmStatus::InProgress);

        for task in &mut pm.tasks {
            task.is_completed = true;
        }
        assert_eq!(pm.status_after_submit(), PmStatus::Completed);
    }
}
