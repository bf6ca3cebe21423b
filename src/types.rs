//! Core types for the task tracker.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// All statuses in display order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the task is finished (no longer counts as overdue).
    pub fn is_closed(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the four status values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Status must be one of: pending, in-progress, completed, cancelled (got '{}')",
            self.0
        )
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A stored task, as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    /// Calendar date in `YYYY-MM-DD` form.
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    /// Parsed due date, if one is set and well-formed.
    pub fn due(&self) -> Option<NaiveDate> {
        self.due_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }

    /// Advisory overdue check used for display only.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_closed() && self.due().is_some_and(|due| due < today)
    }
}

/// Create/update payload as received from a client.
///
/// Fields are kept loose (plain strings) so that validation can report every
/// violation at once instead of failing at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl TaskInput {
    /// Input with just a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }
}

/// Create/update body as the service receives it.
///
/// Values stay untyped JSON so a wrongly typed field is reported alongside
/// every other violation instead of rejecting the whole body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskPayload {
    #[serde(default)]
    pub title: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<serde_json::Value>,
    #[serde(default)]
    pub due_date: Option<serde_json::Value>,
}

/// Body of `PATCH /tasks/{id}/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPatch {
    #[serde(default)]
    pub status: Option<String>,
}

/// Optional list filters; both combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl TaskFilters {
    pub fn new(status: Option<String>, search: Option<String>) -> Self {
        Self { status, search }
    }

    /// Status filter, ignoring blank values.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Search term, trimmed, ignoring blank values.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// The filters a list call actually applies: trimmed, blanks dropped.
    pub fn normalized(&self) -> Self {
        Self {
            status: self.status().map(String::from),
            search: self.search().map(String::from),
        }
    }

    /// Build filters from query pairs; the first value of a repeated key wins.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut filters = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "status" if filters.status.is_none() => filters.status = Some(value),
                "search" if filters.search.is_none() => filters.search = Some(value),
                _ => {}
            }
        }
        filters
    }
}

/// Task counts per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: TaskStatus, due: Option<&str>) -> Task {
        Task {
            id: 1,
            title: "t".into(),
            description: None,
            status,
            due_date: due.map(String::from),
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("in-progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("cancelled".parse::<TaskStatus>(), Ok(TaskStatus::Cancelled));
        assert!("in_progress".parse::<TaskStatus>().is_err());
        assert!("Completed".parse::<TaskStatus>().is_err());
        assert!("".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn overdue_ignores_closed_tasks() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert!(task(TaskStatus::Pending, Some("2026-05-31")).is_overdue(today));
        assert!(!task(TaskStatus::Pending, Some("2026-06-01")).is_overdue(today));
        assert!(!task(TaskStatus::Completed, Some("2020-01-01")).is_overdue(today));
        assert!(!task(TaskStatus::Pending, None).is_overdue(today));
    }

    #[test]
    fn filters_ignore_blank_values() {
        let filters = TaskFilters::new(Some("  ".into()), Some("  bills ".into()));
        assert_eq!(filters.status(), None);
        assert_eq!(filters.search(), Some("bills"));
    }

    #[test]
    fn normalized_filters_compare_by_effect() {
        let padded = TaskFilters::new(Some(String::new()), Some(" milk ".into()));
        let plain = TaskFilters::new(None, Some("milk".into()));
        assert_eq!(padded.normalized(), plain);
        assert_eq!(plain.normalized(), plain);
    }

    #[test]
    fn repeated_query_keys_keep_first_value() {
        let filters = TaskFilters::from_pairs([
            ("search".to_string(), "a".to_string()),
            ("search".to_string(), "b".to_string()),
            ("page".to_string(), "2".to_string()),
            ("status".to_string(), "pending".to_string()),
        ]);
        assert_eq!(filters.search.as_deref(), Some("a"));
        assert_eq!(filters.status.as_deref(), Some("pending"));
    }
}
