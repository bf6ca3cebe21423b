//! Client Task Store.
//!
//! Holds the client's view of the task list, loading/error flags and active
//! filters. State changes only through [`state::reduce`]; network calls live
//! behind the [`TaskApi`] trait so the store can run against any backend.

pub mod api;
pub mod state;
pub mod store;

pub use api::{ApiResult, ClientError, GENERIC_ERROR_MESSAGE, HttpTaskApi, TaskApi};
pub use state::{Action, TaskState, reduce};
pub use store::{OpResult, TaskStore};

use crate::error::FieldError;
use chrono::NaiveDate;

/// Advisory past-date check applied before submitting a form.
///
/// The service accepts past due dates; this only warns the user.
pub fn check_due_date_not_past(due_date: &str, today: NaiveDate) -> Option<FieldError> {
    let due = crate::validation::parse_due_date(due_date.trim())?;
    (due < today).then(|| FieldError::new("due_date", "Due date is in the past"))
}
