//! Payload validation shared by create and update.
//!
//! Every rule is checked and all violations are returned together.

use crate::error::{FieldError, ServiceError, ServiceResult};
use crate::types::{TaskInput, TaskPayload, TaskStatus};
use serde_json::Value;
use chrono::{DateTime, NaiveDate};

pub const TITLE_MAX_CHARS: usize = 255;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// A payload that passed validation, normalized for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTask {
    pub title: String,
    pub description: Option<String>,
    /// `None` when the payload did not name a status.
    pub status: Option<TaskStatus>,
    /// Normalized `YYYY-MM-DD`.
    pub due_date: Option<String>,
}

/// Validate a create/update payload.
pub fn validate_task_input(input: &TaskInput) -> ServiceResult<ValidTask> {
    validate_fields(input, &[])
}

/// Validate a body received over the wire.
///
/// Non-string values are reported as field errors in the same list as the
/// other rules; `null` counts as absent.
pub fn validate_task_payload(payload: &TaskPayload) -> ServiceResult<ValidTask> {
    let mut mistyped = Vec::new();
    let input = TaskInput {
        title: text_field("title", &payload.title, &mut mistyped),
        description: text_field("description", &payload.description, &mut mistyped),
        status: text_field("status", &payload.status, &mut mistyped),
        due_date: text_field("due_date", &payload.due_date, &mut mistyped),
    };
    validate_fields(&input, &mistyped)
}

fn text_field(
    field: &'static str,
    value: &Option<Value>,
    mistyped: &mut Vec<FieldError>,
) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => {
            mistyped.push(FieldError::new(field, format!("{} must be a string", field)));
            None
        }
    }
}

/// Run every rule, reporting errors in field order. A field listed in
/// `mistyped` reports that error in place of its own rules.
fn validate_fields(input: &TaskInput, mistyped: &[FieldError]) -> ServiceResult<ValidTask> {
    let mut errors = Vec::new();
    let type_error = |field: &str| mistyped.iter().find(|e| e.field == field).cloned();

    let title = input.title.as_deref().map(str::trim).unwrap_or_default();
    let title_len = title.chars().count();
    if let Some(e) = type_error("title") {
        errors.push(e);
    } else if title_len == 0 {
        errors.push(FieldError::new("title", "Title is required"));
    } else if title_len > TITLE_MAX_CHARS {
        errors.push(FieldError::new(
            "title",
            format!("Title must be between 1 and {} characters", TITLE_MAX_CHARS),
        ));
    }

    let description = input.description.as_deref().filter(|d| !d.is_empty());
    if let Some(e) = type_error("description") {
        errors.push(e);
    } else if let Some(d) = description
        && d.chars().count() > DESCRIPTION_MAX_CHARS
    {
        errors.push(FieldError::new(
            "description",
            format!(
                "Description must be at most {} characters",
                DESCRIPTION_MAX_CHARS
            ),
        ));
    }

    if let Some(e) = type_error("status") {
        errors.push(e);
    }
    let status = match input.status.as_deref() {
        None => None,
        Some(raw) => match validate_status(raw) {
            Ok(status) => Some(status),
            Err(e) => {
                errors.push(e);
                None
            }
        },
    };

    if let Some(e) = type_error("due_date") {
        errors.push(e);
    }
    let due_date = match input.due_date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match parse_due_date(raw) {
            Some(date) => Some(date.format("%Y-%m-%d").to_string()),
            None => {
                errors.push(FieldError::new(
                    "due_date",
                    "Due date must be a valid date (YYYY-MM-DD)",
                ));
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors));
    }

    Ok(ValidTask {
        title: title.to_string(),
        description: description.map(String::from),
        status,
        due_date,
    })
}

/// Validate a status value against the four-member enum.
pub fn validate_status(raw: &str) -> Result<TaskStatus, FieldError> {
    raw.parse::<TaskStatus>()
        .map_err(|e| FieldError::new("status", e.to_string()))
}

/// Parse a calendar date from `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(err: ServiceError) -> Vec<String> {
        err.field_errors()
            .unwrap_or_default()
            .iter()
            .map(|f| f.field.clone())
            .collect()
    }

    #[test]
    fn accepts_minimal_payload() {
        let valid = validate_task_input(&TaskInput::titled("  Pay bills  ")).unwrap();
        assert_eq!(valid.title, "Pay bills");
        assert_eq!(valid.status, None);
        assert_eq!(valid.description, None);
        assert_eq!(valid.due_date, None);
    }

    #[test]
    fn title_length_boundaries() {
        assert!(validate_task_input(&TaskInput::titled("a".repeat(255))).is_ok());
        assert!(validate_task_input(&TaskInput::titled("a".repeat(256))).is_err());
        assert!(validate_task_input(&TaskInput::titled("   ")).is_err());
        assert!(validate_task_input(&TaskInput::default()).is_err());
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        assert!(validate_task_input(&TaskInput::titled("é".repeat(255))).is_ok());
    }

    #[test]
    fn description_limit() {
        let ok = TaskInput::titled("t").with_description("d".repeat(1000));
        assert!(validate_task_input(&ok).is_ok());
        let too_long = TaskInput::titled("t").with_description("d".repeat(1001));
        assert_eq!(fields(validate_task_input(&too_long).unwrap_err()), vec!["description"]);
    }

    #[test]
    fn collects_every_violation() {
        let input = TaskInput::titled("")
            .with_description("d".repeat(1001))
            .with_status("done")
            .with_due_date("2024-02-30");
        let err = validate_task_input(&input).unwrap_err();
        assert_eq!(fields(err), vec!["title", "description", "status", "due_date"]);
    }

    #[test]
    fn due_date_is_normalized() {
        let input = TaskInput::titled("t").with_due_date("2099-01-01T10:30:00Z");
        let valid = validate_task_input(&input).unwrap();
        assert_eq!(valid.due_date.as_deref(), Some("2099-01-01"));
    }

    #[test]
    fn empty_due_date_is_absent() {
        let valid = validate_task_input(&TaskInput::titled("t").with_due_date("")).unwrap();
        assert_eq!(valid.due_date, None);
    }

    #[test]
    fn past_due_dates_are_accepted() {
        let valid = validate_task_input(&TaskInput::titled("t").with_due_date("2001-01-01")).unwrap();
        assert_eq!(valid.due_date.as_deref(), Some("2001-01-01"));
    }

    #[test]
    fn wrongly_typed_fields_join_the_error_list() {
        let payload: TaskPayload =
            serde_json::from_value(serde_json::json!({"title": 5, "status": "bogus"})).unwrap();
        let err = validate_task_payload(&payload).unwrap_err();
        assert_eq!(fields(err), vec!["title", "status"]);

        let payload: TaskPayload = serde_json::from_value(
            serde_json::json!({"title": "ok", "description": null, "due_date": ["2099-01-01"]}),
        )
        .unwrap();
        let err = validate_task_payload(&payload).unwrap_err();
        assert_eq!(fields(err), vec!["due_date"]);
    }

    #[test]
    fn string_payload_validates_like_input() {
        let payload: TaskPayload = serde_json::from_value(
            serde_json::json!({"title": " Pay bills ", "status": "completed"}),
        )
        .unwrap();
        let valid = validate_task_payload(&payload).unwrap();
        assert_eq!(valid.title, "Pay bills");
        assert_eq!(valid.status, Some(TaskStatus::Completed));
    }

    #[test]
    fn status_must_be_enum_member() {
        assert_eq!(validate_status("completed"), Ok(TaskStatus::Completed));
        assert!(validate_status("archived").is_err());
        let input = TaskInput::titled("t").with_status("in-progress");
        assert_eq!(
            validate_task_input(&input).unwrap().status,
            Some(TaskStatus::InProgress)
        );
    }
}
