//! The store's effect boundary: a trait over the task API and its HTTP
//! implementation.

use crate::error::{ErrorCode, FieldError};
use crate::server::Envelope;
use crate::types::{StatusPatch, Task, TaskFilters, TaskInput, TaskStats, TaskStatus};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;

/// Fallback shown when neither the server nor the transport gave a reason.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// A failed API call as seen by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The server answered with a failure envelope (or an unreadable error body).
    Server {
        status: u16,
        message: Option<String>,
        code: Option<ErrorCode>,
        details: Vec<FieldError>,
    },
    /// The request never produced a usable response.
    Transport(String),
}

impl ClientError {
    /// Human-readable message: server error string, then transport message,
    /// then a generic fallback.
    pub fn user_message(&self) -> String {
        let specific = match self {
            ClientError::Server { message, .. } => message.as_deref(),
            ClientError::Transport(message) => Some(message.as_str()),
        };
        specific
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(GENERIC_ERROR_MESSAGE)
            .to_string()
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

pub type ApiResult<T> = std::result::Result<T, ClientError>;

/// Operations the store needs from the task service.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list(&self, filters: &TaskFilters) -> ApiResult<Vec<Task>>;
    async fn get(&self, task_id: i64) -> ApiResult<Task>;
    async fn create(&self, input: &TaskInput) -> ApiResult<Task>;
    async fn update(&self, task_id: i64, input: &TaskInput) -> ApiResult<Task>;
    async fn patch_status(&self, task_id: i64, status: TaskStatus) -> ApiResult<Task>;
    async fn delete(&self, task_id: i64) -> ApiResult<()>;
    async fn stats(&self) -> ApiResult<TaskStats>;
}

/// [`TaskApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTaskApi {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3001`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/tasks{}", self.base_url, path)
    }
}

/// Read an envelope, turning non-success statuses and `success: false` into errors.
async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<Envelope<T>> {
    let status = response.status();
    let parsed = response.json::<Envelope<T>>().await;

    match parsed {
        Ok(envelope) if status.is_success() && envelope.success => Ok(envelope),
        Ok(envelope) => Err(ClientError::Server {
            status: status.as_u16(),
            message: envelope.error,
            code: envelope.code,
            details: envelope.details.unwrap_or_default(),
        }),
        Err(e) if status.is_success() => Err(e.into()),
        Err(_) => Err(ClientError::Server {
            status: status.as_u16(),
            message: None,
            code: None,
            details: Vec::new(),
        }),
    }
}

async fn read_data<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    read_envelope::<T>(response)
        .await?
        .data
        .ok_or_else(|| ClientError::Transport("Response envelope carried no data".to_string()))
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list(&self, filters: &TaskFilters) -> ApiResult<Vec<Task>> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(status) = filters.status() {
            query.push(("status", status));
        }
        if let Some(search) = filters.search() {
            query.push(("search", search));
        }
        let response = self.client.get(self.url("")).query(&query).send().await?;
        read_data(response).await
    }

    async fn get(&self, task_id: i64) -> ApiResult<Task> {
        let response = self.client.get(self.url(&format!("/{}", task_id))).send().await?;
        read_data(response).await
    }

    async fn create(&self, input: &TaskInput) -> ApiResult<Task> {
        let response = self.client.post(self.url("")).json(input).send().await?;
        read_data(response).await
    }

    async fn update(&self, task_id: i64, input: &TaskInput) -> ApiResult<Task> {
        let response = self
            .client
            .put(self.url(&format!("/{}", task_id)))
            .json(input)
            .send()
            .await?;
        read_data(response).await
    }

    async fn patch_status(&self, task_id: i64, status: TaskStatus) -> ApiResult<Task> {
        let body = StatusPatch {
            status: Some(status.as_str().to_string()),
        };
        let response = self
            .client
            .patch(self.url(&format!("/{}/status", task_id)))
            .json(&body)
            .send()
            .await?;
        read_data(response).await
    }

    async fn delete(&self, task_id: i64) -> ApiResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/{}", task_id)))
            .send()
            .await?;
        read_envelope::<serde_json::Value>(response).await.map(|_| ())
    }

    async fn stats(&self) -> ApiResult<TaskStats> {
        let response = self.client.get(self.url("/stats")).send().await?;
        read_data(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_takes_priority() {
        let err = ClientError::Server {
            status: 404,
            message: Some("Task not found: 7".into()),
            code: Some(ErrorCode::NotFound),
            details: vec![],
        };
        assert_eq!(err.user_message(), "Task not found: 7");
    }

    #[test]
    fn transport_message_is_used_next() {
        let err = ClientError::Transport("connection refused".into());
        assert_eq!(err.user_message(), "connection refused");
    }

    #[test]
    fn generic_fallback_when_nothing_is_known() {
        let err = ClientError::Server {
            status: 502,
            message: None,
            code: None,
            details: vec![],
        };
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(
            ClientError::Transport("  ".into()).user_message(),
            GENERIC_ERROR_MESSAGE
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = HttpTaskApi::new("http://localhost:3001/");
        assert_eq!(api.url("/5"), "http://localhost:3001/tasks/5");
    }
}
