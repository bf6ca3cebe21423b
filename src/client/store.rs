//! The task store: state container plus the effects that feed it.
//!
//! Every operation follows the same shape: dispatch a request action, await
//! the API, then dispatch either the success payload or the failure message.
//! Nothing escapes as an error; writes resolve to an [`OpResult`], listing
//! reports through [`TaskState::error`].

use super::api::TaskApi;
use super::state::{Action, TaskState, reduce};
use crate::types::{Task, TaskFilters, TaskInput, TaskStatus};
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::debug;

/// Outcome of a write operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> OpResult<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Client-side task store over a [`TaskApi`].
///
/// Views subscribe to state changes with [`TaskStore::subscribe`].
pub struct TaskStore<A> {
    api: A,
    state: watch::Sender<TaskState>,
    list_seq: AtomicU64,
    /// Filters of the most recent list request, used to skip redundant refreshes.
    last_listed: Mutex<Option<TaskFilters>>,
}

impl<A: TaskApi> TaskStore<A> {
    pub fn new(api: A) -> Self {
        let (state, _) = watch::channel(TaskState::default());
        Self {
            api,
            state,
            list_seq: AtomicU64::new(0),
            last_listed: Mutex::new(None),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> TaskState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<TaskState> {
        self.state.subscribe()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn dispatch(&self, action: Action) {
        self.state
            .send_modify(|state| *state = reduce(std::mem::take(state), action));
    }

    /// List tasks with the current filters, replacing the task list.
    pub async fn fetch_tasks(&self) {
        let filters = self.state.borrow().filters.clone();
        let seq = self.list_seq.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut last) = self.last_listed.lock() {
            *last = Some(filters.clone());
        }
        self.dispatch(Action::ListRequested { seq });

        match self.api.list(&filters).await {
            Ok(tasks) => {
                debug!(seq, count = tasks.len(), "Task list loaded");
                self.dispatch(Action::ListLoaded { seq, tasks });
            }
            Err(e) => {
                debug!(seq, error = %e, "Task list failed");
                self.dispatch(Action::ListFailed {
                    seq,
                    message: e.user_message(),
                });
            }
        }
    }

    /// Replace the filters. Pure state update; returns whether they changed.
    ///
    /// Filters are compared after normalization, so `" milk"` and `"milk"`
    /// (or an empty status and none) count as the same filter.
    pub fn set_filters(&self, filters: TaskFilters) -> bool {
        let filters = filters.normalized();
        let unchanged = self.state.borrow().filters.normalized() == filters;
        if unchanged {
            return false;
        }
        self.dispatch(Action::FiltersChanged(filters));
        true
    }

    /// Re-list if the filters differ from the last listed ones.
    ///
    /// Returns whether a list call was made.
    pub async fn refresh(&self) -> bool {
        let current = self.state.borrow().filters.normalized();
        let stale = match self.last_listed.lock() {
            Ok(last) => last.as_ref().map(TaskFilters::normalized) != Some(current),
            Err(_) => true,
        };
        if stale {
            self.fetch_tasks().await;
        }
        stale
    }

    /// Apply new filters and converge the list on them.
    pub async fn sync_filters(&self, filters: TaskFilters) -> bool {
        self.set_filters(filters);
        self.refresh().await
    }

    /// Fetch one task; if it is in the list, its entry is refreshed.
    pub async fn fetch_task(&self, task_id: i64) -> OpResult<Task> {
        self.dispatch(Action::Requested);
        match self.api.get(task_id).await {
            Ok(task) => {
                self.dispatch(Action::Updated(task.clone()));
                OpResult::ok(task)
            }
            Err(e) => self.fail(e.user_message()),
        }
    }

    pub async fn create_task(&self, input: &TaskInput) -> OpResult<Task> {
        self.dispatch(Action::Requested);
        match self.api.create(input).await {
            Ok(task) => {
                self.dispatch(Action::Created(task.clone()));
                OpResult::ok(task)
            }
            Err(e) => self.fail(e.user_message()),
        }
    }

    pub async fn update_task(&self, task_id: i64, input: &TaskInput) -> OpResult<Task> {
        self.dispatch(Action::Requested);
        match self.api.update(task_id, input).await {
            Ok(task) => {
                self.dispatch(Action::Updated(task.clone()));
                OpResult::ok(task)
            }
            Err(e) => self.fail(e.user_message()),
        }
    }

    pub async fn update_status(&self, task_id: i64, status: TaskStatus) -> OpResult<Task> {
        self.dispatch(Action::Requested);
        match self.api.patch_status(task_id, status).await {
            Ok(task) => {
                self.dispatch(Action::Updated(task.clone()));
                OpResult::ok(task)
            }
            Err(e) => self.fail(e.user_message()),
        }
    }

    pub async fn delete_task(&self, task_id: i64) -> OpResult<()> {
        self.dispatch(Action::Requested);
        match self.api.delete(task_id).await {
            Ok(()) => {
                self.dispatch(Action::Removed(task_id));
                OpResult::ok(())
            }
            Err(e) => self.fail(e.user_message()),
        }
    }

    fn fail<T>(&self, message: String) -> OpResult<T> {
        self.dispatch(Action::Failed(message.clone()));
        OpResult::failed(message)
    }
}
