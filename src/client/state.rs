//! Client-side task state and its pure reducer.

use crate::types::{Task, TaskFilters};

/// Last known server state as seen by the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskState {
    pub tasks: Vec<Task>,
    pub loading: bool,
    pub error: Option<String>,
    pub filters: TaskFilters,
    /// Sequence number of the most recently issued list request.
    pub latest_list_seq: u64,
    /// Requests started and not yet settled; `loading` mirrors `in_flight > 0`.
    pub in_flight: usize,
}

impl TaskState {
    pub fn find(&self, task_id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }
}

/// Events the store dispatches around each API call.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A write or fetch started.
    Requested,
    /// A list call with this sequence number started.
    ListRequested { seq: u64 },
    ListLoaded { seq: u64, tasks: Vec<Task> },
    ListFailed { seq: u64, message: String },
    Created(Task),
    /// Replace the task with the same id; order unchanged.
    Updated(Task),
    Removed(i64),
    Failed(String),
    FiltersChanged(TaskFilters),
}

/// Apply an action to the state.
///
/// List results older than the latest issued list request are dropped, so a
/// slow earlier response cannot overwrite a newer one. Every completion
/// settles one in-flight request, applied or not.
pub fn reduce(mut state: TaskState, action: Action) -> TaskState {
    match action {
        Action::Requested => start(&mut state),
        Action::ListRequested { seq } => {
            start(&mut state);
            state.latest_list_seq = state.latest_list_seq.max(seq);
        }
        Action::ListLoaded { seq, tasks } => {
            settle(&mut state);
            if seq >= state.latest_list_seq {
                state.tasks = tasks;
            }
        }
        Action::ListFailed { seq, message } => {
            settle(&mut state);
            if seq >= state.latest_list_seq {
                state.error = Some(message);
            }
        }
        Action::Created(task) => {
            settle(&mut state);
            state.tasks.insert(0, task);
        }
        Action::Updated(task) => {
            settle(&mut state);
            if let Some(slot) = state.tasks.iter_mut().find(|t| t.id == task.id) {
                *slot = task;
            }
        }
        Action::Removed(task_id) => {
            settle(&mut state);
            state.tasks.retain(|t| t.id != task_id);
        }
        Action::Failed(message) => {
            settle(&mut state);
            state.error = Some(message);
        }
        Action::FiltersChanged(filters) => {
            state.filters = filters;
        }
    }
    state
}

fn start(state: &mut TaskState) {
    state.in_flight += 1;
    state.loading = true;
    state.error = None;
}

fn settle(state: &mut TaskState) {
    state.in_flight = state.in_flight.saturating_sub(1);
    state.loading = state.in_flight > 0;
}
