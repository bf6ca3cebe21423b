//! Client commands: each one drives the task store and renders its result.

use super::{Command, ListArgs, TaskArgs};
use crate::client::{OpResult, TaskApi, TaskStore, check_due_date_not_past};
use crate::types::{Task, TaskFilters, TaskInput, TaskStatus};
use anyhow::{Result, anyhow, bail};
use chrono::{Local, NaiveDate};

impl From<TaskArgs> for TaskInput {
    fn from(args: TaskArgs) -> Self {
        TaskInput {
            title: Some(args.title),
            description: args.description,
            status: args.status,
            due_date: args.due,
        }
    }
}

impl From<&ListArgs> for TaskFilters {
    fn from(args: &ListArgs) -> Self {
        TaskFilters::new(args.status.clone(), args.search.clone())
    }
}

/// Run a non-`serve` command against the store.
pub async fn run_client_command<A: TaskApi>(store: &TaskStore<A>, command: Command) -> Result<()> {
    let today = Local::now().date_naive();

    match command {
        Command::Serve => bail!("serve is not a client command"),
        Command::List(args) => {
            store.sync_filters(TaskFilters::from(&args)).await;
            let state = store.state();
            if let Some(error) = state.error {
                bail!(error);
            }
            if args.json {
                println!("{}", serde_json::to_string_pretty(&state.tasks)?);
            } else {
                print!("{}", render_table(&state.tasks, today));
            }
        }
        Command::Show { id } => {
            let task = into_data(store.fetch_task(id).await)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        Command::Add(args) => {
            let input = TaskInput::from(args);
            warn_past_due(&input, today);
            let task = into_data(store.create_task(&input).await)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        Command::Edit { id, task } => {
            let input = TaskInput::from(task);
            warn_past_due(&input, today);
            let task = into_data(store.update_task(id, &input).await)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        Command::Status { id, status } => {
            let status: TaskStatus = status.parse()?;
            let task = into_data(store.update_status(id, status).await)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        Command::Delete { id } => {
            into_data(store.delete_task(id).await)?;
            println!("Task {} deleted", id);
        }
        Command::Stats => {
            let stats = store.api().stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn into_data<T>(result: OpResult<T>) -> Result<T> {
    match result {
        OpResult {
            success: true,
            data: Some(data),
            ..
        } => Ok(data),
        OpResult { error, .. } => Err(anyhow!(
            error.unwrap_or_else(|| crate::client::GENERIC_ERROR_MESSAGE.to_string())
        )),
    }
}

fn warn_past_due(input: &TaskInput, today: NaiveDate) {
    if let Some(warning) = input
        .due_date
        .as_deref()
        .and_then(|due| check_due_date_not_past(due, today))
    {
        eprintln!("Warning: {}", warning.message);
    }
}

/// Plain-text table; overdue tasks are flagged with `!`.
pub fn render_table(tasks: &[Task], today: NaiveDate) -> String {
    if tasks.is_empty() {
        return "No tasks found\n".to_string();
    }

    let mut out = format!("{:>5}  {:<12} {:<11} {}\n", "ID", "STATUS", "DUE", "TITLE");
    for task in tasks {
        let flag = if task.is_overdue(today) { "!" } else { " " };
        out.push_str(&format!(
            "{:>5}  {:<12} {:<10}{} {}\n",
            task.id,
            task.status.as_str(),
            task.due_date.as_deref().unwrap_or("-"),
            flag,
            task.title
        ));
    }
    out
}
