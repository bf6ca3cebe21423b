//! CLI command definitions for task-tracker
//!
//! This module defines the CLI structure using clap's derive macros.
//! `serve` runs the HTTP API; the other commands drive the client task
//! store against a running server.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Task tracker API server and command-line client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Address to bind (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Base URL of the API for client commands (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API server (default if no subcommand given)
    Serve,

    /// List tasks, newest first
    List(ListArgs),

    /// Show one task
    Show {
        /// Task id
        id: i64,
    },

    /// Create a task
    Add(TaskArgs),

    /// Replace a task's title, description, status and due date
    Edit {
        /// Task id
        id: i64,

        #[command(flatten)]
        task: TaskArgs,
    },

    /// Change only a task's status
    Status {
        /// Task id
        id: i64,

        /// New status: pending, in-progress, completed or cancelled
        status: String,
    },

    /// Delete a task permanently
    Delete {
        /// Task id
        id: i64,
    },

    /// Show task counts per status
    Stats,
}

/// Filters for `list`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only tasks with this status
    #[arg(long)]
    pub status: Option<String>,

    /// Case-insensitive substring of title or description
    #[arg(long)]
    pub search: Option<String>,

    /// Print raw JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Fields for `add` and `edit`.
#[derive(Args, Debug, Clone)]
pub struct TaskArgs {
    /// Task title
    pub title: String,

    /// Longer description
    #[arg(long)]
    pub description: Option<String>,

    /// Initial status (defaults to pending)
    #[arg(long)]
    pub status: Option<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
}
