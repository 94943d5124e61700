//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface of the `taskpulse` binary: task
//! creation, inspection and updates against the tracking service, plus
//! configuration management.

use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{TaskData, TaskStatus};

/// Taskpulse - task lifecycle tracking
///
/// Creates and updates tracked tasks in the tracking service, for use from
/// scripts, cron jobs and CI pipelines. Library integrations handle queue
/// workloads; this binary covers everything scheduled outside a queue.
#[derive(Parser, Debug)]
#[command(name = "taskpulse")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors; `create` prints only the task id
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, env = "TASKPULSE_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new tracked task
    Create {
        /// Task name
        name: String,

        /// Initial status
        #[arg(short, long, default_value = "processing")]
        status: String,

        /// Initial progress value
        #[arg(long)]
        value: Option<i64>,

        /// Progress value at which the task counts as complete
        #[arg(long, default_value = "100")]
        value_max: i64,

        /// Metadata entries as KEY=VALUE (repeatable)
        #[arg(short, long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,

        /// Metadata as a single JSON object
        #[arg(long, value_name = "JSON")]
        data_json: Option<String>,

        /// Monitor to associate the task with
        #[arg(short, long)]
        monitor: Option<String>,

        /// Print the created task as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Fetch a task and print it
    Get {
        /// Task id
        task_id: String,

        /// Print the task as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Update fields of an existing task
    Update {
        /// Task id
        task_id: String,

        /// New task name
        #[arg(long)]
        name: Option<String>,

        /// New status
        #[arg(short, long)]
        status: Option<String>,

        /// New progress value
        #[arg(long)]
        value: Option<i64>,

        /// New progress maximum
        #[arg(long)]
        value_max: Option<i64>,

        /// Metadata entries as KEY=VALUE (repeatable)
        #[arg(short, long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,

        /// Metadata as a single JSON object
        #[arg(long, value_name = "JSON")]
        data_json: Option<String>,

        /// Print the updated task as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Display version and build information
    Version,
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show,

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the configuration
    Validate,
}

/// Parse a status argument
pub fn parse_status(value: &str) -> Result<TaskStatus> {
    value
        .parse()
        .map_err(|e: String| Error::config_field_invalid("status", e))
}

/// Parse one KEY=VALUE metadata pair
///
/// Values that parse as JSON keep their type; anything else becomes a
/// string, so `attempts=3` is a number and `queue=emails` a string.
pub fn parse_data_pair(pair: &str) -> Result<(String, Value)> {
    let (key, value) = pair.split_once('=').ok_or_else(|| {
        Error::config_validation(format!("Invalid data entry '{}'; expected KEY=VALUE", pair))
    })?;
    if key.is_empty() {
        return Err(Error::config_validation(format!(
            "Invalid data entry '{}'; key is empty",
            pair
        )));
    }
    let parsed = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), parsed))
}

/// Combine --data-json and --data entries into one metadata map
///
/// KEY=VALUE entries win over keys from the JSON object.
pub fn collect_data(pairs: &[String], data_json: Option<&str>) -> Result<Option<TaskData>> {
    let mut data = TaskData::new();

    if let Some(raw) = data_json {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => data.extend(map),
            Ok(_) => {
                return Err(Error::config_validation(
                    "--data-json must be a JSON object",
                ));
            }
            Err(e) => {
                return Err(Error::config_validation(format!(
                    "Invalid JSON for --data-json: {}",
                    e
                )));
            }
        }
    }

    for pair in pairs {
        let (key, value) = parse_data_pair(pair)?;
        data.insert(key, value);
    }

    Ok(if data.is_empty() { None } else { Some(data) })
}
