//! Taskpulse command-line client
//!
//! Entry point for the `taskpulse` binary: create, fetch and update
//! tracked tasks from the shell, plus configuration management. Unlike
//! the library's lifecycle tracking, CLI calls surface their errors.

use clap::Parser;
use tracing::debug;

use taskpulse::api::{HttpTaskApi, TaskApi};
use taskpulse::cli::{self, Cli, Commands, ConfigSubcommand};
use taskpulse::config::{self, Settings};
use taskpulse::error::{Error, Result};
use taskpulse::types::{Task, TaskFields};
use taskpulse::{logging, version};

fn main() {
    if let Err(e) = run() {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    // Commands that don't need settings or full logging
    match &cli.command {
        Commands::Version => {
            version::print_version();
            return Ok(());
        }
        Commands::Config { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_config_command(cli.config.as_deref(), subcommand.clone());
        }
        _ => {}
    }

    let settings = Settings::load(cli.config.as_deref())?;

    // The guards must be kept alive for the lifetime of the program
    let _log_guards = logging::init_logging(&settings.logging, cli.verbose, cli.quiet)?;

    let build = version::build_info();
    debug!(version = %build.full_version(), "Starting taskpulse");

    // Task commands are one-shot; a current-thread runtime is plenty
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create runtime: {}", e)))?;

    let quiet = cli.quiet;
    match cli.command {
        Commands::Create {
            name,
            status,
            value,
            value_max,
            data,
            data_json,
            monitor,
            json,
        } => {
            let fields = TaskFields {
                name: None,
                status: Some(cli::parse_status(&status)?),
                value,
                value_max: Some(value_max),
                data: cli::collect_data(&data, data_json.as_deref())?,
                max_runtime: None,
                stale_timeout: None,
            };
            runtime.block_on(run_create(
                &settings,
                &name,
                fields,
                monitor.as_deref(),
                json,
                quiet,
            ))
        }
        Commands::Get { task_id, json } => runtime.block_on(run_get(&settings, &task_id, json)),
        Commands::Update {
            task_id,
            name,
            status,
            value,
            value_max,
            data,
            data_json,
            json,
        } => {
            let status = status.map(|s| cli::parse_status(&s)).transpose()?;
            let fields = TaskFields {
                name,
                status,
                value,
                value_max,
                data: cli::collect_data(&data, data_json.as_deref())?,
                max_runtime: None,
                stale_timeout: None,
            };
            if fields.is_empty() {
                return Err(Error::config_validation(
                    "Nothing to update; pass at least one of --name, --status, --value, --value-max or --data",
                ));
            }
            runtime.block_on(run_update(&settings, &task_id, fields, json))
        }
        Commands::Version | Commands::Config { .. } => {
            // Already handled above
            unreachable!();
        }
    }
}

/// Create a task and print it
async fn run_create(
    settings: &Settings,
    name: &str,
    fields: TaskFields,
    monitor_id: Option<&str>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let api = HttpTaskApi::from_settings(&settings.api)?;
    let task = api.create_task(name, &fields, monitor_id).await?;

    if quiet {
        // Bare id for shell capture
        println!("{}", task.id);
    } else if json {
        print_task_json(&task)?;
    } else {
        println!("Created task {} ({})", task.id, task.status);
        if let Some(url) = settings.api.dashboard_task_url(&task.id) {
            println!("  {}", url);
        }
    }
    Ok(())
}

/// Fetch a task and print it
async fn run_get(settings: &Settings, task_id: &str, json: bool) -> Result<()> {
    let api = HttpTaskApi::from_settings(&settings.api)?;
    let task = api.get_task(task_id).await?;

    if json {
        print_task_json(&task)?;
    } else {
        println!("{}", task);
    }
    Ok(())
}

/// Update a task and print the result
async fn run_update(
    settings: &Settings,
    task_id: &str,
    fields: TaskFields,
    json: bool,
) -> Result<()> {
    let api = HttpTaskApi::from_settings(&settings.api)?;
    let task = api.update_task(task_id, &fields).await?;

    if json {
        print_task_json(&task)?;
    } else {
        println!("Updated task {} ({})", task.id, task.status);
    }
    Ok(())
}

fn print_task_json(task: &Task) -> Result<()> {
    let encoded = serde_json::to_string_pretty(task)
        .map_err(|e| Error::Internal(format!("Failed to encode task: {}", e)))?;
    println!("{}", encoded);
    Ok(())
}

/// Handle configuration subcommands
fn handle_config_command(config_path: Option<&str>, subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            let settings = Settings::load(config_path)?;
            println!("{}", toml::to_string_pretty(&settings)?);
        }
        ConfigSubcommand::Init { path, force } => {
            config::init_config(path.as_deref(), force)?;
        }
        ConfigSubcommand::Validate => {
            let settings = Settings::load(config_path)?;
            if settings.api.is_configured() {
                println!("Configuration is valid.");
            } else {
                println!(
                    "Configuration is valid. Tracking is disabled (missing: {}).",
                    settings.api.missing_fields().join(", ")
                );
            }
        }
    }

    Ok(())
}
