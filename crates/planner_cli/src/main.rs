//! Planner command line.
//!
//! # Responsibility
//! - Expand a task snapshot file into calendar occurrences.
//! - Run the reminder loop against a snapshot and print notifications.

use clap::{Args, Parser, Subcommand};
use log::info;
use planner_core::{
    init_logging_with, ChannelSink, NotificationRecord, PlannerConfig, PlannerEngine,
    ReminderLoop, SystemClock, TaskFilter,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;

#[derive(Debug, Parser)]
#[command(name = "planner", version, about = "Recurring task calendar and reminders")]
struct Cli {
    /// JSON config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Absolute directory for rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<String>,
    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the expanded occurrences of a task snapshot.
    Occurrences {
        /// Task snapshot (JSON array as returned by the task store).
        tasks: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Watch a task snapshot and print reminders until Ctrl-C.
    Watch {
        tasks: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Debug, Args)]
struct FilterArgs {
    #[arg(long)]
    priority: Option<u8>,
    #[arg(long)]
    done: Option<bool>,
    #[arg(long)]
    search: Option<String>,
}

impl From<FilterArgs> for TaskFilter {
    fn from(value: FilterArgs) -> Self {
        Self {
            priority: value.priority,
            done: value.done,
            search: value.search,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("planner: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = match cli.config.as_deref() {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::default(),
    };
    if cli.log_dir.is_some() {
        config.logging.dir = cli.log_dir;
    }
    if cli.log_level.is_some() {
        config.logging.level = cli.log_level;
    }
    if config.logging.dir.is_some() {
        init_logging_with(&config.logging)?;
    }

    let engine = PlannerEngine::new(&config);
    match cli.command {
        Command::Occurrences { tasks, filter } => {
            load_tasks(&engine, &tasks, filter.into())?;
            print_occurrences(&engine);
            Ok(())
        }
        Command::Watch { tasks, filter } => {
            load_tasks(&engine, &tasks, filter.into())?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(watch(engine, &config))
        }
    }
}

fn load_tasks(engine: &PlannerEngine, path: &Path, filter: TaskFilter) -> Result<(), Box<dyn Error>> {
    let raw = std::fs::read_to_string(path)?;
    engine.load_snapshot_json(raw.as_str())?;
    let count = engine.set_filter(filter);
    info!("event=cli_snapshot_loaded module=cli status=ok occurrences={count}");
    Ok(())
}

fn print_occurrences(engine: &PlannerEngine) {
    for occurrence in engine.occurrences().iter() {
        println!(
            "{}  {:<12} {:<8} {:<8} {}",
            occurrence.start.format("%Y-%m-%d %H:%M"),
            occurrence.id.to_string(),
            occurrence.recurrence.as_str(),
            occurrence.colors.background,
            occurrence.title
        );
    }
}

async fn watch(engine: PlannerEngine, config: &PlannerConfig) -> Result<(), Box<dyn Error>> {
    let (tx, mut rx) = unbounded_channel::<NotificationRecord>();
    let mut reminder_loop = ReminderLoop::start(
        engine,
        Arc::new(SystemClock),
        Arc::new(ChannelSink::new(tx)),
        config.reminders,
    )?;

    loop {
        tokio::select! {
            record = rx.recv() => match record {
                Some(record) => println!(
                    "[{}] {}: {}",
                    record.raised_at.format("%H:%M:%S"),
                    record.title,
                    record.message
                ),
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
        }
    }

    reminder_loop.stop();
    Ok(())
}
