//! CLI entry point and command definitions.

use crate::batch::{AutoYes, BatchRunner, Confirm, LinePrompt};
use crate::config::Config;
use crate::job_id::JobId;
use crate::job_manager::JobManager;
use crate::status_viewer::StatusViewer;
use crate::supervisor::Supervisor;
use crate::ui::{render_groups, Palette};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};

const EXAMPLES: &str = "\
Examples:
  bgjob gowitness report server
  bgjob -l
  bgjob -l -v
  bgjob -s cmd-1732459032
  bgjob -s cmd-1732459032 -f
  bgjob -k cmd-1732459032
  bgjob -K
  bgjob --clean

Environment:
  NO_COLOR                     Disable colored output if set
  BGJOB_LOG_FILE               Append diagnostic logs to this file
  RUST_LOG                     Diagnostic log filter (default: warn)";

/// bgjob - Background systemd-run helper.
#[derive(Parser, Debug)]
#[command(name = "bgjob")]
#[command(version)]
#[command(about = "Run commands as transient systemd user services")]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// List all cmd-* units grouped by state
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Show status and logs for a specific unit
    #[arg(short = 's', long, value_name = "UNIT")]
    pub status: Option<String>,

    /// Clean dead/failed/inactive cmd-* units
    #[arg(long)]
    pub clean: bool,

    /// Stop a specific running unit
    #[arg(short = 'k', long, value_name = "UNIT")]
    pub kill: Option<String>,

    /// Stop all running cmd-* units
    #[arg(short = 'K', long = "kill-all")]
    pub kill_all: bool,

    /// Show detailed information (descriptions) and debug logs
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Follow logs in real-time (use with -s)
    #[arg(short = 'f', long)]
    pub follow: bool,

    /// Answer yes to all confirmations
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Command to start as a transient unit
    #[arg(value_name = "COMMAND", trailing_var_arg = true)]
    pub command: Vec<String>,
}

/// What a single invocation does; the first matching flag wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List,
    Status(JobId),
    Clean,
    KillAll,
    Kill(JobId),
    Start(Vec<String>),
    /// No action and no command: print usage and fail
    Usage,
}

impl Cli {
    pub fn action(&self) -> Action {
        if self.list {
            Action::List
        } else if let Some(unit) = &self.status {
            Action::Status(JobId::new(unit.as_str()))
        } else if self.clean {
            Action::Clean
        } else if self.kill_all {
            Action::KillAll
        } else if let Some(unit) = &self.kill {
            Action::Kill(JobId::new(unit.as_str()))
        } else if self.command.is_empty() {
            Action::Usage
        } else {
            Action::Start(self.command.clone())
        }
    }

    /// Apply flags on top of the environment-derived configuration.
    pub fn apply(&self, config: Config) -> Config {
        config
            .with_color(!self.no_color)
            .with_verbose(self.verbose)
            .with_auto_yes(self.yes)
            .with_follow(self.follow)
    }
}

/// Exit status for a rejected command line: 0 for `--help`/`--version`, 1 otherwise.
pub fn parse_error_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

fn confirmer(config: &Config) -> Box<dyn Confirm> {
    if config.auto_yes {
        Box::new(AutoYes)
    } else {
        Box::new(LinePrompt::stdin())
    }
}

/// Handle the default start action.
pub fn handle_start<S: Supervisor>(
    manager: &mut JobManager<S>,
    palette: &Palette,
    command: &[String],
) -> Result<()> {
    println!("Command: {}", palette.muted(&command.join(" ")));

    let id = manager
        .start_job(command, |id| {
            println!("Starting unit: {}", palette.info(id.as_str()));
        })
        .context("Failed to start job")?;

    println!("\n{} Unit {} started successfully", palette.check(), palette.info(id.as_str()));
    println!(
        "View status with: {}",
        palette.muted(&format!("bgjob -s {}", id))
    );
    Ok(())
}

/// Handle `--list`.
pub fn handle_list<S: Supervisor>(
    manager: &JobManager<S>,
    palette: &Palette,
    verbose: bool,
) -> Result<()> {
    let groups = manager.list_jobs()?;
    if groups.is_empty() {
        println!("{}", palette.muted("No cmd-* units found."));
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_groups(&mut out, palette, &groups, verbose)?;
    out.flush()?;
    Ok(())
}

/// Handle `--status`.
pub fn handle_status<S: Supervisor>(
    manager: &JobManager<S>,
    palette: &Palette,
    config: &Config,
    id: &JobId,
) -> Result<()> {
    let viewer = StatusViewer::new(manager.supervisor(), palette, config.log_tail_lines);
    viewer.show(&mut io::stdout(), id, config.follow)?;
    Ok(())
}

/// Handle `--kill`.
pub fn handle_kill<S: Supervisor>(
    manager: &JobManager<S>,
    palette: &Palette,
    id: &JobId,
) -> Result<()> {
    let stopped = manager.kill_job(id)?;
    println!("{} Stopped {}", palette.check(), stopped);
    Ok(())
}

/// Handle `--clean`.
pub fn handle_clean<S: Supervisor>(
    manager: &JobManager<S>,
    palette: &Palette,
    config: &Config,
) -> Result<()> {
    let mut runner = BatchRunner::new(palette, io::stdout(), io::stderr());
    let mut confirm = confirmer(config);
    manager.clean_jobs(&mut runner, confirm.as_mut())?;
    Ok(())
}

/// Handle `--kill-all`.
pub fn handle_kill_all<S: Supervisor>(
    manager: &JobManager<S>,
    palette: &Palette,
    config: &Config,
) -> Result<()> {
    let mut runner = BatchRunner::new(palette, io::stdout(), io::stderr());
    let mut confirm = confirmer(config);
    manager
        .kill_all_jobs(&mut runner, confirm.as_mut())
        .context("Failed to query running units")?;
    Ok(())
}
