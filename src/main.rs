mod batch;
mod cli;
mod config;
mod error;
mod job_id;
mod job_manager;
mod logging;
mod registry;
mod status_viewer;
mod supervisor;
mod ui;
mod unit_table;
mod utils;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Action, Cli};
use config::Config;
use job_manager::JobManager;
use supervisor::{check_environment, Systemd};
use ui::Palette;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(cli::parse_error_exit_code(&err));
        }
    };
    let config = cli.apply(Config::from_env());
    let palette = Palette::new(config.color);

    if let Err(err) = run(&cli, &config, &palette) {
        eprintln!("{} {:#}", palette.failure("Error:"), err);
        std::process::exit(1);
    }
}

fn run(args: &Cli, config: &Config, palette: &Palette) -> Result<()> {
    logging::init_logging(config)?;

    check_environment(&config.programs)?;
    let mut manager = JobManager::new(Systemd::new(config.programs.clone()));

    match args.action() {
        Action::List => cli::handle_list(&manager, palette, config.verbose)?,
        Action::Status(id) => cli::handle_status(&manager, palette, config, &id)?,
        Action::Clean => cli::handle_clean(&manager, palette, config)?,
        Action::KillAll => cli::handle_kill_all(&manager, palette, config)?,
        Action::Kill(id) => cli::handle_kill(&manager, palette, &id)?,
        Action::Start(command) => cli::handle_start(&mut manager, palette, &command)?,
        Action::Usage => {
            Cli::command().print_help()?;
            std::process::exit(1);
        }
    }

    Ok(())
}
