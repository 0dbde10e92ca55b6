//! Typed client over the systemd user manager.
//!
//! Every operation shells out to `systemctl`, `systemd-run` or `journalctl`
//! and blocks until the tool exits.

use crate::config::Programs;
use crate::error::{JobError, Result};
use crate::job_id::JobId;
use crate::utils::{parse_show_output, run_command, run_passthrough, CommandResult};
use tracing::{debug, warn};

/// Launch, stop, query and log operations of the process supervisor.
pub trait Supervisor {
    /// Start `command` as a transient unit named `id` in the caller's directory.
    fn launch(&self, id: &JobId, command: &[String]) -> Result<()>;

    /// Raw unit table, optionally filtered to one state.
    fn query_all(&self, state: Option<&str>) -> Result<String>;

    /// Active-state token of a single unit.
    fn query_state(&self, id: &JobId) -> Result<String>;

    fn stop(&self, id: &JobId) -> Result<()>;

    /// Drop the failed/inactive bookkeeping the supervisor keeps for a unit.
    fn reset_failed(&self, id: &JobId) -> Result<()>;

    /// Print the supervisor's status text for a unit to the terminal.
    fn show_status(&self, id: &JobId) -> Result<()>;

    /// Print the last `tail_lines` log lines; with `follow`, block and keep streaming.
    fn stream_logs(&self, id: &JobId, tail_lines: usize, follow: bool) -> Result<()>;
}

/// `Supervisor` backed by the systemd user instance.
#[derive(Debug, Clone)]
pub struct Systemd {
    programs: Programs,
}

impl Systemd {
    pub fn new(programs: Programs) -> Self {
        Self { programs }
    }

    fn systemctl(&self, args: &[&str]) -> Result<CommandResult> {
        let mut full = vec!["--user"];
        full.extend_from_slice(args);
        run_command(&self.programs.systemctl, &full)
    }
}

impl Supervisor for Systemd {
    fn launch(&self, id: &JobId, command: &[String]) -> Result<()> {
        let unit_arg = format!("--unit={}", id.as_str());
        let mut args = vec!["--user", "--same-dir", unit_arg.as_str()];
        args.extend(command.iter().map(String::as_str));

        let code = run_passthrough(&self.programs.systemd_run, &args)?;
        if code != 0 {
            return Err(JobError::Launch {
                unit: id.to_string(),
                diagnostic: format!("exit status {}", code),
            });
        }
        Ok(())
    }

    fn query_all(&self, state: Option<&str>) -> Result<String> {
        let state_arg = match state {
            Some(state) => format!("--state={}", state),
            None => "--all".to_string(),
        };
        let result = self.systemctl(&[
            "--type=service",
            &state_arg,
            "--plain",
            "--no-pager",
            "--no-legend",
        ])?;

        // stderr counts as output; only total silence on failure is fatal
        if result.combined_output().is_empty() && !result.success() {
            return Err(JobError::SupervisorUnavailable(result.diagnostic()));
        }
        if !result.success() {
            debug!(
                return_code = result.return_code,
                "systemctl list returned non-zero with output, continuing"
            );
        }
        Ok(result.stdout)
    }

    fn query_state(&self, id: &JobId) -> Result<String> {
        let unit = id.unit_name();
        let result = self.systemctl(&["show", &unit, "-p", "LoadState", "-p", "ActiveState"])?;

        if parse_show_output(&result.stdout, "LoadState").as_deref() == Some("not-found") {
            return Err(JobError::NotFound(unit));
        }
        parse_show_output(&result.stdout, "ActiveState").ok_or_else(|| JobError::Supervisor {
            context: format!("failed to read state of {}", unit),
            diagnostic: result.diagnostic(),
        })
    }

    fn stop(&self, id: &JobId) -> Result<()> {
        let unit = id.unit_name();
        let result = self.systemctl(&["stop", &unit])?;
        if !result.success() {
            return Err(JobError::Stop {
                unit,
                diagnostic: result.diagnostic(),
            });
        }
        Ok(())
    }

    fn reset_failed(&self, id: &JobId) -> Result<()> {
        let unit = id.unit_name();
        let result = self.systemctl(&["reset-failed", &unit])?;
        if !result.success() {
            return Err(JobError::Clean {
                unit,
                diagnostic: result.diagnostic(),
            });
        }
        Ok(())
    }

    fn show_status(&self, id: &JobId) -> Result<()> {
        let unit = id.unit_name();
        let code = run_passthrough(
            &self.programs.systemctl,
            &["--user", "status", &unit, "--no-pager"],
        )?;
        // systemctl status exits non-zero for inactive and failed units
        if code != 0 {
            debug!(unit = %unit, code, "systemctl status returned non-zero");
        }
        Ok(())
    }

    fn stream_logs(&self, id: &JobId, tail_lines: usize, follow: bool) -> Result<()> {
        let unit = id.unit_name();
        let lines = tail_lines.to_string();
        let mut args = vec!["--user", "-u", unit.as_str(), "-n", lines.as_str(), "--no-pager"];
        if follow {
            args.push("-f");
        }

        let code = run_passthrough(&self.programs.journalctl, &args)?;
        if code != 0 {
            return Err(JobError::Supervisor {
                context: "failed to get logs".to_string(),
                diagnostic: format!("exit status {}", code),
            });
        }
        Ok(())
    }
}

/// Verify that systemd is the init system and its tools are on PATH.
pub fn check_environment(programs: &Programs) -> Result<()> {
    check_systemd_available()?;
    must_have_command(&programs.systemctl)?;
    must_have_command(&programs.systemd_run)?;
    Ok(())
}

fn check_systemd_available() -> Result<()> {
    if which::which("pidof").is_ok() {
        match run_command("pidof", &["systemd"]) {
            Ok(result) if result.success() && !result.stdout.trim().is_empty() => return Ok(()),
            Ok(_) => debug!("pidof found no systemd process"),
            Err(err) => warn!(error = %err, "pidof failed"),
        }
    }

    if let Ok(comm) = std::fs::read_to_string("/proc/1/comm") {
        if comm.trim() == "systemd" {
            return Ok(());
        }
    }

    Err(JobError::Environment(
        "systemd is not available on this system (init process is not systemd)".to_string(),
    ))
}

fn must_have_command(name: &str) -> Result<()> {
    which::which(name).map(|_| ()).map_err(|_| {
        JobError::Environment(format!(
            "required command '{}' is not available in PATH",
            name
        ))
    })
}

#[cfg(test)]
pub mod testing {
    //! In-memory supervisor that records every call.

    use super::Supervisor;
    use crate::error::{JobError, Result};
    use crate::job_id::JobId;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    #[derive(Debug, Default)]
    pub struct FakeSupervisor {
        tables: HashMap<String, String>,
        states: HashMap<String, String>,
        failing: HashSet<String>,
        reject_launch: bool,
        calls: RefCell<Vec<String>>,
    }

    impl FakeSupervisor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Table returned for `query_all(Some(filter))`, or `"all"` for no filter.
        pub fn with_table(mut self, filter: &str, table: &str) -> Self {
            self.tables.insert(filter.to_string(), table.to_string());
            self
        }

        pub fn with_state(mut self, unit: &str, state: &str) -> Self {
            self.states.insert(unit.to_string(), state.to_string());
            self
        }

        /// Make stop and reset-failed fail for `unit`.
        pub fn failing_on(mut self, unit: &str) -> Self {
            self.failing.insert(unit.to_string());
            self
        }

        pub fn rejecting_launch(mut self) -> Self {
            self.reject_launch = true;
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        /// Calls that change supervisor state.
        pub fn control_calls(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter(|c| c.starts_with("stop ") || c.starts_with("reset ") || c.starts_with("launch "))
                .collect()
        }

        fn record(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl Supervisor for FakeSupervisor {
        fn launch(&self, id: &JobId, command: &[String]) -> Result<()> {
            self.record(format!("launch {} {}", id, command.join(" ")));
            if self.reject_launch {
                return Err(JobError::Launch {
                    unit: id.to_string(),
                    diagnostic: "exit status 1".to_string(),
                });
            }
            Ok(())
        }

        fn query_all(&self, state: Option<&str>) -> Result<String> {
            let key = state.unwrap_or("all");
            self.record(format!("query {}", key));
            self.tables
                .get(key)
                .cloned()
                .ok_or_else(|| JobError::SupervisorUnavailable("no output".to_string()))
        }

        fn query_state(&self, id: &JobId) -> Result<String> {
            let unit = id.unit_name();
            self.record(format!("state {}", unit));
            self.states
                .get(&unit)
                .cloned()
                .ok_or(JobError::NotFound(unit))
        }

        fn stop(&self, id: &JobId) -> Result<()> {
            let unit = id.unit_name();
            self.record(format!("stop {}", unit));
            if self.failing.contains(&unit) {
                return Err(JobError::Stop {
                    unit,
                    diagnostic: "exit status 1: Access denied".to_string(),
                });
            }
            Ok(())
        }

        fn reset_failed(&self, id: &JobId) -> Result<()> {
            let unit = id.unit_name();
            self.record(format!("reset {}", unit));
            if self.failing.contains(&unit) {
                return Err(JobError::Clean {
                    unit,
                    diagnostic: "exit status 1".to_string(),
                });
            }
            Ok(())
        }

        fn show_status(&self, id: &JobId) -> Result<()> {
            self.record(format!("status {}", id.unit_name()));
            Ok(())
        }

        fn stream_logs(&self, id: &JobId, tail_lines: usize, follow: bool) -> Result<()> {
            self.record(format!("logs {} {} follow={}", id.unit_name(), tail_lines, follow));
            Ok(())
        }
    }
}
