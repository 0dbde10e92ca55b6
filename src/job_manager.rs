//! Job Manager for background unit lifecycle management.

use crate::batch::{BatchOperation, BatchOutcome, BatchRunner, Confirm, CLEAN, KILL_ALL};
use crate::error::{JobError, Result};
use crate::job_id::{Clock, IdAllocator, JobId, SystemClock, JOB_PREFIX};
use crate::registry::{group_by_state, units_in_state, StateGroup, UnitState, CLEANABLE_STATES};
use crate::supervisor::Supervisor;
use crate::unit_table::parse_units;
use std::io::Write;
use tracing::{debug, info, warn};

/// States in which a unit can be stopped with `kill`.
const STOPPABLE_STATES: [&str; 3] = ["active", "activating", "reloading"];

/// Starts, inspects and stops managed units through a `Supervisor`.
#[derive(Debug)]
pub struct JobManager<S: Supervisor, C: Clock = SystemClock> {
    supervisor: S,
    allocator: IdAllocator<C>,
    prefix: String,
}

impl<S: Supervisor> JobManager<S, SystemClock> {
    pub fn new(supervisor: S) -> Self {
        Self::with_allocator(supervisor, IdAllocator::new())
    }
}

impl<S: Supervisor, C: Clock> JobManager<S, C> {
    pub fn with_allocator(supervisor: S, allocator: IdAllocator<C>) -> Self {
        Self {
            supervisor,
            allocator,
            prefix: JOB_PREFIX.to_string(),
        }
    }

    pub fn supervisor(&self) -> &S {
        &self.supervisor
    }

    /// Start `command` as a new unit and return its identifier.
    ///
    /// `announce` sees the identifier before the supervisor is asked to launch.
    pub fn start_job<F>(&mut self, command: &[String], announce: F) -> Result<JobId>
    where
        F: FnOnce(&JobId),
    {
        if command.is_empty() {
            return Err(JobError::EmptyCommand);
        }

        let id = self.allocator.allocate();
        info!(unit = %id, command = %command.join(" "), "starting job");
        announce(&id);
        self.supervisor.launch(&id, command)?;
        Ok(id)
    }

    /// Current managed units grouped by state.
    pub fn list_jobs(&self) -> Result<Vec<StateGroup>> {
        let output = self.supervisor.query_all(None)?;
        let units = parse_units(&output, &self.prefix);
        debug!(count = units.len(), "parsed unit table");
        Ok(group_by_state(units))
    }

    /// Stop a single unit that is currently running.
    pub fn kill_job(&self, id: &JobId) -> Result<JobId> {
        if !id.is_managed() {
            warn!(unit = %id, "unit is not a managed cmd-* job");
        }
        let id = JobId::new(id.unit_name());
        let state = self.supervisor.query_state(&id)?;
        if !STOPPABLE_STATES.iter().any(|s| *s == state) {
            return Err(JobError::State {
                unit: id.to_string(),
                state,
            });
        }

        self.supervisor.stop(&id)?;
        info!(unit = %id, "stopped job");
        Ok(id)
    }

    /// Best-effort state lookup for previews.
    pub fn state_of(&self, id: &JobId) -> Option<String> {
        match self.supervisor.query_state(id) {
            Ok(state) => Some(state),
            Err(err) => {
                debug!(unit = %id, error = %err, "state lookup failed");
                None
            }
        }
    }

    /// Failed, inactive and dead units; a state that cannot be queried is skipped.
    pub fn clean_targets(&self) -> Vec<JobId> {
        let mut targets = Vec::new();
        for state in &CLEANABLE_STATES {
            match units_in_state(&self.supervisor, state, &self.prefix) {
                Ok(ids) => targets.extend(ids),
                Err(err) => warn!(state = %state, error = %err, "skipping state query"),
            }
        }
        targets
    }

    pub fn kill_all_targets(&self) -> Result<Vec<JobId>> {
        units_in_state(&self.supervisor, &UnitState::Running, &self.prefix)
    }

    /// Reset every failed, inactive or dead unit.
    pub fn clean_jobs<W: Write, E: Write>(
        &self,
        runner: &mut BatchRunner<'_, W, E>,
        confirm: &mut dyn Confirm,
    ) -> Result<BatchOutcome> {
        let targets = self.clean_targets();
        self.run_batch(runner, &CLEAN, targets, confirm, |id| {
            self.supervisor.reset_failed(id)
        })
    }

    /// Stop every running unit.
    pub fn kill_all_jobs<W: Write, E: Write>(
        &self,
        runner: &mut BatchRunner<'_, W, E>,
        confirm: &mut dyn Confirm,
    ) -> Result<BatchOutcome> {
        let targets = self.kill_all_targets()?;
        self.run_batch(runner, &KILL_ALL, targets, confirm, |id| {
            self.supervisor.stop(id)
        })
    }

    fn run_batch<W, E, A>(
        &self,
        runner: &mut BatchRunner<'_, W, E>,
        op: &BatchOperation,
        targets: Vec<JobId>,
        confirm: &mut dyn Confirm,
        action: A,
    ) -> Result<BatchOutcome>
    where
        W: Write,
        E: Write,
        A: FnMut(&JobId) -> Result<()>,
    {
        let outcome = runner.run(op, targets, |id| self.state_of(id), confirm, action)?;
        if let BatchOutcome::Completed(result) = outcome {
            info!(
                succeeded = result.succeeded,
                failed = result.failed,
                total = result.total,
                "batch finished"
            );
        }
        Ok(outcome)
    }
}
