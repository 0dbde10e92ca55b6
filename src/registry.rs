//! Grouping of parsed units by state.

use crate::error::Result;
use crate::job_id::JobId;
use crate::supervisor::Supervisor;
use crate::unit_table::{parse_units, UnitRecord};
use std::fmt;

/// Lifecycle state reported by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnitState {
    Running,
    Failed,
    Inactive,
    Dead,
    /// Any state outside the canonical list, such as `activating`.
    Other(String),
}

/// Display and selection order for the known states.
pub const CANONICAL_STATES: [UnitState; 4] = [
    UnitState::Running,
    UnitState::Failed,
    UnitState::Inactive,
    UnitState::Dead,
];

/// States whose units are removed by `clean`.
pub const CLEANABLE_STATES: [UnitState; 3] =
    [UnitState::Failed, UnitState::Inactive, UnitState::Dead];

impl UnitState {
    pub fn from_token(token: &str) -> Self {
        match token {
            "running" => UnitState::Running,
            "failed" => UnitState::Failed,
            "inactive" => UnitState::Inactive,
            "dead" => UnitState::Dead,
            other => UnitState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            UnitState::Running => "running",
            UnitState::Failed => "failed",
            UnitState::Inactive => "inactive",
            UnitState::Dead => "dead",
            UnitState::Other(state) => state,
        }
    }

    pub fn is_canonical(&self) -> bool {
        CANONICAL_STATES.contains(self)
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Records of one state, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateGroup {
    pub state: UnitState,
    pub units: Vec<UnitRecord>,
}

/// Groups records by state.
///
/// Canonical states come first in `CANONICAL_STATES` order, then other
/// states in the order they were first seen. Empty groups are never emitted.
pub fn group_by_state(records: Vec<UnitRecord>) -> Vec<StateGroup> {
    let mut canonical: Vec<StateGroup> = CANONICAL_STATES
        .iter()
        .map(|state| StateGroup {
            state: state.clone(),
            units: Vec::new(),
        })
        .collect();
    let mut others: Vec<StateGroup> = Vec::new();

    for record in records {
        let bucket = if record.state.is_canonical() {
            &mut canonical
        } else {
            &mut others
        };
        match bucket.iter_mut().find(|group| group.state == record.state) {
            Some(group) => group.units.push(record),
            None => bucket.push(StateGroup {
                state: record.state.clone(),
                units: vec![record],
            }),
        }
    }

    canonical
        .into_iter()
        .filter(|group| !group.units.is_empty())
        .chain(others)
        .collect()
}

/// Names of managed units the supervisor lists under `state`.
pub fn units_in_state<S: Supervisor + ?Sized>(
    supervisor: &S,
    state: &UnitState,
    prefix: &str,
) -> Result<Vec<JobId>> {
    let output = supervisor.query_all(Some(state.as_str()))?;
    Ok(parse_units(&output, prefix)
        .iter()
        .map(UnitRecord::job_id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job_id::JOB_PREFIX;
    use crate::supervisor::testing::FakeSupervisor;

    fn record(name: &str, state: &str) -> UnitRecord {
        UnitRecord {
            name: name.to_string(),
            state: UnitState::from_token(state),
            description: String::new(),
        }
    }

    fn names(group: &StateGroup) -> Vec<&str> {
        group.units.iter().map(|u| u.name.as_str()).collect()
    }

    #[test]
    fn test_canonical_groups_first() {
        let groups = group_by_state(vec![
            record("cmd-1", "activating"),
            record("cmd-2", "dead"),
            record("cmd-3", "running"),
            record("cmd-4", "failed"),
            record("cmd-5", "running"),
        ]);
        let states: Vec<&str> = groups.iter().map(|g| g.state.as_str()).collect();
        assert_eq!(states, vec!["running", "failed", "dead", "activating"]);
        assert_eq!(names(&groups[0]), vec!["cmd-3", "cmd-5"]);
    }

    #[test]
    fn test_other_states_in_first_seen_order() {
        let groups = group_by_state(vec![
            record("cmd-1", "reloading"),
            record("cmd-2", "active"),
            record("cmd-3", "reloading"),
            record("cmd-4", "activating"),
        ]);
        let states: Vec<&str> = groups.iter().map(|g| g.state.as_str()).collect();
        assert_eq!(states, vec!["reloading", "active", "activating"]);
        assert_eq!(names(&groups[0]), vec!["cmd-1", "cmd-3"]);
    }

    #[test]
    fn test_group_sizes_sum_to_input() {
        let records = vec![
            record("cmd-1", "running"),
            record("cmd-2", "inactive"),
            record("cmd-3", "active"),
            record("cmd-4", "inactive"),
            record("cmd-5", "failed"),
        ];
        let total = records.len();
        let groups = group_by_state(records);
        assert_eq!(groups.iter().map(|g| g.units.len()).sum::<usize>(), total);
        assert!(groups.iter().all(|g| !g.units.is_empty()));
    }

    #[test]
    fn test_group_empty_input() {
        assert!(group_by_state(Vec::new()).is_empty());
    }

    #[test]
    fn test_unit_state_round_trip_names() {
        assert_eq!(UnitState::from_token("failed"), UnitState::Failed);
        assert!(!UnitState::from_token("activating").is_canonical());
        assert_eq!(UnitState::Other("reloading".into()).to_string(), "reloading");
    }

    #[test]
    fn test_units_in_state_queries_with_filter() {
        let supervisor = FakeSupervisor::new().with_table(
            "failed",
            "cmd-1.service loaded failed failed a\nfoo.service loaded failed failed b\n",
        );
        let ids = units_in_state(&supervisor, &UnitState::Failed, JOB_PREFIX).unwrap();
        assert_eq!(ids, vec![JobId::from("cmd-1.service")]);
        assert_eq!(supervisor.calls(), vec!["query failed".to_string()]);
    }
}
