//! Job identifiers and their allocation.

use chrono::Utc;
use std::fmt;

/// Namespace prefix that marks a unit as managed by this tool.
pub const JOB_PREFIX: &str = "cmd";

/// Unit-type suffix systemd expects on service names.
pub const UNIT_SUFFIX: &str = ".service";

/// A namespaced job name such as `cmd-1732459032`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name carries the managed-job prefix.
    pub fn is_managed(&self) -> bool {
        has_prefix(&self.0, JOB_PREFIX)
    }

    /// Name in the form systemd expects, with the `.service` suffix.
    pub fn unit_name(&self) -> String {
        if self.0.ends_with(UNIT_SUFFIX) {
            self.0.clone()
        } else {
            format!("{}{}", self.0, UNIT_SUFFIX)
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Whether `name` starts with `<prefix>-`.
pub fn has_prefix(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('-'))
}

/// Source of epoch seconds for identifier allocation.
pub trait Clock {
    fn epoch_seconds(&self) -> i64;
}

/// Wall clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_seconds(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Allocates `cmd-<epochSeconds>` identifiers.
///
/// Within one allocator the issued values are strictly increasing: if the
/// clock has not moved past the last value, the next second is used instead.
#[derive(Debug)]
pub struct IdAllocator<C: Clock = SystemClock> {
    clock: C,
    prefix: String,
    last: Option<i64>,
}

impl IdAllocator<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for IdAllocator<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> IdAllocator<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            prefix: JOB_PREFIX.to_string(),
            last: None,
        }
    }

    pub fn allocate(&mut self) -> JobId {
        let now = self.clock.epoch_seconds();
        let value = match self.last {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last = Some(value);
        JobId(format!("{}-{}", self.prefix, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::cell::Cell;

    struct FixedClock(Cell<i64>);

    impl Clock for FixedClock {
        fn epoch_seconds(&self) -> i64 {
            self.0.get()
        }
    }

    #[test]
    fn test_allocate_format() {
        let mut allocator = IdAllocator::new();
        let id = allocator.allocate();
        let re = Regex::new(r"^cmd-\d+$").unwrap();
        assert!(re.is_match(id.as_str()), "unexpected id {}", id);
        assert!(id.is_managed());
    }

    #[test]
    fn test_allocate_uses_clock() {
        let mut allocator = IdAllocator::with_clock(FixedClock(Cell::new(1732459032)));
        assert_eq!(allocator.allocate().as_str(), "cmd-1732459032");
    }

    #[test]
    fn test_allocate_same_second_is_unique() {
        let mut allocator = IdAllocator::with_clock(FixedClock(Cell::new(100)));
        let first = allocator.allocate();
        let second = allocator.allocate();
        let third = allocator.allocate();
        assert_eq!(first.as_str(), "cmd-100");
        assert_eq!(second.as_str(), "cmd-101");
        assert_eq!(third.as_str(), "cmd-102");
    }

    #[test]
    fn test_allocate_follows_clock_forward() {
        let clock = FixedClock(Cell::new(100));
        let mut allocator = IdAllocator::with_clock(clock);
        allocator.allocate();
        allocator.clock.0.set(500);
        assert_eq!(allocator.allocate().as_str(), "cmd-500");
    }

    #[test]
    fn test_unit_name_normalization() {
        assert_eq!(JobId::from("cmd-1").unit_name(), "cmd-1.service");
        assert_eq!(JobId::from("cmd-1.service").unit_name(), "cmd-1.service");
    }

    #[test]
    fn test_is_managed() {
        assert!(JobId::from("cmd-1").is_managed());
        assert!(JobId::from("cmd-1.service").is_managed());
        assert!(!JobId::from("cmdline.service").is_managed());
        assert!(!JobId::from("dbus.service").is_managed());
    }
}
