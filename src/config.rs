//! Runtime configuration assembled from CLI flags and the environment.

use std::path::PathBuf;

/// Number of log lines shown by `--status`.
pub const DEFAULT_LOG_TAIL_LINES: usize = 50;

/// Paths of the supervisor tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Programs {
    pub systemctl: String,
    pub systemd_run: String,
    pub journalctl: String,
}

impl Default for Programs {
    fn default() -> Self {
        Self {
            systemctl: "systemctl".to_string(),
            systemd_run: "systemd-run".to_string(),
            journalctl: "journalctl".to_string(),
        }
    }
}

impl Programs {
    /// Defaults, overridden by `BGJOB_SYSTEMCTL`, `BGJOB_SYSTEMD_RUN` and `BGJOB_JOURNALCTL`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let pick = |key: &str, default: String| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(default)
        };
        Self {
            systemctl: pick("BGJOB_SYSTEMCTL", defaults.systemctl),
            systemd_run: pick("BGJOB_SYSTEMD_RUN", defaults.systemd_run),
            journalctl: pick("BGJOB_JOURNALCTL", defaults.journalctl),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Colorized output; the core never reads this, only `ui::Palette` does.
    pub color: bool,
    pub verbose: bool,
    pub auto_yes: bool,
    pub follow: bool,
    pub log_tail_lines: usize,
    /// Debug log destination; stderr when unset.
    pub log_file: Option<PathBuf>,
    pub programs: Programs,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color: true,
            verbose: false,
            auto_yes: false,
            follow: false,
            log_tail_lines: DEFAULT_LOG_TAIL_LINES,
            log_file: None,
            programs: Programs::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let no_color = lookup("NO_COLOR").is_some_and(|v| !v.is_empty());
        let log_file = lookup("BGJOB_LOG_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            color: !no_color,
            log_file,
            programs: Programs::from_lookup(&lookup),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color = self.color && enabled;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_auto_yes(mut self, auto_yes: bool) -> Self {
        self.auto_yes = auto_yes;
        self
    }

    pub fn with_follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }
}
