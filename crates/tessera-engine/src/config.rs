//! Thread pool configuration, validation, and error types.

use std::error::Error;
use std::fmt;

// ── PoolConfig ────────────────────────────────────────────────────

/// Configuration for a [`ThreadPool`](crate::ThreadPool).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads. Must be in `1..=MAX_THREADS`.
    pub n_threads: usize,
    /// CPU ids assigned round-robin to workers as affinity hints.
    ///
    /// Hints are recorded and logged; threads are not pinned. `None`
    /// means no preference. An empty list is rejected.
    pub affinity: Option<Vec<usize>>,
    /// `try_recv` polls on worker exit notices before shutdown blocks.
    /// Default: 64.
    pub spin_rounds: u32,
    /// Prefix for worker thread names; worker `i` is `"{name}-{i}"`.
    pub thread_name: String,
}

impl PoolConfig {
    /// Upper bound on [`n_threads`](Self::n_threads).
    pub const MAX_THREADS: usize = 512;

    /// Default for [`spin_rounds`](Self::spin_rounds).
    pub const DEFAULT_SPIN_ROUNDS: u32 = 64;

    /// Default for [`thread_name`](Self::thread_name).
    pub const DEFAULT_THREAD_NAME: &'static str = "tessera-worker";

    /// A config with `n_threads` workers and defaults elsewhere.
    pub fn new(n_threads: usize) -> Self {
        Self {
            n_threads,
            affinity: None,
            spin_rounds: Self::DEFAULT_SPIN_ROUNDS,
            thread_name: Self::DEFAULT_THREAD_NAME.to_owned(),
        }
    }

    /// Set CPU affinity hints.
    pub fn with_affinity(mut self, cpus: Vec<usize>) -> Self {
        self.affinity = Some(cpus);
        self
    }

    /// Set the number of spin polls before shutdown blocks.
    pub fn with_spin_rounds(mut self, spin_rounds: u32) -> Self {
        self.spin_rounds = spin_rounds;
        self
    }

    /// Set the worker thread name prefix.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Worker count matching the machine: `available_parallelism`,
    /// clamped to `[1, MAX_THREADS]`, or 4 if it cannot be queried.
    pub fn available_threads() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .clamp(1, Self::MAX_THREADS)
    }

    /// The CPU hint for worker `index`, if any.
    pub fn affinity_for(&self, index: usize) -> Option<usize> {
        self.affinity
            .as_ref()
            .filter(|cpus| !cpus.is_empty())
            .map(|cpus| cpus[index % cpus.len()])
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_threads == 0 || self.n_threads > Self::MAX_THREADS {
            return Err(ConfigError::InvalidConfig {
                reason: format!(
                    "n_threads must be in 1..={}, got {}",
                    Self::MAX_THREADS,
                    self.n_threads
                ),
            });
        }
        if self.affinity.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::InvalidConfig {
                reason: "affinity list is empty".into(),
            });
        }
        if self.thread_name.is_empty() {
            return Err(ConfigError::InvalidConfig {
                reason: "thread_name is empty".into(),
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(Self::available_threads())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors from [`PoolConfig::validate`] and pool construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration value is out of range.
    InvalidConfig {
        /// Which invariant was violated.
        reason: String,
    },
    /// The OS refused to start a worker thread.
    ThreadSpawnFailed {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid pool config: {reason}"),
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {}
