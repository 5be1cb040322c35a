//! A fixed-size worker pool with scoped jobs.
//!
//! The workers are a dedicated [`rayon`] pool, built once with the
//! configured thread count, names and affinity hints. [`ThreadPool::scope`]
//! is the only way to submit work: jobs spawned into a [`Scope`] may
//! borrow from the caller's stack, and the scope waits for all of them
//! before it returns.
//!
//! Every worker reports its exit on a crossbeam channel. Shutdown polls
//! that channel `spin_rounds` times before blocking on it, and counts
//! the notices it collects.

use std::cell::Cell;
use std::io;
use std::thread;

use crossbeam_channel::Receiver;

use crate::config::{ConfigError, PoolConfig};

/// Summary returned by [`ThreadPool::shutdown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Worker threads joined by this call.
    pub workers_joined: usize,
}

struct Worker {
    name: String,
    affinity: Option<usize>,
}

/// A fixed set of named worker threads.
///
/// Created once and reused for any number of [`scope`](Self::scope)
/// calls. Dropping the pool shuts it down.
pub struct ThreadPool {
    /// `None` once shut down.
    inner: Option<rayon::ThreadPool>,
    workers: Vec<Worker>,
    /// One notice per worker that has exited.
    exits: Receiver<usize>,
    spin_rounds: u32,
}

impl ThreadPool {
    /// Validate `config` and start its workers.
    pub fn new(config: PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let workers: Vec<Worker> = (0..config.n_threads)
            .map(|index| Worker {
                name: format!("{}-{index}", config.thread_name),
                affinity: config.affinity_for(index),
            })
            .collect();
        let hints: Vec<Option<usize>> = workers.iter().map(|w| w.affinity).collect();
        let prefix = config.thread_name.clone();
        let (exit_tx, exits) = crossbeam_channel::unbounded();

        let inner = rayon::ThreadPoolBuilder::new()
            .num_threads(config.n_threads)
            .thread_name(move |index| format!("{prefix}-{index}"))
            .exit_handler(move |index| {
                tracing::trace!(index, "worker exiting");
                // The pool may already be gone; nobody is counting then.
                let _ = exit_tx.send(index);
            })
            .spawn_handler(move |worker| spawn_worker(worker, &hints))
            .build()
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: e.to_string(),
            })?;

        tracing::debug!(
            n_threads = config.n_threads,
            spin_rounds = config.spin_rounds,
            affinity = ?config.affinity,
            "thread pool started"
        );
        Ok(Self {
            inner: Some(inner),
            workers,
            exits,
            spin_rounds: config.spin_rounds,
        })
    }

    /// Number of worker threads.
    pub fn n_threads(&self) -> usize {
        self.workers.len()
    }

    /// Spin polls before a shutdown blocks on worker exits.
    pub fn spin_rounds(&self) -> u32 {
        self.spin_rounds
    }

    /// The CPU hint recorded for worker `index`.
    ///
    /// Hints are advisory: the pool does not pin threads.
    pub fn affinity_hint(&self, index: usize) -> Option<usize> {
        self.workers.get(index).and_then(|w| w.affinity)
    }

    /// The thread name of worker `index`.
    pub fn thread_name(&self, index: usize) -> Option<&str> {
        self.workers.get(index).map(|w| w.name.as_str())
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.inner.is_none()
    }

    /// Run `f` with a [`Scope`] for spawning jobs, then wait for every
    /// job spawned into it.
    ///
    /// If a job panics, the panic is resumed on this thread after all
    /// jobs have finished. A pool that has been shut down runs the jobs
    /// on the calling thread as they are spawned.
    ///
    /// ```
    /// use tessera_engine::{PoolConfig, ThreadPool};
    ///
    /// let pool = ThreadPool::new(PoolConfig::new(2)).unwrap();
    /// let mut halves = [0u32; 8];
    /// let (left, right) = halves.split_at_mut(4);
    /// pool.scope(|s| {
    ///     s.spawn(move || left.fill(1));
    ///     s.spawn(move || right.fill(2));
    /// });
    /// assert_eq!(halves, [1, 1, 1, 1, 2, 2, 2, 2]);
    /// ```
    pub fn scope<'scope, F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Scope<'_, 'scope>) -> R + Send,
        R: Send,
    {
        match &self.inner {
            Some(pool) => pool.scope(|s| f(&Scope::new(Some(s)))),
            None => f(&Scope::new(None)),
        }
    }

    /// Stop the workers and wait until each one has exited.
    ///
    /// Jobs already running finish first. Calling this again joins
    /// nothing. A pool that has been shut down still accepts scopes but
    /// runs their jobs on the calling thread.
    pub fn shutdown(&mut self) -> ShutdownReport {
        let Some(pool) = self.inner.take() else {
            return ShutdownReport { workers_joined: 0 };
        };
        drop(pool);

        let mut workers_joined = 0;
        while workers_joined < self.workers.len() {
            match self.recv_exit() {
                Some(_) => workers_joined += 1,
                None => break,
            }
        }
        tracing::debug!(workers_joined, "thread pool shut down");
        ShutdownReport { workers_joined }
    }

    /// Next exit notice, or `None` once no worker can send one.
    fn recv_exit(&self) -> Option<usize> {
        for _ in 0..self.spin_rounds {
            if let Ok(index) = self.exits.try_recv() {
                return Some(index);
            }
            std::hint::spin_loop();
        }
        self.exits.recv().ok()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("n_threads", &self.workers.len())
            .field("spin_rounds", &self.spin_rounds)
            .field("shut_down", &self.inner.is_none())
            .finish()
    }
}

/// Start one rayon worker on a named OS thread, logging its CPU hint.
fn spawn_worker(worker: rayon::ThreadBuilder, hints: &[Option<usize>]) -> io::Result<()> {
    let index = worker.index();
    let mut builder = thread::Builder::new();
    if let Some(name) = worker.name() {
        builder = builder.name(name.to_owned());
    }
    if let Some(size) = worker.stack_size() {
        builder = builder.stack_size(size);
    }
    let cpu_hint = hints.get(index).copied().flatten();
    builder.spawn(move || {
        tracing::trace!(
            worker = thread::current().name().unwrap_or("unnamed"),
            cpu_hint = ?cpu_hint,
            "worker started"
        );
        worker.run();
    })?;
    Ok(())
}

// ── Scope ──────────────────────────────────────────────────────────

/// Handle for spawning jobs inside [`ThreadPool::scope`].
///
/// Jobs may borrow anything that outlives the `scope` call.
pub struct Scope<'a, 'scope> {
    /// `None` when the pool has been shut down.
    inner: Option<&'a rayon::Scope<'scope>>,
    spawned: Cell<usize>,
}

impl<'a, 'scope> Scope<'a, 'scope> {
    fn new(inner: Option<&'a rayon::Scope<'scope>>) -> Self {
        Self {
            inner,
            spawned: Cell::new(0),
        }
    }

    /// Queue `job` on the pool.
    pub fn spawn<J>(&self, job: J)
    where
        J: FnOnce() + Send + 'scope,
    {
        self.spawned.set(self.spawned.get() + 1);
        match self.inner {
            Some(scope) => scope.spawn(move |_| job()),
            None => job(),
        }
    }

    /// Jobs spawned so far.
    pub fn spawned(&self) -> usize {
        self.spawned.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn pool(n: usize) -> ThreadPool {
        ThreadPool::new(PoolConfig::new(n)).unwrap()
    }

    #[test]
    fn scope_waits_for_every_job() {
        let pool = pool(4);
        let counter = AtomicUsize::new(0);
        let counter = &counter;
        pool.scope(|s| {
            for _ in 0..100 {
                s.spawn(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                });
            }
            assert_eq!(s.spawned(), 100);
        });
        assert_eq!(counter.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn jobs_write_disjoint_borrowed_chunks() {
        let pool = pool(3);
        let mut data = vec![0usize; 1000];
        let chunks: Vec<&mut [usize]> = data.chunks_mut(128).collect();
        pool.scope(|s| {
            for (i, chunk) in chunks.into_iter().enumerate() {
                s.spawn(move || chunk.fill(i));
            }
        });
        for (idx, v) in data.iter().enumerate() {
            assert_eq!(*v, idx / 128);
        }
    }

    #[test]
    fn scope_returns_closure_value() {
        let pool = pool(1);
        let v = pool.scope(|_| 42);
        assert_eq!(v, 42);
    }

    #[test]
    fn jobs_run_on_named_workers() {
        let pool = ThreadPool::new(PoolConfig::new(2).with_thread_name("calc")).unwrap();
        let names = Mutex::new(Vec::new());
        let names_ref = &names;
        pool.scope(|s| {
            for _ in 0..8 {
                s.spawn(move || {
                    let name = thread::current().name().map(str::to_owned);
                    names_ref.lock().unwrap().push(name);
                });
            }
        });
        let names = names.into_inner().unwrap();
        assert_eq!(names.len(), 8);
        for name in names {
            assert!(name.unwrap().starts_with("calc-"));
        }
        assert_eq!(pool.thread_name(1), Some("calc-1"));
    }

    #[test]
    fn job_panic_is_resumed_after_drain() {
        let pool = pool(2);
        let finished = AtomicUsize::new(0);
        let finished_ref = &finished;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pool.scope(|s| {
                s.spawn(|| panic!("job failed"));
                for _ in 0..10 {
                    s.spawn(move || {
                        finished_ref.fetch_add(1, Ordering::Relaxed);
                    });
                }
            })
        }));
        assert!(result.is_err());
        assert_eq!(finished.load(Ordering::Relaxed), 10);

        // Workers survive a job panic.
        let v = AtomicUsize::new(0);
        let v_ref = &v;
        pool.scope(|s| {
            s.spawn(move || {
                v_ref.store(7, Ordering::Relaxed);
            })
        });
        assert_eq!(v.load(Ordering::Relaxed), 7);
    }

    #[test]
    fn zero_spin_rounds_blocks_on_shutdown() {
        let mut pool = ThreadPool::new(PoolConfig::new(2).with_spin_rounds(0)).unwrap();
        let counter = AtomicUsize::new(0);
        let counter_ref = &counter;
        pool.scope(|s| {
            for _ in 0..16 {
                s.spawn(move || {
                    counter_ref.fetch_add(1, Ordering::Relaxed);
                });
            }
        });
        assert_eq!(counter.load(Ordering::Relaxed), 16);
        assert_eq!(pool.shutdown(), ShutdownReport { workers_joined: 2 });
    }

    #[test]
    fn affinity_hints_are_recorded() {
        let pool = ThreadPool::new(PoolConfig::new(3).with_affinity(vec![0, 1])).unwrap();
        assert_eq!(pool.affinity_hint(0), Some(0));
        assert_eq!(pool.affinity_hint(1), Some(1));
        assert_eq!(pool.affinity_hint(2), Some(0));
        assert_eq!(pool.affinity_hint(3), None);
    }

    #[test]
    fn invalid_config_starts_nothing() {
        assert!(matches!(
            ThreadPool::new(PoolConfig::new(0)),
            Err(ConfigError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn shutdown_joins_all_workers_once() {
        let mut pool = pool(4);
        assert_eq!(pool.shutdown(), ShutdownReport { workers_joined: 4 });
        assert!(pool.is_shut_down());
        assert_eq!(pool.shutdown(), ShutdownReport { workers_joined: 0 });
    }

    #[test]
    fn scope_after_shutdown_runs_inline() {
        let mut pool = pool(2);
        pool.shutdown();
        let caller = thread::current().id();
        let ran_on = Mutex::new(None);
        let ran_on_ref = &ran_on;
        pool.scope(|s| {
            s.spawn(move || {
                *ran_on_ref.lock().unwrap() = Some(thread::current().id());
            })
        });
        assert_eq!(ran_on.into_inner().unwrap(), Some(caller));
    }
}
