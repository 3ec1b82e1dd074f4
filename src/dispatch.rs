//! Execution contexts for background work and completion callbacks.
//!
//! # Overview
//!
//! Long-latency work (network fetches, image decoding, file writes, directory
//! scans) runs on rayon thread pools. Results are never applied on the worker
//! thread: they are posted back to a [`MainLoop`] owned by the caller, and run
//! when that thread pumps the loop. This mirrors a UI thread with a message
//! queue.
//!
//! * [`worker_pool`]: fixed-size pool for independent jobs.
//! * [`SerialQueue`]: single-thread pool fed in FIFO order, so jobs run one at
//!   a time in submission order.
//! * [`MainLoop`] / [`MainHandle`]: the caller's continuation queue.
//!
//! # Example
//!
//! ```
//! use wallstash::dispatch::{MainLoop, SerialQueue};
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let main_loop = MainLoop::new();
//! let queue = SerialQueue::new("example").unwrap();
//! let done = Arc::new(AtomicBool::new(false));
//!
//! let handle = main_loop.handle();
//! let flag = done.clone();
//! queue.submit(move || {
//!     // background work here
//!     handle.post(move || flag.store(true, Ordering::SeqCst));
//! });
//!
//! assert!(main_loop.run_until(Duration::from_secs(5), || done.load(Ordering::SeqCst)));
//! ```

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use rayon::{ThreadPool, ThreadPoolBuilder};

/// A unit of work posted to a [`MainLoop`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Errors that can occur while setting up execution contexts.
#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    /// The thread pool could not be created.
    #[error("Failed to build thread pool '{name}': {source}")]
    PoolBuild {
        /// Pool name
        name: String,
        /// The underlying rayon error
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

/// Build a named, fixed-size worker pool.
///
/// Panics inside jobs are logged instead of aborting the process.
///
/// # Errors
///
/// Returns [`DispatchError::PoolBuild`] if the OS refuses to spawn threads.
pub fn worker_pool(name: &str, threads: usize) -> Result<ThreadPool, DispatchError> {
    let thread_prefix = name.to_string();
    let panic_name = name.to_string();
    ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(move |i| format!("{thread_prefix}-{i}"))
        .panic_handler(move |_| log::error!("A job on pool '{}' panicked", panic_name))
        .build()
        .map_err(|source| DispatchError::PoolBuild {
            name: name.to_string(),
            source,
        })
}

/// A queue that runs jobs one at a time, in submission order.
pub struct SerialQueue {
    name: String,
    pool: ThreadPool,
}

impl SerialQueue {
    /// Create a queue backed by its own worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PoolBuild`] if the worker thread cannot be spawned.
    pub fn new(name: &str) -> Result<Self, DispatchError> {
        Ok(Self {
            name: name.to_string(),
            pool: worker_pool(name, 1)?,
        })
    }

    /// Queue a job behind every previously submitted job.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        log::trace!("Queueing job on '{}'", self.name);
        self.pool.spawn_fifo(job);
    }

    /// Queue name, used for thread names and logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialQueue")
            .field("name", &self.name)
            .finish()
    }
}

/// The caller-owned queue where completion callbacks run.
///
/// Continuations posted through a [`MainHandle`] run only when the owning
/// thread calls [`run_pending`](Self::run_pending) or
/// [`run_until`](Self::run_until), and always on that thread.
pub struct MainLoop {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

impl MainLoop {
    /// Create an empty main loop.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self { sender, receiver }
    }

    /// A cloneable handle that worker threads use to post continuations.
    #[must_use]
    pub fn handle(&self) -> MainHandle {
        MainHandle {
            sender: self.sender.clone(),
        }
    }

    /// Run every continuation that is already queued, without blocking.
    ///
    /// # Returns
    ///
    /// The number of continuations executed.
    pub fn run_pending(&self) -> usize {
        let mut executed = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            executed += 1;
        }
        executed
    }

    /// Run continuations as they arrive until `done` returns `true` or the
    /// timeout elapses.
    ///
    /// `done` is checked before waiting and after each continuation.
    ///
    /// # Returns
    ///
    /// `true` if `done` was satisfied, `false` on timeout.
    pub fn run_until<F>(&self, timeout: Duration, mut done: F) -> bool
    where
        F: FnMut() -> bool,
    {
        // `None` means the deadline is too far away to represent: wait forever.
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if done() {
                return true;
            }
            let remaining =
                deadline.map_or(Duration::MAX, |d| d.saturating_duration_since(Instant::now()));
            if remaining.is_zero() {
                return false;
            }
            match self.receiver.recv_timeout(remaining) {
                Ok(task) => task(),
                Err(RecvTimeoutError::Timeout) => return done(),
                // The loop holds its own sender, so this never happens.
                Err(RecvTimeoutError::Disconnected) => return done(),
            }
        }
    }
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MainLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainLoop").finish_non_exhaustive()
    }
}

/// Posts continuations onto a [`MainLoop`]. Cheap to clone, `Send`.
#[derive(Clone)]
pub struct MainHandle {
    sender: Sender<Task>,
}

impl MainHandle {
    /// Queue `task` to run on the main loop's thread.
    ///
    /// If the main loop has been dropped the task is discarded.
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.sender.send(Box::new(task)).is_err() {
            log::debug!("Main loop is gone, dropping continuation");
        }
    }
}

impl std::fmt::Debug for MainHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainHandle").finish_non_exhaustive()
    }
}
