//! One-shot poll timer on a private work loop.
//!
//! A [`PollTimer`] fires its action once per arm. The action runs on the
//! timer's own thread and may re-arm the timer; that is how periodic polling
//! is built. Cancelling only prevents future firings, it never interrupts an
//! action already running.
//!
//! ```text
//!   set_timeout(d) ──► [Armed(deadline)] ──deadline──► action() ──► [Idle]
//!        ▲                   │                              │
//!        └───── cancel() ◄───┘                set_timeout() ┘ (re-arm)
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use thiserror_no_std::Error;

/// Work run each time a timer fires.
pub type TimerAction = Box<dyn Fn() + Send + Sync + 'static>;

/// Failure to set up a timer.
#[derive(Debug, Error)]
pub enum TimerError {
    /// The work-loop thread could not be started.
    #[error("failed to start work loop thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A re-armable one-shot timer.
pub trait PollTimer: Send + Sync {
    /// Fire once, `after` from now. Replaces any pending deadline.
    fn set_timeout(&self, after: Duration);

    /// Drop any pending deadline.
    fn cancel(&self);
}

/// Creates timers bound to an action.
pub trait TimerFactory {
    /// Create an idle timer that runs `action` whenever it fires.
    fn create(&self, action: TimerAction) -> Result<Arc<dyn PollTimer>, TimerError>;
}

/// Timer factory backed by a dedicated thread per timer.
#[derive(Debug, Clone)]
pub struct WorkLoop {
    name: String,
}

impl WorkLoop {
    /// Factory whose threads carry `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }
}

impl Default for WorkLoop {
    fn default() -> Self {
        Self::new("codec-poll")
    }
}

impl TimerFactory for WorkLoop {
    fn create(&self, action: TimerAction) -> Result<Arc<dyn PollTimer>, TimerError> {
        Ok(Arc::new(WorkLoopTimer::spawn(&self.name, action)?))
    }
}

#[derive(Debug, Default)]
struct Slot {
    deadline: Option<Instant>,
    shutdown: bool,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<Slot>,
    wake: Condvar,
}

/// [`PollTimer`] running on its own thread.
///
/// Dropping the timer stops the thread and joins it, unless the drop happens
/// on that thread (an action released the last handle), in which case the
/// thread exits on its own after the action returns.
pub struct WorkLoopTimer {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
}

impl WorkLoopTimer {
    /// Start the work-loop thread. The timer begins idle.
    pub fn spawn(name: &str, action: TimerAction) -> Result<Self, TimerError> {
        let shared = Arc::new(Shared::default());
        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || run(&worker_shared, &action))?;
        let worker_id = handle.thread().id();
        Ok(Self {
            shared,
            worker: Mutex::new(Some(handle)),
            worker_id,
        })
    }

    /// Stop the thread. Pending deadlines are discarded.
    pub fn shutdown(&self) {
        {
            let mut slot = self.shared.slot.lock();
            slot.shutdown = true;
            slot.deadline = None;
        }
        self.shared.wake.notify_all();

        if thread::current().id() == self.worker_id {
            return;
        }
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                tracing::warn!("poll timer thread panicked");
            }
        }
    }

    /// Returns `true` while a deadline is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.shared.slot.lock().deadline.is_some()
    }
}

impl PollTimer for WorkLoopTimer {
    fn set_timeout(&self, after: Duration) {
        {
            let mut slot = self.shared.slot.lock();
            if slot.shutdown {
                return;
            }
            slot.deadline = Some(Instant::now() + after);
        }
        self.shared.wake.notify_all();
    }

    fn cancel(&self) {
        self.shared.slot.lock().deadline = None;
        self.shared.wake.notify_all();
    }
}

impl Drop for WorkLoopTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(shared: &Shared, action: &TimerAction) {
    let mut slot = shared.slot.lock();
    loop {
        if slot.shutdown {
            return;
        }
        match slot.deadline {
            None => shared.wake.wait(&mut slot),
            Some(deadline) if Instant::now() >= deadline => {
                slot.deadline = None;
                MutexGuard::unlocked(&mut slot, || action());
            }
            Some(deadline) => {
                let _ = shared.wake.wait_until(&mut slot, deadline);
            }
        }
    }
}
