//! Cooperative scheduling: batch timing and pause/resume/stop control.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{EvalError, EvalResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
    Stopped,
}

/// Handle for pausing, resuming and stopping runs from anywhere, including
/// other threads. Cheap to clone; all clones drive the same state.
///
/// Requests are observed at the next suspension point of a run.
#[derive(Debug, Clone)]
pub struct RunControl {
    state: Arc<watch::Sender<RunState>>,
}

impl RunControl {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RunState::Running);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Cancel the current run at its next suspension point.
    pub fn stop(&self) {
        self.state.send_replace(RunState::Stopped);
    }

    /// Hold the run at its next suspension point until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.state.send_modify(|state| {
            if *state == RunState::Running {
                *state = RunState::Paused;
            }
        });
    }

    pub fn resume(&self) {
        self.state.send_modify(|state| {
            if *state == RunState::Paused {
                *state = RunState::Running;
            }
        });
    }

    /// A new run clears a previous stop; a standing pause stays.
    pub(crate) fn begin_run(&self) {
        self.state.send_modify(|state| {
            if *state == RunState::Stopped {
                *state = RunState::Running;
            }
        });
    }

    /// Wait out a pause. Fails with `Cancelled` once stopped.
    pub(crate) async fn admit(&self) -> EvalResult<()> {
        let mut receiver = self.state.subscribe();
        loop {
            let state = *receiver.borrow_and_update();
            match state {
                RunState::Running => return Ok(()),
                RunState::Stopped => return Err(EvalError::Cancelled),
                RunState::Paused => {}
            }
            if receiver.changed().await.is_err() {
                return Err(EvalError::Cancelled);
            }
        }
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Decides when a run suspends and what happens while it is suspended.
pub(crate) struct Scheduler {
    batch: Duration,
    wait: Duration,
    control: RunControl,
    batch_start: Instant,
}

impl Scheduler {
    pub(crate) fn new(batch: Duration, wait: Duration, control: RunControl) -> Self {
        Self {
            batch,
            wait,
            control,
            batch_start: Instant::now(),
        }
    }

    /// Suspend if the current batch has used up its time.
    pub(crate) async fn checkpoint(&mut self) -> EvalResult<()> {
        if self.batch_start.elapsed() < self.batch {
            return Ok(());
        }
        self.suspend().await?;
        self.batch_start = Instant::now();
        Ok(())
    }

    async fn suspend(&self) -> EvalResult<()> {
        if self.wait.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.wait).await;
        }
        self.control.admit().await
    }
}
