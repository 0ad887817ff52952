//! Cancellable timers for the generators.
//!
//! Two schedules are supported:
//!
//! - [`Schedule::Delay`]: self-rescheduling. The next run is scheduled only
//!   after the current one completes, so runs never overlap and drift
//!   accumulates with execution time.
//! - [`Schedule::Period`]: fixed period, independent of execution time.
//!
//! [`Timer::start_paced`] is the self-rescheduling loop with a delay
//! recomputed after every run.
//!
//! Timers stop when their [`CancelToken`] fires or when every
//! [`CancelHandle`] for it is dropped.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

/// Sending half of a cancellation token
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Receiving half, passed to the scheduling call
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Create a linked handle/token pair
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolve once cancelled or once the handle is gone
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Wait this long after each run completes
    Delay(Duration),
    /// Run on a fixed period
    Period(Duration),
}

/// Spawn a timer task running `tick` on `schedule` until `token` is cancelled.
///
/// With `run_immediately` the first run happens before the first wait.
pub fn spawn_timer<F>(
    name: &'static str,
    schedule: Schedule,
    run_immediately: bool,
    mut token: CancelToken,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        tracing::debug!(timer = name, ?schedule, "timer started");

        if run_immediately && !token.is_cancelled() {
            tick();
        }

        match schedule {
            Schedule::Delay(delay) => delay_loop(&mut token, || delay, &mut tick).await,
            Schedule::Period(period) => {
                let mut interval = interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = interval.tick() => {}
                    }
                    tick();
                }
            }
        }

        tracing::debug!(timer = name, "timer stopped");
    })
}

/// Spawn a self-rescheduling timer whose wait is `next_delay()`, asked
/// again after each run.
pub fn spawn_paced_timer<D, F>(
    name: &'static str,
    run_immediately: bool,
    mut token: CancelToken,
    next_delay: D,
    mut tick: F,
) -> JoinHandle<()>
where
    D: FnMut() -> Duration + Send + 'static,
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        tracing::debug!(timer = name, "paced timer started");

        if run_immediately && !token.is_cancelled() {
            tick();
        }
        delay_loop(&mut token, next_delay, &mut tick).await;

        tracing::debug!(timer = name, "timer stopped");
    })
}

async fn delay_loop<D, F>(token: &mut CancelToken, mut next_delay: D, mut tick: F)
where
    D: FnMut() -> Duration,
    F: FnMut(),
{
    loop {
        let delay = next_delay();
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = sleep(delay) => {}
        }
        if token.is_cancelled() {
            break;
        }
        tick();
    }
}

/// A running timer owning its own cancellation handle
#[derive(Debug)]
pub struct Timer {
    name: &'static str,
    cancel: CancelHandle,
    join: JoinHandle<()>,
}

impl Timer {
    pub fn start<F>(name: &'static str, schedule: Schedule, run_immediately: bool, tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (cancel, token) = cancel_pair();
        let join = spawn_timer(name, schedule, run_immediately, token, tick);
        Self { name, cancel, join }
    }

    pub fn start_paced<D, F>(
        name: &'static str,
        run_immediately: bool,
        next_delay: D,
        tick: F,
    ) -> Self
    where
        D: FnMut() -> Duration + Send + 'static,
        F: FnMut() + Send + 'static,
    {
        let (cancel, token) = cancel_pair();
        let join = spawn_paced_timer(name, run_immediately, token, next_delay, tick);
        Self { name, cancel, join }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cancel the pending continuation; a run in progress completes
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancel and wait for the task to exit
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.join.await;
    }
}
