//! Wall-clock driver for [`Countdown`].
//!
//! The countdown runs on a spawned tokio task that owns all timer state. The
//! returned [`CountdownTask`] is the only handle to it: dropping the handle
//! aborts the task, so no tick outlives the attempt it belongs to.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use qudratak_core::timer::{CompletionReason, Countdown, TickOutcome};

const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { remaining: u32 },
    /// Sent at most once per task.
    Completed(CompletionReason),
}

/// Owned handle to a running countdown.
#[derive(Debug)]
pub struct CountdownTask {
    handle: JoinHandle<()>,
    finish: Option<oneshot::Sender<()>>,
    remaining: watch::Receiver<u32>,
}

impl CountdownTask {
    /// Start ticking `total_seconds` down on the current tokio runtime.
    ///
    /// The first tick fires one second after the call.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(total_seconds: u32) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (remaining_tx, remaining_rx) = watch::channel(total_seconds);
        let (finish_tx, finish_rx) = oneshot::channel();

        let handle = tokio::spawn(run(
            Countdown::new(total_seconds),
            events_tx,
            remaining_tx,
            finish_rx,
        ));

        let task = Self {
            handle,
            finish: Some(finish_tx),
            remaining: remaining_rx,
        };
        (task, events_rx)
    }

    /// Seconds left as of the last tick.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        *self.remaining.borrow()
    }

    /// Per-second updates of the remaining time.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.remaining.clone()
    }

    /// Stop ticking and emit `Completed(FinishedEarly)`.
    ///
    /// Returns `false` if the countdown had already stopped, in which case no
    /// second completion is sent.
    pub fn finish_now(&mut self) -> bool {
        self.finish
            .take()
            .is_some_and(|finish| finish.send(()).is_ok())
    }

    /// Stop without a completion signal.
    pub fn cancel(self) {
        drop(self);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for CountdownTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(
    mut countdown: Countdown,
    events: mpsc::UnboundedSender<TimerEvent>,
    remaining: watch::Sender<u32>,
    mut finish: oneshot::Receiver<()>,
) {
    let mut interval = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => match countdown.tick() {
                TickOutcome::Running { remaining: left } => {
                    remaining.send_replace(left);
                    if events.send(TimerEvent::Tick { remaining: left }).is_err() {
                        trace!(remaining = left, "timer event receiver dropped");
                    }
                }
                TickOutcome::Completed(reason) => {
                    remaining.send_replace(0);
                    let _ = events.send(TimerEvent::Completed(reason));
                    debug!(?reason, "countdown completed");
                    break;
                }
                TickOutcome::Idle => break,
            },
            signal = &mut finish => {
                match signal {
                    Ok(()) => {
                        if let Some(reason) = countdown.finish_now() {
                            let _ = events.send(TimerEvent::Completed(reason));
                            debug!(
                                ?reason,
                                remaining = countdown.remaining_seconds(),
                                "countdown finished early"
                            );
                        }
                    }
                    // Handle dropped without finishing: abandoned attempt.
                    Err(_) => {
                        countdown.cancel();
                        debug!("countdown cancelled");
                    }
                }
                break;
            }
        }
    }
}
