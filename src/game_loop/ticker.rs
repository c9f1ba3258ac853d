//! Ticking task - drives the update callback at a fixed period.
//!
//! The ticker waits on a periodic timer, applies pending control signals,
//! measures the delta since the previous tick and invokes the callback.

use std::any::Any;
use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use super::signal::ControlSignal;
use super::state::LoopState;

/// Per-tick update work, called with the elapsed time in seconds.
pub type UpdateFn = Box<dyn FnMut(f64) + Send + 'static>;

/// Seconds elapsed between `last` and `now`.
///
/// Without a previous tick the nominal interval is reported. A clock that
/// reads earlier than `last` yields zero.
pub fn delta_seconds(now: Instant, last: Option<Instant>, interval: Duration) -> f64 {
    match last {
        Some(last) => now.saturating_duration_since(last).as_secs_f64(),
        None => interval.as_secs_f64(),
    }
}

/// Best-effort text for a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Publishes `Stopped` when the ticking task exits, including by unwinding.
struct StopOnExit {
    state: Arc<watch::Sender<LoopState>>,
}

impl Drop for StopOnExit {
    fn drop(&mut self) {
        if std::thread::panicking() {
            log::error!("Ticking task terminated by update callback panic");
        }
        self.state.send_replace(LoopState::Stopped);
    }
}

/// The single ticking activity of a started game loop.
pub(crate) struct Ticker {
    interval: Duration,
    callback: UpdateFn,
    control: mpsc::UnboundedReceiver<ControlSignal>,
    state: Arc<watch::Sender<LoopState>>,
    ticks: Arc<AtomicU64>,
    recover_panics: bool,
    last_tick: Option<Instant>,
    paused: bool,
}

impl Ticker {
    pub(crate) fn new(
        interval: Duration,
        callback: UpdateFn,
        control: mpsc::UnboundedReceiver<ControlSignal>,
        state: Arc<watch::Sender<LoopState>>,
        ticks: Arc<AtomicU64>,
        recover_panics: bool,
    ) -> Self {
        Self {
            interval,
            callback,
            control,
            state,
            ticks,
            recover_panics,
            last_tick: None,
            paused: false,
        }
    }

    /// Run until stopped, the control channel closes, or the callback panics.
    pub(crate) async fn run(mut self) {
        let _guard = StopOnExit {
            state: self.state.clone(),
        };

        let mut timer = time::interval_at(Instant::now() + self.interval, self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if self.paused {
                // Paused: only a control signal can wake us
                let signal = self.control.recv().await;
                if self.apply(signal, &mut timer).is_break() {
                    break;
                }
                continue;
            }

            tokio::select! {
                biased;
                signal = self.control.recv() => {
                    if self.apply(signal, &mut timer).is_break() {
                        break;
                    }
                }
                _ = timer.tick() => {
                    if self.drain_pending(&mut timer).is_break() {
                        break;
                    }
                    if !self.paused {
                        self.tick(Instant::now());
                    }
                }
            }
        }

        log::debug!("Ticking task exited after {} ticks", self.ticks.load(Ordering::Relaxed));
    }

    /// Apply every signal already queued, without waiting.
    fn drain_pending(&mut self, timer: &mut Interval) -> ControlFlow<()> {
        loop {
            match self.control.try_recv() {
                Ok(signal) => self.apply(Some(signal), timer)?,
                Err(mpsc::error::TryRecvError::Empty) => return ControlFlow::Continue(()),
                Err(mpsc::error::TryRecvError::Disconnected) => return self.apply(None, timer),
            }
        }
    }

    /// Apply one control signal. `None` means every sender is gone.
    fn apply(&mut self, signal: Option<ControlSignal>, timer: &mut Interval) -> ControlFlow<()> {
        let Some(signal) = signal else {
            tracing::debug!("Control channel closed, stopping loop");
            return ControlFlow::Break(());
        };

        if signal.is_stop_signal() {
            tracing::debug!("Stop signal received, stopping loop");
            return ControlFlow::Break(());
        }

        let current = if self.paused { LoopState::Paused } else { LoopState::Running };
        let next = current.apply(signal);
        if next == current {
            tracing::debug!(signal = ?signal, state = %current, "Control signal has no effect");
            return ControlFlow::Continue(());
        }
        tracing::debug!(signal = ?signal, from = %current, to = %next, "Control signal received");

        if signal.is_pause_signal() {
            self.paused = true;
        } else if current.is_resumable() {
            // Measure the next delta from now, not from before the pause
            self.paused = false;
            self.last_tick = Some(Instant::now());
            timer.reset();
        }

        self.state.send_replace(next);
        ControlFlow::Continue(())
    }

    fn tick(&mut self, now: Instant) {
        let delta = delta_seconds(now, self.last_tick, self.interval);
        self.last_tick = Some(now);

        let tick = self.ticks.load(Ordering::Relaxed) + 1;
        tracing::trace!(tick = tick, delta = delta, "Tick");

        if self.recover_panics {
            let callback = &mut self.callback;
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(delta))) {
                tracing::error!(
                    tick = tick,
                    error = %panic_message(payload.as_ref()),
                    "Update callback panicked, continuing"
                );
            }
        } else {
            (self.callback)(delta);
        }

        self.ticks.store(tick, Ordering::Relaxed);
    }
}
