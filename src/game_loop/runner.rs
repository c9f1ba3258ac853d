//! GameLoop - lifecycle handle around a single ticking task.
//!
//! `start` spawns the ticking task on the current tokio runtime and returns
//! immediately. `pause`, `resume` and `stop` are delivered to that task as
//! control signals, in the order they are sent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::signal::ControlSignal;
use super::state::LoopState;
use super::ticker::{Ticker, UpdateFn, panic_message};
use crate::config::LoopConfig;
use crate::error::{LoopError, Result};

/// Resources handed to the ticking task on start.
struct Pending {
    callback: UpdateFn,
    control: mpsc::UnboundedReceiver<ControlSignal>,
}

/// Fixed-timestep game loop.
///
/// Invokes the update callback every `interval` with the measured time since
/// the previous tick, in seconds. The first tick after starting or resuming
/// reports the nominal interval (or the time since resume), never the time
/// spent idle or paused.
///
/// ```ignore
/// let game_loop = GameLoop::new(Duration::from_millis(50), move |dt| world.advance(dt))?;
/// game_loop.start()?;
/// // ...
/// game_loop.shutdown().await?;
/// ```
pub struct GameLoop {
    interval: Duration,
    recover_panics: bool,
    control: mpsc::UnboundedSender<ControlSignal>,
    state: Arc<watch::Sender<LoopState>>,
    ticks: Arc<AtomicU64>,
    pending: Mutex<Option<Pending>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl GameLoop {
    /// Create an idle loop that ticks every `interval`.
    pub fn new<F>(interval: Duration, callback: F) -> Result<Self>
    where
        F: FnMut(f64) + Send + 'static,
    {
        Self::build(interval, false, Box::new(callback))
    }

    /// Create an idle loop from configuration.
    pub fn with_config<F>(config: &LoopConfig, callback: F) -> Result<Self>
    where
        F: FnMut(f64) + Send + 'static,
    {
        Self::build(config.interval()?, config.recover_panics, Box::new(callback))
    }

    fn build(interval: Duration, recover_panics: bool, callback: UpdateFn) -> Result<Self> {
        if interval.is_zero() {
            return Err(LoopError::InvalidInterval("interval must be > 0".to_string()));
        }
        // The timer schedules deadlines one and two periods ahead of now
        let now = Instant::now();
        if now.checked_add(interval).and_then(|t| t.checked_add(interval)).is_none() {
            return Err(LoopError::InvalidInterval(format!(
                "interval {:?} is too large to schedule",
                interval
            )));
        }

        let (control, rx) = mpsc::unbounded_channel();
        Ok(Self {
            interval,
            recover_panics,
            control,
            state: Arc::new(watch::Sender::new(LoopState::Idle)),
            ticks: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(Some(Pending { callback, control: rx })),
            handle: Mutex::new(None),
        })
    }

    /// Nominal period between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current lifecycle state as last published by the loop.
    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// Number of callback invocations that have returned.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Watch lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    /// Start ticking on a background task of the current tokio runtime.
    ///
    /// Fails if the loop was already started or stopped, or if called
    /// outside a runtime. Never spawns a second ticking task.
    pub fn start(&self) -> Result<()> {
        let runtime = Handle::try_current().map_err(|_| LoopError::NoRuntime)?;

        let started = self.state.send_if_modified(|state| {
            if *state == LoopState::Idle {
                *state = LoopState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            let state = self.state();
            let reason = if state.is_terminal() {
                "a stopped loop cannot be restarted".to_string()
            } else {
                format!("loop is already {}", state)
            };
            return Err(LoopError::InvalidState(reason));
        }

        let pending = self
            .pending
            .lock()
            .map_err(|_| LoopError::InvalidState("loop lock poisoned".to_string()))?
            .take()
            .ok_or_else(|| LoopError::InvalidState("loop was already started".to_string()))?;

        let ticker = Ticker::new(
            self.interval,
            pending.callback,
            pending.control,
            self.state.clone(),
            self.ticks.clone(),
            self.recover_panics,
        );
        let handle = runtime.spawn(ticker.run());

        if let Ok(mut slot) = self.handle.lock() {
            *slot = Some(handle);
        }

        info!("Game loop started with interval {:?}", self.interval);
        Ok(())
    }

    /// Request Running -> Paused. Ignored unless the loop is active.
    pub fn pause(&self) {
        self.signal(ControlSignal::Pause);
    }

    /// Request Paused -> Running. Ignored unless the loop is active.
    pub fn resume(&self) {
        self.signal(ControlSignal::Resume);
    }

    /// Stop the loop for good. Safe to call repeatedly.
    pub fn stop(&self) {
        let stopped_idle = self.state.send_if_modified(|state| {
            if *state == LoopState::Idle {
                *state = LoopState::Stopped;
                true
            } else {
                false
            }
        });
        if stopped_idle {
            // Never started: release the callback now
            if let Ok(mut pending) = self.pending.lock() {
                pending.take();
            }
            info!("Game loop stopped before starting");
            return;
        }
        self.signal(ControlSignal::Stop);
    }

    fn signal(&self, signal: ControlSignal) {
        let state = self.state();
        if !state.is_active() {
            debug!("Ignoring {:?} for {} loop", signal, state);
            return;
        }
        // A closed channel means the ticking task already exited
        if self.control.send(signal).is_err() {
            debug!("Ignoring {:?}, ticking task has exited", signal);
        }
    }

    /// Wait for the ticking task to exit.
    ///
    /// Returns `CallbackPanicked` when a callback panic terminated it.
    /// Returns immediately if the loop never started or was already joined.
    pub async fn join(&self) -> Result<()> {
        let handle = match self.handle.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => return Err(LoopError::InvalidState("loop lock poisoned".to_string())),
        };
        let Some(handle) = handle else {
            return Ok(());
        };

        match handle.await {
            Ok(()) => {
                info!("Game loop stopped after {} ticks", self.tick_count());
                Ok(())
            }
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic().as_ref());
                Err(LoopError::CallbackPanicked(message))
            }
            Err(_) => Ok(()),
        }
    }

    /// Stop the loop and wait for the ticking task to exit.
    pub async fn shutdown(&self) -> Result<()> {
        self.stop();
        self.join().await
    }
}

impl std::fmt::Debug for GameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLoop")
            .field("interval", &self.interval)
            .field("state", &self.state())
            .field("ticks", &self.tick_count())
            .field("recover_panics", &self.recover_panics)
            .finish()
    }
}
