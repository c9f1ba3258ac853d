//! Lifecycle state of a game loop

use std::fmt;

use serde::Serialize;

use super::signal::ControlSignal;

/// Lifecycle position of a game loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    /// Constructed, not yet started
    #[default]
    Idle,
    /// Ticking
    Running,
    /// Ticking suspended (resumable)
    Paused,
    /// Terminated; cannot be restarted
    Stopped,
}

impl LoopState {
    /// Returns true if the loop can never tick again
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Stopped)
    }

    /// Returns true if the loop can be resumed
    pub fn is_resumable(&self) -> bool {
        matches!(self, LoopState::Paused)
    }

    /// Returns true while a ticking task owns the loop
    pub fn is_active(&self) -> bool {
        matches!(self, LoopState::Running | LoopState::Paused)
    }

    /// State reached by applying `signal` to this state.
    ///
    /// Signals that do not apply leave the state unchanged: resuming a
    /// running loop is a no-op and nothing moves a stopped loop.
    pub fn apply(self, signal: ControlSignal) -> LoopState {
        match (self, signal) {
            (LoopState::Stopped, _) => LoopState::Stopped,
            (_, ControlSignal::Stop) => LoopState::Stopped,
            (LoopState::Running, ControlSignal::Pause) => LoopState::Paused,
            (LoopState::Paused, ControlSignal::Resume) => LoopState::Running,
            (state, _) => state,
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::Idle => "idle",
            LoopState::Running => "running",
            LoopState::Paused => "paused",
            LoopState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
