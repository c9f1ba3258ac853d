//! Control signals for a running game loop
//!
//! Signals are the only way external callers steer the ticking task:
//! pause, resume, stop.

/// A control request delivered to the ticking task in send order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Suspend ticking (resumable)
    Pause,
    /// Continue a paused loop
    Resume,
    /// Terminate ticking for good
    Stop,
}

impl ControlSignal {
    /// Check if this signal ends the ticking task
    pub fn is_stop_signal(&self) -> bool {
        matches!(self, ControlSignal::Stop)
    }

    /// Check if this signal suspends ticking
    pub fn is_pause_signal(&self) -> bool {
        matches!(self, ControlSignal::Pause)
    }
}
