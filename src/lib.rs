//! tickloop - fixed-timestep game loop for real-time simulations
//!
//! A `GameLoop` calls a user-supplied update function at a fixed period with
//! the measured time since the previous call, and can be paused, resumed and
//! stopped from outside while it runs.

pub mod config;
pub mod error;
pub mod game_loop;

pub use error::{LoopError, Result};
pub use game_loop::{ControlSignal, GameLoop, LoopState};
