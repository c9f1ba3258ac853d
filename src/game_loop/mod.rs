//! Fixed-timestep game loop.
//!
//! This module provides:
//! - **GameLoop**: lifecycle handle (start, pause, resume, stop, join)
//! - **LoopState**: Idle -> Running <-> Paused -> Stopped
//! - **ControlSignal**: ordered pause/resume/stop requests to the ticking task
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use tickloop::game_loop::GameLoop;
//!
//! let game_loop = GameLoop::new(Duration::from_millis(50), |dt| println!("advance {dt}s"))?;
//! game_loop.start()?;
//! tokio::time::sleep(Duration::from_secs(1)).await;
//! game_loop.shutdown().await?;
//! ```

mod runner;
mod signal;
mod state;
mod ticker;

pub use runner::GameLoop;
pub use signal::ControlSignal;
pub use state::LoopState;
pub use ticker::{UpdateFn, delta_seconds};
