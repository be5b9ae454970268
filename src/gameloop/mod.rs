//! The loop scheduler
//!
//! Drives a dynamic collection of loop items through a fixed-rate
//! input -> update -> render cycle:
//! - **Input:** all handlers run concurrently and settle before updates
//! - **Update:** sequential, insertion order, with the elapsed time since
//!   the previous cycle; finished items are swept afterwards
//! - **Render:** sequential, insertion order
//!
//! The cycle re-arms itself as a deferred tokio task rather than blocking,
//! and honors pause/end at cycle boundaries.

mod config;
mod core;

pub use config::GameLoopConfig;
pub use core::{GameLoop, LoopState};
