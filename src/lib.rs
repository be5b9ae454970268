//! GameLoop - fixed-rate cooperative loop scheduler
//!
//! A [`GameLoop`] owns a dynamic collection of [`LoopItem`]s and drives them
//! through an input -> update -> render cycle at a configurable tick rate.
//! The loop pauses and resumes without losing registered items, and removes
//! items that report completion.
//!
//! # Core Concepts
//!
//! - **Cooperative cycles**: one cycle is logically active at a time; the
//!   loop re-arms itself as a deferred tokio task, never a blocking sleep
//! - **Phase ordering**: input precedes update precedes render within every
//!   cycle, in item insertion order
//! - **Boundary mutation**: items added or removed mid-cycle (including from
//!   their own callbacks) take effect at phase boundaries
//! - **Isolated failures**: one item's failing callback never stops the rest
//!   of the cycle; failures are logged and reported
//!
//! # Modules
//!
//! - [`gameloop`] - the scheduler and its configuration
//! - [`item`] - the loop item capability and failure reports
//! - [`clock`] - injectable time source
//! - [`id`] - item identifier helper

pub mod clock;
pub mod gameloop;
pub mod id;
pub mod item;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use gameloop::{GameLoop, GameLoopConfig, LoopState};
pub use id::generate_id;
pub use item::{CyclePhase, ItemFailure, LoopItem};
