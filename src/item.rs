//! Loop item capability and failure reporting

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// A unit of per-cycle work driven by the loop
///
/// Items are registered as `Arc<dyn LoopItem>` and visited each cycle in
/// insertion order: input, then update, then render. Callbacks take `&self`;
/// items keep their own state behind interior mutability.
///
/// The loop never generates item ids. Callers supply them (see
/// [`crate::id::generate_id`] for a convenience helper) and are responsible
/// for uniqueness; lookups return the first match.
#[async_trait]
pub trait LoopItem: Send + Sync {
    /// Stable identifier for the item's lifetime in the collection
    fn id(&self) -> &str;

    /// Input phase callback
    ///
    /// May run concurrently with other items' input handlers; the phase
    /// completes once all of them have settled.
    async fn handle_input(&self) -> eyre::Result<()>;

    /// Update phase callback
    ///
    /// `elapsed` is the time between the start of the previous cycle and the
    /// start of this one.
    async fn update(&self, elapsed: Duration) -> eyre::Result<()>;

    /// Render phase callback
    async fn render(&self) -> eyre::Result<()>;

    /// Completion query, checked after the update phase
    ///
    /// Items returning true are removed before the render phase of the same
    /// cycle. The default never finishes, for items whose lifetime is managed
    /// by the caller alone.
    fn is_finished(&self) -> bool {
        false
    }
}

/// Phase of the cycle a failure occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Input,
    Update,
    Render,
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Update => write!(f, "update"),
            Self::Render => write!(f, "render"),
        }
    }
}

/// Report of a single item callback failure
///
/// Failures are isolated per item: the cycle logs the failure, forwards it to
/// the reporter channel when one is installed, and continues with the
/// remaining items. The collection's bookkeeping is unaffected.
#[derive(Debug, Error)]
#[error("item {item_id} failed during {phase} phase: {error}")]
pub struct ItemFailure {
    /// Id of the failing item
    pub item_id: String,
    /// Phase the failure occurred in
    pub phase: CyclePhase,
    /// The error the callback returned
    pub error: eyre::Report,
}
