use crate::{ComponentId, Size};

/// Errors surfaced by tree mutation and cross-thread dispatch.
///
/// Damage and invalidation requests never produce these: reports against
/// invisible, unrealized or already removed components are dropped silently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("event queue is closed")]
    QueueClosed,

    #[error("invoke_and_wait called from the dispatch thread")]
    WouldDeadlock,

    #[error("dispatched task panicked: {0}")]
    TaskPanicked(String),

    #[error("component {0:?} is not in the tree")]
    UnknownComponent(ComponentId),

    #[error("negative size {}x{}", .0.width, .0.height)]
    NegativeSize(Size),

    #[error("top-level component {0:?} cannot be added as a child")]
    NotAChild(ComponentId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Best-effort message extraction from a caught panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}
