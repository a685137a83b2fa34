//! Repaint manager, damage coalescing, double buffering and the
//! scroll-blitting viewport.
//!
//! - [`RepaintManager`] collects damage and layout requests from any thread
//!   and turns them into at most one queued drain per window.
//! - [`merge`] decides which component actually paints each piece of damage.
//! - [`OffscreenBuffer`] is the single, grow-only double buffer.
//! - [`Viewport`] scrolls its view by shifting its backing image instead of
//!   repainting it.

mod buffer;
mod config;
mod dirty;
mod dispatch;
mod manager;
pub mod merge;
mod panel;
pub mod viewport;

pub use buffer::OffscreenBuffer;
pub use config::RepaintConfig;
pub use dirty::DirtyRegions;
pub use manager::{Painted, RepaintManager};
pub use panel::Panel;
pub use viewport::{Blit, ScrollMode, Viewport, ViewportPaint, compute_blit};
