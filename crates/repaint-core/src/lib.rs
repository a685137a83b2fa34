//! # Components, Damage, and the UI Queue
//!
//! Repaint keeps three things apart:
//!
//! - the **component tree**: who is inside whom, where, and whether it can be
//!   seen (`ComponentTree`, `ComponentId`, `ComponentFlags`);
//! - **pixels**: software images and a clipped drawing context (`Image`,
//!   `Graphics`);
//! - the **UI queue**: a single-consumer task queue that every paint and
//!   layout pass runs on (`EventQueue`).
//!
//! `repaint-ui` builds the repaint manager on top of these; this crate has no
//! opinion about when things get painted.
//!
//! ## Widgets
//!
//! A component's behaviour is an `Arc<dyn Widget>`. The default `paint` just
//! paints the children, so containers only override what they draw themselves:
//!
//! ```rust
//! use repaint_core::*;
//!
//! struct Swatch(Color);
//!
//! impl Widget for Swatch {
//!     fn paint(&self, cx: &mut PaintCx<'_, '_>) {
//!         let size = cx.size();
//!         cx.graphics().fill_rect(Rect::from_size(size), self.0);
//!         cx.paint_children();
//!     }
//! }
//! ```
//!
//! ## Threads
//!
//! The tree is shared as a `SharedTree` (`Arc<RwLock<ComponentTree>>`) so that
//! background threads can report damage. Everything that runs widget code
//! (paint, validate) runs on the thread draining the `EventQueue`.

pub mod color;
pub mod error;
pub mod geometry;
pub mod image;
pub mod prelude;
pub mod queue;
pub mod tests;
pub mod tree;

pub use color::*;
pub use error::{Error, Result};
pub use geometry::*;
pub use image::*;
pub use queue::*;
pub use tree::*;
