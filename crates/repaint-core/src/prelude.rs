pub use crate::color::Color;
pub use crate::error::{Error, Result};
pub use crate::geometry::{Point, Rect, Size};
pub use crate::image::{Graphics, Image};
pub use crate::queue::{EventQueue, Task};
pub use crate::tree::{
    ComponentFlags, ComponentId, ComponentTree, NoopWidget, PaintCx, PaintNode, SharedTree,
    Widget,
};
