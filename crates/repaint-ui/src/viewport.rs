//! # Viewport
//!
//! A viewport is a window onto a single, usually larger, child called the
//! *view*. Scrolling moves the view to a negative location inside the viewport;
//! the viewport's own bounds never change.
//!
//! With the backing store enabled the viewport keeps a private image of what it
//! last painted. A paint then goes through one of three paths:
//!
//! - `Full`: repaint the damaged area into the backing image and copy the
//!   image out. Used for the first paint, for paints without a scroll, and
//!   whenever a scroll can't be blitted.
//! - `Blit`: the view moved along exactly one axis by less than the extent in
//!   that axis. The still-visible pixels are shifted in place with one
//!   `copy_area`, only the exposed strip is repainted, and the image is copied
//!   out.
//! - `Direct`: no backing store; paint straight into the target.
//!
//! ```text
//!   state     Normal ──first backed paint──▶ Backed ──set_view_position──▶ Scrolling
//!                                              ▲                             │
//!                                              └────────── any paint ────────┘
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use repaint_core::{
    Color, ComponentId, Error, Graphics, Image, PaintCx, PaintNode, Point, Rect, Result, Size,
    Widget,
};

use crate::RepaintManager;

/// Parameters of a scroll blit, all in viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Blit {
    /// Top-left of the pixels that stay visible, before the copy.
    pub from: Point,
    /// Where they land.
    pub to: Point,
    pub size: Size,
    /// Newly exposed strip that has to be painted.
    pub paint: Rect,
}

/// Works out the blit for a view that moved by `(dx, dy)` inside a viewport of
/// `extent`, or `None` if the move is diagonal, zero, or at least a whole
/// extent along its axis.
pub fn compute_blit(dx: i32, dy: i32, extent: Size) -> Option<Blit> {
    let (dx_abs, dy_abs) = (dx.unsigned_abs() as i64, dy.unsigned_abs() as i64);

    if dx == 0 && dy != 0 && dy_abs < extent.height as i64 {
        let dy_abs = dy_abs as i32;
        let (from_y, to_y, paint_y) = if dy < 0 {
            (dy_abs, 0, extent.height - dy_abs)
        } else {
            (0, dy_abs, 0)
        };
        return Some(Blit {
            from: Point::new(0, from_y),
            to: Point::new(0, to_y),
            size: Size::new(extent.width, extent.height - dy_abs),
            paint: Rect::new(0, paint_y, extent.width, dy_abs),
        });
    }

    if dy == 0 && dx != 0 && dx_abs < extent.width as i64 {
        let dx_abs = dx_abs as i32;
        let (from_x, to_x, paint_x) = if dx < 0 {
            (dx_abs, 0, extent.width - dx_abs)
        } else {
            (0, dx_abs, 0)
        };
        return Some(Blit {
            from: Point::new(from_x, 0),
            to: Point::new(to_x, 0),
            size: Size::new(extent.width - dx_abs, extent.height),
            paint: Rect::new(paint_x, 0, dx_abs, extent.height),
        });
    }

    None
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollMode {
    /// No backing image.
    Normal,
    Backed,
    /// The view moved since the last paint.
    Scrolling,
}

/// Which path the most recent paint took.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportPaint {
    Direct,
    Full,
    Blit(Blit),
}

#[derive(Debug)]
struct ViewportState {
    backing_store: bool,
    backing: Option<Image>,
    last_paint_position: Point,
    scroll_underway: bool,
    last_paint: Option<ViewportPaint>,
}

struct ViewportWidget {
    state: Arc<Mutex<ViewportState>>,
    background: Color,
}

impl ViewportWidget {
    fn paint_contents(&self, node: &PaintNode, g: &mut Graphics<'_>) {
        g.fill_rect(Rect::from_size(node.bounds.size()), self.background);
        node.paint_children(g);
    }
}

impl Widget for ViewportWidget {
    fn paint(&self, cx: &mut PaintCx<'_, '_>) {
        let size = cx.size();
        if size.is_empty() {
            return;
        }
        let node = cx.node();
        // Location of the view, i.e. minus the scroll position.
        let view_bounds = node.children.first().map(|v| v.bounds);
        let view_location = view_bounds.map_or(Point::ORIGIN, |b| b.origin());

        let mut guard = self.state.lock();
        let st = &mut *guard;
        let g = cx.graphics();

        let Some(view_bounds) = view_bounds.filter(|_| st.backing_store) else {
            self.paint_contents(node, g);
            st.last_paint_position = view_location;
            st.last_paint = Some(ViewportPaint::Direct);
            return;
        };

        // A view smaller than the viewport must not expose stale pixels.
        g.clip_rect(Rect::from_size(view_bounds.size()));

        if st.backing.as_ref().is_some_and(|img| img.size() != size) {
            st.backing = None;
        }
        let fresh = st.backing.is_none();
        let backing = st
            .backing
            .get_or_insert_with(|| Image::new(size.width, size.height));

        let blit = if fresh || !st.scroll_underway || st.last_paint_position == view_location {
            None
        } else {
            compute_blit(
                view_location.x - st.last_paint_position.x,
                view_location.y - st.last_paint_position.y,
                size,
            )
        };

        match blit {
            Some(blit) => {
                let mut bg = backing.graphics();
                bg.copy_area(
                    blit.from.x,
                    blit.from.y,
                    blit.size.width,
                    blit.size.height,
                    blit.to.x - blit.from.x,
                    blit.to.y - blit.from.y,
                );
                bg.set_clip(view_bounds.intersection(&blit.paint));
                self.paint_contents(node, &mut bg);
                st.last_paint = Some(ViewportPaint::Blit(blit));
            }
            None => {
                let mut bg = backing.graphics();
                bg.set_clip(g.clip_bounds());
                self.paint_contents(node, &mut bg);
                st.last_paint = Some(ViewportPaint::Full);
            }
        }
        g.draw_image(backing, 0, 0);

        st.last_paint_position = view_location;
        st.scroll_underway = false;
    }
}

/// Handle to a viewport component.
pub struct Viewport {
    id: ComponentId,
    rm: Arc<RepaintManager>,
    state: Arc<Mutex<ViewportState>>,
}

impl Viewport {
    /// Inserts an empty viewport under `parent`. An opaque `background` makes
    /// the viewport opaque, so damage inside it repaints from the viewport
    /// down instead of from the window.
    pub fn new(
        rm: &Arc<RepaintManager>,
        parent: ComponentId,
        bounds: Rect,
        background: Color,
    ) -> Result<Self> {
        let state = Arc::new(Mutex::new(ViewportState {
            backing_store: false,
            backing: None,
            last_paint_position: Point::ORIGIN,
            scroll_underway: false,
            last_paint: None,
        }));
        let widget = Arc::new(ViewportWidget {
            state: state.clone(),
            background,
        });
        let id = {
            let mut tree = rm.tree().write();
            let id = tree.insert_child(parent, bounds, widget)?;
            tree.set_opaque(id, background.is_opaque())?;
            id
        };
        rm.add_dirty_rect(parent, bounds);
        Ok(Self {
            id,
            rm: rm.clone(),
            state,
        })
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn view(&self) -> Option<ComponentId> {
        self.rm.tree().read().children(self.id).first().copied()
    }

    /// Makes `widget` the view, replacing the current one.
    pub fn set_view(&self, widget: Arc<dyn Widget>, size: Size) -> Result<ComponentId> {
        if size.width < 0 || size.height < 0 {
            return Err(Error::NegativeSize(size));
        }
        if let Some(old) = self.view() {
            self.rm.remove_component(old)?;
        }
        let id = self
            .rm
            .tree()
            .write()
            .insert_child(self.id, Rect::from_size(size), widget)?;
        {
            let mut st = self.state.lock();
            st.scroll_underway = false;
            st.last_paint_position = Point::ORIGIN;
        }
        self.rm.mark_completely_dirty(self.id);
        Ok(id)
    }

    pub fn view_size(&self) -> Size {
        self.view()
            .and_then(|v| self.rm.tree().read().size(v))
            .unwrap_or(Size::ZERO)
    }

    /// Resizes the view in place. The next paint never blits, since the
    /// pixels in the backing image may no longer match the view.
    pub fn set_view_size(&self, size: Size) -> Result<()> {
        if size.width < 0 || size.height < 0 {
            return Err(Error::NegativeSize(size));
        }
        let Some(view) = self.view() else {
            return Ok(());
        };
        let old = self
            .rm
            .tree()
            .read()
            .bounds(view)
            .ok_or(Error::UnknownComponent(view))?;
        if old.size() == size {
            return Ok(());
        }
        self.state.lock().scroll_underway = false;
        self.rm
            .reshape(view, Rect::from_origin_size(old.origin(), size))
    }

    /// Top-left of the visible area, in view coordinates.
    pub fn view_position(&self) -> Point {
        let tree = self.rm.tree().read();
        tree.children(self.id)
            .first()
            .and_then(|v| tree.bounds(*v))
            .map_or(Point::ORIGIN, |b| Point::new(-b.x, -b.y))
    }

    /// Scrolls so that `p` (view coordinates) is at the viewport's top-left.
    /// Negative coordinates clamp to zero. No-op without a view.
    pub fn set_view_position(&self, p: Point) -> Result<()> {
        let Some(view) = self.view() else {
            return Ok(());
        };
        let location = Point::new(-p.x.max(0), -p.y.max(0));
        let old = self
            .rm
            .tree()
            .read()
            .bounds(view)
            .ok_or(Error::UnknownComponent(view))?;
        if old.origin() == location {
            return Ok(());
        }
        self.state.lock().scroll_underway = true;
        self.rm.set_location(view, location)
    }

    pub fn extent_size(&self) -> Size {
        self.rm.tree().read().size(self.id).unwrap_or(Size::ZERO)
    }

    /// Resizes the viewport, keeping its location.
    pub fn set_extent_size(&self, size: Size) -> Result<()> {
        let bounds = self
            .rm
            .tree()
            .read()
            .bounds(self.id)
            .ok_or(Error::UnknownComponent(self.id))?;
        self.reshape(Rect::from_origin_size(bounds.origin(), size))
    }

    /// Visible part of the view, in view coordinates.
    pub fn view_rect(&self) -> Rect {
        Rect::from_origin_size(self.view_position(), self.extent_size())
    }

    /// Scrolls the minimum amount that brings `r` (view coordinates) into
    /// view, preferring its top-left edge when it is larger than the extent.
    ///
    /// The next paint goes through the backing store in full.
    pub fn scroll_rect_to_visible(&self, r: Rect) -> Result<()> {
        if self.view().is_none() {
            return Ok(());
        }
        let extent = self.extent_size();
        let pos = self.view_position();
        let dx = position_adjustment(extent.width, r.w, r.x - pos.x);
        let dy = position_adjustment(extent.height, r.h, r.y - pos.y);
        if dx != 0 || dy != 0 {
            self.set_view_position(Point::new(pos.x - dx, pos.y - dy))?;
            self.state.lock().scroll_underway = false;
        }
        Ok(())
    }

    pub fn set_backing_store_enabled(&self, enabled: bool) {
        let mut st = self.state.lock();
        st.backing_store = enabled;
        if !enabled {
            st.backing = None;
        }
    }

    pub fn is_backing_store_enabled(&self) -> bool {
        self.state.lock().backing_store
    }

    pub fn scroll_mode(&self) -> ScrollMode {
        let st = self.state.lock();
        match (&st.backing, st.scroll_underway) {
            (None, _) => ScrollMode::Normal,
            (Some(_), true) => ScrollMode::Scrolling,
            (Some(_), false) => ScrollMode::Backed,
        }
    }

    pub fn last_paint(&self) -> Option<ViewportPaint> {
        self.state.lock().last_paint
    }

    /// Moves/resizes the viewport; a size change drops the backing image.
    pub fn reshape(&self, bounds: Rect) -> Result<()> {
        if self.extent_size() != bounds.size() {
            self.state.lock().backing = None;
        }
        self.rm.reshape(self.id, bounds)
    }
}

/// How far to move content of length `len` at `at` so it fits into
/// `extent`, along one axis. Positive moves the content towards the end.
fn position_adjustment(extent: i32, len: i32, at: i32) -> i32 {
    let end = at.saturating_add(len);
    match () {
        // Already inside, or covering the whole extent.
        _ if at >= 0 && end <= extent => 0,
        _ if at <= 0 && end >= extent => 0,
        // Sticks out past the end.
        _ if at > 0 && len <= extent => extent - end,
        _ if at >= 0 && len >= extent => -at,
        // Sticks out before the start.
        _ if at <= 0 && len <= extent => -at,
        _ if at < 0 && len >= extent => extent - end,
        _ => 0,
    }
}
