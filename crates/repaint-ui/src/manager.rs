//! # The repaint manager
//!
//! Widgets never paint themselves directly. They report damage
//! (`add_dirty_region`) or a possibly changed preferred size
//! (`add_invalid_component`), and the manager schedules one drain per window
//! on the UI queue. A drain always runs in two phases:
//!
//! 1. `validate_invalid_components` lays out every queued validate root;
//! 2. `paint_dirty_regions` merges all damage (see [`crate::merge`]) and
//!    paints each resulting root exactly once, double buffered through the
//!    shared offscreen image, onto its window surface.
//!
//! Both queues are swapped out under their lock before being processed, so
//! damage reported while a drain is running lands in a fresh store and is
//! picked up by the next drain instead of racing with the current one.
//!
//! ```rust
//! use repaint_core::*;
//! use repaint_ui::*;
//! use std::sync::Arc;
//!
//! let tree = ComponentTree::new().into_shared();
//! let window = tree
//!     .write()
//!     .insert_window(Rect::new(0, 0, 320, 240), Arc::new(Panel::new(Color::WHITE)));
//! let queue = EventQueue::new();
//! let rm = RepaintManager::new(tree.clone(), queue.clone(), RepaintConfig::default());
//!
//! rm.add_dirty_region(window, 0, 0, 10, 10);
//! rm.add_dirty_region(window, 100, 100, 10, 10);
//! assert_eq!(queue.len(), 1);
//!
//! queue.run_pending();
//! assert!(rm.get_dirty_region(window).is_empty());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use repaint_core::{
    ComponentFlags, ComponentId, ComponentTree, Error, EventQueue, Image, Point, Rect, Result,
    SharedTree, Size,
};
use smallvec::SmallVec;

use crate::buffer::OffscreenBuffer;
use crate::config::RepaintConfig;
use crate::dirty::DirtyRegions;
use crate::dispatch::WorkRequests;
use crate::merge::merge_dirty_regions;

pub type Painted = SmallVec<[(ComponentId, Rect); 8]>;

type PaintObserver = Arc<dyn Fn(&[(ComponentId, Rect)]) + Send + Sync>;

pub struct RepaintManager {
    this: Weak<RepaintManager>,
    tree: SharedTree,
    dirty: Mutex<DirtyRegions>,
    invalid: Mutex<Vec<ComponentId>>,
    requests: WorkRequests,

    double_buffering: AtomicBool,
    screen_size: Size,
    max_buffer_size: Mutex<Option<Size>>,
    // Only touched from the UI thread during paint.
    buffer: Mutex<OffscreenBuffer>,
    surfaces: Mutex<HashMap<ComponentId, Image>>,
    observer: Mutex<Option<PaintObserver>>,
}

/// Window that `c` is shown in, or `None` if `c` or an ancestor is hidden or
/// unrealized. Iconified windows count as hidden when `skip_iconified` is set.
fn showing_window(tree: &ComponentTree, c: ComponentId, skip_iconified: bool) -> Option<ComponentId> {
    for p in tree.ancestors(c) {
        let flags = tree.flags(p);
        if !flags.contains(ComponentFlags::VISIBLE | ComponentFlags::REALIZED) {
            return None;
        }
        if flags.contains(ComponentFlags::TOP_LEVEL) {
            if skip_iconified && flags.contains(ComponentFlags::ICONIFIED) {
                return None;
            }
            return Some(p);
        }
    }
    None
}

/// Climbs from `c` to the first component that is opaque or top-level,
/// carrying `rect` into its space and clipping it on the way.
fn opaque_painter(tree: &ComponentTree, c: ComponentId, rect: Rect) -> Option<(ComponentId, Rect)> {
    let mut painter = c;
    let mut clip = rect.intersection(&Rect::from_size(tree.size(c)?));
    loop {
        if clip.is_empty() {
            return None;
        }
        let flags = tree.flags(painter);
        if flags.intersects(ComponentFlags::OPAQUE | ComponentFlags::TOP_LEVEL) {
            return Some((painter, clip));
        }
        let bounds = tree.bounds(painter)?;
        painter = tree.parent(painter)?;
        clip = clip
            .translate(bounds.x, bounds.y)
            .intersection(&Rect::from_size(tree.size(painter)?));
    }
}

impl RepaintManager {
    pub fn new(tree: SharedTree, queue: EventQueue, config: RepaintConfig) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            tree,
            dirty: Mutex::new(DirtyRegions::new()),
            invalid: Mutex::new(Vec::new()),
            requests: WorkRequests::new(queue),
            double_buffering: AtomicBool::new(config.double_buffering),
            screen_size: config.screen_size,
            max_buffer_size: Mutex::new(config.max_double_buffer_size),
            buffer: Mutex::new(OffscreenBuffer::new()),
            surfaces: Mutex::new(HashMap::new()),
            observer: Mutex::new(None),
        })
    }

    pub fn tree(&self) -> &SharedTree {
        &self.tree
    }

    pub fn queue(&self) -> &EventQueue {
        self.requests.queue()
    }

    // ---- damage -------------------------------------------------------------

    /// Adds `(x, y, w, h)` (in `c`'s coordinates) to `c`'s damage.
    ///
    /// Dropped silently if the rectangle is empty, `c` has no area, or `c` is
    /// not showing in a realized, non-iconified window.
    pub fn add_dirty_region(&self, c: ComponentId, x: i32, y: i32, w: i32, h: i32) {
        if w <= 0 || h <= 0 {
            return;
        }
        let r = Rect::new(x, y, w, h);

        let root = {
            let tree = self.tree.read();
            match tree.size(c) {
                Some(size) if !size.is_empty() => {}
                _ => return,
            }
            // Already dirty implies it was showing; just grow the region.
            if self.dirty.lock().union_existing(c, r) {
                return;
            }
            match showing_window(&tree, c, true) {
                Some(root) => root,
                None => return,
            }
        };

        if self.dirty.lock().add(c, r) {
            self.queue_work(root);
        }
    }

    pub fn add_dirty_rect(&self, c: ComponentId, r: Rect) {
        self.add_dirty_region(c, r.x, r.y, r.w, r.h);
    }

    /// Current damage of `c`, or an empty rectangle if it is clean.
    pub fn get_dirty_region(&self, c: ComponentId) -> Rect {
        self.dirty.lock().get(c).unwrap_or(Rect::ZERO)
    }

    pub fn mark_completely_dirty(&self, c: ComponentId) {
        self.add_dirty_rect(c, Rect::EVERYTHING);
    }

    pub fn mark_completely_clean(&self, c: ComponentId) {
        self.dirty.lock().remove(c);
    }

    /// True if the next drain repaints all of `c`; lets callers skip computing
    /// finer damage.
    pub fn is_completely_dirty(&self, c: ComponentId) -> bool {
        self.get_dirty_region(c).is_everything()
    }

    // ---- layout -------------------------------------------------------------

    /// Queues the nearest validate root of `c` for the next validate phase.
    pub fn add_invalid_component(&self, c: ComponentId) {
        let (validate_root, window) = {
            let tree = self.tree.read();
            let mut validate_root = None;
            for p in tree.ancestors(c) {
                let flags = tree.flags(p);
                if !flags.contains(ComponentFlags::REALIZED) {
                    return;
                }
                if flags.contains(ComponentFlags::VALIDATE_ROOT) {
                    validate_root = Some(p);
                    break;
                }
            }
            let Some(validate_root) = validate_root else {
                return;
            };
            match showing_window(&tree, validate_root, false) {
                Some(window) => (validate_root, window),
                None => return,
            }
        };

        {
            let mut invalid = self.invalid.lock();
            if invalid.contains(&validate_root) {
                return;
            }
            invalid.push(validate_root);
        }
        self.queue_work(window);
    }

    pub fn remove_invalid_component(&self, c: ComponentId) {
        self.invalid.lock().retain(|id| *id != c);
    }

    /// Validate roots waiting for the next validate phase, in queue order.
    pub fn invalid_components(&self) -> Vec<ComponentId> {
        self.invalid.lock().clone()
    }

    /// Lays out every queued validate root, in the order they were queued.
    pub fn validate_invalid_components(&self) {
        let roots = std::mem::take(&mut *self.invalid.lock());
        for id in roots {
            let widget = self.tree.read().widget(id);
            if let Some(widget) = widget {
                log::trace!("validate {id:?}");
                widget.validate(id, &self.tree);
            }
        }
    }

    // ---- painting -----------------------------------------------------------

    /// Paints all accumulated damage: one paint per merged root. Returns the
    /// roots painted and the (clipped) rectangle each was painted with.
    pub fn paint_dirty_regions(&self) -> Painted {
        let mut work = self.dirty.lock().take();
        if work.is_empty() {
            return Painted::new();
        }

        let painted = {
            let tree = self.tree.read();
            merge_dirty_regions(&tree, &mut work)
        };
        log::trace!(
            "paint_dirty_regions: {} dirty component(s) -> {} root(s)",
            work.len(),
            painted.len()
        );

        for (root, rect) in &painted {
            self.paint_immediately(*root, *rect);
        }

        let observer = self.observer.lock().clone();
        if let Some(observer) = observer.filter(|_| !painted.is_empty()) {
            observer(painted.as_slice());
        }
        painted
    }

    /// Called after every `paint_dirty_regions` that painted something, with
    /// the roots it painted. Replaces any previous observer.
    pub fn set_paint_observer(&self, f: impl Fn(&[(ComponentId, Rect)]) + Send + Sync + 'static) {
        *self.observer.lock() = Some(Arc::new(f));
    }

    /// Synchronously paints `rect` of `c` (and its visible descendants) onto
    /// `c`'s window surface.
    ///
    /// A non-opaque `c` is painted from its nearest opaque ancestor (or its
    /// window), with `rect` moved into that ancestor's space.
    ///
    /// Widgets must not call back into this from their own `paint`.
    pub fn paint_immediately(&self, c: ComponentId, rect: Rect) {
        let (window, offset, window_size, snapshot, clip) = {
            let tree = self.tree.read();
            if !tree.is_showing(c) {
                return;
            }
            let Some((painter, clip)) = opaque_painter(&tree, c, rect) else {
                return;
            };
            let (Some(window), Some(offset)) =
                (tree.window_of(painter), tree.offset_in_window(painter))
            else {
                return;
            };
            let (Some(window_size), Some(snapshot)) = (tree.size(window), tree.snapshot(painter))
            else {
                return;
            };
            (window, offset, window_size, snapshot, clip)
        };

        let mut surfaces = self.surfaces.lock();
        let surface = surfaces
            .entry(window)
            .or_insert_with(|| Image::new(window_size.width, window_size.height));
        if surface.size() != window_size {
            *surface = Image::new(window_size.width, window_size.height);
        }

        if !self.is_double_buffering_enabled() {
            let mut g = surface.graphics();
            g.translate(offset.x, offset.y);
            g.clip_rect(clip);
            snapshot.paint(&mut g);
            return;
        }

        let max = self.double_buffer_maximum_size();
        let mut buffer = self.buffer.lock();
        let image = buffer.get(clip.size(), max);

        // The buffer may be capped below the clip; paint in buffer-sized tiles.
        let tile_w = image.width().min(clip.w);
        let tile_h = image.height().min(clip.h);
        for ty in (clip.y..clip.y + clip.h).step_by(tile_h as usize) {
            for tx in (clip.x..clip.x + clip.w).step_by(tile_w as usize) {
                let tile = Rect::new(
                    tx,
                    ty,
                    tile_w.min(clip.x + clip.w - tx),
                    tile_h.min(clip.y + clip.h - ty),
                );
                {
                    let mut g = image.graphics();
                    g.translate(-tile.x, -tile.y);
                    g.set_clip(tile);
                    g.clear_rect(tile);
                    snapshot.paint(&mut g);
                }
                surface.graphics().draw_image_region(
                    image,
                    Rect::from_size(tile.size()),
                    Point::new(offset.x + tile.x, offset.y + tile.y),
                );
            }
        }
    }

    /// Runs `f` with the presented pixels of `window`, if it has been painted.
    pub fn with_window_surface<R>(&self, window: ComponentId, f: impl FnOnce(&Image) -> R) -> Option<R> {
        self.surfaces.lock().get(&window).map(f)
    }

    // ---- double buffering ---------------------------------------------------

    /// The shared offscreen image, at least `proposed` unless capped by
    /// [`double_buffer_maximum_size`](Self::double_buffer_maximum_size).
    pub fn offscreen_buffer(&self, proposed: Size) -> MappedMutexGuard<'_, Image> {
        let max = self.double_buffer_maximum_size();
        MutexGuard::map(self.buffer.lock(), |b| b.get(proposed, max))
    }

    pub fn offscreen_buffer_size(&self) -> Option<Size> {
        self.buffer.lock().current_size()
    }

    pub fn offscreen_buffer_allocations(&self) -> u64 {
        self.buffer.lock().allocations()
    }

    pub fn set_double_buffer_maximum_size(&self, max: Size) {
        *self.max_buffer_size.lock() = Some(max);
        self.buffer.lock().enforce_max(max);
    }

    pub fn double_buffer_maximum_size(&self) -> Size {
        self.max_buffer_size.lock().unwrap_or(self.screen_size)
    }

    pub fn set_double_buffering_enabled(&self, enabled: bool) {
        self.double_buffering.store(enabled, Ordering::Relaxed);
    }

    pub fn is_double_buffering_enabled(&self) -> bool {
        self.double_buffering.load(Ordering::Relaxed)
    }

    /// Recreate the offscreen image on its next use.
    pub fn reset_double_buffer(&self) {
        self.buffer.lock().reset();
    }

    // ---- tree changes that imply damage ------------------------------------

    /// Moves/resizes `c`, repainting what it used to cover and what it covers
    /// now. A size change also queues a layout pass.
    pub fn reshape(&self, c: ComponentId, bounds: Rect) -> Result<()> {
        let (old, parent, top_level) = {
            let mut tree = self.tree.write();
            let old = tree.bounds(c).ok_or(Error::UnknownComponent(c))?;
            tree.set_bounds(c, bounds)?;
            (
                old,
                tree.parent(c),
                tree.flags(c).contains(ComponentFlags::TOP_LEVEL),
            )
        };
        if old == bounds {
            return Ok(());
        }

        let resized = old.size() != bounds.size();
        if top_level {
            if resized {
                self.reset_double_buffer();
                self.mark_completely_dirty(c);
            }
        } else if let Some(parent) = parent {
            self.add_dirty_rect(parent, old.union(&bounds));
        }
        if resized {
            self.add_invalid_component(c);
        }
        Ok(())
    }

    pub fn set_location(&self, c: ComponentId, at: Point) -> Result<()> {
        let size = self
            .tree
            .read()
            .size(c)
            .ok_or(Error::UnknownComponent(c))?;
        self.reshape(c, Rect::from_origin_size(at, size))
    }

    /// Removes `c`'s subtree and forgets any pending damage, layout or work
    /// requests that referred to it.
    pub fn remove_component(&self, c: ComponentId) -> Result<()> {
        let (removed, parent, old) = {
            let mut tree = self.tree.write();
            let parent = tree.parent(c);
            let old = tree.bounds(c);
            (tree.remove(c)?, parent, old)
        };

        {
            let mut dirty = self.dirty.lock();
            for id in &removed {
                dirty.remove(*id);
            }
        }
        self.invalid.lock().retain(|id| !removed.contains(id));
        {
            let mut surfaces = self.surfaces.lock();
            for id in &removed {
                self.requests.forget(*id);
                surfaces.remove(id);
            }
        }

        if let (Some(parent), Some(old)) = (parent, old) {
            self.add_dirty_rect(parent, old);
        }
        Ok(())
    }

    // ---- scheduling ---------------------------------------------------------

    fn queue_work(&self, root: ComponentId) {
        self.requests
            .queue_component_work_request(root, self.this.clone());
    }

    /// True while a drain for `window` is queued but has not started.
    pub fn has_pending_work(&self, window: ComponentId) -> bool {
        self.requests.is_pending(window)
    }
}

impl fmt::Debug for RepaintManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepaintManager")
            .field("dirty", &*self.dirty.lock())
            .field("invalid", &*self.invalid.lock())
            .field("double_buffering", &self.is_double_buffering_enabled())
            .finish_non_exhaustive()
    }
}
