//! # Component tree
//!
//! Components live in a slot-map arena and are addressed by [`ComponentId`].
//! Each node stores its bounds relative to its parent, a set of
//! [`ComponentFlags`] and the [`Widget`] delegate that paints and lays it out.
//!
//! The tree is shared between the UI thread and any thread that reports damage
//! as a [`SharedTree`]. Widget code never runs while the tree lock is held:
//! painting walks an immutable [`PaintNode`] snapshot, and `validate` receives
//! the shared handle so it can take the write lock itself.
//!
//! ```rust
//! use repaint_core::*;
//! use std::sync::Arc;
//!
//! let mut tree = ComponentTree::new();
//! let window = tree.insert_window(Rect::new(0, 0, 640, 480), Arc::new(NoopWidget));
//! let child = tree
//!     .insert_child(window, Rect::new(10, 10, 100, 20), Arc::new(NoopWidget))
//!     .unwrap();
//! assert_eq!(tree.window_of(child), Some(window));
//! assert_eq!(tree.offset_in_window(child), Some(Point::new(10, 10)));
//! ```

use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::RwLock;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::{Error, Graphics, Point, Rect, Result, Size};

slotmap::new_key_type! {
    /// Stable identity of a component; stays unique after removal.
    pub struct ComponentId;
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ComponentFlags: u8 {
        const VISIBLE = 1 << 0;
        /// Attached to a realized window (has a native peer).
        const REALIZED = 1 << 1;
        /// Paints every pixel of its bounds.
        const OPAQUE = 1 << 2;
        /// Layout changes below this component stop here.
        const VALIDATE_ROOT = 1 << 3;
        const TOP_LEVEL = 1 << 4;
        const ICONIFIED = 1 << 5;
    }
}

impl Default for ComponentFlags {
    fn default() -> Self {
        ComponentFlags::VISIBLE
    }
}

pub type SharedTree = Arc<RwLock<ComponentTree>>;

/// Behaviour a component plugs into the repaint pipeline.
pub trait Widget: Send + Sync + 'static {
    /// Paints the component. `cx.graphics()` is already translated to the
    /// component's local space and clipped to the damaged area.
    fn paint(&self, cx: &mut PaintCx<'_, '_>) {
        cx.paint_children();
    }

    /// Lays out the subtree. Called for validate roots during the validate
    /// phase, always before the paint phase of the same drain.
    fn validate(&self, _id: ComponentId, _tree: &SharedTree) {}
}

/// Widget that paints nothing of its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopWidget;

impl Widget for NoopWidget {}

struct Node {
    parent: Option<ComponentId>,
    children: SmallVec<[ComponentId; 4]>,
    bounds: Rect,
    flags: ComponentFlags,
    widget: Arc<dyn Widget>,
}

#[derive(Default)]
pub struct ComponentTree {
    nodes: SlotMap<ComponentId, Node>,
}

impl ComponentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedTree {
        Arc::new(RwLock::new(self))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Adds a realized, visible top-level window.
    pub fn insert_window(&mut self, bounds: Rect, widget: Arc<dyn Widget>) -> ComponentId {
        self.nodes.insert(Node {
            parent: None,
            children: SmallVec::new(),
            bounds,
            flags: ComponentFlags::VISIBLE
                | ComponentFlags::REALIZED
                | ComponentFlags::TOP_LEVEL
                | ComponentFlags::VALIDATE_ROOT,
            widget,
        })
    }

    /// Adds a visible child. It is realized iff its parent is.
    pub fn insert_child(
        &mut self,
        parent: ComponentId,
        bounds: Rect,
        widget: Arc<dyn Widget>,
    ) -> Result<ComponentId> {
        if bounds.w < 0 || bounds.h < 0 {
            return Err(Error::NegativeSize(bounds.size()));
        }
        let parent_flags = self.node(parent)?.flags;
        let mut flags = ComponentFlags::VISIBLE;
        if parent_flags.contains(ComponentFlags::REALIZED) {
            flags |= ComponentFlags::REALIZED;
        }
        let id = self.nodes.insert(Node {
            parent: Some(parent),
            children: SmallVec::new(),
            bounds,
            flags,
            widget,
        });
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Re-parents `child` (and its subtree) under `parent`.
    pub fn reparent(&mut self, child: ComponentId, parent: ComponentId) -> Result<()> {
        self.node(parent)?;
        let node = self.node(child)?;
        if node.flags.contains(ComponentFlags::TOP_LEVEL)
            || self.ancestors(parent).any(|a| a == child)
        {
            return Err(Error::NotAChild(child));
        }
        if let Some(old) = node.parent {
            self.nodes[old].children.retain(|c| *c != child);
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        let realized = self.nodes[parent].flags.contains(ComponentFlags::REALIZED);
        self.set_realized_subtree(child, realized);
        Ok(())
    }

    /// Removes `id` and its whole subtree, returning every removed id.
    pub fn remove(&mut self, id: ComponentId) -> Result<Vec<ComponentId>> {
        let parent = self.node(id)?.parent;
        if let Some(p) = parent {
            self.nodes[p].children.retain(|c| *c != id);
        }
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(next) {
                stack.extend(node.children);
                removed.push(next);
            }
        }
        Ok(removed)
    }

    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: ComponentId) -> &[ComponentId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn bounds(&self, id: ComponentId) -> Option<Rect> {
        self.nodes.get(id).map(|n| n.bounds)
    }

    pub fn size(&self, id: ComponentId) -> Option<Size> {
        self.bounds(id).map(|b| b.size())
    }

    pub fn set_bounds(&mut self, id: ComponentId, bounds: Rect) -> Result<()> {
        if bounds.w < 0 || bounds.h < 0 {
            return Err(Error::NegativeSize(bounds.size()));
        }
        self.node_mut(id)?.bounds = bounds;
        Ok(())
    }

    pub fn set_location(&mut self, id: ComponentId, at: Point) -> Result<()> {
        let node = self.node_mut(id)?;
        node.bounds = Rect::from_origin_size(at, node.bounds.size());
        Ok(())
    }

    pub fn flags(&self, id: ComponentId) -> ComponentFlags {
        self.nodes
            .get(id)
            .map(|n| n.flags)
            .unwrap_or(ComponentFlags::empty())
    }

    pub fn set_flag(&mut self, id: ComponentId, flag: ComponentFlags, on: bool) -> Result<()> {
        self.node_mut(id)?.flags.set(flag, on);
        Ok(())
    }

    pub fn set_visible(&mut self, id: ComponentId, visible: bool) -> Result<()> {
        self.set_flag(id, ComponentFlags::VISIBLE, visible)
    }

    pub fn set_opaque(&mut self, id: ComponentId, opaque: bool) -> Result<()> {
        self.set_flag(id, ComponentFlags::OPAQUE, opaque)
    }

    pub fn set_validate_root(&mut self, id: ComponentId, root: bool) -> Result<()> {
        self.set_flag(id, ComponentFlags::VALIDATE_ROOT, root)
    }

    pub fn set_iconified(&mut self, id: ComponentId, iconified: bool) -> Result<()> {
        self.set_flag(id, ComponentFlags::ICONIFIED, iconified)
    }

    /// Realizes or unrealizes `id` together with its subtree.
    pub fn set_realized(&mut self, id: ComponentId, realized: bool) -> Result<()> {
        self.node(id)?;
        self.set_realized_subtree(id, realized);
        Ok(())
    }

    fn set_realized_subtree(&mut self, id: ComponentId, realized: bool) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(next) {
                node.flags.set(ComponentFlags::REALIZED, realized);
                stack.extend(node.children.iter().copied());
            }
        }
    }

    pub fn is_opaque(&self, id: ComponentId) -> bool {
        self.flags(id).contains(ComponentFlags::OPAQUE)
    }

    pub fn widget(&self, id: ComponentId) -> Option<Arc<dyn Widget>> {
        self.nodes.get(id).map(|n| n.widget.clone())
    }

    /// Iterator over `id` and its ancestors, nearest first.
    pub fn ancestors(&self, id: ComponentId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.contains(id).then_some(id),
        }
    }

    /// The top-level window containing `id`, if any.
    pub fn window_of(&self, id: ComponentId) -> Option<ComponentId> {
        self.ancestors(id)
            .find(|c| self.flags(*c).contains(ComponentFlags::TOP_LEVEL))
    }

    /// Location of `id`'s origin in its window's coordinate space.
    pub fn offset_in_window(&self, id: ComponentId) -> Option<Point> {
        let mut offset = Point::ORIGIN;
        for c in self.ancestors(id) {
            let node = &self.nodes[c];
            if node.flags.contains(ComponentFlags::TOP_LEVEL) {
                return Some(offset);
            }
            offset = offset.offset(node.bounds.x, node.bounds.y);
        }
        None
    }

    /// Visible and realized up to a window that is not iconified.
    pub fn is_showing(&self, id: ComponentId) -> bool {
        for c in self.ancestors(id) {
            let flags = self.flags(c);
            if !flags.contains(ComponentFlags::VISIBLE | ComponentFlags::REALIZED) {
                return false;
            }
            if flags.contains(ComponentFlags::TOP_LEVEL) {
                return !flags.contains(ComponentFlags::ICONIFIED);
            }
        }
        false
    }

    /// Immutable snapshot of the visible subtree rooted at `id`.
    pub fn snapshot(&self, id: ComponentId) -> Option<PaintNode> {
        let node = self.nodes.get(id)?;
        let children = node
            .children
            .iter()
            .filter(|c| self.flags(**c).contains(ComponentFlags::VISIBLE))
            .filter_map(|c| self.snapshot(*c))
            .collect();
        Some(PaintNode {
            id,
            bounds: node.bounds,
            opaque: node.flags.contains(ComponentFlags::OPAQUE),
            widget: node.widget.clone(),
            children,
        })
    }

    fn node(&self, id: ComponentId) -> Result<&Node> {
        self.nodes.get(id).ok_or(Error::UnknownComponent(id))
    }

    fn node_mut(&mut self, id: ComponentId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(Error::UnknownComponent(id))
    }
}

pub struct Ancestors<'a> {
    tree: &'a ComponentTree,
    next: Option<ComponentId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ComponentId;

    fn next(&mut self) -> Option<ComponentId> {
        let cur = self.next?;
        self.next = self.tree.parent(cur);
        Some(cur)
    }
}

/// Frozen view of one component for the duration of a paint.
#[derive(Clone)]
pub struct PaintNode {
    pub id: ComponentId,
    /// Relative to the parent.
    pub bounds: Rect,
    pub opaque: bool,
    pub widget: Arc<dyn Widget>,
    /// Visible children, in paint order.
    pub children: Vec<PaintNode>,
}

impl std::fmt::Debug for PaintNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaintNode")
            .field("id", &self.id)
            .field("bounds", &self.bounds)
            .field("opaque", &self.opaque)
            .field("children", &self.children)
            .finish()
    }
}

impl PaintNode {
    /// Paints this node (and whatever its widget paints) into `g`, which must
    /// already be in this node's local space.
    pub fn paint(&self, g: &mut Graphics<'_>) {
        if g.clip_bounds().is_empty() {
            return;
        }
        let mut cx = PaintCx { node: self, g };
        self.widget.paint(&mut cx);
    }

    /// Paints the visible children into `g` (in this node's local space).
    pub fn paint_children(&self, g: &mut Graphics<'_>) {
        for child in &self.children {
            let mut cg = g.sub(child.bounds);
            child.paint(&mut cg);
        }
    }
}

/// What a [`Widget`] sees while painting.
pub struct PaintCx<'a, 'g> {
    node: &'a PaintNode,
    g: &'a mut Graphics<'g>,
}

impl<'a, 'g> PaintCx<'a, 'g> {
    pub fn id(&self) -> ComponentId {
        self.node.id
    }

    pub fn size(&self) -> Size {
        self.node.bounds.size()
    }

    pub fn node(&self) -> &'a PaintNode {
        self.node
    }

    pub fn children(&self) -> &'a [PaintNode] {
        &self.node.children
    }

    pub fn graphics(&mut self) -> &mut Graphics<'g> {
        self.g
    }

    /// Damaged area in local coordinates.
    pub fn clip(&self) -> Rect {
        self.g.clip_bounds()
    }

    pub fn paint_children(&mut self) {
        self.node.paint_children(self.g);
    }
}
