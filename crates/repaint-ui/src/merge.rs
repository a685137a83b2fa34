//! Region merging: turning per-component damage into one paint per root.
//!
//! For every dirty component we walk up the parent chain, re-expressing the
//! damaged rectangle in each ancestor's coordinates and clipping it to that
//! ancestor's bounds. If the rectangle ever clips away the component
//! contributes nothing. Otherwise its damage is folded into the *paint target*:
//! the nearest opaque component at or above the highest dirty ancestor-or-self,
//! or the top of the chain if nothing there is opaque.
//!
//! A non-opaque component shows whatever is behind it, so it can only be
//! repainted correctly from an opaque ancestor; painting that ancestor also
//! repaints the descendant, so the descendant is never painted separately.
//!
//! "Dirty" always means dirty when the merge started. Targets gain entries
//! while the merge runs, and those must not turn into new absorption points.

use std::collections::HashSet;

use repaint_core::{ComponentId, ComponentTree, Rect};
use smallvec::SmallVec;

use crate::dirty::DirtyRegions;

pub type PaintRoots = SmallVec<[ComponentId; 8]>;

/// A candidate paint target found while walking up from a dirty component.
#[derive(Clone, Copy, Debug)]
struct Target {
    id: ComponentId,
    /// Offset from the dirty component's origin to this component's origin,
    /// expressed in this component's space.
    dx: i32,
    dy: i32,
    opaque: bool,
}

/// Folds the damage of `dirty_component` into its paint target and records
/// the target in `roots` (once).
///
/// `dirty_before` is the set of components that were dirty before the merge
/// began.
pub fn collect_dirty_components(
    tree: &ComponentTree,
    dirty: &mut DirtyRegions,
    dirty_before: &HashSet<ComponentId>,
    dirty_component: ComponentId,
    roots: &mut PaintRoots,
) {
    let Some(damage) = dirty.get(dirty_component) else {
        return;
    };
    let Some(mut bounds) = tree.bounds(dirty_component) else {
        return;
    };

    let mut tmp = damage.intersection(&Rect::from_size(bounds.size()));
    if tmp.is_empty() {
        return;
    }

    let mut chain: SmallVec<[Target; 16]> = SmallVec::new();
    chain.push(Target {
        id: dirty_component,
        dx: 0,
        dy: 0,
        opaque: tree.is_opaque(dirty_component),
    });
    let mut highest_dirty = 0;

    let (mut dx, mut dy) = (0i32, 0i32);
    let mut component = dirty_component;

    while let Some(parent) = tree.parent(component) {
        component = parent;

        dx = dx.saturating_add(bounds.x);
        dy = dy.saturating_add(bounds.y);
        tmp = tmp.translate(bounds.x, bounds.y);

        let Some(parent_bounds) = tree.bounds(component) else {
            return;
        };
        bounds = parent_bounds;
        tmp = tmp.intersection(&Rect::from_size(bounds.size()));
        if tmp.is_empty() {
            return;
        }

        if dirty_before.contains(&component) {
            highest_dirty = chain.len();
        }
        chain.push(Target {
            id: component,
            dx,
            dy,
            opaque: tree.is_opaque(component),
        });
    }

    let Some(target) = chain[highest_dirty..]
        .iter()
        .find(|t| t.opaque)
        .or_else(|| chain.last())
        .copied()
    else {
        return;
    };

    if target.id != dirty_component {
        // `tmp` is in the topmost ancestor's space; shift it into the target's.
        let r = tmp.translate(target.dx - dx, target.dy - dy);
        dirty.add(target.id, r);
    }

    if !roots.contains(&target.id) {
        roots.push(target.id);
    }
}

/// Runs [`collect_dirty_components`] for every entry in `dirty`, then clips
/// each root's accumulated rectangle to the root's own bounds.
///
/// Roots whose rectangle clips to nothing are dropped.
pub fn merge_dirty_regions(
    tree: &ComponentTree,
    dirty: &mut DirtyRegions,
) -> SmallVec<[(ComponentId, Rect); 8]> {
    let ids = dirty.ids();
    let dirty_before: HashSet<ComponentId> = ids.iter().copied().collect();
    let mut roots = PaintRoots::new();
    for id in ids {
        collect_dirty_components(tree, dirty, &dirty_before, id, &mut roots);
    }

    roots
        .into_iter()
        .filter_map(|root| {
            let local = Rect::from_size(tree.size(root)?);
            let r = dirty.get(root)?.intersection(&local);
            (!r.is_empty()).then_some((root, r))
        })
        .collect()
}
