use std::collections::HashMap;

use repaint_core::{ComponentId, Rect};

/// Accumulated damage per component, in each component's local coordinates.
///
/// An entry is never empty: adding an empty rect is ignored and cleaning
/// removes the entry instead of zeroing it.
#[derive(Debug, Default, Clone)]
pub struct DirtyRegions {
    regions: HashMap<ComponentId, Rect>,
}

impl DirtyRegions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: ComponentId) -> Option<Rect> {
        self.regions.get(&id).copied()
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.regions.contains_key(&id)
    }

    /// Unions `r` into an existing entry. Returns false if `id` has none.
    pub fn union_existing(&mut self, id: ComponentId, r: Rect) -> bool {
        match self.regions.get_mut(&id) {
            Some(existing) => {
                *existing = existing.union(&r);
                true
            }
            None => false,
        }
    }

    /// Unions `r` into the entry for `id`, creating it if needed. Returns true
    /// when a new entry was created.
    pub fn add(&mut self, id: ComponentId, r: Rect) -> bool {
        if r.is_empty() {
            return false;
        }
        if self.union_existing(id, r) {
            return false;
        }
        self.regions.insert(id, r);
        true
    }

    pub fn remove(&mut self, id: ComponentId) -> Option<Rect> {
        self.regions.remove(&id)
    }

    /// Moves every entry out, leaving the store empty for new damage.
    pub fn take(&mut self) -> DirtyRegions {
        std::mem::take(self)
    }

    pub fn ids(&self) -> Vec<ComponentId> {
        self.regions.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, Rect)> + '_ {
        self.regions.iter().map(|(id, r)| (*id, *r))
    }
}
