//! Work-request coalescing.
//!
//! Each top-level window gets one [`WorkRequest`] record. Asking for work on a
//! window that already has a callback queued is a no-op, so any number of
//! damage reports between two drains schedule exactly one validate-and-paint
//! callback. The pending flag is cleared by the callback itself, under the
//! record's own lock, just before it drains.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use repaint_core::{ComponentId, EventQueue};

use crate::RepaintManager;

#[derive(Debug, Default)]
struct WorkRequest {
    pending: Mutex<bool>,
}

pub(crate) struct WorkRequests {
    queue: EventQueue,
    roots: Mutex<HashMap<ComponentId, Arc<WorkRequest>>>,
}

impl WorkRequests {
    pub(crate) fn new(queue: EventQueue) -> Self {
        Self {
            queue,
            roots: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Schedules `manager`'s drain for `root` unless one is already pending.
    /// Returns true if a callback was posted.
    pub(crate) fn queue_component_work_request(
        &self,
        root: ComponentId,
        manager: Weak<RepaintManager>,
    ) -> bool {
        let req = self.roots.lock().entry(root).or_default().clone();

        let mut pending = req.pending.lock();
        if *pending {
            return false;
        }
        *pending = true;

        let record = req.clone();
        let posted = self.queue.post(move || {
            *record.pending.lock() = false;
            if let Some(rm) = manager.upgrade() {
                rm.validate_invalid_components();
                rm.paint_dirty_regions();
            }
        });

        match posted {
            Ok(()) => true,
            Err(e) => {
                // Roll back so the next request for this root is not swallowed.
                *pending = false;
                log::debug!("work request for {root:?} not scheduled: {e}");
                false
            }
        }
    }

    pub(crate) fn is_pending(&self, root: ComponentId) -> bool {
        self.roots
            .lock()
            .get(&root)
            .is_some_and(|req| *req.pending.lock())
    }

    pub(crate) fn forget(&self, root: ComponentId) {
        self.roots.lock().remove(&root);
    }
}
