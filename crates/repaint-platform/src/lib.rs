//! Platform glue: one [`UiContext`] per independent UI.
//!
//! A context owns the component tree, the UI queue, the thread draining that
//! queue, and its repaint manager, which is created on first use. Nothing in
//! this workspace is process-global; two contexts in one process never share
//! damage, buffers or a dispatch thread.
//!
//! ```rust
//! use repaint_core::*;
//! use repaint_platform::UiContext;
//! use repaint_ui::{Panel, RepaintConfig};
//! use std::sync::Arc;
//!
//! let cx = UiContext::new(RepaintConfig::default());
//! cx.spawn_dispatch_thread().unwrap();
//!
//! let window = cx
//!     .tree()
//!     .write()
//!     .insert_window(Rect::new(0, 0, 64, 64), Arc::new(Panel::new(Color::WHITE)));
//! cx.repaint_manager().mark_completely_dirty(window);
//!
//! // Everything queued before this has been drained once it returns.
//! cx.invoke_and_wait(|| ()).unwrap();
//! cx.shutdown();
//! ```

use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use anyhow::{Context as _, bail};
use parking_lot::Mutex;
use repaint_core::{ComponentTree, EventQueue, SharedTree};
use repaint_ui::{RepaintConfig, RepaintManager};

pub const DISPATCH_THREAD_NAME: &str = "repaint-dispatch";

/// Installs `env_logger` (honouring `RUST_LOG`). Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

pub struct UiContext {
    tree: SharedTree,
    queue: EventQueue,
    config: RepaintConfig,
    manager: OnceLock<Arc<RepaintManager>>,
    dispatch: Mutex<Option<JoinHandle<()>>>,
}

impl Default for UiContext {
    fn default() -> Self {
        Self::new(RepaintConfig::default())
    }
}

impl UiContext {
    pub fn new(config: RepaintConfig) -> Self {
        Self {
            tree: ComponentTree::new().into_shared(),
            queue: EventQueue::new(),
            config,
            manager: OnceLock::new(),
            dispatch: Mutex::new(None),
        }
    }

    /// Context configured from `REPAINT_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(RepaintConfig::from_env())
    }

    pub fn tree(&self) -> &SharedTree {
        &self.tree
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// This context's repaint manager, created on first call.
    pub fn repaint_manager(&self) -> &Arc<RepaintManager> {
        self.manager.get_or_init(|| {
            log::debug!("creating repaint manager ({:?})", self.config);
            RepaintManager::new(self.tree.clone(), self.queue.clone(), self.config)
        })
    }

    /// Installs a custom manager before first use. It must have been built
    /// over this context's [`tree`](Self::tree) and [`queue`](Self::queue).
    /// Hands the manager back if one is already in place.
    pub fn set_repaint_manager(&self, rm: Arc<RepaintManager>) -> Result<(), Arc<RepaintManager>> {
        self.manager.set(rm)
    }

    /// Queues `f` to run on the dispatch thread.
    pub fn invoke_later(&self, f: impl FnOnce() + Send + 'static) -> repaint_core::Result<()> {
        self.queue.post(f)
    }

    /// Runs `f` on the dispatch thread and waits for its result.
    pub fn invoke_and_wait<R: Send + 'static>(
        &self,
        f: impl FnOnce() -> R + Send + 'static,
    ) -> repaint_core::Result<R> {
        self.queue.invoke_and_wait(f)
    }

    pub fn is_dispatch_thread(&self) -> bool {
        self.queue.is_dispatch_thread()
    }

    /// Starts the thread that drains the UI queue.
    pub fn spawn_dispatch_thread(&self) -> anyhow::Result<()> {
        let mut slot = self.dispatch.lock();
        if slot.is_some() {
            bail!("dispatch thread already running");
        }
        if self.queue.is_closed() {
            bail!("UI context has been shut down");
        }
        let queue = self.queue.clone();
        let handle = thread::Builder::new()
            .name(DISPATCH_THREAD_NAME.into())
            .spawn(move || queue.run())
            .context("spawning dispatch thread")?;
        *slot = Some(handle);
        Ok(())
    }

    /// Lets already queued work finish, closes the queue and joins the
    /// dispatch thread. Idempotent.
    pub fn shutdown(&self) {
        let handle = self.dispatch.lock().take();
        if let Some(handle) = handle {
            if !self.queue.is_closed() && !self.is_dispatch_thread() {
                if let Err(e) = self.queue.invoke_and_wait(|| ()) {
                    log::warn!("could not flush UI queue: {e}");
                }
            }
            self.queue.close();
            if handle.join().is_err() {
                log::error!("dispatch thread panicked");
            }
        } else {
            self.queue.close();
        }
    }
}

impl Drop for UiContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repaint_core::{Color, Error, Rect};
    use repaint_ui::Panel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn window(cx: &UiContext) -> repaint_core::ComponentId {
        cx.tree()
            .write()
            .insert_window(Rect::new(0, 0, 32, 32), Arc::new(Panel::new(Color::WHITE)))
    }

    #[test]
    fn manager_is_created_once_per_context() {
        let a = UiContext::default();
        let b = UiContext::default();
        assert!(Arc::ptr_eq(a.repaint_manager(), a.repaint_manager()));
        assert!(!Arc::ptr_eq(a.repaint_manager(), b.repaint_manager()));
    }

    #[test]
    fn custom_manager_must_come_first() {
        let cx = UiContext::default();
        let rm = RepaintManager::new(cx.tree().clone(), cx.queue().clone(), RepaintConfig::default());
        assert!(cx.set_repaint_manager(rm.clone()).is_ok());
        assert!(Arc::ptr_eq(cx.repaint_manager(), &rm));
        assert!(cx.set_repaint_manager(rm).is_err());
    }

    #[test]
    fn dispatch_thread_drains_damage() {
        let cx = UiContext::default();
        let w = window(&cx);
        let painted = Arc::new(AtomicUsize::new(0));
        {
            let painted = painted.clone();
            cx.repaint_manager()
                .set_paint_observer(move |roots| {
                    painted.fetch_add(roots.len(), Ordering::SeqCst);
                });
        }
        cx.spawn_dispatch_thread().unwrap();
        assert!(cx.spawn_dispatch_thread().is_err());

        cx.repaint_manager().mark_completely_dirty(w);
        cx.invoke_and_wait(|| ()).unwrap();
        assert_eq!(painted.load(Ordering::SeqCst), 1);

        let on_dispatch = cx
            .invoke_and_wait(|| thread::current().name().map(str::to_owned))
            .unwrap();
        assert_eq!(on_dispatch.as_deref(), Some(DISPATCH_THREAD_NAME));
        assert!(!cx.is_dispatch_thread());
        cx.shutdown();
    }

    #[test]
    fn shutdown_rejects_new_work() {
        let cx = UiContext::default();
        cx.spawn_dispatch_thread().unwrap();
        cx.shutdown();
        cx.shutdown();
        assert!(matches!(cx.invoke_later(|| ()), Err(Error::QueueClosed)));
        assert!(matches!(cx.invoke_and_wait(|| 1), Err(Error::QueueClosed)));
        assert!(cx.spawn_dispatch_thread().is_err());
    }

    #[test]
    fn init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}
