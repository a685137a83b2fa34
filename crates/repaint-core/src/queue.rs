//! # UI event queue
//!
//! A FIFO of boxed tasks consumed by exactly one dispatch thread. Any thread may
//! [`post`](EventQueue::post); only the thread inside [`run`](EventQueue::run)
//! (or a test pumping with [`run_pending`](EventQueue::run_pending)) executes.
//!
//! Posting never blocks beyond the queue lock. A task that panics is caught and
//! logged; the loop keeps going, so one misbehaving callback cannot wedge
//! every window sharing the queue.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

use crate::error::panic_message;
use crate::{Error, Result};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Clone, Default)]
pub struct EventQueue {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<QueueState>,
    ready: Condvar,
}

#[derive(Default)]
struct QueueState {
    tasks: VecDeque<Task>,
    closed: bool,
    dispatch_thread: Option<ThreadId>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `task` to the end of the queue.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) -> Result<()> {
        let mut st = self.inner.state.lock();
        if st.closed {
            return Err(Error::QueueClosed);
        }
        st.tasks.push_back(Box::new(task));
        drop(st);
        self.inner.ready.notify_one();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Stops accepting tasks and discards whatever is still queued.
    pub fn close(&self) {
        let dropped = {
            let mut st = self.inner.state.lock();
            st.closed = true;
            std::mem::take(&mut st.tasks)
        };
        if !dropped.is_empty() {
            log::debug!("event queue closed, discarding {} task(s)", dropped.len());
        }
        // Dropped outside the lock: task destructors may post or signal.
        drop(dropped);
        self.inner.ready.notify_all();
    }

    pub fn is_dispatch_thread(&self) -> bool {
        self.inner.state.lock().dispatch_thread == Some(thread::current().id())
    }

    /// Runs tasks on the calling thread until the queue is closed.
    pub fn run(&self) {
        self.inner.state.lock().dispatch_thread = Some(thread::current().id());
        log::debug!("dispatch loop started on {:?}", thread::current().name());
        loop {
            let task = {
                let mut st = self.inner.state.lock();
                loop {
                    if st.closed {
                        st.dispatch_thread = None;
                        log::debug!("dispatch loop finished");
                        return;
                    }
                    if let Some(t) = st.tasks.pop_front() {
                        break t;
                    }
                    self.inner.ready.wait(&mut st);
                }
            };
            run_task(task);
        }
    }

    /// Runs the tasks queued at the time of the call on the current thread and
    /// returns how many ran. Tasks they post are left for the next call.
    pub fn run_pending(&self) -> usize {
        let (batch, previous) = {
            let mut st = self.inner.state.lock();
            let batch = st.tasks.len();
            let previous = st.dispatch_thread.replace(thread::current().id());
            (batch, previous)
        };
        let mut ran = 0;
        for _ in 0..batch {
            let Some(task) = self.inner.state.lock().tasks.pop_front() else {
                break;
            };
            run_task(task);
            ran += 1;
        }
        self.inner.state.lock().dispatch_thread = previous;
        ran
    }

    /// Keeps pumping until no task is queued. Returns the total run.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let n = self.run_pending();
            if n == 0 {
                return total;
            }
            total += n;
        }
    }

    /// Runs `f` on the dispatch thread and blocks until it returns.
    pub fn invoke_and_wait<R: Send + 'static>(
        &self,
        f: impl FnOnce() -> R + Send + 'static,
    ) -> Result<R> {
        if self.is_dispatch_thread() {
            return Err(Error::WouldDeadlock);
        }
        let reply = Arc::new(Reply::default());
        let sender = ReplySender {
            reply: reply.clone(),
            sent: false,
        };
        self.post(move || {
            let mut sender = sender;
            let outcome = catch_unwind(AssertUnwindSafe(f))
                .map_err(|payload| Error::TaskPanicked(panic_message(payload.as_ref())));
            sender.send(outcome);
        })?;
        reply.wait()
    }
}

fn run_task(task: Task) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
        log::error!(
            "dispatched task panicked: {}",
            panic_message(payload.as_ref())
        );
    }
}

struct Reply<R> {
    slot: Mutex<Option<Result<R>>>,
    done: Condvar,
}

impl<R> Default for Reply<R> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
            done: Condvar::new(),
        }
    }
}

impl<R> Reply<R> {
    fn wait(&self) -> Result<R> {
        let mut slot = self.slot.lock();
        loop {
            if let Some(outcome) = slot.take() {
                return outcome;
            }
            self.done.wait(&mut slot);
        }
    }
}

/// Completes the reply exactly once; a task dropped unrun (queue closed)
/// resolves the waiter with `QueueClosed`.
struct ReplySender<R> {
    reply: Arc<Reply<R>>,
    sent: bool,
}

impl<R> ReplySender<R> {
    fn send(&mut self, outcome: Result<R>) {
        *self.reply.slot.lock() = Some(outcome);
        self.sent = true;
        self.reply.done.notify_all();
    }
}

impl<R> Drop for ReplySender<R> {
    fn drop(&mut self) {
        if !self.sent {
            self.send(Err(Error::QueueClosed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn tasks_run_in_post_order() {
        let q = EventQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            q.post(move || log.lock().push(i)).unwrap();
        }
        assert_eq!(q.run_pending(), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn run_pending_leaves_reposted_tasks() {
        let q = EventQueue::new();
        let q2 = q.clone();
        q.post(move || {
            q2.post(|| {}).unwrap();
        })
        .unwrap();
        assert_eq!(q.run_pending(), 1);
        assert_eq!(q.len(), 1);
        assert_eq!(q.run_until_idle(), 1);
    }

    #[test]
    fn post_after_close_fails() {
        let q = EventQueue::new();
        q.close();
        assert!(matches!(q.post(|| {}), Err(Error::QueueClosed)));
    }

    #[test]
    fn panicking_task_does_not_stop_the_queue() {
        let q = EventQueue::new();
        let hits = Arc::new(AtomicUsize::new(0));
        q.post(|| panic!("boom")).unwrap();
        let h = hits.clone();
        q.post(move || {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(q.run_pending(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invoke_and_wait_round_trips_through_dispatch_thread() {
        let q = EventQueue::new();
        let runner = q.clone();
        let handle = thread::spawn(move || runner.run());
        let probe = q.clone();
        let on_dispatch = q
            .invoke_and_wait(move || probe.is_dispatch_thread())
            .unwrap();
        assert!(on_dispatch);
        assert_eq!(q.invoke_and_wait(|| 40 + 2).unwrap(), 42);
        q.close();
        handle.join().unwrap();
    }

    #[test]
    fn invoke_and_wait_from_dispatch_thread_is_rejected() {
        let q = EventQueue::new();
        let inner = q.clone();
        let seen = Arc::new(Mutex::new(None));
        let s = seen.clone();
        q.post(move || {
            *s.lock() = Some(matches!(
                inner.invoke_and_wait(|| ()),
                Err(Error::WouldDeadlock)
            ));
        })
        .unwrap();
        q.run_pending();
        assert_eq!(*seen.lock(), Some(true));
    }

    #[test]
    fn invoke_and_wait_reports_panics() {
        let q = EventQueue::new();
        let runner = q.clone();
        let handle = thread::spawn(move || runner.run());
        let err = q.invoke_and_wait(|| -> u32 { panic!("bad layout") }).unwrap_err();
        assert!(matches!(err, Error::TaskPanicked(ref m) if m == "bad layout"));
        q.close();
        handle.join().unwrap();
    }

    #[test]
    fn discarded_task_resolves_waiter() {
        let q = EventQueue::new();
        let waiter = {
            let q = q.clone();
            thread::spawn(move || q.invoke_and_wait(|| 1))
        };
        while q.is_empty() {
            thread::yield_now();
        }
        q.close();
        assert!(matches!(waiter.join().unwrap(), Err(Error::QueueClosed)));
    }
}
