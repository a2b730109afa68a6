//! Microtask queue.
//!
//! Microtasks run in FIFO order at a checkpoint, after the current task has
//! finished. A microtask may queue further microtasks; the checkpoint keeps
//! draining until the queue is empty. Mutation observer delivery and deferred
//! button actions are scheduled here.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::logging::targets;

/// A unique identifier for a queued microtask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MicrotaskId(u64);

impl MicrotaskId {
    /// Get the raw u64 value of this id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

static NEXT_MICROTASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_microtask_id() -> MicrotaskId {
    MicrotaskId(NEXT_MICROTASK_ID.fetch_add(1, Ordering::Relaxed))
}

type BoxedTask = Box<dyn FnOnce() + Send + 'static>;

struct TaskData {
    id: MicrotaskId,
    task: BoxedTask,
}

/// FIFO queue of deferred closures.
///
/// The queue lock is released while each task runs, so tasks may freely queue
/// or cancel other tasks.
pub struct MicrotaskQueue {
    tasks: Mutex<VecDeque<TaskData>>,
    /// Set while a checkpoint is draining the queue.
    running: AtomicBool,
}

impl Default for MicrotaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MicrotaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
            running: AtomicBool::new(false),
        }
    }

    /// Queue a microtask.
    pub fn post<F>(&self, task: F) -> MicrotaskId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = next_microtask_id();
        self.tasks.lock().push_back(TaskData {
            id,
            task: Box::new(task),
        });
        tracing::trace!(target: targets::MICROTASK, id = id.as_u64(), "queued microtask");
        id
    }

    /// Cancel a pending microtask.
    ///
    /// Returns `true` if the task was found and cancelled.
    pub fn cancel(&self, id: MicrotaskId) -> bool {
        let mut tasks = self.tasks.lock();
        if let Some(pos) = tasks.iter().position(|t| t.id == id) {
            tasks.remove(pos);
            true
        } else {
            false
        }
    }

    /// Get the number of pending microtasks.
    pub fn pending_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Run microtasks until the queue is empty.
    ///
    /// A checkpoint reached from inside a running microtask returns
    /// immediately; the outer checkpoint picks up anything newly queued.
    /// Returns the number of tasks run.
    pub fn run_until_empty(&self) -> usize {
        if self.running.swap(true, Ordering::SeqCst) {
            return 0;
        }
        let mut count = 0;
        loop {
            let next = self.tasks.lock().pop_front();
            let Some(task_data) = next else {
                break;
            };
            tracing::trace!(target: targets::MICROTASK, id = task_data.id.as_u64(), "running microtask");
            (task_data.task)();
            count += 1;
        }
        self.running.store(false, Ordering::SeqCst);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fifo_order() {
        let queue = MicrotaskQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let log = log.clone();
            queue.post(move || log.lock().push(n));
        }
        assert_eq!(queue.pending_count(), 3);
        assert_eq!(queue.run_until_empty(), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_cancel() {
        let queue = MicrotaskQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_a = log.clone();
        let a = queue.post(move || log_a.lock().push("a"));
        let log_b = log.clone();
        queue.post(move || log_b.lock().push("b"));

        assert!(queue.cancel(a));
        assert!(!queue.cancel(a));
        queue.run_until_empty();
        assert_eq!(*log.lock(), vec!["b"]);
    }

    #[test]
    fn test_tasks_queued_during_checkpoint_run() {
        let queue = Arc::new(MicrotaskQueue::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_queue = queue.clone();
        let inner_log = log.clone();
        queue.post(move || {
            inner_log.lock().push(1);
            let nested_log = inner_log.clone();
            inner_queue.post(move || nested_log.lock().push(3));
            // Nested checkpoint is a no-op
            assert_eq!(inner_queue.run_until_empty(), 0);
        });
        let log_two = log.clone();
        queue.post(move || log_two.lock().push(2));

        assert_eq!(queue.run_until_empty(), 3);
        assert_eq!(*log.lock(), vec![1, 2, 3]);
    }
}
