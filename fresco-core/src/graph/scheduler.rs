//! Update Scheduler
//!
//! The scheduler coalesces update work: any number of synchronous mutations
//! within one tick collapse into at most one queued job per subscriber.
//!
//! # Algorithm
//!
//! 1. A reactive trigger asks the subscriber to schedule itself; subscribers
//!    with a scheduler override enqueue a job keyed by their subscriber ID.
//! 2. Enqueueing a key that is already pending is a no-op. This is the
//!    coalescing guarantee a render effect needs (several property writes
//!    inside one event handler produce a single render+patch pass).
//! 3. `flush` drains the queue in FIFO order until it is empty, tolerating
//!    jobs that enqueue further jobs. A flush started while another flush is
//!    draining is a no-op; the outer drain picks up the new work.
//!
//! The queue never blocks and never runs work on another thread; flushing is
//! the cooperative "next tick" boundary of the framework.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A unit of deferred work, keyed for deduplication.
struct Job {
    key: u64,
    run: Box<dyn FnOnce() + Send>,
}

/// The tick queue: pending jobs plus the dedup set of their keys.
#[derive(Default)]
pub struct TickQueue {
    queue: Mutex<VecDeque<Job>>,
    pending: Mutex<HashSet<u64>>,
    flushing: AtomicBool,
}

/// Resets the flushing flag even if a job panics mid-drain.
struct FlushGuard<'a>(&'a AtomicBool);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl TickQueue {
    /// Create a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a job under the given key.
    ///
    /// Returns `true` if the job was queued, `false` if a job with the same
    /// key is already pending (the new job is dropped: at most one update
    /// per subscriber per tick).
    pub fn enqueue(&self, key: u64, run: impl FnOnce() + Send + 'static) -> bool {
        {
            let mut pending = self.pending.lock().expect("pending lock poisoned");
            if !pending.insert(key) {
                return false;
            }
        }

        self.queue
            .lock()
            .expect("queue lock poisoned")
            .push_back(Job {
                key,
                run: Box::new(run),
            });
        true
    }

    /// Drain the queue, running every pending job in FIFO order.
    ///
    /// Jobs enqueued while draining are processed in the same flush. Calling
    /// `flush` from within a running job is a no-op.
    pub fn flush(&self) {
        if self.flushing.swap(true, Ordering::SeqCst) {
            return;
        }
        let _guard = FlushGuard(&self.flushing);

        loop {
            let job = {
                let mut queue = self.queue.lock().expect("queue lock poisoned");
                queue.pop_front()
            };

            let Some(job) = job else {
                break;
            };

            // Clear the dedup entry before running so the job itself may
            // re-schedule its key for a later tick.
            self.pending
                .lock()
                .expect("pending lock poisoned")
                .remove(&job.key);

            (job.run)();
        }
    }

    /// Number of jobs currently pending.
    pub fn len(&self) -> usize {
        self.queue.lock().expect("queue lock poisoned").len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;
    use std::sync::Arc;

    #[test]
    fn enqueue_and_flush_runs_jobs_in_order() {
        let queue = TickQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3u64 {
            let order = order.clone();
            queue.enqueue(i, move || order.lock().unwrap().push(i));
        }

        queue.flush();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn duplicate_keys_coalesce() {
        let queue = TickQueue::new();
        let count = Arc::new(AtomicI32::new(0));

        for _ in 0..5 {
            let count = count.clone();
            queue.enqueue(7, move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(queue.len(), 1);
        queue.flush();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn job_can_requeue_its_own_key() {
        let queue = Arc::new(TickQueue::new());
        let count = Arc::new(AtomicI32::new(0));

        let q = queue.clone();
        let c = count.clone();
        queue.enqueue(1, move || {
            c.fetch_add(1, Ordering::SeqCst);
            let c2 = c.clone();
            // Requeue under the same key; drained in the same flush.
            q.enqueue(1, move || {
                c2.fetch_add(1, Ordering::SeqCst);
            });
        });

        queue.flush();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn reentrant_flush_is_a_noop() {
        let queue = Arc::new(TickQueue::new());
        let count = Arc::new(AtomicI32::new(0));

        let q = queue.clone();
        let c = count.clone();
        queue.enqueue(1, move || {
            c.fetch_add(1, Ordering::SeqCst);
            // Flushing from inside a job must not recurse into the drain.
            q.flush();
        });

        queue.flush();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
