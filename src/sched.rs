//! Scheduler: multi-level priority queue with slot-based fairness, or a
//! single ready/run queue fallback.
//!
//! Grounded on `sched.c`. Both policies share one `Scheduler` type here
//! rather than the original's compile-time `#ifdef MLQ_SCHED` split, so a
//! single binary can construct either at runtime (useful for exercising
//! both in tests); the `mlq` Cargo feature only picks the default.

use std::sync::{Arc, Mutex};

use crate::config::MAX_PRIO;
use crate::process::Process;
use crate::queue::Queue;

enum Inner {
    Mlq { queues: Vec<Queue>, slots: Vec<usize> },
    Single { ready: Queue, run: Queue },
}

pub struct Scheduler {
    inner: Mutex<Inner>,
}

impl Scheduler {
    /// MLQ policy: `MAX_PRIO` priority levels, slot quantum `MAX_PRIO - p`.
    pub fn new_mlq() -> Self {
        let queues = (0..MAX_PRIO).map(|_| Queue::new()).collect();
        let slots = (0..MAX_PRIO).map(|p| MAX_PRIO - p).collect();
        Self { inner: Mutex::new(Inner::Mlq { queues, slots }) }
    }

    /// Single ready/run queue fallback policy.
    pub fn new_single() -> Self {
        Self { inner: Mutex::new(Inner::Single { ready: Queue::new(), run: Queue::new() }) }
    }

    /// Constructs the scheduler using whichever policy the `mlq` feature
    /// selects as default.
    #[cfg(feature = "mlq")]
    pub fn new() -> Self {
        Self::new_mlq()
    }

    #[cfg(not(feature = "mlq"))]
    pub fn new() -> Self {
        Self::new_single()
    }

    pub fn queue_empty(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        match &*inner {
            Inner::Mlq { queues, .. } => queues.iter().all(|q| q.is_empty()),
            Inner::Single { ready, run } => ready.is_empty() && run.is_empty(),
        }
    }

    /// Admits a new process (MLQ: its priority queue; single-queue: the
    /// ready queue).
    pub fn add_proc(&self, proc: Arc<Process>) {
        let mut inner = self.inner.lock().unwrap();
        match &mut *inner {
            Inner::Mlq { queues, .. } => queues[proc.prio].enqueue(proc),
            Inner::Single { ready, .. } => ready.enqueue(proc),
        }
    }

    /// Re-admits a preempted process (MLQ: its priority queue; single-queue:
    /// the run queue, to be drained back into ready on the next `get_proc`).
    pub fn put_proc(&self, proc: Arc<Process>) {
        let mut inner = self.inner.lock().unwrap();
        match &mut *inner {
            Inner::Mlq { queues, .. } => queues[proc.prio].enqueue(proc),
            Inner::Single { run, .. } => run.enqueue(proc),
        }
    }

    /// Selects the next process to run, or `None` if every queue is empty.
    pub fn get_proc(&self) -> Option<Arc<Process>> {
        let mut inner = self.inner.lock().unwrap();
        match &mut *inner {
            Inner::Mlq { queues, slots } => {
                if slots.iter().all(|&s| s == 0) {
                    for (p, slot) in slots.iter_mut().enumerate() {
                        *slot = MAX_PRIO - p;
                    }
                }
                for (p, queue) in queues.iter_mut().enumerate() {
                    if !queue.is_empty() && slots[p] > 0 {
                        let proc = queue.dequeue();
                        if proc.is_some() {
                            slots[p] -= 1;
                        }
                        return proc;
                    }
                }
                None
            }
            Inner::Single { ready, run } => {
                if ready.is_empty() {
                    while let Some(p) = run.dequeue() {
                        ready.enqueue(p);
                    }
                }
                ready.dequeue()
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
