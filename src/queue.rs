//! Bounded process queue.
//!
//! Grounded on `queue.c`. A queue only ever holds processes from a single
//! priority bucket in this design (the MLQ scheduler keeps one `Queue` per
//! priority level), so the original's priority-comparison scan degenerates
//! to a FIFO pop of the front — documented here rather than special-cased,
//! matching how the comparison is a no-op in the common case upstream.

use std::sync::Arc;

use log::warn;

use crate::config::MAX_QUEUE_SIZE;
use crate::process::Process;

#[derive(Default)]
pub struct Queue {
    procs: Vec<Arc<Process>>,
}

impl Queue {
    pub fn new() -> Self {
        Self { procs: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    /// Silently drops the process (after logging) when the queue is full,
    /// matching the original's diagnostic-only full-queue handling.
    pub fn enqueue(&mut self, proc: Arc<Process>) {
        if self.procs.len() >= MAX_QUEUE_SIZE {
            warn!("queue is full, cannot enqueue process {}", proc.pid);
            return;
        }
        self.procs.push(proc);
    }

    pub fn dequeue(&mut self) -> Option<Arc<Process>> {
        if self.procs.is_empty() {
            return None;
        }
        Some(self.procs.remove(0))
    }
}
