//! Process control block.
//!
//! Grounded on `kernel/src/processtable.rs`'s `Process` struct: there, a
//! fixed-size global table of `Process` slots backs lookups by pid. This
//! simulator has no fixed process-table ceiling in its spec, so each
//! `Process` is instead owned directly via `Arc` and passed between
//! scheduler queues and worker threads by cloning the handle, rather than
//! indexing into a global array.

use std::sync::{Arc, Mutex};

use crate::memphy::MemPhy;
use crate::vm::Mm;

/// A process: its memory-management context plus the physical devices it
/// allocates from. Shared between the scheduler and worker threads as
/// `Arc<Process>`.
pub struct Process {
    pub pid: usize,
    pub prio: usize,
    pub mm: Mutex<Mm>,
    pub mram: Arc<MemPhy>,
    pub active_mswp: Arc<MemPhy>,
}

impl Process {
    pub fn new(pid: usize, prio: usize, mram: Arc<MemPhy>, active_mswp: Arc<MemPhy>) -> Arc<Self> {
        Arc::new(Self { pid, prio, mm: Mutex::new(Mm::new()), mram, active_mswp })
    }

    /// Returns every frame currently held by this process, in RAM and in
    /// swap, to their respective free lists. Rust's ownership model makes
    /// this deterministic at drop time without the original's explicit
    /// `free_pcb_memph` callback, but it is exposed explicitly here so a
    /// driver can reclaim memory before a `Process` is actually dropped.
    pub fn free_all(&self) {
        let mm = self.mm.lock().unwrap();
        for pte in &mm.pgd {
            if !pte.is_present() {
                continue;
            }
            if pte.is_swapped() {
                let (_, swpoff) = pte.swp();
                self.active_mswp.put_freefp(swpoff);
            } else {
                self.mram.put_freefp(pte.fpn());
            }
        }
    }
}
