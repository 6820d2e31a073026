//! Virtual memory area and region bookkeeping.
//!
//! Grounded on `mm-vm.c`'s `get_vma_by_num`/`get_symrg_byid`/
//! `enlist_vm_freerg_list`/`validate_overlap_vm_area`, rebuilt over an
//! index-addressed arena rather than the original's linked list: VMAs
//! live in a plain `Vec` indexed directly by `vm_id`, and each VMA owns
//! its own free list instead of relying on a global list filtered by id.

use std::collections::VecDeque;

use crate::config::{PAGING_MAX_PGN, PAGING_MAX_SYMTBL_SZ};
use crate::error::{Error, Result};
use crate::pte::Pte;

/// A byte range `[start, end)` belonging to vma `vmaid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: usize,
    pub end: usize,
    pub vmaid: usize,
}

impl Region {
    pub fn new(start: usize, end: usize, vmaid: usize) -> Self {
        Self { start, end, vmaid }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A virtual memory area: one contiguous, growable segment (data or heap).
pub struct Vma {
    pub vm_id: usize,
    pub vm_start: usize,
    pub vm_end: usize,
    pub sbrk: usize,
    pub free_list: Vec<Region>,
}

impl Vma {
    fn new(vm_id: usize, vm_start: usize) -> Self {
        Self { vm_id, vm_start, vm_end: vm_start, sbrk: vm_start, free_list: Vec::new() }
    }
}

/// A process's memory-management context: page directory, vmas, named
/// region table, and FIFO replacement-tracking list.
pub struct Mm {
    pub pgd: Vec<Pte>,
    pub vmas: Vec<Vma>,
    pub symrgtbl: Vec<Option<Region>>,
    /// Head = most recently mapped pgn; tail = oldest. Victim selection
    /// pops from the tail.
    pub fifo_pgn: VecDeque<usize>,
}

impl Mm {
    /// Two vmas: data (id 0) and heap (id 1), each starting empty, with the
    /// heap reserved at `VMA_HEAP_START` so the data vma has room to grow
    /// without routinely butting up against the heap's reservation.
    pub fn new() -> Self {
        let data = Vma::new(crate::config::VMA_DATA, 0);
        let heap = Vma::new(crate::config::VMA_HEAP, crate::config::VMA_HEAP_START);
        Self {
            pgd: vec![Pte::EMPTY; PAGING_MAX_PGN],
            vmas: vec![data, heap],
            symrgtbl: vec![None; PAGING_MAX_SYMTBL_SZ],
            fifo_pgn: VecDeque::new(),
        }
    }

    pub fn vma(&self, vmaid: usize) -> Result<&Vma> {
        self.vmas.get(vmaid).ok_or(Error::InvalidVmaId)
    }

    pub fn vma_mut(&mut self, vmaid: usize) -> Result<&mut Vma> {
        self.vmas.get_mut(vmaid).ok_or(Error::InvalidVmaId)
    }

    /// Bound is exclusive: `0 <= rgid < PAGING_MAX_SYMTBL_SZ`. The
    /// original compared with `rgid > PAGING_MAX_SYMTBL_SZ`, an off-by-one
    /// that let `rgid == PAGING_MAX_SYMTBL_SZ` through.
    pub fn symrg(&self, rgid: usize) -> Result<&Option<Region>> {
        self.symrgtbl.get(rgid).ok_or(Error::InvalidRegionId)
    }

    pub fn symrg_mut(&mut self, rgid: usize) -> Result<&mut Option<Region>> {
        self.symrgtbl.get_mut(rgid).ok_or(Error::InvalidRegionId)
    }

    /// Pushes `rg` onto the free list of the vma it actually belongs to.
    pub fn enlist_free_region(&mut self, rg: Region) -> Result<()> {
        if rg.is_empty() {
            return Err(Error::NoFreeRegion);
        }
        let vmaid = rg.vmaid;
        self.vma_mut(vmaid)?.free_list.push(rg);
        Ok(())
    }

    /// Returns `Error::Overlap` if growing `vmaid` to `[lo, hi)` would reach
    /// into another vma's current extent. `vmaid`'s own vma is excluded:
    /// there is exactly one vma per id, so it can never be an "other" vma
    /// to collide with.
    pub fn validate_overlap(&self, vmaid: usize, lo: usize, hi: usize) -> Result<()> {
        for vma in &self.vmas {
            if vma.vm_id == vmaid {
                continue;
            }
            if lo < vma.vm_end && vma.vm_start < hi {
                return Err(Error::Overlap);
            }
        }
        Ok(())
    }

    /// Pushes a newly mapped page number to the head of the replacement
    /// tracking list.
    pub fn track_mapped(&mut self, pgn: usize) {
        self.fifo_pgn.push_front(pgn);
    }
}

impl Default for Mm {
    fn default() -> Self {
        Self::new()
    }
}
