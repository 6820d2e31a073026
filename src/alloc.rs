//! Region allocation, free, and byte access on behalf of a process.
//!
//! Grounded on `mm-vm.c`'s `__alloc`/`__free`/`__read`/`__write`,
//! `get_free_vmrg_area`, and `inc_vma_limit`.

use log::debug;

use crate::config::PAGING_ADDR_FPN_LOBIT;
use crate::error::{Error, Result};
use crate::frame::vm_map_ram;
use crate::paging::{pg_getval, pg_setval};
use crate::process::Process;
use crate::vm::Region;

fn align_up(size: usize, align: usize) -> usize {
    size.div_ceil(align) * align
}

/// First-fit search of `vmaid`'s free list. On an exact match the region
/// is removed; on an over-sized match it is shrunk from the left.
fn get_free_vmrg_area(process: &Process, vmaid: usize, size: usize) -> Result<Region> {
    let mut mm = process.mm.lock().unwrap();
    let vma = mm.vma_mut(vmaid)?;
    let pos = vma.free_list.iter().position(|rg| rg.start + size <= rg.end);
    match pos {
        Some(i) => {
            let rg = vma.free_list[i];
            let found = Region::new(rg.start, rg.start + size, vmaid);
            if rg.start + size < rg.end {
                vma.free_list[i].start += size;
            } else {
                vma.free_list.remove(i);
            }
            Ok(found)
        }
        None => Err(Error::NoFreeRegion),
    }
}

/// Extends vma `vmaid`'s limit by `inc_sz` (already page-aligned), mapping
/// the new pages into RAM. Returns the newly mapped region.
pub fn inc_vma_limit(process: &Process, vmaid: usize, inc_sz: usize) -> Result<Region> {
    let pagesz = 1usize << PAGING_ADDR_FPN_LOBIT;
    let incnumpage = inc_sz / pagesz;

    let (area_start, area_end, old_end) = {
        let mm = process.mm.lock().unwrap();
        let vma = mm.vma(vmaid)?;
        (vma.sbrk, vma.sbrk + inc_sz, vma.vm_end)
    };

    {
        let mm = process.mm.lock().unwrap();
        mm.validate_overlap(vmaid, area_start, area_end)?;
    }

    {
        let mut mm = process.mm.lock().unwrap();
        mm.vma_mut(vmaid)?.vm_end += inc_sz;
    }

    vm_map_ram(process, vmaid, old_end, incnumpage)
}

/// Allocates `size` bytes in vma `vmaid`, recording the region under
/// `rgid` in the symbol table.
pub fn alloc(process: &Process, vmaid: usize, rgid: usize, size: usize) -> Result<usize> {
    if let Ok(rg) = get_free_vmrg_area(process, vmaid, size) {
        let mut mm = process.mm.lock().unwrap();
        *mm.symrg_mut(rgid)? = Some(rg);
        debug!("alloc: region {} at {} (from free list)", rgid, rg.start);
        return Ok(rg.start);
    }

    let pagesz = 1usize << PAGING_ADDR_FPN_LOBIT;
    let inc_sz = align_up(size, pagesz);
    let old_sbrk = process.mm.lock().unwrap().vma(vmaid)?.sbrk;

    let grown = inc_vma_limit(process, vmaid, inc_sz)?;

    let mut mm = process.mm.lock().unwrap();
    *mm.symrg_mut(rgid)? = Some(Region::new(old_sbrk, old_sbrk + size, vmaid));
    if old_sbrk + size < grown.end {
        mm.enlist_free_region(Region::new(old_sbrk + size, grown.end, vmaid))?;
    }
    mm.vma_mut(vmaid)?.sbrk = old_sbrk + size;
    debug!("alloc: region {} at {} (grew vma {})", rgid, old_sbrk, vmaid);
    Ok(old_sbrk)
}

/// Frees region `rgid`, returning its range to its owning vma's free list.
///
/// Does not coalesce with adjacent free regions: the original never did,
/// and no testable property here depends on coalescing changing
/// allocation order.
pub fn free(process: &Process, rgid: usize) -> Result<()> {
    let mut mm = process.mm.lock().unwrap();
    let rg = (*mm.symrg(rgid)?).ok_or(Error::InvalidRegionId)?;
    mm.enlist_free_region(rg)?;
    *mm.symrg_mut(rgid)? = None;
    Ok(())
}

/// Reads one byte at `offset` into region `rgid`.
pub fn read(process: &Process, rgid: usize, offset: usize) -> Result<u8> {
    let rg = (*process.mm.lock().unwrap().symrg(rgid)?).ok_or(Error::InvalidRegionId)?;
    pg_getval(process, rg.start + offset)
}

/// Writes one byte at `offset` into region `rgid`.
pub fn write(process: &Process, rgid: usize, offset: usize, value: u8) -> Result<()> {
    let rg = (*process.mm.lock().unwrap().symrg(rgid)?).ok_or(Error::InvalidRegionId)?;
    pg_setval(process, rg.start + offset, value)
}

/// Allocates in the data vma (id 0).
pub fn pgalloc(process: &Process, size: usize, reg_index: usize) -> Result<usize> {
    alloc(process, crate::config::VMA_DATA, reg_index, size)
}

/// Allocates in the heap vma (id 1).
pub fn pgmalloc(process: &Process, size: usize, reg_index: usize) -> Result<usize> {
    alloc(process, crate::config::VMA_HEAP, reg_index, size)
}

pub fn pgfree_data(process: &Process, reg_index: usize) -> Result<()> {
    free(process, reg_index)
}

pub fn pgread(process: &Process, source: usize, offset: usize) -> Result<u8> {
    read(process, source, offset)
}

pub fn pgwrite(process: &Process, data: u8, destination: usize, offset: usize) -> Result<()> {
    write(process, destination, offset, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memphy::MemPhy;
    use std::sync::Arc;

    fn new_process() -> std::sync::Arc<Process> {
        let mram = Arc::new(MemPhy::new(64));
        let swp = Arc::new(MemPhy::new(64));
        Process::new(1, 0, mram, swp)
    }

    #[test]
    fn alloc_then_free_then_reuse() {
        let p = new_process();
        // a page-sized request leaves no remainder in the free list, so
        // freeing and reallocating the same size must hand back the exact
        // same address.
        let a1 = pgalloc(&p, 256, 0).unwrap();
        pgfree_data(&p, 0).unwrap();
        let a2 = pgalloc(&p, 256, 1).unwrap();
        assert_eq!(a1, a2, "freed region should be reused by the next allocation");
    }

    #[test]
    fn alloc_addresses_are_monotonic_without_free() {
        let p = new_process();
        let a1 = pgalloc(&p, 8, 0).unwrap();
        let a2 = pgalloc(&p, 8, 1).unwrap();
        assert!(a2 >= a1 + 8);
    }

    #[test]
    fn read_write_roundtrip_across_regions() {
        let p = new_process();
        pgalloc(&p, 8, 0).unwrap();
        pgwrite(&p, 0x55, 0, 3).unwrap();
        assert_eq!(pgread(&p, 0, 3).unwrap(), 0x55);
    }

    #[test]
    fn free_unknown_region_errors() {
        let p = new_process();
        assert_eq!(pgfree_data(&p, 0), Err(Error::InvalidRegionId));
    }

    #[test]
    fn alloc_grown_regions_do_not_overlap() {
        let p = new_process();
        let heap1 = pgmalloc(&p, 20, 0).unwrap();
        let heap2 = pgmalloc(&p, 20, 1).unwrap();
        assert!(heap2 >= heap1 + 20);
    }

    #[test]
    fn repeated_growth_in_one_vma_does_not_false_positive_overlap() {
        let p = new_process();
        // neither request is page-aligned, so both go through the grow
        // path (get_free_vmrg_area misses); the second request can't be
        // served from the first's leftover free-list fragment either, so
        // it also grows. Nothing else occupies the grown range, so this
        // must succeed.
        pgalloc(&p, 8, 0).unwrap();
        pgalloc(&p, 300, 1).unwrap();
    }

    #[test]
    fn growth_reaching_into_the_heap_reservation_errors() {
        let p = new_process();
        let heap_start = { p.mm.lock().unwrap().vma(crate::config::VMA_HEAP).unwrap().vm_start };
        // a single data-vma growth request that reaches past the heap's
        // reserved starting address is a genuine overlap, not a
        // self-comparison artifact.
        assert_eq!(pgalloc(&p, heap_start + 1, 0), Err(Error::Overlap));
    }
}
