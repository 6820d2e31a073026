//! Tunables shared by the paging core and the scheduler, collected in one
//! place so an external driver crate can read them without duplicating
//! magic numbers.

/// Bytes per page. Must be a power of two.
pub const PAGING_PAGESZ: usize = 256;

/// log2(PAGING_PAGESZ): number of low bits of a physical address spent on
/// the in-page offset, i.e. the shift applied to a frame number to get its
/// base byte address.
pub const PAGING_ADDR_FPN_LOBIT: u32 = 8;

/// Number of page-table entries per process (size of the page directory).
pub const PAGING_MAX_PGN: usize = 512;

/// Number of named regions a process may track at once.
pub const PAGING_MAX_SYMTBL_SZ: usize = 30;

/// Number of distinct scheduler priority levels (0 = highest).
pub const MAX_PRIO: usize = 140;

/// Maximum number of processes a single scheduler queue may hold.
pub const MAX_QUEUE_SIZE: usize = 10;

/// vma id of the data segment.
pub const VMA_DATA: usize = 0;
/// vma id of the heap segment.
pub const VMA_HEAP: usize = 1;

/// Initial virtual address the heap vma starts at: half the addressable
/// page-directory range, leaving the data vma room to grow without its
/// ordinary growth immediately butting up against the heap's reservation.
pub const VMA_HEAP_START: usize = (PAGING_MAX_PGN / 2) * PAGING_PAGESZ;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagesz_is_power_of_two() {
        assert!(PAGING_PAGESZ.is_power_of_two());
        assert_eq!(1usize << PAGING_ADDR_FPN_LOBIT, PAGING_PAGESZ);
    }
}
