//! Page table entry encoding.
//!
//! A PTE is a single 32-bit word packed into PRESENT/SWAPPED/DIRTY flag
//! bits plus either a frame number (`FPN`) or a swap-device selector and
//! offset (`SWPTYP`/`SWPOFF`), mirroring the field layout used throughout
//! the original simulator's `mm-vm.c`/`mm.c`.

use bitflags::bitflags;

use crate::config::PAGING_ADDR_FPN_LOBIT;
use crate::error::{Error, Result};

bitflags! {
    pub struct PteFlags: u32 {
        const NONE     = 0b000;
        const PRESENT  = 0b001;
        const SWAPPED  = 0b010;
        const DIRTY    = 0b100;
    }
}

const FPN_SHIFT: u32 = 0;
const FPN_MASK: u32 = 0x00ff_ffff;
const SWPTYP_SHIFT: u32 = 0;
const SWPTYP_MASK: u32 = 0x0000_00ff;
const SWPOFF_SHIFT: u32 = 8;
const SWPOFF_MASK: u32 = 0x00ff_ff00;
const FLAGS_SHIFT: u32 = 24;

/// A single page-table entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pte(u32);

impl Pte {
    pub const EMPTY: Pte = Pte(0);

    fn flags(self) -> PteFlags {
        PteFlags::from_bits_truncate(self.0 >> FLAGS_SHIFT)
    }

    fn with_flags(mut self, flags: PteFlags) -> Self {
        self.0 = (self.0 & !(0xff << FLAGS_SHIFT)) | (flags.bits() << FLAGS_SHIFT);
        self
    }

    /// General constructor matching the original `init_pte`: rejects a
    /// present, non-swapped mapping onto frame 0, since frame 0 is
    /// reserved as an invalid sentinel by the frame allocator.
    pub fn init(
        present: bool,
        fpn: usize,
        dirty: bool,
        swap: bool,
        swptyp: usize,
        swpoff: usize,
    ) -> Result<Pte> {
        if present && !swap && fpn == 0 {
            return Err(Error::InvalidFrame);
        }
        let mut flags = PteFlags::NONE;
        if present {
            flags |= PteFlags::PRESENT;
        }
        if dirty {
            flags |= PteFlags::DIRTY;
        }
        if swap {
            flags |= PteFlags::SWAPPED;
        }
        let mut pte = Pte(0).with_flags(flags);
        if swap {
            pte.set_swap_fields(swptyp, swpoff);
        } else {
            pte.set_fpn_field(fpn);
        }
        Ok(pte)
    }

    fn set_fpn_field(&mut self, fpn: usize) {
        self.0 = (self.0 & !FPN_MASK) | ((fpn as u32) << FPN_SHIFT & FPN_MASK);
    }

    fn set_swap_fields(&mut self, swptyp: usize, swpoff: usize) {
        self.0 = (self.0 & !(SWPTYP_MASK | SWPOFF_MASK))
            | ((swptyp as u32) << SWPTYP_SHIFT & SWPTYP_MASK)
            | ((swpoff as u32) << SWPOFF_SHIFT & SWPOFF_MASK);
    }

    /// Marks the page present and backed by RAM frame `fpn`, clearing any
    /// prior swapped state.
    pub fn set_fpn(&mut self, fpn: usize) -> Result<()> {
        if fpn == 0 {
            return Err(Error::InvalidFrame);
        }
        *self = self.with_flags(PteFlags::PRESENT);
        self.set_fpn_field(fpn);
        Ok(())
    }

    /// Marks the page present and swapped out to swap-device slot
    /// `(swptyp, swpoff)`.
    pub fn set_swap(&mut self, swptyp: usize, swpoff: usize) {
        *self = self.with_flags(PteFlags::PRESENT | PteFlags::SWAPPED);
        self.set_swap_fields(swptyp, swpoff);
    }

    pub fn is_present(self) -> bool {
        self.flags().contains(PteFlags::PRESENT)
    }

    pub fn is_swapped(self) -> bool {
        self.flags().contains(PteFlags::SWAPPED)
    }

    /// True when the page is actually resident in RAM: mapped and not
    /// currently swapped out. A page that is mapped but swapped is
    /// "present" (it has a valid mapping) without being "page present"
    /// (online in RAM) — matching the original's `PAGING_PTE_PAGE_PRESENT`.
    pub fn page_present(self) -> bool {
        self.is_present() && !self.is_swapped()
    }

    /// The backing RAM frame number. Meaningful only when present and not
    /// swapped.
    pub fn fpn(self) -> usize {
        ((self.0 & FPN_MASK) >> FPN_SHIFT) as usize
    }

    /// `(swptyp, swpoff)`. Meaningful only when swapped.
    pub fn swp(self) -> (usize, usize) {
        (
            ((self.0 & SWPTYP_MASK) >> SWPTYP_SHIFT) as usize,
            ((self.0 & SWPOFF_MASK) >> SWPOFF_SHIFT) as usize,
        )
    }
}

/// Splits a virtual address into its page number and in-page offset.
pub fn addr_to_pgn_off(addr: usize) -> (usize, usize) {
    (addr >> PAGING_ADDR_FPN_LOBIT, addr & ((1 << PAGING_ADDR_FPN_LOBIT) - 1))
}

/// Physical byte address of frame `fpn`, cell `off`.
pub fn frame_addr(fpn: usize, off: usize) -> usize {
    (fpn << PAGING_ADDR_FPN_LOBIT) + off
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_mapping_roundtrips() {
        let pte = Pte::init(true, 7, false, false, 0, 0).unwrap();
        assert!(pte.is_present());
        assert!(!pte.is_swapped());
        assert_eq!(pte.fpn(), 7);
    }

    #[test]
    fn swapped_mapping_roundtrips() {
        let pte = Pte::init(true, 0, false, true, 3, 91).unwrap();
        assert!(pte.is_present());
        assert!(pte.is_swapped());
        assert!(!pte.page_present());
        assert_eq!(pte.swp(), (3, 91));
    }

    #[test]
    fn online_mapping_is_page_present() {
        let pte = Pte::init(true, 7, false, false, 0, 0).unwrap();
        assert!(pte.page_present());
    }

    #[test]
    fn zero_frame_present_rejected() {
        assert_eq!(Pte::init(true, 0, false, false, 0, 0), Err(Error::InvalidFrame));
    }

    #[test]
    fn set_fpn_rejects_zero() {
        let mut pte = Pte::EMPTY;
        assert_eq!(pte.set_fpn(0), Err(Error::InvalidFrame));
    }

    #[test]
    fn addr_split_matches_pagesz() {
        let (pgn, off) = addr_to_pgn_off(300);
        assert_eq!(pgn, 1);
        assert_eq!(off, 300 - 256);
        assert_eq!(frame_addr(pgn, off), 300);
    }
}
