use std::fmt;

/// Error type shared by the paging core and the scheduler.
///
/// Replaces the original simulator's sentinel integer returns (`-1`,
/// `-3000`, ...) with a tagged enum so callers match on cause rather than
/// magic numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A region id fell outside `0..PAGING_MAX_SYMTBL_SZ`.
    InvalidRegionId,
    /// A vma id did not name an existing virtual memory area.
    InvalidVmaId,
    /// No free region satisfied an allocation and the vma could not grow.
    NoFreeRegion,
    /// A requested address range overlapped an existing vma.
    Overlap,
    /// Frame allocation failed and could not be satisfied even after
    /// evicting a victim page.
    OutOfMemory,
    /// No victim page was available to evict under memory pressure.
    NoVictim,
    /// A scheduler queue was at capacity.
    QueueFull,
    /// A page table entry was constructed with an invalid frame number.
    InvalidFrame,
    /// A process handle did not resolve to a live process.
    ProcessNotFound,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::InvalidRegionId => "invalid region id",
            Error::InvalidVmaId => "invalid vma id",
            Error::NoFreeRegion => "no free region available",
            Error::Overlap => "address range overlaps an existing vma",
            Error::OutOfMemory => "out of memory",
            Error::NoVictim => "no victim page available for eviction",
            Error::QueueFull => "queue is full",
            Error::InvalidFrame => "invalid frame number in page table entry",
            Error::ProcessNotFound => "process not found",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
