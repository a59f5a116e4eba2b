//! x86_64 architecture-specific implementation.
//!
//! This module provides the hardware implementation for x86_64 with 4-level
//! paging: address validation, level geometry, the page table entry encoding,
//! and CR3 loading.

mod entry;
mod flags;
mod table;

pub use entry::{EntryKind, PageEntry};
pub use flags::{PageFlags, translate_flags};
pub use table::PageTable;

use x86_64::{
    PhysAddr,
    registers::control::{Cr3, Cr3Flags},
    structures::paging::PhysFrame,
};

use crate::PhysicalAddress;

/// Maximum number of bits in a physical address on x86_64.
/// This is typically 52 bits on modern CPUs, but we use 48 as a conservative default.
pub const MAX_PHYSICAL_BITS: usize = 48;

/// Maximum number of bits in a virtual address on x86_64 with 4-level paging.
pub const MAX_VIRTUAL_BITS: usize = 48;

/// Default page size in bytes (4 KiB).
pub const PAGE_SIZE: usize = 4096;

/// Number of page table levels in x86_64 (4-level paging).
/// Level 0 is the page table (PT) and level 3 the root (PML4).
pub const PAGE_TABLE_LEVELS: usize = 4;

/// Number of virtual address bits consumed by one table index.
const INDEX_BITS: usize = 9;

/// Returns the bit position where the index for the given level starts.
#[inline]
pub const fn index_shift(level: usize) -> usize {
    assert!(level < PAGE_TABLE_LEVELS, "level out of range");
    12 + level * INDEX_BITS
}

/// Returns the page table index for a given virtual address at the specified level.
///
/// Each level uses 9 bits: level 0 is the page table (PT), level 1 the page
/// directory (PD), level 2 the page directory pointer table (PDPT), and
/// level 3 the page map level 4 (PML4).
#[inline]
pub const fn page_index(address: usize, level: usize) -> usize {
    (address >> index_shift(level)) & ((1 << INDEX_BITS) - 1)
}

/// Returns the number of bytes of virtual address space one entry at the
/// given level spans (4 KiB, 2 MiB, 1 GiB, 512 GiB).
#[inline]
pub const fn level_capacity(level: usize) -> usize {
    1 << index_shift(level)
}

/// Returns the size in bytes of one page table at the given level.
#[inline]
pub const fn table_size(level: usize) -> usize {
    assert!(level < PAGE_TABLE_LEVELS, "level out of range");
    core::mem::size_of::<PageTable>()
}

/// Validates a physical address for x86_64.
///
/// Physical addresses must not exceed the maximum physical address width.
#[inline]
pub const fn validate_physical(addr: usize) -> bool {
    addr < (1 << MAX_PHYSICAL_BITS)
}

/// Validates a virtual address for x86_64.
///
/// Virtual addresses must be canonical (bits 47-63 must be sign-extended from bit 47).
#[inline]
pub const fn validate_virtual(addr: usize) -> bool {
    canonicalize_virtual(addr) == addr
}

/// Canonicalizes a virtual address by sign-extending bit 47 to bits 48-63.
#[inline]
pub const fn canonicalize_virtual(addr: usize) -> usize {
    if (addr & (1 << (MAX_VIRTUAL_BITS - 1))) != 0 {
        addr | !((1 << MAX_VIRTUAL_BITS) - 1)
    } else {
        addr & ((1 << MAX_VIRTUAL_BITS) - 1)
    }
}

/// Activates the given root table by loading it into CR3.
///
/// # Safety
///
/// Loading an invalid page table causes undefined behavior, including memory
/// corruption and system crashes. The caller must ensure:
/// - The table tree correctly maps all memory that will be accessed
/// - The kernel is properly mapped
/// - The page tables themselves are mapped
pub unsafe fn activate_root(root: PhysicalAddress) {
    let frame = PhysFrame::containing_address(PhysAddr::new(root.as_usize() as u64));
    // SAFETY: Caller must ensure the root table is valid
    unsafe {
        Cr3::write(frame, Cr3Flags::empty());
    }
}
