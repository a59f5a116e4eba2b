//! Software emulation implementation for testing and development.
//!
//! This module provides a software-emulated architecture that can run on any
//! host. It's designed for testing and development without requiring actual
//! hardware access.
//!
//! The emulated architecture is a generic RISC-style 64-bit MMU, sized so
//! that realistic mapping scenarios are expressible:
//! - 4 KiB pages (as on x86_64 and most 64-bit hardware)
//! - 4 levels of page tables
//! - 10-bit indexes (1024 entries per table, 8 KiB tables)
//! - 52-bit sign-extended canonical virtual addresses
//!
//! One entry therefore spans 4 KiB, 4 MiB, 4 GiB, or 4 TiB depending on its
//! level. Page tables live inside [`EmulatedMemory`], a buffer standing in
//! for physical memory, and are reached through the address translator just
//! like direct-mapped tables on real hardware.

mod entry;
mod flags;
mod table;

pub use entry::{EntryKind, PageEntry};
pub use flags::{PageFlags, translate_flags};
pub use table::PageTable;

/// Maximum number of bits in a physical address for software emulation.
pub const MAX_PHYSICAL_BITS: usize = 52;

/// Maximum number of bits in a virtual address for software emulation.
pub const MAX_VIRTUAL_BITS: usize = 52;

/// Page size in bytes (4 KiB).
pub const PAGE_SIZE: usize = 4096;

/// Number of page table levels (levels 3 down to 0, the root table at level 3).
pub const PAGE_TABLE_LEVELS: usize = 4;

/// Number of virtual address bits consumed by one table index.
const INDEX_BITS: usize = 10;

/// Returns the bit position where the index for the given level starts.
///
/// - Bits 0-11: page offset
/// - Bits 12-21: level 0 index
/// - Bits 22-31: level 1 index
/// - Bits 32-41: level 2 index
/// - Bits 42-51: level 3 index (root)
#[inline]
pub const fn index_shift(level: usize) -> usize {
    assert!(level < PAGE_TABLE_LEVELS, "level out of range");
    12 + level * INDEX_BITS
}

/// Returns the page table index for a given virtual address at the specified level.
#[inline]
pub const fn page_index(address: usize, level: usize) -> usize {
    (address >> index_shift(level)) & ((1 << INDEX_BITS) - 1)
}

/// Returns the number of bytes of virtual address space one entry at the
/// given level spans.
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

/// Validates a physical address for software emulation.
#[inline]
pub const fn validate_physical(addr: usize) -> bool {
    addr < (1 << MAX_PHYSICAL_BITS)
}

/// Validates a virtual address for software emulation.
///
/// Virtual addresses must be canonical (bits 52-63 must be sign-extended
/// from bit 51).
#[inline]
pub const fn validate_virtual(addr: usize) -> bool {
    canonicalize_virtual(addr) == addr
}

/// Canonicalizes a virtual address by sign-extending bit 51 to bits 52-63.
#[inline]
pub const fn canonicalize_virtual(addr: usize) -> usize {
    if (addr & (1 << (MAX_VIRTUAL_BITS - 1))) != 0 {
        addr | !((1 << MAX_VIRTUAL_BITS) - 1)
    } else {
        addr & ((1 << MAX_VIRTUAL_BITS) - 1)
    }
}

/// Activates the given root table.
///
/// The emulated architecture has no MMU register to load; lookups always go
/// through an explicit table walk.
///
/// # Safety
///
/// Callers must uphold the same contract as on hardware: the root must refer
/// to a fully built table tree.
pub unsafe fn activate_root(_root: crate::PhysicalAddress) {}

/// One page-aligned, page-sized chunk of the emulated buffer.
///
/// Backing the buffer with these (rather than raw bytes) keeps every
/// page-aligned "physical address" at a host address aligned for
/// [`PageTable`] access.
#[derive(Clone, Copy)]
#[repr(C, align(4096))]
struct EmulatedPage([u8; PAGE_SIZE]);

/// Emulated memory for software simulation.
///
/// This provides a simulated physical memory space for testing page table
/// operations without requiring actual hardware or virtual memory support
/// from the host OS. All page tables built during a test live inside this
/// buffer, addressed by their offset (the "physical address").
pub struct EmulatedMemory {
    /// The underlying memory buffer.
    memory: Vec<EmulatedPage>,
    /// Next allocation offset (simple bump allocator).
    next_alloc: core::sync::atomic::AtomicUsize,
}

impl EmulatedMemory {
    /// Creates a new emulated memory region of the specified size, rounded up
    /// to whole pages.
    pub fn new(size: usize) -> Self {
        Self {
            memory: vec![EmulatedPage([0; PAGE_SIZE]); size.div_ceil(PAGE_SIZE)],
            next_alloc: core::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Allocates a block of memory from the emulated space.
    ///
    /// Returns the physical address of the allocated block, or None if
    /// there's not enough space. Blocks are never reused.
    pub fn allocate(&self, size: usize, align: usize) -> Option<usize> {
        use core::sync::atomic::Ordering;

        loop {
            let current = self.next_alloc.load(Ordering::Relaxed);

            // Align the current offset
            let aligned = (current + align - 1) & !(align - 1);
            let end = aligned + size;

            if end > self.size() {
                return None;
            }

            // Try to claim this allocation
            if self
                .next_alloc
                .compare_exchange(current, end, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return Some(aligned);
            }
        }
    }

    /// Translates a physical address to a virtual address (pointer into the buffer).
    pub fn translate(&self, phys: usize) -> *mut u8 {
        assert!(phys < self.size(), "physical address out of bounds");
        unsafe { (self.memory.as_ptr() as *mut u8).add(phys) }
    }

    /// Translates a virtual address (pointer) back to a physical address.
    pub fn ptr_to_phys(&self, ptr: *const u8) -> usize {
        let offset = unsafe { ptr.offset_from(self.memory.as_ptr() as *const u8) };
        assert!(offset >= 0, "pointer not within emulated memory");
        assert!(
            (offset as usize) < self.size(),
            "pointer not within emulated memory"
        );
        offset as usize
    }

    /// Returns the size of the emulated memory region in bytes.
    pub fn size(&self) -> usize {
        self.memory.len() * PAGE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_is_consistent() {
        assert_eq!(level_capacity(0), PAGE_SIZE);
        assert_eq!(level_capacity(1), 4 * 1024 * 1024);
        assert_eq!(level_capacity(2), 4 * 1024 * 1024 * 1024);
        for level in 1..PAGE_TABLE_LEVELS {
            assert_eq!(level_capacity(level), level_capacity(level - 1) << INDEX_BITS);
        }
    }

    #[test]
    fn page_index_extracts_each_level() {
        let addr = (5 << index_shift(3)) | (4 << index_shift(2)) | (3 << index_shift(1)) | (2 << index_shift(0)) | 1;
        assert_eq!(page_index(addr, 3), 5);
        assert_eq!(page_index(addr, 2), 4);
        assert_eq!(page_index(addr, 1), 3);
        assert_eq!(page_index(addr, 0), 2);
    }

    #[test]
    fn canonical_addresses() {
        assert!(validate_virtual(0));
        assert!(validate_virtual((1 << (MAX_VIRTUAL_BITS - 1)) - 1));
        assert!(!validate_virtual(1 << (MAX_VIRTUAL_BITS - 1)));
        assert!(validate_virtual(canonicalize_virtual(1 << (MAX_VIRTUAL_BITS - 1))));
    }

    #[test]
    fn emulated_memory_allocates_aligned_blocks() {
        let mem = EmulatedMemory::new(8 * PAGE_SIZE);
        let a = mem.allocate(PAGE_SIZE, PAGE_SIZE).unwrap();
        let b = mem.allocate(PAGE_SIZE, PAGE_SIZE).unwrap();
        assert_eq!(a % PAGE_SIZE, 0);
        assert_eq!(b % PAGE_SIZE, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn emulated_memory_reports_exhaustion() {
        let mem = EmulatedMemory::new(2 * PAGE_SIZE);
        assert!(mem.allocate(PAGE_SIZE, PAGE_SIZE).is_some());
        assert!(mem.allocate(PAGE_SIZE, PAGE_SIZE).is_some());
        assert!(mem.allocate(PAGE_SIZE, PAGE_SIZE).is_none());
        assert_eq!(mem.size(), 2 * PAGE_SIZE);
    }

    #[test]
    fn emulated_memory_translation_round_trip() {
        let mem = EmulatedMemory::new(4 * PAGE_SIZE);
        let phys = mem.allocate(PAGE_SIZE, PAGE_SIZE).unwrap();
        let ptr = mem.translate(phys);
        assert_eq!(mem.ptr_to_phys(ptr), phys);
    }
}
