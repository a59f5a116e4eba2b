//! Page table structure for software emulation.

use super::entry::PageEntry;

/// Number of entries in a software-emulated page table (10-bit indexes).
const ENTRY_COUNT: usize = 1024;

/// A page table for software emulation.
///
/// Unlike a heap-allocated structure, a `PageTable` is only ever built inside
/// emulated physical memory: the table allocator hands out a zeroed block and
/// the mapper reaches it by translating its physical address. A reference to
/// a `PageTable` is therefore always a view over memory owned by the table
/// tree.
#[repr(C, align(4096))]
pub struct PageTable {
    /// The entries in this page table.
    entries: [PageEntry; ENTRY_COUNT],
}

impl PageTable {
    /// Returns the entry at the given index.
    ///
    /// # Panics
    /// Panics if index >= 1024.
    pub fn entry(&self, index: usize) -> PageEntry {
        assert!(index < ENTRY_COUNT, "page table index out of bounds");
        self.entries[index]
    }

    /// Returns a mutable reference to the entry at the given index.
    ///
    /// # Panics
    /// Panics if index >= 1024.
    pub fn entry_mut(&mut self, index: usize) -> &mut PageEntry {
        assert!(index < ENTRY_COUNT, "page table index out of bounds");
        &mut self.entries[index]
    }

    /// Returns the number of entries in this page table.
    pub const fn len(&self) -> usize {
        ENTRY_COUNT
    }
}
