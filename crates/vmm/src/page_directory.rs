//! Region mapping into a hierarchical page table.
//!
//! This module provides the [`PageDirectory`] type, which owns the root of
//! one table tree and installs translations for whole regions at once. A
//! request is consumed in best-fit chunks: each root-to-leaf walk stops at
//! the highest level whose span exactly matches the aligned remainder of the
//! request, falling back to single pages for irregular remainders. When a
//! walk runs into a pre-existing coarser mapping it demotes it in place,
//! re-installing the non-overlapping remainders at finer granularity before
//! the new translation overwrites the rest.
//!
//! All walk state is local to the call, so operations against different
//! table trees are independent; serializing operations against the *same*
//! tree is the job of [`AddressSpace`](crate::AddressSpace).

use crate::{
    MapFlags, PhysicalAddress, VirtualAddress,
    address::AddressTranslator,
    arch::{self, EntryKind, PageEntry, PageFlags, PageTable},
    table_alloc,
};

/// Errors that can occur while mapping a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// An intermediate page table could not be allocated.
    ///
    /// Leaves installed by earlier chunks of the same request stay in place;
    /// there is no rollback across a partially mapped region.
    TableAllocation,
}

/// Reads the entry at `index` of the table at physical address `table`.
fn entry_at(table: PhysicalAddress, index: usize) -> PageEntry {
    let table = AddressTranslator::current().phys_to_ptr::<PageTable>(table.as_usize());
    // SAFETY: Table addresses only ever come from the table allocator or from
    // table-pointer entries, both of which refer to fully allocated tables.
    unsafe { (*table).entry(index) }
}

/// Writes `entry` into slot `index` of the table at physical address `table`.
fn set_entry(table: PhysicalAddress, index: usize, entry: PageEntry) {
    let table = AddressTranslator::current().phys_to_ptr::<PageTable>(table.as_usize());
    // SAFETY: Same as entry_at; the reference is dropped before any recursive
    // walk can touch the same table.
    unsafe {
        *(*table).entry_mut(index) = entry;
    }
}

/// Clears slot `index` of the table at physical address `table`.
fn clear_entry(table: PhysicalAddress, index: usize) {
    let table = AddressTranslator::current().phys_to_ptr::<PageTable>(table.as_usize());
    // SAFETY: Same as set_entry.
    unsafe {
        (*table).entry_mut(index).clear();
    }
}

/// A page table tree with region-granular mapping operations.
///
/// This type owns the root page table (allocated at construction through the
/// table allocator) and installs translations by walking the hierarchy,
/// allocating intermediate tables as needed. It does not implement unmapping;
/// a mapping is only ever replaced by a later mapping over the same range.
pub struct PageDirectory {
    /// Physical address of the root page table for this tree.
    root: PhysicalAddress,
}

impl PageDirectory {
    /// Creates a new page directory with an empty root page table.
    pub fn new() -> Result<Self, MapError> {
        Ok(Self {
            root: table_alloc::allocate_table(arch::PAGE_TABLE_LEVELS - 1)?,
        })
    }

    /// Returns the physical address of the root page table.
    pub fn root_address(&self) -> PhysicalAddress {
        self.root
    }

    /// Activates this table tree as the current translation root.
    ///
    /// # Safety
    ///
    /// The tree must map everything the CPU will touch after the switch,
    /// including the kernel and the tables themselves. See
    /// [`arch::activate_root`] for the full contract.
    pub unsafe fn activate(&self) {
        unsafe { arch::activate_root(self.root) }
    }

    /// Maps the virtual range `[virt, virt + size)` to the physical range
    /// starting at `phys`, with the given protection.
    ///
    /// Addresses and size are masked down to page granularity: callers own
    /// page alignment, and stray low-order bits are dropped rather than
    /// rejected. A size smaller than one page therefore maps nothing.
    ///
    /// The region is consumed in best-fit chunks (see the module docs), and
    /// any pre-existing mapping that overlaps the range is overwritten, with
    /// its non-overlapping remainder preserved at finer granularity.
    ///
    /// On allocation failure the already-mapped prefix of the region stays
    /// mapped; callers that need all-or-nothing semantics must build it on
    /// top (e.g. by mapping into a scratch tree and committing on success).
    pub fn map_region(
        &mut self,
        phys: PhysicalAddress,
        virt: VirtualAddress,
        size: usize,
        flags: MapFlags,
    ) -> Result<(), MapError> {
        let phys = phys.align_down(arch::PAGE_SIZE).as_usize();
        let virt = virt.align_down(arch::PAGE_SIZE).as_usize();
        let size = size & !(arch::PAGE_SIZE - 1);

        // Translate the generic flags to the hardware encoding exactly once;
        // recursive split calls re-use already-translated flags.
        let flags = arch::translate_flags(flags);

        self.map_chunks(phys, virt, size, flags)
    }

    /// Translates a virtual address through this table tree.
    ///
    /// Returns the physical address the leaf resolves it to (including the
    /// offset within the leaf's span) and the stored hardware flags, or None
    /// if no leaf covers the address.
    pub fn translate(&self, virt: VirtualAddress) -> Option<(PhysicalAddress, PageFlags)> {
        let virt = virt.as_usize();
        let mut table = self.root;

        for level in (0..arch::PAGE_TABLE_LEVELS).rev() {
            match entry_at(table, arch::page_index(virt, level)).kind(level) {
                EntryKind::Empty => return None,
                EntryKind::Leaf { address, flags } => {
                    let offset = virt & (arch::level_capacity(level) - 1);
                    return Some((address + offset, flags));
                }
                EntryKind::Table { table: next } => table = next,
            }
        }

        // Level 0 entries always classify as empty or leaf.
        None
    }

    /// Consumes a region best-fit chunk by best-fit chunk.
    fn map_chunks(
        &mut self,
        mut phys: usize,
        mut virt: usize,
        mut remaining: usize,
        flags: PageFlags,
    ) -> Result<(), MapError> {
        while remaining > 0 {
            let mapped = self.map_best_fit(phys, virt, remaining, flags)?;
            remaining -= mapped;
            if remaining == 0 {
                break;
            }
            // Advance only while more is left: a region ending at the top of
            // the address space would otherwise overflow the cursor.
            phys += mapped;
            virt += mapped;
        }
        Ok(())
    }

    /// Walks from the root and installs one leaf for the start of the
    /// remaining region, returning the number of bytes it covers.
    ///
    /// The walk stops at the first level whose span exactly matches the
    /// aligned remainder; an irregular remainder always lands at level 0,
    /// whose one-page span divides everything.
    fn map_best_fit(
        &mut self,
        phys: usize,
        virt: usize,
        remaining: usize,
        flags: PageFlags,
    ) -> Result<usize, MapError> {
        let mut table = self.root;

        for level in (1..arch::PAGE_TABLE_LEVELS).rev() {
            let capacity = arch::level_capacity(level);
            let index = arch::page_index(virt, level);
            log::trace!(
                "level {level}: vaddr {virt:#x} paddr {phys:#x} table {table} index {index}"
            );

            // Best fit: this level's span matches the remainder exactly.
            if virt & (capacity - 1) == 0 && capacity == remaining {
                set_entry(
                    table,
                    index,
                    PageEntry::leaf(PhysicalAddress::new(phys), flags, level),
                );
                return Ok(capacity);
            }

            // A coarser mapping is in the way; demote it so we can descend.
            if let EntryKind::Leaf {
                address,
                flags: old_flags,
            } = entry_at(table, index).kind(level)
            {
                self.demote(table, index, level, address, old_flags, virt, remaining)?;
            }

            table = match entry_at(table, index).kind(level) {
                EntryKind::Table { table } => table,
                EntryKind::Empty => {
                    let subtable = table_alloc::allocate_table(level - 1)?;
                    set_entry(table, index, PageEntry::table(subtable));
                    subtable
                }
                EntryKind::Leaf { .. } => unreachable!("leaf was demoted above"),
            };
        }

        // Level 0: the finest granularity always fits the remainder.
        set_entry(
            table,
            arch::page_index(virt, 0),
            PageEntry::leaf(PhysicalAddress::new(phys), flags, 0),
        );
        Ok(arch::PAGE_SIZE)
    }

    /// Replaces the coarse leaf at `(table, index)` with finer structure.
    ///
    /// The leaf's span necessarily overlaps the request `[virt, virt +
    /// remaining)`; the overlapping portion is abandoned (it is about to be
    /// overwritten), and whichever remainders fall outside the request are
    /// re-mapped with the old translation and flags before the slot is
    /// descended through.
    fn demote(
        &mut self,
        table: PhysicalAddress,
        index: usize,
        level: usize,
        old_phys: PhysicalAddress,
        old_flags: PageFlags,
        virt: usize,
        remaining: usize,
    ) -> Result<(), MapError> {
        // Work in offsets from the span base: the span or the request can end
        // exactly at the top of the address space, where an end address would
        // overflow.
        let capacity = arch::level_capacity(level);
        let span_base = virt & !(capacity - 1);
        let offset = virt - span_base;
        let overlap = remaining.min(capacity - offset);

        log::trace!(
            "demoting level {level} leaf: span {span_base:#x}+{capacity:#x} request {virt:#x}+{remaining:#x}"
        );

        clear_entry(table, index);

        // Old part rests on the left of the request.
        if offset > 0 {
            self.map_chunks(old_phys.as_usize(), span_base, offset, old_flags)?;
        }

        // Old part remains on the right of the request.
        let kept = offset + overlap;
        if kept < capacity {
            self.map_chunks(
                old_phys.as_usize() + kept,
                span_base + kept,
                capacity - kept,
                old_flags,
            )?;
        }

        Ok(())
    }
}
