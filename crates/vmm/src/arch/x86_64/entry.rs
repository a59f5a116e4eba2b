//! Page table entry for x86_64 architecture.

use x86_64::structures::paging::PageTableFlags;

use crate::PhysicalAddress;

use super::flags::PageFlags;

/// The decoded state of a page table slot.
///
/// A slot is in exactly one of three states, and the mapper's core logic only
/// ever sees this classification; the bit-level encoding stays inside this
/// module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// No mapping and no subtable.
    Empty,
    /// A direct translation to a physical frame.
    Leaf {
        address: PhysicalAddress,
        flags: PageFlags,
    },
    /// A pointer to the next-level table.
    Table { table: PhysicalAddress },
}

/// A single page table entry for x86_64.
///
/// On x86_64, page table entries are 64-bit values containing a physical
/// address and various flags. Whether a present mid-level entry maps memory
/// directly is encoded in the huge-page bit (PS); PT entries (level 0) always
/// map directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct PageEntry(usize);

impl PageEntry {
    /// Physical address mask for x86_64 page table entries.
    /// Bits 12-51 contain the physical address (assuming 52-bit physical addresses).
    const ADDRESS_MASK: usize = 0x000F_FFFF_FFFF_F000;

    /// Flag bits mask (bits 0-11 and 52-63).
    const FLAGS_MASK: usize = !Self::ADDRESS_MASK;

    /// Bit indicating this mid-level entry is a huge page (2MB or 1GB).
    const HUGE_PAGE_BIT: usize = PageTableFlags::HUGE_PAGE.bits() as usize;

    /// Creates an empty (zero sentinel) entry.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates a leaf entry mapping `address` at the given level.
    ///
    /// The present bit is always set; mid-level leaves additionally carry the
    /// huge-page bit so the CPU stops the walk at this level.
    ///
    /// The physical address must be page-aligned.
    pub fn leaf(address: PhysicalAddress, flags: PageFlags, level: usize) -> Self {
        debug_assert!(
            address.is_aligned(super::PAGE_SIZE),
            "physical address must be page-aligned"
        );

        let mut raw = (address.as_usize() & Self::ADDRESS_MASK)
            | (flags.as_usize() & Self::FLAGS_MASK)
            | PageTableFlags::PRESENT.bits() as usize;
        if level > 0 {
            raw |= Self::HUGE_PAGE_BIT;
        }
        Self(raw)
    }

    /// Creates a table-pointer entry linking the next-level table at `table`.
    ///
    /// Intermediate entries are permissive; the leaf entry governs the
    /// effective protection.
    pub fn table(table: PhysicalAddress) -> Self {
        debug_assert!(
            table.is_aligned(super::PAGE_SIZE),
            "table address must be page-aligned"
        );

        let flags = PageTableFlags::PRESENT | PageTableFlags::WRITABLE;
        Self((table.as_usize() & Self::ADDRESS_MASK) | flags.bits() as usize)
    }

    /// Classifies this entry as seen from a table at the given level.
    ///
    /// At level 0 every present entry is a leaf; above that the huge-page bit
    /// distinguishes a direct translation from a table pointer.
    pub fn kind(self, level: usize) -> EntryKind {
        if self.0 & PageTableFlags::PRESENT.bits() as usize == 0 {
            return EntryKind::Empty;
        }

        let address = PhysicalAddress::new(self.0 & Self::ADDRESS_MASK);
        if level == 0 || self.0 & Self::HUGE_PAGE_BIT != 0 {
            // The huge-page bit is a structural marker, not a permission.
            EntryKind::Leaf {
                address,
                flags: PageFlags::from(self.0 & Self::FLAGS_MASK & !Self::HUGE_PAGE_BIT),
            }
        } else {
            EntryKind::Table { table: address }
        }
    }

    /// Clears this entry back to the empty state.
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Returns the raw usize value of this entry.
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl Default for PageEntry {
    fn default() -> Self {
        Self::empty()
    }
}
