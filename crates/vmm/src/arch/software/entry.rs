//! Page table entry for software emulation.

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

/// A single page table entry for software emulation.
///
/// The entry format mirrors common 64-bit hardware:
/// - Bits 0-5: Flags
/// - Bit 7: Leaf bit (set on mid-level entries that map directly)
/// - Bits 12-51: Physical address (page-aligned)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct PageEntry(usize);

impl PageEntry {
    /// Physical address mask (bits 12-51).
    const ADDRESS_MASK: usize = ((1 << super::MAX_PHYSICAL_BITS) - 1) & !(super::PAGE_SIZE - 1);

    /// Permission/attribute flag bits (bits 0-5).
    const FLAGS_MASK: usize = 0x3F;

    /// Marks a present mid-level entry as a direct translation rather than a
    /// table pointer. Excluded from the decoded flags.
    const LEAF_BIT: usize = 1 << 7;

    /// Creates an empty (zero sentinel) entry.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates a leaf entry mapping `address` at the given level.
    ///
    /// The present bit is always set; the leaf bit is set on mid-level
    /// entries, where a present entry would otherwise be a table pointer.
    ///
    /// The physical address must be page-aligned.
    pub fn leaf(address: PhysicalAddress, flags: PageFlags, level: usize) -> Self {
        debug_assert!(
            address.is_aligned(super::PAGE_SIZE),
            "physical address must be page-aligned"
        );

        let mut raw = (address.as_usize() & Self::ADDRESS_MASK)
            | (flags.to_raw() & Self::FLAGS_MASK)
            | PageFlags::PRESENT;
        if level > 0 {
            raw |= Self::LEAF_BIT;
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

        Self((table.as_usize() & Self::ADDRESS_MASK) | PageFlags::PRESENT | PageFlags::WRITABLE)
    }

    /// Classifies this entry as seen from a table at the given level.
    ///
    /// At level 0 every present entry is a leaf; above that the leaf bit
    /// distinguishes a direct translation from a table pointer.
    pub fn kind(self, level: usize) -> EntryKind {
        if self.0 & PageFlags::PRESENT == 0 {
            return EntryKind::Empty;
        }

        let address = PhysicalAddress::new(self.0 & Self::ADDRESS_MASK);
        if level == 0 || self.0 & Self::LEAF_BIT != 0 {
            EntryKind::Leaf {
                address,
                flags: PageFlags::from_raw(self.0 & Self::FLAGS_MASK),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero_sentinel() {
        assert_eq!(PageEntry::empty().as_usize(), 0);
        assert_eq!(PageEntry::empty().kind(0), EntryKind::Empty);
        assert_eq!(PageEntry::empty().kind(3), EntryKind::Empty);
    }

    #[test]
    fn leaf_round_trip() {
        let flags = PageFlags::from_raw(PageFlags::PRESENT | PageFlags::WRITABLE);
        let entry = PageEntry::leaf(PhysicalAddress::new(0x3000), flags, 0);

        match entry.kind(0) {
            EntryKind::Leaf { address, flags } => {
                assert_eq!(address, PhysicalAddress::new(0x3000));
                assert!(flags.is_present());
                assert!(flags.is_writable());
            }
            other => panic!("expected leaf, got {other:?}"),
        }
    }

    #[test]
    fn leaf_bit_does_not_pollute_flags() {
        let flags = PageFlags::from_raw(PageFlags::PRESENT);
        let mid = PageEntry::leaf(PhysicalAddress::new(0x400000), flags, 1);

        match mid.kind(1) {
            EntryKind::Leaf { flags, .. } => assert_eq!(flags.to_raw(), PageFlags::PRESENT),
            other => panic!("expected leaf, got {other:?}"),
        }
    }

    #[test]
    fn mid_level_table_pointer() {
        let entry = PageEntry::table(PhysicalAddress::new(0x8000));
        match entry.kind(2) {
            EntryKind::Table { table } => assert_eq!(table, PhysicalAddress::new(0x8000)),
            other => panic!("expected table pointer, got {other:?}"),
        }
    }

    #[test]
    fn level_zero_present_entries_are_always_leaves() {
        // A level-0 slot cannot point at a further table; presence means leaf.
        let entry = PageEntry::table(PhysicalAddress::new(0x8000));
        assert!(matches!(entry.kind(0), EntryKind::Leaf { .. }));
    }

    #[test]
    fn clear_resets_to_empty() {
        let flags = PageFlags::from_raw(PageFlags::PRESENT);
        let mut entry = PageEntry::leaf(PhysicalAddress::new(0x3000), flags, 0);
        entry.clear();
        assert_eq!(entry.kind(0), EntryKind::Empty);
    }
}
