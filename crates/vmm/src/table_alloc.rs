//! Page table allocation.
//!
//! The mapper lazily allocates intermediate tables while descending; this
//! module is where those blocks come from. On hardware builds the kernel
//! registers a frame source once during early boot; in test/software-emulation
//! mode tables are carved out of the emulated memory space. Either way the
//! returned block is zeroed, page-aligned, and reported as a plain failure
//! when the source is exhausted -- the mapper never retries.

use crate::{PhysicalAddress, address::AddressTranslator, arch, page_directory::MapError};

/// A source of physical memory for page tables.
///
/// Called with a size and alignment; returns the physical address of a block,
/// or None when no memory is available. The block must be covered by the
/// direct map so the mapper can reach it through the address translator.
#[cfg(not(any(test, feature = "software-emulation")))]
pub type TableSource = fn(size: usize, align: usize) -> Option<usize>;

#[cfg(not(any(test, feature = "software-emulation")))]
static TABLE_SOURCE: spin::Once<TableSource> = spin::Once::new();

/// Registers the physical memory source for page tables.
///
/// This function must be called exactly once during initialization, before
/// the first mapping operation.
///
/// # Panics
///
/// Panics if the source has already been set.
#[cfg(not(any(test, feature = "software-emulation")))]
pub fn set_table_source(source: TableSource) {
    if TABLE_SOURCE.get().is_some() {
        panic!("table source already set");
    }
    TABLE_SOURCE.call_once(|| source);
}

/// Obtains a raw block from the registered table source.
#[cfg(not(any(test, feature = "software-emulation")))]
fn raw_allocate(size: usize, align: usize) -> Option<usize> {
    let source = TABLE_SOURCE
        .get()
        .expect("table source not set; call set_table_source during initialization");
    source(size, align)
}

/// Obtains a raw block from the emulated memory space.
#[cfg(any(test, feature = "software-emulation"))]
fn raw_allocate(size: usize, align: usize) -> Option<usize> {
    AddressTranslator::current().allocate(size, align)
}

/// Allocates a zeroed, page-aligned page table for the given level.
///
/// On failure the whole mapping operation is aborted; tables already linked
/// into the tree stay where they are.
pub(crate) fn allocate_table(level: usize) -> Result<PhysicalAddress, MapError> {
    let size = arch::table_size(level);

    let Some(phys) = raw_allocate(size, arch::PAGE_SIZE) else {
        log::error!("out of table memory: failed to allocate {size} bytes for a level {level} table");
        return Err(MapError::TableAllocation);
    };

    // The source contract says zeroed, but a freshly unlinked view must never
    // expose stale entries, so clear it here regardless.
    let translator = AddressTranslator::current();
    // SAFETY: The block was just handed out by the source and is covered by
    // the translator; nothing else references it yet.
    unsafe {
        core::ptr::write_bytes(translator.phys_to_ptr::<u8>(phys), 0, size);
    }

    Ok(PhysicalAddress::new(phys))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(bytes: usize) {
        if AddressTranslator::try_current().is_none() {
            AddressTranslator::set_current(AddressTranslator::emulated(bytes));
        }
    }

    #[test]
    fn allocates_aligned_distinct_tables() {
        setup(16 * arch::table_size(0));

        let a = allocate_table(0).expect("first table");
        let b = allocate_table(arch::PAGE_TABLE_LEVELS - 1).expect("second table");

        assert!(a.is_aligned(arch::PAGE_SIZE));
        assert!(b.is_aligned(arch::PAGE_SIZE));
        assert!(b - a >= arch::table_size(0));
    }

    #[test]
    fn allocated_tables_are_zeroed() {
        setup(4 * arch::table_size(0));

        let table = allocate_table(0).expect("table");
        let translator = AddressTranslator::current();
        let bytes = translator.phys_to_ptr::<u8>(table.as_usize());
        for offset in 0..arch::table_size(0) {
            assert_eq!(unsafe { *bytes.add(offset) }, 0);
        }
    }

    #[test]
    fn exhaustion_is_reported() {
        setup(arch::table_size(0));

        assert!(allocate_table(0).is_ok());
        assert_eq!(allocate_table(0), Err(MapError::TableAllocation));
    }
}
