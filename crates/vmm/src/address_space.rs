//! A lock-guarded page table tree.
//!
//! [`PageDirectory`] keeps all walk state on the stack, so two directories
//! can be mapped into concurrently without coordination. Mutating one shared
//! tree from several contexts is a different matter: an in-progress split
//! must not interleave with another walk over the same slots. [`AddressSpace`]
//! pairs a directory with a [`spin::Mutex`] and holds the lock for the whole
//! of each operation.

use crate::{
    MapFlags, PhysicalAddress, VirtualAddress,
    arch::PageFlags,
    page_directory::{MapError, PageDirectory},
};

/// A page table tree shared between contexts.
///
/// All operations take `&self`; the inner lock serializes them. Use
/// [`PageDirectory`] directly when the tree has a single owner.
pub struct AddressSpace {
    tables: spin::Mutex<PageDirectory>,
}

impl AddressSpace {
    /// Creates a new address space with an empty root page table.
    pub fn new() -> Result<Self, MapError> {
        Ok(Self {
            tables: spin::Mutex::new(PageDirectory::new()?),
        })
    }

    /// Returns the physical address of the root page table.
    pub fn root_address(&self) -> PhysicalAddress {
        self.tables.lock().root_address()
    }

    /// Maps the virtual range `[virt, virt + size)` to the physical range
    /// starting at `phys`. See [`PageDirectory::map_region`].
    pub fn map_region(
        &self,
        phys: PhysicalAddress,
        virt: VirtualAddress,
        size: usize,
        flags: MapFlags,
    ) -> Result<(), MapError> {
        self.tables.lock().map_region(phys, virt, size, flags)
    }

    /// Translates a virtual address through this address space. See
    /// [`PageDirectory::translate`].
    pub fn translate(&self, virt: VirtualAddress) -> Option<(PhysicalAddress, PageFlags)> {
        self.tables.lock().translate(virt)
    }

    /// Activates this address space as the current translation root.
    ///
    /// # Safety
    ///
    /// See [`PageDirectory::activate`].
    pub unsafe fn activate(&self) {
        unsafe { self.tables.lock().activate() }
    }
}
