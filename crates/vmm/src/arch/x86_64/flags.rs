//! Page table entry flags for x86_64 architecture.

use x86_64::structures::paging::PageTableFlags;

use crate::flags::MapFlags;

/// Page table entry flags for x86_64.
///
/// This wraps the x86_64 crate's page table entry flags, providing a minimal
/// interface for flag manipulation without higher-level abstractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFlags(PageTableFlags);

impl From<usize> for PageFlags {
    fn from(value: usize) -> Self {
        Self(PageTableFlags::from_bits_truncate(value as u64))
    }
}

impl PageFlags {
    /// Creates empty page flags (page not present).
    pub const fn empty() -> Self {
        Self(PageTableFlags::empty())
    }

    /// Returns the raw usize value of these flags.
    pub const fn as_usize(self) -> usize {
        self.0.bits() as usize
    }

    /// Returns whether the present bit is set.
    pub fn is_present(self) -> bool {
        self.0.contains(PageTableFlags::PRESENT)
    }

    /// Returns whether the writable bit is set.
    pub fn is_writable(self) -> bool {
        self.0.contains(PageTableFlags::WRITABLE)
    }

    /// Returns whether the user-accessible bit is set.
    pub fn is_user(self) -> bool {
        self.0.contains(PageTableFlags::USER_ACCESSIBLE)
    }

    /// Returns whether the no-execute bit is set.
    pub fn is_no_execute(self) -> bool {
        self.0.contains(PageTableFlags::NO_EXECUTE)
    }

    /// Returns whether the cache-disable bit is set.
    pub fn is_no_cache(self) -> bool {
        self.0.contains(PageTableFlags::NO_CACHE)
    }

    /// Returns whether the global bit is set.
    pub fn is_global(self) -> bool {
        self.0.contains(PageTableFlags::GLOBAL)
    }
}

impl Default for PageFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Translates the architecture-neutral permission set into the x86_64 page
/// table entry encoding.
///
/// The present bit is always set; a mapping without [`MapFlags::EXECUTABLE`]
/// gets the NX bit.
pub fn translate_flags(flags: MapFlags) -> PageFlags {
    let mut hw = PageTableFlags::PRESENT;
    if flags.contains(MapFlags::WRITABLE) {
        hw |= PageTableFlags::WRITABLE;
    }
    if !flags.contains(MapFlags::EXECUTABLE) {
        hw |= PageTableFlags::NO_EXECUTE;
    }
    if flags.contains(MapFlags::USER) {
        hw |= PageTableFlags::USER_ACCESSIBLE;
    }
    if flags.contains(MapFlags::GLOBAL) {
        hw |= PageTableFlags::GLOBAL;
    }
    if flags.contains(MapFlags::CACHE_DISABLE) {
        hw |= PageTableFlags::NO_CACHE;
    }
    PageFlags(hw)
}
