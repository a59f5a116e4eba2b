//! Page table entry flags for software emulation.

use crate::flags::MapFlags;

/// Page table entry flags for software emulation.
///
/// This provides a simplified hardware encoding for testing. Flags are stored
/// as raw bits in the low bits of an entry, mirroring how real MMUs pack
/// permission bits around the physical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFlags(usize);

impl PageFlags {
    /// Present bit (bit 0).
    pub const PRESENT: usize = 1 << 0;

    /// Writable bit (bit 1).
    pub const WRITABLE: usize = 1 << 1;

    /// User-accessible bit (bit 2).
    pub const USER: usize = 1 << 2;

    /// No-execute bit (bit 3).
    pub const NO_EXECUTE: usize = 1 << 3;

    /// Cache-disable bit (bit 4).
    pub const NO_CACHE: usize = 1 << 4;

    /// Global bit (bit 5).
    pub const GLOBAL: usize = 1 << 5;

    /// Creates empty page flags (page not present).
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates page flags from a raw value.
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// Returns the raw value of these flags.
    pub const fn to_raw(self) -> usize {
        self.0
    }

    /// Returns whether the present bit is set.
    pub const fn is_present(self) -> bool {
        (self.0 & Self::PRESENT) != 0
    }

    /// Returns whether the writable bit is set.
    pub const fn is_writable(self) -> bool {
        (self.0 & Self::WRITABLE) != 0
    }

    /// Returns whether the user-accessible bit is set.
    pub const fn is_user(self) -> bool {
        (self.0 & Self::USER) != 0
    }

    /// Returns whether the no-execute bit is set.
    pub const fn is_no_execute(self) -> bool {
        (self.0 & Self::NO_EXECUTE) != 0
    }

    /// Returns whether the cache-disable bit is set.
    pub const fn is_no_cache(self) -> bool {
        (self.0 & Self::NO_CACHE) != 0
    }

    /// Returns whether the global bit is set.
    pub const fn is_global(self) -> bool {
        (self.0 & Self::GLOBAL) != 0
    }
}

impl Default for PageFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Translates the architecture-neutral permission set into the emulated
/// hardware encoding.
///
/// The present bit is always set; a mapping without [`MapFlags::EXECUTABLE`]
/// gets the no-execute bit.
pub fn translate_flags(flags: MapFlags) -> PageFlags {
    let mut raw = PageFlags::PRESENT;
    if flags.contains(MapFlags::WRITABLE) {
        raw |= PageFlags::WRITABLE;
    }
    if !flags.contains(MapFlags::EXECUTABLE) {
        raw |= PageFlags::NO_EXECUTE;
    }
    if flags.contains(MapFlags::USER) {
        raw |= PageFlags::USER;
    }
    if flags.contains(MapFlags::GLOBAL) {
        raw |= PageFlags::GLOBAL;
    }
    if flags.contains(MapFlags::CACHE_DISABLE) {
        raw |= PageFlags::NO_CACHE;
    }
    PageFlags::from_raw(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_sets_present() {
        assert!(translate_flags(MapFlags::empty()).is_present());
    }

    #[test]
    fn translate_read_write() {
        let flags = translate_flags(MapFlags::WRITABLE);
        assert!(flags.is_present());
        assert!(flags.is_writable());
        assert!(flags.is_no_execute());
        assert!(!flags.is_user());
    }

    #[test]
    fn translate_executable_clears_no_execute() {
        let flags = translate_flags(MapFlags::EXECUTABLE);
        assert!(!flags.is_no_execute());
        assert!(!flags.is_writable());
    }

    #[test]
    fn translate_attributes() {
        let flags = translate_flags(MapFlags::USER | MapFlags::GLOBAL | MapFlags::CACHE_DISABLE);
        assert!(flags.is_user());
        assert!(flags.is_global());
        assert!(flags.is_no_cache());
    }
}
