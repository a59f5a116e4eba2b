//! Architecture-neutral mapping permissions.
//!
//! Callers describe the protection of a region with [`MapFlags`]; the set is
//! translated into the architecture-specific page table encoding exactly once
//! per mapping call, at entry.

bitflags::bitflags! {
    /// Architecture-independent page mapping flags.
    ///
    /// Readability is implied by the mapping being present.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MapFlags: u64 {
        /// Region is writable.
        const WRITABLE      = 1 << 0;
        /// Region is executable (if unset, no-execute is implied).
        const EXECUTABLE    = 1 << 1;
        /// Region is accessible from user mode.
        const USER          = 1 << 2;
        /// Global mapping (not flushed on address-space switch).
        const GLOBAL        = 1 << 3;
        /// Caching disabled for this region.
        const CACHE_DISABLE = 1 << 4;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_by_default() {
        assert!(MapFlags::empty().is_empty());
    }

    #[test]
    fn combination() {
        let flags = MapFlags::WRITABLE | MapFlags::USER;
        assert!(flags.contains(MapFlags::WRITABLE));
        assert!(flags.contains(MapFlags::USER));
        assert!(!flags.contains(MapFlags::EXECUTABLE));
    }

    #[test]
    fn all_bits_distinct() {
        let all = [
            MapFlags::WRITABLE,
            MapFlags::EXECUTABLE,
            MapFlags::USER,
            MapFlags::GLOBAL,
            MapFlags::CACHE_DISABLE,
        ];
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                if i != j {
                    assert!((*a & *b).is_empty(), "{a:?} and {b:?} share bits");
                }
            }
        }
    }
}
