#![cfg_attr(not(any(test, feature = "software-emulation")), no_std)]

//! # Virtual Memory Mapper (VMM)
//!
//! A low-level virtual memory crate that builds hierarchical (multi-level)
//! page tables. Given an address space, a physical address, a virtual
//! address, a size, and a permission set, it installs translations so that
//! accesses to the virtual range reach the corresponding physical frames
//! with the requested protection. It provides:
//!
//! - Best-fit region mapping: a request is consumed in the largest chunks
//!   whose level capacity exactly matches the aligned remainder, down to
//!   single pages.
//! - In-place demotion of pre-existing larger mappings that overlap a new
//!   request, preserving the non-overlapping remainders.
//! - Lazy allocation of intermediate tables through a pluggable table source.
//! - Support for hardware page table formats (x86_64) and a software
//!   emulation for testing in non-kernel environments.
//!
//! Physical frame allocation, TLB invalidation, and unmapping are out of
//! scope: frames are supplied by the caller, and callers are responsible for
//! any TLB maintenance after a mapping call returns.

mod address;
mod address_space;
mod arch;
mod flags;
mod page_directory;
mod table_alloc;

pub use address::{AddressTranslator, PhysicalAddress, VirtualAddress};
pub use address_space::AddressSpace;
pub use flags::MapFlags;
pub use page_directory::{MapError, PageDirectory};
#[cfg(not(any(test, feature = "software-emulation")))]
pub use table_alloc::{TableSource, set_table_source};

pub use arch::{PAGE_SIZE, PAGE_TABLE_LEVELS, PageFlags};
