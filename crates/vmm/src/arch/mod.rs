//! Architecture-specific page table primitives.
//!
//! This module conditionally imports either hardware-specific implementations
//! or software emulation based on the target architecture and features. Every
//! backend exports the same surface: the level geometry constants, the
//! [`PageEntry`]/[`PageFlags`]/[`PageTable`] primitives, the generic-flag
//! translation, and root table activation.

// Use x86_64 hardware implementation when we're on x86_64 and not testing or emulating.
// NOTE: We DO include the module even during tests so that rust-analyzer can see it.
#[cfg(target_arch = "x86_64")]
mod x86_64;
#[cfg(all(target_arch = "x86_64", not(test), not(feature = "software-emulation")))]
pub use x86_64::*;

// Use software emulation ONLY when:
// - Running tests, OR
// - software-emulation feature is explicitly enabled
#[cfg(any(test, feature = "software-emulation"))]
mod software;
#[cfg(any(test, feature = "software-emulation"))]
pub use software::*;
