//! Workspace placeholder crate.
//!
//! Re-exports the core service so host applications can depend on
//! `vpc-workspace` and pick the platform shims through its feature flags
//! instead of wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
