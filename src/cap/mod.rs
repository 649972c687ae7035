//! Capability-Based Security
//!
//! POSIX-style capabilities: each task carries a fixed bitmap of privilege
//! bits, and privileged operations check one bit before proceeding.
//!
//! # Design
//! - The capability set is closed and known at compile time
//! - Checks are O(1) bit tests with no allocation
//! - Denials are always audited

pub mod capability;
pub mod registry;

pub use capability::{Capability, CapabilitySet, MAX_CAP};
pub use registry::CapabilityRegistry;
