//! Audit Subsystem
//!
//! Bounded, tamper-evident trail of security decisions and resource group
//! mutations.
//!
//! # Security Properties
//! - Recording cannot fail, so a denial path cannot suppress its own evidence
//! - Records are immutable once written
//! - Reading the trail never blocks writers for longer than a window copy

pub mod record;
pub mod trail;

pub use record::{AuditKind, AuditObject, AuditRecord, NO_MESSAGE};
pub use trail::{AuditSnapshot, AuditTrail, AUDIT_CAPACITY};
