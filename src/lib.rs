//! PantherOS Security Core
//!
//! Kernel-resident capability enforcement, resource groups and audit trail.
//!
//! # Components
//! - Capability registry: per-task privilege bits, fail-closed checks
//! - Audit trail: bounded ring of security decisions, drained on demand
//! - Resource group hierarchy: a forest of named task groups whose every
//!   mutation is capability-gated and audited
//!
//! # Security Features
//! - No heap: every table is a fixed array sized at compile time
//! - Every denial and every successful mutation leaves an audit record
//! - Stale group ids are detected through slot generations
//! - All shared state sits behind spinlocks that are never held across a
//!   call into the console
//!
//! # Usage
//! The kernel builds one [`SecurityKernel`] at boot from a [`Config`] and
//! its task provider, log sink and clock, then passes it by reference to
//! every subsystem that needs a privileged operation.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod cap;
pub mod cgroup;
pub mod config;
pub mod console;
pub mod error;
pub mod kernel;
pub mod task;

#[cfg(test)]
mod testing;

pub use audit::{AuditKind, AuditObject, AuditRecord, AuditSnapshot, AuditTrail};
pub use cap::{Capability, CapabilitySet};
pub use cgroup::{GroupId, GroupSnapshot, ResourceGroup, ResourceGroups};
pub use config::Config;
pub use console::{Clock, LogFacadeSink, LogSink, TickClock};
pub use error::{ConfigError, Error, Result};
pub use kernel::SecurityKernel;
pub use task::{Pid, Task, TaskProvider, Uid};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
