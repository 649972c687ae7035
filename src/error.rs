//! Error Types
//!
//! Every failure in the security core is an explicit value returned to the
//! caller. Nothing in here is fatal: conditions that can only arise from
//! internal corruption are guarded with assertions instead.
//!
//! # Taxonomy
//! - `Denied`: capability check failed (always audited)
//! - `InvalidName` / `InvalidCapability`: malformed argument, no audit
//! - `Duplicate`: name or membership collision
//! - `NotFound` / `TaskNotFound`: unknown or stale group id, absent member
//! - `Full` / `NoSpace`: bounded capacity exhausted

use core::fmt;

use crate::cap::Capability;

/// Error type for security core operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The caller does not hold the required capability.
    Denied(Capability),
    /// Group name is empty or longer than `MAX_NAME_LEN`.
    InvalidName,
    /// A raw capability number outside the declared set.
    InvalidCapability(u32),
    /// Name already used by a live group, or task already a member.
    Duplicate,
    /// Group id is unknown or refers to a destroyed group.
    NotFound,
    /// Task is not a member of the group.
    TaskNotFound,
    /// Group member set is at capacity.
    Full,
    /// Hierarchy or parent child list is at capacity.
    NoSpace,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denied(cap) => write!(f, "permission denied: {} required", cap),
            Self::InvalidName => write!(f, "invalid group name"),
            Self::InvalidCapability(raw) => write!(f, "invalid capability {}", raw),
            Self::Duplicate => write!(f, "already exists"),
            Self::NotFound => write!(f, "group not found"),
            Self::TaskNotFound => write!(f, "task not found in group"),
            Self::Full => write!(f, "group is full"),
            Self::NoSpace => write!(f, "no space left in hierarchy"),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for rejected configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A limit was set to zero.
    ZeroLimit(&'static str),
    /// A limit exceeds the compile-time capacity backing it.
    LimitTooLarge {
        /// Name of the offending limit.
        limit: &'static str,
        /// Requested value.
        requested: usize,
        /// Compile-time capacity.
        capacity: usize,
    },
    /// The bootstrap task would start with every capability.
    BootstrapTooBroad,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroLimit(limit) => write!(f, "{} cannot be zero", limit),
            Self::LimitTooLarge {
                limit,
                requested,
                capacity,
            } => write!(f, "{} = {} exceeds capacity {}", limit, requested, capacity),
            Self::BootstrapTooBroad => {
                write!(f, "bootstrap task must not hold every capability")
            }
        }
    }
}
