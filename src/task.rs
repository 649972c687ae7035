//! Task Identity
//!
//! The security core never creates tasks. It only asks the scheduler
//! "who is calling" through [`TaskProvider`] and receives a [`Task`]
//! snapshot carrying the caller's ids and capability set.

use core::fmt;

use crate::cap::CapabilitySet;

/// Process-wide unique task id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Pid(u32);

impl Pid {
    /// Create a task id.
    #[inline]
    pub const fn new(pid: u32) -> Self {
        Self(pid)
    }

    /// Get the raw id.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<u32> for Pid {
    fn from(pid: u32) -> Self {
        Self(pid)
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pid({})", self.0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owning user id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Uid(u32);

impl Uid {
    /// The superuser.
    pub const ROOT: Self = Self(0);

    /// Create a user id.
    #[inline]
    pub const fn new(uid: u32) -> Self {
        Self(uid)
    }

    /// Get the raw id.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<u32> for Uid {
    fn from(uid: u32) -> Self {
        Self(uid)
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", self.0)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point-in-time view of a task as seen by the security core.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Task {
    /// Task id.
    pub pid: Pid,
    /// Owning user.
    pub uid: Uid,
    /// Capabilities held by the task.
    pub caps: CapabilitySet,
}

impl Task {
    /// Create a task view.
    #[inline]
    pub const fn new(pid: Pid, uid: Uid, caps: CapabilitySet) -> Self {
        Self { pid, uid, caps }
    }
}

/// Resolves the task on whose behalf an operation runs.
///
/// Implemented by the scheduler. Must not block.
pub trait TaskProvider: Sync {
    /// The calling task.
    fn current_task(&self) -> Task;
}
