//! Audit Record Types
//!
//! An [`AuditRecord`] is written once by the trail and never mutated. It is
//! only ever replaced wholesale when the ring wraps.

use core::fmt;

use crate::cap::Capability;
use crate::cgroup::GroupId;
use crate::task::{Pid, Uid};

/// Message recorded when the caller has none to give.
pub const NO_MESSAGE: &str = "(no message)";

/// Class of audited event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum AuditKind {
    /// System call boundary crossing.
    Syscall = 0,
    /// Security decision (capability checks).
    Security = 1,
    /// Login or session change.
    Login = 2,
    /// Subsystem-defined event (resource group mutations).
    UserDefined = 3,
}

impl AuditKind {
    /// Short tag used in console output.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Syscall => "SYSCALL",
            Self::Security => "SECURITY",
            Self::Login => "LOGIN",
            Self::UserDefined => "USER",
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// What an audited decision was about.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum AuditObject {
    /// Nothing beyond the acting task.
    #[default]
    None,
    /// A resource group.
    Group(GroupId),
    /// A task's membership in a resource group.
    Member {
        /// Group acted on.
        group: GroupId,
        /// Task attached or detached.
        pid: Pid,
    },
    /// A capability that was checked or changed.
    Capability(Capability),
}

impl fmt::Display for AuditObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Group(id) => write!(f, " group={}", id),
            Self::Member { group, pid } => write!(f, " group={} task={}", group, pid),
            Self::Capability(cap) => write!(f, " cap={}", cap),
        }
    }
}

/// One immutable entry of the audit trail.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AuditRecord {
    kind: AuditKind,
    message: &'static str,
    pid: Pid,
    uid: Uid,
    timestamp: u64,
    object: AuditObject,
}

impl AuditRecord {
    pub(crate) const fn empty() -> Self {
        Self {
            kind: AuditKind::Syscall,
            message: NO_MESSAGE,
            pid: Pid::new(0),
            uid: Uid::new(0),
            timestamp: 0,
            object: AuditObject::None,
        }
    }

    pub(crate) fn new(
        kind: AuditKind,
        message: Option<&'static str>,
        uid: Uid,
        pid: Pid,
        object: AuditObject,
        timestamp: u64,
    ) -> Self {
        Self {
            kind,
            message: message.unwrap_or(NO_MESSAGE),
            pid,
            uid,
            timestamp,
            object,
        }
    }

    /// Event class.
    #[inline]
    pub fn kind(&self) -> AuditKind {
        self.kind
    }

    /// Message text, or [`NO_MESSAGE`].
    #[inline]
    pub fn message(&self) -> &'static str {
        self.message
    }

    /// Acting task.
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Acting user.
    #[inline]
    pub fn uid(&self) -> Uid {
        self.uid
    }

    /// Clock value at the time of recording.
    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Object of the decision.
    #[inline]
    pub fn object(&self) -> AuditObject {
        self.object
    }
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "time={} pid={} uid={} type={} msg={}{}",
            self.timestamp, self.pid, self.uid, self.kind, self.message, self.object
        )
    }
}
