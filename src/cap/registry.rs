//! Capability Registry
//!
//! Answers "may this task perform an operation requiring capability C?"
//! and applies administrative changes to capability sets.
//!
//! # Security Properties
//! - Checks fail closed: unknown capability numbers are never granted
//! - Every denial appends exactly one security audit record
//! - Changing any capability set, including the caller's own, requires
//!   `CAP_SETPCAP`, so a task cannot escalate itself

use spin::Mutex;

use super::capability::{Capability, CapabilitySet};
use crate::audit::{AuditKind, AuditObject, AuditTrail};
use crate::console::LogSink;
use crate::error::{Error, Result};
use crate::sink_line;
use crate::task::Task;

/// Per-kernel capability state.
///
/// Holds the bootstrap task's set. All other sets are owned by their tasks
/// and reach the registry through [`Task`] snapshots.
pub struct CapabilityRegistry {
    bootstrap: Mutex<Task>,
}

impl CapabilityRegistry {
    /// Create a registry with the given bootstrap policy.
    pub const fn new(bootstrap: Task) -> Self {
        Self {
            bootstrap: Mutex::new(bootstrap),
        }
    }

    /// Announce the bootstrap policy.
    pub fn init(&self) {
        let task = self.bootstrap_task();
        log::info!(
            target: "capability",
            "[capability] Initialized capability subsystem (bootstrap pid={} uid={} caps={:?})",
            task.pid,
            task.uid,
            task.caps
        );
    }

    /// Current view of the bootstrap task.
    pub fn bootstrap_task(&self) -> Task {
        *self.bootstrap.lock()
    }

    /// Check whether `task` holds `cap`.
    ///
    /// On denial a security record is appended to `audit` and a diagnostic
    /// line is written to `sink`.
    pub fn capable(
        &self,
        task: &Task,
        cap: Capability,
        audit: &AuditTrail<'_>,
        sink: &dyn LogSink,
    ) -> bool {
        if task.caps.has(cap) {
            return true;
        }

        audit.record(
            AuditKind::Security,
            Some("Capability check failed"),
            task.uid,
            task.pid,
            AuditObject::Capability(cap),
        );
        sink_line!(
            sink,
            "[capability] Denied: pid={} uid={} cap={}",
            task.pid,
            task.uid,
            cap
        );
        false
    }

    /// Check by raw capability number.
    ///
    /// Numbers outside the declared set are rejected as invalid arguments:
    /// the answer is false and no audit record is written.
    pub fn capable_raw(
        &self,
        task: &Task,
        raw: u32,
        audit: &AuditTrail<'_>,
        sink: &dyn LogSink,
    ) -> bool {
        match Capability::from_raw(raw) {
            Some(cap) => self.capable(task, cap, audit, sink),
            None => {
                log::warn!(
                    target: "capability",
                    "[capability] Invalid capability {} requested by pid={}",
                    raw,
                    task.pid
                );
                false
            }
        }
    }

    /// Grant or clear one capability in `target` on behalf of `actor`.
    ///
    /// Requires `CAP_SETPCAP`. Successful changes are audited.
    pub fn set_capability(
        &self,
        actor: &Task,
        target: &mut CapabilitySet,
        cap: Capability,
        value: bool,
        audit: &AuditTrail<'_>,
        sink: &dyn LogSink,
    ) -> Result<()> {
        self.require(actor, Capability::SetPcap, audit, sink)?;
        target.assign(cap, value);
        Self::audit_change(actor, cap, value, audit);
        Ok(())
    }

    /// Raw-number variant of [`set_capability`](Self::set_capability).
    pub fn set_capability_raw(
        &self,
        actor: &Task,
        target: &mut CapabilitySet,
        raw: u32,
        value: bool,
        audit: &AuditTrail<'_>,
        sink: &dyn LogSink,
    ) -> Result<()> {
        let cap = Capability::from_raw(raw).ok_or(Error::InvalidCapability(raw))?;
        self.set_capability(actor, target, cap, value, audit, sink)
    }

    /// Grant or clear one capability of the bootstrap task.
    pub fn set_bootstrap_capability(
        &self,
        actor: &Task,
        cap: Capability,
        value: bool,
        audit: &AuditTrail<'_>,
        sink: &dyn LogSink,
    ) -> Result<()> {
        self.require(actor, Capability::SetPcap, audit, sink)?;
        self.bootstrap.lock().caps.assign(cap, value);
        Self::audit_change(actor, cap, value, audit);
        Ok(())
    }

    fn require(
        &self,
        task: &Task,
        cap: Capability,
        audit: &AuditTrail<'_>,
        sink: &dyn LogSink,
    ) -> Result<()> {
        if self.capable(task, cap, audit, sink) {
            Ok(())
        } else {
            Err(Error::Denied(cap))
        }
    }

    fn audit_change(actor: &Task, cap: Capability, value: bool, audit: &AuditTrail<'_>) {
        let message = if value {
            "Capability granted"
        } else {
            "Capability revoked"
        };
        audit.record(
            AuditKind::Security,
            Some(message),
            actor.uid,
            actor.pid,
            AuditObject::Capability(cap),
        );
    }
}
