//! Security Kernel Context
//!
//! One [`SecurityKernel`] value owns the capability registry, the audit
//! trail and the resource group hierarchy, and borrows the collaborators
//! they need (task provider, log sink, clock). It is built once at boot and
//! passed by reference to every caller, so each test can build its own.
//!
//! # Initialization Order
//! 1. audit (so that every later decision can be recorded)
//! 2. capability registry
//! 3. cgroup hierarchy

use crate::audit::{AuditKind, AuditObject, AuditTrail};
use crate::cap::{Capability, CapabilityRegistry, CapabilitySet};
use crate::cgroup::{Hierarchy, ResourceGroups};
use crate::config::Config;
use crate::console::{Clock, LogSink};
use crate::error::{ConfigError, Result};
use crate::task::{Task, TaskProvider};

/// The security core of one kernel instance.
pub struct SecurityKernel<'a> {
    config: Config,
    caps: CapabilityRegistry,
    audit: AuditTrail<'a>,
    groups: Hierarchy,
    tasks: &'a dyn TaskProvider,
    sink: &'a dyn LogSink,
}

impl<'a> SecurityKernel<'a> {
    /// Build the security core.
    ///
    /// Fails fast if `config` is invalid. The returned kernel is empty;
    /// call [`init`](Self::init) before use.
    pub fn new(
        config: Config,
        tasks: &'a dyn TaskProvider,
        sink: &'a dyn LogSink,
        clock: &'a dyn Clock,
    ) -> core::result::Result<Self, ConfigError> {
        config.validate().inspect_err(|err| {
            log::warn!(target: "kernel", "[BOOT] Rejected security config: {}", err);
        })?;

        Ok(Self {
            config,
            caps: CapabilityRegistry::new(config.bootstrap),
            audit: AuditTrail::new(config.audit_capacity, clock),
            groups: Hierarchy::new(config.group_limits()),
            tasks,
            sink,
        })
    }

    /// Initialize every subsystem.
    pub fn init(&self) {
        self.audit.init();
        self.caps.init();
        self.groups.init();
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The calling task.
    pub fn current_task(&self) -> Task {
        self.tasks.current_task()
    }

    /// The first task, with its configured capability set.
    pub fn bootstrap_task(&self) -> Task {
        self.caps.bootstrap_task()
    }

    /// Check whether the calling task holds `cap`. Denials are audited.
    pub fn capable(&self, cap: Capability) -> bool {
        let task = self.tasks.current_task();
        self.task_capable(&task, cap)
    }

    /// Check whether `task` holds `cap`. Denials are audited.
    pub fn task_capable(&self, task: &Task, cap: Capability) -> bool {
        self.caps.capable(task, cap, &self.audit, self.sink)
    }

    /// Check a raw capability number for the calling task.
    ///
    /// Unknown numbers are refused without an audit record.
    pub fn capable_raw(&self, raw: u32) -> bool {
        let task = self.tasks.current_task();
        self.caps.capable_raw(&task, raw, &self.audit, self.sink)
    }

    /// Grant or clear one bit of `target` on behalf of the calling task.
    ///
    /// Requires `CAP_SETPCAP`, even when `target` is the caller's own set.
    pub fn set_capability(
        &self,
        target: &mut CapabilitySet,
        cap: Capability,
        value: bool,
    ) -> Result<()> {
        let actor = self.tasks.current_task();
        self.caps
            .set_capability(&actor, target, cap, value, &self.audit, self.sink)
    }

    /// Raw-number variant of [`set_capability`](Self::set_capability).
    pub fn set_capability_raw(
        &self,
        target: &mut CapabilitySet,
        raw: u32,
        value: bool,
    ) -> Result<()> {
        let actor = self.tasks.current_task();
        self.caps
            .set_capability_raw(&actor, target, raw, value, &self.audit, self.sink)
    }

    /// Grant or clear one capability of the bootstrap task.
    pub fn set_bootstrap_capability(&self, cap: Capability, value: bool) -> Result<()> {
        let actor = self.tasks.current_task();
        self.caps
            .set_bootstrap_capability(&actor, cap, value, &self.audit, self.sink)
    }

    /// Resource group operations, gated and audited.
    pub fn cgroups(&self) -> ResourceGroups<'_> {
        ResourceGroups {
            hierarchy: &self.groups,
            caps: &self.caps,
            audit: &self.audit,
            tasks: self.tasks,
            sink: self.sink,
        }
    }

    /// Audit trail, for inspection.
    #[inline]
    pub fn audit(&self) -> &AuditTrail<'a> {
        &self.audit
    }

    /// Record an event on behalf of the calling task.
    ///
    /// Used by other subsystems for syscall-boundary and login events.
    pub fn audit_event(&self, kind: AuditKind, message: Option<&'static str>) {
        let task = self.tasks.current_task();
        self.audit
            .record(kind, message, task.uid, task.pid, AuditObject::None);
    }

    /// Administrative flush: print the audit window to the log sink.
    pub fn flush_audit(&self) -> usize {
        self.audit.flush(self.sink)
    }
}
