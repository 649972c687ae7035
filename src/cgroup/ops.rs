//! Gated Resource Group Operations
//!
//! Every mutating entry point runs the same sequence:
//! 1. resolve the caller through the task provider
//! 2. check `CAP_SYS_ADMIN` (a denial is audited by the registry)
//! 3. mutate the hierarchy under its lock
//! 4. audit the success before that lock is dropped, so concurrent
//!    mutations reach the trail in the order they were applied
//!
//! Argument and state errors (bad name, unknown id, full group) are
//! returned without an audit record: no security decision was made.

use super::group::GroupId;
use super::hierarchy::{Destroyed, Hierarchy};
use super::name::GroupName;
use super::snapshot::{write_group, write_header, GroupSnapshot};
use crate::audit::{AuditKind, AuditObject, AuditTrail};
use crate::cap::{Capability, CapabilityRegistry};
use crate::console::LogSink;
use crate::error::{Error, Result};
use crate::task::{Pid, Task, TaskProvider};

/// Capability required to change the group hierarchy.
pub const CGROUP_ADMIN_CAP: Capability = Capability::SysAdmin;

/// Borrowed handle bundling the hierarchy with its collaborators.
///
/// Obtained from [`SecurityKernel::cgroups`](crate::SecurityKernel::cgroups).
#[derive(Clone, Copy)]
pub struct ResourceGroups<'k> {
    pub(crate) hierarchy: &'k Hierarchy,
    pub(crate) caps: &'k CapabilityRegistry,
    pub(crate) audit: &'k AuditTrail<'k>,
    pub(crate) tasks: &'k dyn TaskProvider,
    pub(crate) sink: &'k dyn LogSink,
}

impl<'k> ResourceGroups<'k> {
    /// Create a group, optionally as a child of `parent`.
    ///
    /// # Errors
    /// - `Denied` without `CAP_SYS_ADMIN`
    /// - `InvalidName` for an empty, over-long or malformed name
    /// - `NoSpace` if the hierarchy or the parent's child list is full
    /// - `Duplicate` if a live group already has this name
    /// - `NotFound` if `parent` is stale
    pub fn create(&self, name: &str, parent: Option<GroupId>) -> Result<GroupId> {
        let caller = self.authorize()?;
        let group_name = GroupName::new(name).inspect_err(|_| {
            log::warn!(target: "cgroup", "[cgroup] Error: invalid cgroup name");
        })?;

        let id = self
            .hierarchy
            .create(group_name, parent, |id| {
                self.audit_success(&caller, "Created cgroup", AuditObject::Group(id));
            })
            .inspect_err(|err| {
                log::warn!(target: "cgroup", "[cgroup] Error: create '{}': {}", name, err);
            })?;

        log::info!(target: "cgroup", "[cgroup] Created cgroup id={} name={}", id, name);
        Ok(id)
    }

    /// Destroy a group and, recursively, all of its descendants.
    ///
    /// Members of every destroyed group are detached. One audit record is
    /// written per destroyed group, children first.
    pub fn destroy(&self, id: GroupId) -> Result<Destroyed> {
        let caller = self.authorize()?;
        let destroyed = self
            .hierarchy
            .destroy(id, |destroyed| {
                for gid in destroyed.groups() {
                    self.audit_success(&caller, "Destroyed cgroup", AuditObject::Group(*gid));
                }
            })
            .inspect_err(|err| {
                log::warn!(target: "cgroup", "[cgroup] Error: destroy {}: {}", id, err);
            })?;

        log::info!(
            target: "cgroup",
            "[cgroup] Destroyed cgroup id={} ({} groups, {} tasks released)",
            id,
            destroyed.groups().len(),
            destroyed.tasks_released()
        );
        Ok(destroyed)
    }

    /// Add `pid` to group `id`.
    ///
    /// # Errors
    /// - `NotFound` if `id` is stale
    /// - `Duplicate` if `pid` already belongs to this or any other group
    /// - `Full` if the group is at its member limit
    pub fn attach_task(&self, id: GroupId, pid: Pid) -> Result<()> {
        let caller = self.authorize()?;
        self.hierarchy
            .attach(id, pid, || {
                self.audit_success(
                    &caller,
                    "Attached task to cgroup",
                    AuditObject::Member { group: id, pid },
                );
            })
            .inspect_err(|err| {
                log::warn!(target: "cgroup", "[cgroup] Error: attach pid={} to {}: {}", pid, id, err);
            })?;

        log::info!(target: "cgroup", "[cgroup] Attached pid={} to cgroup id={}", pid, id);
        Ok(())
    }

    /// Remove `pid` from group `id`.
    pub fn detach_task(&self, id: GroupId, pid: Pid) -> Result<()> {
        let caller = self.authorize()?;
        self.hierarchy
            .detach(id, pid, || {
                self.audit_success(
                    &caller,
                    "Detached task from cgroup",
                    AuditObject::Member { group: id, pid },
                );
            })
            .inspect_err(|err| {
                log::warn!(target: "cgroup", "[cgroup] Error: detach pid={} from {}: {}", pid, id, err);
            })?;

        log::info!(target: "cgroup", "[cgroup] Detached pid={} from cgroup id={}", pid, id);
        Ok(())
    }

    /// Look a live group up by name.
    pub fn find(&self, name: &str) -> Result<GroupId> {
        self.hierarchy.find(name)
    }

    /// Check whether `pid` is a member of group `id`.
    pub fn has_task(&self, id: GroupId, pid: Pid) -> Result<bool> {
        self.hierarchy.has_task(id, pid)
    }

    /// The group `pid` currently belongs to.
    pub fn group_of(&self, pid: Pid) -> Option<GroupId> {
        self.hierarchy.group_of(pid)
    }

    /// Number of live groups.
    pub fn len(&self) -> usize {
        self.hierarchy.len()
    }

    /// True if no group is live.
    pub fn is_empty(&self) -> bool {
        self.hierarchy.is_empty()
    }

    /// Consistent copy of all groups and their members into caller-owned
    /// storage, which may be static.
    pub fn dump_into(&self, out: &mut GroupSnapshot) {
        self.hierarchy.snapshot_into(out);
    }

    /// Consistent copy of all groups and their members, by value.
    ///
    /// Convenient on the host; see [`dump_into`](Self::dump_into) for
    /// kernel stacks.
    pub fn dump(&self) -> GroupSnapshot {
        self.hierarchy.snapshot()
    }

    /// Print every group to the kernel log sink.
    ///
    /// Groups are copied out one at a time and printed with the lock
    /// released, so each group is consistent but the listing as a whole may
    /// interleave with concurrent mutations.
    pub fn dump_to_log(&self) {
        write_header(self.sink);
        let mut cursor = None;
        while let Some(group) = self.hierarchy.next_by_creation(cursor) {
            write_group(self.sink, &group);
            cursor = Some(group.created());
        }
    }

    fn authorize(&self) -> Result<Task> {
        let caller = self.tasks.current_task();
        if self
            .caps
            .capable(&caller, CGROUP_ADMIN_CAP, self.audit, self.sink)
        {
            Ok(caller)
        } else {
            Err(Error::Denied(CGROUP_ADMIN_CAP))
        }
    }

    fn audit_success(&self, caller: &Task, message: &'static str, object: AuditObject) {
        // Runs under the hierarchy lock, so no logging here.
        self.audit.append(
            AuditKind::UserDefined,
            Some(message),
            caller.uid,
            caller.pid,
            object,
        );
    }
}
