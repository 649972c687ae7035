//! Security Core Configuration
//!
//! Compile-time constants fix the size of every array. A [`Config`] may
//! lower those limits at startup but never raise them, and is validated
//! before any subsystem is built.

use crate::audit::AUDIT_CAPACITY;
use crate::cap::CapabilitySet;
use crate::cgroup::{MAX_CHILDREN, MAX_GROUPS, MAX_TASKS_PER_GROUP};
use crate::error::ConfigError;
use crate::task::{Pid, Task, Uid};

/// Capabilities granted to the first task unless configured otherwise.
pub const DEFAULT_BOOTSTRAP_CAPS: CapabilitySet =
    CapabilitySet::CHOWN.union(CapabilitySet::KILL);

/// Limits enforced by the group hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupLimits {
    /// Live groups across the whole forest.
    pub max_groups: usize,
    /// Direct children of one group.
    pub max_children: usize,
    /// Members of one group.
    pub max_tasks_per_group: usize,
}

impl GroupLimits {
    /// Clamp every limit into `1..=capacity`.
    pub const fn clamped(self) -> Self {
        Self {
            max_groups: clamp(self.max_groups, MAX_GROUPS),
            max_children: clamp(self.max_children, MAX_CHILDREN),
            max_tasks_per_group: clamp(self.max_tasks_per_group, MAX_TASKS_PER_GROUP),
        }
    }
}

const fn clamp(value: usize, capacity: usize) -> usize {
    if value == 0 {
        1
    } else if value > capacity {
        capacity
    } else {
        value
    }
}

/// Startup configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Live groups across the whole forest.
    pub max_groups: usize,
    /// Direct children of one group.
    pub max_children: usize,
    /// Members of one group.
    pub max_tasks_per_group: usize,
    /// Audit ring size.
    pub audit_capacity: usize,
    /// Identity and capability set of the first task.
    pub bootstrap: Task,
}

impl Config {
    /// Full capacities and the default bootstrap policy
    /// (pid 1, uid 0, `CAP_CHOWN | CAP_KILL`).
    pub const fn new() -> Self {
        Self {
            max_groups: MAX_GROUPS,
            max_children: MAX_CHILDREN,
            max_tasks_per_group: MAX_TASKS_PER_GROUP,
            audit_capacity: AUDIT_CAPACITY,
            bootstrap: Task::new(Pid::new(1), Uid::ROOT, DEFAULT_BOOTSTRAP_CAPS),
        }
    }

    /// Set the live group limit.
    pub const fn with_max_groups(mut self, max_groups: usize) -> Self {
        self.max_groups = max_groups;
        self
    }

    /// Set the per-group child limit.
    pub const fn with_max_children(mut self, max_children: usize) -> Self {
        self.max_children = max_children;
        self
    }

    /// Set the per-group member limit.
    pub const fn with_max_tasks_per_group(mut self, max_tasks: usize) -> Self {
        self.max_tasks_per_group = max_tasks;
        self
    }

    /// Set the audit ring size.
    pub const fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }

    /// Set the bootstrap task.
    pub const fn with_bootstrap(mut self, bootstrap: Task) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Group limits derived from this config.
    pub const fn group_limits(&self) -> GroupLimits {
        GroupLimits {
            max_groups: self.max_groups,
            max_children: self.max_children,
            max_tasks_per_group: self.max_tasks_per_group,
        }
    }

    /// Reject limits outside `1..=capacity` and an all-powerful bootstrap
    /// task.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_limit("max_groups", self.max_groups, MAX_GROUPS)?;
        check_limit("max_children", self.max_children, MAX_CHILDREN)?;
        check_limit(
            "max_tasks_per_group",
            self.max_tasks_per_group,
            MAX_TASKS_PER_GROUP,
        )?;
        check_limit("audit_capacity", self.audit_capacity, AUDIT_CAPACITY)?;

        if self.bootstrap.caps.is_all() {
            return Err(ConfigError::BootstrapTooBroad);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn check_limit(limit: &'static str, requested: usize, capacity: usize) -> Result<(), ConfigError> {
    if requested == 0 {
        return Err(ConfigError::ZeroLimit(limit));
    }
    if requested > capacity {
        return Err(ConfigError::LimitTooLarge {
            limit,
            requested,
            capacity,
        });
    }
    Ok(())
}
