//! Group Dump Snapshots
//!
//! `dump` copies every live group out under the hierarchy lock and hands
//! back this snapshot. Iterating it never touches the live hierarchy, so it
//! can be walked any number of times and never shows a half-applied change.
//!
//! A snapshot is as large as the group arena, so kernel callers keep one in
//! static storage and refill it with `dump_into` rather than taking it by
//! value.

use super::group::{GroupId, ResourceGroup, MAX_GROUPS};
use super::name::GroupName;
use crate::console::LogSink;
use crate::sink_line;
use crate::task::Pid;

/// Point-in-time copy of the group forest.
#[derive(Clone)]
pub struct GroupSnapshot {
    groups: [ResourceGroup; MAX_GROUPS],
    len: usize,
}

impl GroupSnapshot {
    /// An empty snapshot, e.g. for static storage passed to
    /// [`ResourceGroups::dump_into`](super::ResourceGroups::dump_into).
    pub const fn empty() -> Self {
        const BLANK: ResourceGroup =
            ResourceGroup::new(GroupId::VACANT, GroupName::empty(), None, 0);
        Self {
            groups: [BLANK; MAX_GROUPS],
            len: 0,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    pub(crate) fn push(&mut self, group: ResourceGroup) {
        debug_assert!(self.len < MAX_GROUPS);
        self.groups[self.len] = group;
        self.len += 1;
    }

    pub(crate) fn sort_by_creation(&mut self) {
        self.groups[..self.len].sort_unstable_by_key(ResourceGroup::created);
    }

    /// Groups in creation order.
    pub fn iter(&self) -> core::slice::Iter<'_, ResourceGroup> {
        self.groups[..self.len].iter()
    }

    /// Groups in creation order, paired with their members.
    pub fn entries(&self) -> impl Iterator<Item = (&ResourceGroup, &[Pid])> + '_ {
        self.iter().map(|group| (group, group.members()))
    }

    /// Number of groups captured.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no group was live.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Captured group with this name.
    pub fn find(&self, name: &str) -> Option<&ResourceGroup> {
        self.iter().find(|group| group.name() == name)
    }

    /// Print the snapshot, one line per group followed by its members.
    pub fn write_to(&self, sink: &dyn LogSink) {
        write_header(sink);
        for group in self.iter() {
            write_group(sink, group);
        }
    }
}

pub(crate) fn write_header(sink: &dyn LogSink) {
    sink_line!(sink, "[cgroup] Dumping all cgroups:");
}

pub(crate) fn write_group(sink: &dyn LogSink, group: &ResourceGroup) {
    sink_line!(
        sink,
        "  [{}] {}: {} tasks",
        group.id(),
        group.name(),
        group.member_count()
    );
    for pid in group.members() {
        sink_line!(sink, "    - pid: {}", pid);
    }
}

impl<'s> IntoIterator for &'s GroupSnapshot {
    type Item = &'s ResourceGroup;
    type IntoIter = core::slice::Iter<'s, ResourceGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
