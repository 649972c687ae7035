//! Resource Group Hierarchy
//!
//! Owns every [`ResourceGroup`] in a fixed arena of slots.
//!
//! # Design
//! - Slot + generation ids: destroying a group bumps its slot generation,
//!   so stale ids fail with `NotFound`
//! - Groups are only ever attached as children at creation time, never
//!   re-parented, so the parent links always form a forest
//! - Destroy removes the whole subtree under one lock acquisition; no
//!   observer can see a destroyed parent with a live child
//!
//! Methods here perform no capability checks. Each mutation takes a
//! `commit` hook that runs after the change is applied but before the lock
//! is dropped; [`ResourceGroups`](super::ResourceGroups) uses it to write the
//! success audit record, so the trail orders mutations the way the hierarchy
//! applied them. Lock order is hierarchy, then audit.

use spin::Mutex;

use super::group::{GroupId, ResourceGroup, MAX_GROUPS};
use super::name::GroupName;
use super::snapshot::GroupSnapshot;
use crate::config::GroupLimits;
use crate::error::{Error, Result};
use crate::task::Pid;

/// One arena slot.
#[derive(Clone, Copy)]
struct Slot {
    /// Bumped each time the slot is vacated.
    generation: u32,
    group: Option<ResourceGroup>,
}

impl Slot {
    const VACANT: Self = Self {
        generation: 0,
        group: None,
    };
}

/// Arena state behind the lock.
struct HierarchyInner {
    slots: [Slot; MAX_GROUPS],
    /// Number of occupied slots.
    live: usize,
    /// Next creation sequence number.
    next_seq: u64,
}

impl HierarchyInner {
    const fn new() -> Self {
        Self {
            slots: [Slot::VACANT; MAX_GROUPS],
            live: 0,
            next_seq: 0,
        }
    }

    fn get(&self, id: GroupId) -> Result<&ResourceGroup> {
        let slot = self.slots.get(id.index()).ok_or(Error::NotFound)?;
        if slot.generation != id.generation() {
            return Err(Error::NotFound);
        }
        slot.group.as_ref().ok_or(Error::NotFound)
    }

    fn get_mut(&mut self, id: GroupId) -> Result<&mut ResourceGroup> {
        let slot = self.slots.get_mut(id.index()).ok_or(Error::NotFound)?;
        if slot.generation != id.generation() {
            return Err(Error::NotFound);
        }
        slot.group.as_mut().ok_or(Error::NotFound)
    }

    fn live_groups(&self) -> impl Iterator<Item = &ResourceGroup> + '_ {
        self.slots.iter().filter_map(|slot| slot.group.as_ref())
    }

    /// Earliest-created live group with this name.
    fn find(&self, name: &str) -> Option<GroupId> {
        self.live_groups()
            .filter(|group| group.name() == name)
            .min_by_key(|group| group.created())
            .map(ResourceGroup::id)
    }

    fn group_of(&self, pid: Pid) -> Option<GroupId> {
        self.live_groups()
            .find(|group| group.has_member(pid))
            .map(ResourceGroup::id)
    }
}

/// Groups removed by one destroy call.
#[derive(Clone, Copy, Debug)]
pub struct Destroyed {
    /// Descendants first, the requested group last.
    ids: [GroupId; MAX_GROUPS],
    len: usize,
    tasks_released: usize,
}

impl Destroyed {
    const fn new() -> Self {
        Self {
            ids: [GroupId::VACANT; MAX_GROUPS],
            len: 0,
            tasks_released: 0,
        }
    }

    fn push(&mut self, id: GroupId) {
        self.ids[self.len] = id;
        self.len += 1;
    }

    /// Destroyed group ids, children before their parents.
    pub fn groups(&self) -> &[GroupId] {
        &self.ids[..self.len]
    }

    /// Number of memberships cleared.
    pub fn tasks_released(&self) -> usize {
        self.tasks_released
    }
}

/// Process-wide group forest.
pub struct Hierarchy {
    inner: Mutex<HierarchyInner>,
    limits: GroupLimits,
}

impl Hierarchy {
    /// Create an empty hierarchy.
    ///
    /// Limits are clamped to the compile-time capacities.
    pub const fn new(limits: GroupLimits) -> Self {
        Self {
            inner: Mutex::new(HierarchyInner::new()),
            limits: limits.clamped(),
        }
    }

    /// Drop every group.
    ///
    /// Slot generations keep counting, so ids from before the reset stay
    /// invalid.
    pub fn init(&self) {
        {
            let mut inner = self.inner.lock();
            for slot in inner.slots.iter_mut() {
                if slot.group.take().is_some() {
                    slot.generation = slot.generation.wrapping_add(1);
                }
            }
            inner.live = 0;
        }
        log::info!(
            target: "cgroup",
            "[cgroup] Initialized cgroup subsystem (max {} groups)",
            self.limits.max_groups
        );
    }

    /// Limits this hierarchy enforces.
    #[inline]
    pub fn limits(&self) -> GroupLimits {
        self.limits
    }

    pub(crate) fn create(
        &self,
        name: GroupName,
        parent: Option<GroupId>,
        commit: impl FnOnce(GroupId),
    ) -> Result<GroupId> {
        let mut inner = self.inner.lock();

        if inner.live >= self.limits.max_groups {
            return Err(Error::NoSpace);
        }
        if inner.find(name.as_str()).is_some() {
            return Err(Error::Duplicate);
        }
        if let Some(parent) = parent {
            if inner.get(parent)?.children().len() >= self.limits.max_children {
                return Err(Error::NoSpace);
            }
        }

        // Lowest free slot, so indices stay dense.
        let index = inner.slots[..self.limits.max_groups]
            .iter()
            .position(|slot| slot.group.is_none())
            .ok_or(Error::NoSpace)?;

        let seq = inner.next_seq;
        inner.next_seq += 1;
        let id = GroupId::new(index, inner.slots[index].generation);
        inner.slots[index].group = Some(ResourceGroup::new(id, name, parent, seq));
        inner.live += 1;

        if let Some(parent) = parent {
            inner.get_mut(parent)?.push_child(id);
        }
        commit(id);
        Ok(id)
    }

    pub(crate) fn destroy(
        &self,
        id: GroupId,
        commit: impl FnOnce(&Destroyed),
    ) -> Result<Destroyed> {
        let mut inner = self.inner.lock();
        let parent = inner.get(id)?.parent();

        // Pre-order walk with an explicit stack. Every live group is pushed
        // at most once, so MAX_GROUPS entries always suffice.
        let mut order = Destroyed::new();
        let mut stack = [GroupId::VACANT; MAX_GROUPS];
        let mut depth = 1;
        stack[0] = id;
        while depth > 0 {
            depth -= 1;
            let current = stack[depth];
            let group = inner.get(current);
            debug_assert!(group.is_ok(), "dangling child {}", current);
            let Ok(group) = group else { continue };
            order.push(current);
            for child in group.children() {
                stack[depth] = *child;
                depth += 1;
            }
        }

        if let Some(parent) = parent {
            let group = inner.get_mut(parent);
            debug_assert!(group.is_ok(), "dangling parent {}", parent);
            if let Ok(group) = group {
                group.remove_child(id);
            }
        }

        // Reverse pre-order: every child goes before its parent.
        let mut released = 0;
        for gid in order.groups().iter().rev() {
            let slot = &mut inner.slots[gid.index()];
            if let Some(group) = slot.group.take() {
                released += group.member_count();
            }
            slot.generation = slot.generation.wrapping_add(1);
            inner.live -= 1;
        }
        order.tasks_released = released;
        order.ids[..order.len].reverse();

        commit(&order);
        Ok(order)
    }

    pub(crate) fn attach(&self, id: GroupId, pid: Pid, commit: impl FnOnce()) -> Result<()> {
        let mut inner = self.inner.lock();
        let group = inner.get(id)?;

        if group.has_member(pid) || inner.group_of(pid).is_some() {
            return Err(Error::Duplicate);
        }
        if group.member_count() >= self.limits.max_tasks_per_group {
            return Err(Error::Full);
        }

        inner.get_mut(id)?.push_member(pid);
        commit();
        Ok(())
    }

    pub(crate) fn detach(&self, id: GroupId, pid: Pid, commit: impl FnOnce()) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.get_mut(id)?.remove_member(pid) {
            commit();
            Ok(())
        } else {
            Err(Error::TaskNotFound)
        }
    }

    /// Look a live group up by name.
    ///
    /// If several groups ever matched, the earliest created would win.
    pub fn find(&self, name: &str) -> Result<GroupId> {
        self.inner.lock().find(name).ok_or(Error::NotFound)
    }

    /// Copy of one group.
    pub fn get(&self, id: GroupId) -> Result<ResourceGroup> {
        self.inner.lock().get(id).copied()
    }

    /// Check whether `pid` is a member of group `id`.
    pub fn has_task(&self, id: GroupId, pid: Pid) -> Result<bool> {
        Ok(self.inner.lock().get(id)?.has_member(pid))
    }

    /// The group `pid` belongs to, if any.
    pub fn group_of(&self, pid: Pid) -> Option<GroupId> {
        self.inner.lock().group_of(pid)
    }

    /// Number of live groups.
    pub fn len(&self) -> usize {
        self.inner.lock().live
    }

    /// True if no group is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consistent copy of every live group into caller-owned storage, in
    /// creation order. Previous contents of `out` are discarded.
    pub fn snapshot_into(&self, out: &mut GroupSnapshot) {
        out.clear();
        {
            let inner = self.inner.lock();
            for group in inner.live_groups() {
                out.push(*group);
            }
        }
        out.sort_by_creation();
    }

    /// Consistent copy of every live group, returned by value.
    ///
    /// The snapshot is as large as the whole arena; kernel threads with small
    /// stacks should use [`snapshot_into`](Self::snapshot_into) with static
    /// storage instead.
    pub fn snapshot(&self) -> GroupSnapshot {
        let mut snap = GroupSnapshot::empty();
        self.snapshot_into(&mut snap);
        snap
    }

    /// Copy of the earliest-created live group created after sequence
    /// number `after` (or the earliest of all when `after` is None).
    ///
    /// Lets a caller walk the forest one group at a time without holding
    /// the lock between steps.
    pub fn next_by_creation(&self, after: Option<u64>) -> Option<ResourceGroup> {
        self.inner
            .lock()
            .live_groups()
            .filter(|group| after.map_or(true, |seq| group.created() > seq))
            .min_by_key(|group| group.created())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroup::{MAX_CHILDREN, MAX_TASKS_PER_GROUP};

    fn limits(max_groups: usize) -> GroupLimits {
        GroupLimits {
            max_groups,
            max_children: MAX_CHILDREN,
            max_tasks_per_group: MAX_TASKS_PER_GROUP,
        }
    }

    fn name(s: &str) -> GroupName {
        GroupName::new(s).unwrap()
    }

    #[test]
    fn test_create_and_find() {
        let h = Hierarchy::new(limits(8));
        let a = h.create(name("a"), None, |_| ()).unwrap();
        let b = h.create(name("b"), Some(a), |_| ()).unwrap();
        assert_eq!(h.find("a"), Ok(a));
        assert_eq!(h.find("b"), Ok(b));
        assert_eq!(h.find("c"), Err(Error::NotFound));
        assert_eq!(h.get(b).unwrap().parent(), Some(a));
        assert_eq!(h.get(a).unwrap().children(), &[b]);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_duplicate_name_anywhere() {
        let h = Hierarchy::new(limits(8));
        let a = h.create(name("a"), None, |_| ()).unwrap();
        h.create(name("x"), Some(a), |_| ()).unwrap();
        assert_eq!(h.create(name("x"), None, |_| ()), Err(Error::Duplicate));
        assert_eq!(h.create(name("a"), Some(a), |_| ()), Err(Error::Duplicate));
    }

    #[test]
    fn test_no_space_and_slot_reuse() {
        let h = Hierarchy::new(limits(2));
        let a = h.create(name("a"), None, |_| ()).unwrap();
        let b = h.create(name("b"), None, |_| ()).unwrap();
        assert_eq!(h.create(name("c"), None, |_| ()), Err(Error::NoSpace));

        h.destroy(a, |_| ()).unwrap();
        let c = h.create(name("c"), None, |_| ()).unwrap();
        assert_eq!(c.index(), a.index());
        assert_ne!(c.generation(), a.generation());

        // The stale id must not alias the new group.
        assert_eq!(h.get(a).map(|g| g.id()), Err(Error::NotFound));
        assert_eq!(h.destroy(a, |_| ()).map(|_| ()), Err(Error::NotFound));
        assert_eq!(h.get(b).unwrap().name().as_str(), "b");
    }

    #[test]
    fn test_parent_child_limit() {
        let h = Hierarchy::new(GroupLimits {
            max_groups: 8,
            max_children: 1,
            max_tasks_per_group: 4,
        });
        let root = h.create(name("root"), None, |_| ()).unwrap();
        h.create(name("one"), Some(root), |_| ()).unwrap();
        assert_eq!(h.create(name("two"), Some(root), |_| ()), Err(Error::NoSpace));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_stale_parent_rejected() {
        let h = Hierarchy::new(limits(8));
        let a = h.create(name("a"), None, |_| ()).unwrap();
        h.destroy(a, |_| ()).unwrap();
        assert_eq!(h.create(name("b"), Some(a), |_| ()), Err(Error::NotFound));
        assert!(h.is_empty());
    }

    #[test]
    fn test_destroy_is_recursive() {
        let h = Hierarchy::new(limits(16));
        let root = h.create(name("root"), None, |_| ()).unwrap();
        let a = h.create(name("a"), Some(root), |_| ()).unwrap();
        let b = h.create(name("b"), Some(root), |_| ()).unwrap();
        let a1 = h.create(name("a1"), Some(a), |_| ()).unwrap();
        let other = h.create(name("other"), None, |_| ()).unwrap();
        h.attach(a1, Pid::new(7), || ()).unwrap();
        h.attach(b, Pid::new(8), || ()).unwrap();

        let destroyed = h.destroy(root, |_| ()).unwrap();
        assert_eq!(destroyed.groups().len(), 4);
        assert_eq!(destroyed.tasks_released(), 2);
        assert_eq!(*destroyed.groups().last().unwrap(), root);
        let pos = |id| destroyed.groups().iter().position(|g| *g == id).unwrap();
        assert!(pos(a1) < pos(a));

        for n in ["root", "a", "b", "a1"] {
            assert_eq!(h.find(n), Err(Error::NotFound));
        }
        assert_eq!(h.find("other"), Ok(other));
        assert_eq!(h.group_of(Pid::new(7)), None);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_destroy_child_unlinks_from_parent() {
        let h = Hierarchy::new(limits(8));
        let root = h.create(name("root"), None, |_| ()).unwrap();
        let a = h.create(name("a"), Some(root), |_| ()).unwrap();
        let b = h.create(name("b"), Some(root), |_| ()).unwrap();
        h.destroy(a, |_| ()).unwrap();
        assert_eq!(h.get(root).unwrap().children(), &[b]);
    }

    #[test]
    fn test_attach_detach_scenario() {
        let h = Hierarchy::new(limits(8));
        let g = h.create(name("g"), None, |_| ()).unwrap();
        let pid = Pid::new(42);

        assert_eq!(h.attach(g, pid, || ()), Ok(()));
        assert_eq!(h.attach(g, pid, || ()), Err(Error::Duplicate));
        assert_eq!(h.has_task(g, pid), Ok(true));
        assert_eq!(h.detach(g, pid, || ()), Ok(()));
        assert_eq!(h.detach(g, pid, || ()), Err(Error::TaskNotFound));
        assert_eq!(h.has_task(g, pid), Ok(false));
    }

    #[test]
    fn test_single_group_membership() {
        let h = Hierarchy::new(limits(8));
        let a = h.create(name("a"), None, |_| ()).unwrap();
        let b = h.create(name("b"), None, |_| ()).unwrap();
        h.attach(a, Pid::new(1), || ()).unwrap();
        assert_eq!(h.attach(b, Pid::new(1), || ()), Err(Error::Duplicate));
        h.detach(a, Pid::new(1), || ()).unwrap();
        assert_eq!(h.attach(b, Pid::new(1), || ()), Ok(()));
        assert_eq!(h.group_of(Pid::new(1)), Some(b));
    }

    #[test]
    fn test_group_full() {
        let h = Hierarchy::new(GroupLimits {
            max_groups: 4,
            max_children: 4,
            max_tasks_per_group: 2,
        });
        let g = h.create(name("g"), None, |_| ()).unwrap();
        h.attach(g, Pid::new(1), || ()).unwrap();
        h.attach(g, Pid::new(2), || ()).unwrap();
        assert_eq!(h.attach(g, Pid::new(3), || ()), Err(Error::Full));
    }

    #[test]
    fn test_operations_on_unknown_id() {
        let h = Hierarchy::new(limits(4));
        let bogus = GroupId::new(3, 0);
        assert_eq!(h.attach(bogus, Pid::new(1), || ()), Err(Error::NotFound));
        assert_eq!(h.detach(bogus, Pid::new(1), || ()), Err(Error::NotFound));
        assert_eq!(h.has_task(bogus, Pid::new(1)), Err(Error::NotFound));
        assert_eq!(h.attach(GroupId::VACANT, Pid::new(1), || ()), Err(Error::NotFound));
    }

    #[test]
    fn test_snapshot_in_creation_order() {
        let h = Hierarchy::new(limits(4));
        let a = h.create(name("a"), None, |_| ()).unwrap();
        h.create(name("b"), None, |_| ()).unwrap();
        h.destroy(a, |_| ()).unwrap();
        h.create(name("c"), None, |_| ()).unwrap();

        let snap = h.snapshot();
        let names: Vec<&str> = snap.iter().map(|g| g.name().as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_init_invalidates_ids() {
        let h = Hierarchy::new(limits(4));
        let a = h.create(name("a"), None, |_| ()).unwrap();
        h.init();
        assert!(h.is_empty());
        assert_eq!(h.get(a).map(|g| g.id()), Err(Error::NotFound));
        let again = h.create(name("a"), None, |_| ()).unwrap();
        assert_ne!(again, a);
    }

    #[test]
    fn test_commit_runs_under_lock() {
        let h = Hierarchy::new(limits(4));
        let mut seen = None;
        let g = h
            .create(name("g"), None, |id| {
                assert!(h.inner.is_locked());
                seen = Some(id);
            })
            .unwrap();
        assert_eq!(seen, Some(g));
        assert!(!h.inner.is_locked());

        h.attach(g, Pid::new(1), || assert!(h.inner.is_locked())).unwrap();
        h.detach(g, Pid::new(1), || assert!(h.inner.is_locked())).unwrap();
        h.destroy(g, |d| {
            assert!(h.inner.is_locked());
            assert_eq!(d.groups(), &[g]);
        })
        .unwrap();
    }

    #[test]
    fn test_commit_skipped_on_error() {
        let h = Hierarchy::new(limits(4));
        let g = h.create(name("g"), None, |_| ()).unwrap();
        let mut calls = 0;
        assert_eq!(h.create(name("g"), None, |_| calls += 1), Err(Error::Duplicate));
        assert_eq!(h.detach(g, Pid::new(5), || calls += 1), Err(Error::TaskNotFound));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_snapshot_into_reuses_storage() {
        let h = Hierarchy::new(limits(4));
        let a = h.create(name("a"), None, |_| ()).unwrap();
        h.create(name("b"), None, |_| ()).unwrap();

        let mut snap = GroupSnapshot::empty();
        h.snapshot_into(&mut snap);
        assert_eq!(snap.len(), 2);

        h.destroy(a, |_| ()).unwrap();
        h.snapshot_into(&mut snap);
        let names: Vec<&str> = snap.iter().map(|g| g.name().as_str()).collect();
        assert_eq!(names, vec!["b"]);
    }

    #[test]
    fn test_walk_by_creation() {
        let h = Hierarchy::new(limits(4));
        let a = h.create(name("a"), None, |_| ()).unwrap();
        h.create(name("b"), None, |_| ()).unwrap();
        h.destroy(a, |_| ()).unwrap();
        h.create(name("c"), None, |_| ()).unwrap();

        let mut names = Vec::new();
        let mut cursor = None;
        while let Some(group) = h.next_by_creation(cursor) {
            names.push(group.name().as_str().to_string());
            cursor = Some(group.created());
        }
        assert_eq!(names, vec!["b", "c"]);
    }
}
