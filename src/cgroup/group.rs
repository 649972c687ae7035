//! Resource Groups and Group Ids
//!
//! A [`GroupId`] is a slot index plus a generation. The generation is
//! bumped every time the slot is vacated, so an id held across a destroy is
//! detected as stale instead of silently naming whatever group reuses the
//! slot.

use core::fmt;

use super::name::GroupName;
use crate::task::Pid;

/// Maximum number of live groups.
pub const MAX_GROUPS: usize = 64;

/// Maximum number of direct children per group.
pub const MAX_CHILDREN: usize = 16;

/// Maximum number of member tasks per group.
pub const MAX_TASKS_PER_GROUP: usize = 128;

/// Generation-tagged handle to a resource group.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId {
    index: u16,
    generation: u32,
}

impl GroupId {
    /// Placeholder filling unused child entries. Never handed out.
    pub(crate) const VACANT: Self = Self {
        index: u16::MAX,
        generation: 0,
    };

    pub(crate) const fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index as u16,
            generation,
        }
    }

    /// Slot index. Reused after the group is destroyed.
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Slot generation at the time the group was created.
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({}.{})", self.index, self.generation)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.index, self.generation)
    }
}

/// A named set of tasks in the group forest.
#[derive(Clone, Copy, Debug)]
pub struct ResourceGroup {
    id: GroupId,
    name: GroupName,
    parent: Option<GroupId>,
    children: [GroupId; MAX_CHILDREN],
    child_count: usize,
    members: [Pid; MAX_TASKS_PER_GROUP],
    member_count: usize,
    /// Creation sequence number, used for creation-order tie-breaks.
    created: u64,
}

impl ResourceGroup {
    pub(crate) const fn new(
        id: GroupId,
        name: GroupName,
        parent: Option<GroupId>,
        created: u64,
    ) -> Self {
        Self {
            id,
            name,
            parent,
            children: [GroupId::VACANT; MAX_CHILDREN],
            child_count: 0,
            members: [Pid::new(0); MAX_TASKS_PER_GROUP],
            member_count: 0,
            created,
        }
    }

    /// Group id.
    #[inline]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Group name.
    #[inline]
    pub fn name(&self) -> &GroupName {
        &self.name
    }

    /// Parent group, or None for a root.
    #[inline]
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    /// Direct children in attach order.
    #[inline]
    pub fn children(&self) -> &[GroupId] {
        &self.children[..self.child_count]
    }

    /// Member tasks in attach order.
    #[inline]
    pub fn members(&self) -> &[Pid] {
        &self.members[..self.member_count]
    }

    /// Number of member tasks.
    #[inline]
    pub fn member_count(&self) -> usize {
        self.member_count
    }

    /// Check membership.
    pub fn has_member(&self, pid: Pid) -> bool {
        self.members().contains(&pid)
    }

    /// Creation sequence number. Lower means created earlier.
    #[inline]
    pub fn created(&self) -> u64 {
        self.created
    }

    pub(crate) fn push_child(&mut self, child: GroupId) {
        debug_assert!(self.child_count < MAX_CHILDREN);
        self.children[self.child_count] = child;
        self.child_count += 1;
    }

    pub(crate) fn remove_child(&mut self, child: GroupId) {
        if let Some(pos) = self.children().iter().position(|c| *c == child) {
            self.children.copy_within(pos + 1..self.child_count, pos);
            self.child_count -= 1;
            self.children[self.child_count] = GroupId::VACANT;
        } else {
            debug_assert!(false, "child {} missing from parent {}", child, self.id);
        }
    }

    pub(crate) fn push_member(&mut self, pid: Pid) {
        debug_assert!(self.member_count < MAX_TASKS_PER_GROUP);
        self.members[self.member_count] = pid;
        self.member_count += 1;
    }

    /// Remove a member, keeping the rest in order. Returns false if absent.
    pub(crate) fn remove_member(&mut self, pid: Pid) -> bool {
        match self.members().iter().position(|p| *p == pid) {
            Some(pos) => {
                self.members.copy_within(pos + 1..self.member_count, pos);
                self.member_count -= 1;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> ResourceGroup {
        ResourceGroup::new(GroupId::new(0, 0), GroupName::new("g").unwrap(), None, 0)
    }

    #[test]
    fn test_member_removal_keeps_order() {
        let mut g = group();
        for pid in [3, 1, 4, 15] {
            g.push_member(Pid::new(pid));
        }
        assert!(g.remove_member(Pid::new(1)));
        assert_eq!(g.members(), &[Pid::new(3), Pid::new(4), Pid::new(15)]);
        assert!(!g.remove_member(Pid::new(99)));
        assert_eq!(g.member_count(), 3);
    }

    #[test]
    fn test_child_removal() {
        let mut g = group();
        let a = GroupId::new(1, 0);
        let b = GroupId::new(2, 0);
        let c = GroupId::new(3, 4);
        g.push_child(a);
        g.push_child(b);
        g.push_child(c);
        g.remove_child(b);
        assert_eq!(g.children(), &[a, c]);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(format!("{}", GroupId::new(5, 2)), "5.2");
        assert_eq!(format!("{:?}", GroupId::new(5, 2)), "GroupId(5.2)");
    }
}
