//! Resource Groups (cgroups)
//!
//! A forest of named groups, each holding a bounded set of member tasks.
//!
//! # Design
//! - All groups live in one fixed arena owned by [`Hierarchy`]
//! - Ids carry a slot generation, so stale ids are detected
//! - A group never outlives its parent: destroy is recursive
//! - A task belongs to at most one group at a time
//!
//! # Security Properties
//! - Every mutation requires `CAP_SYS_ADMIN`
//! - Every denial and every successful mutation is audited

pub mod group;
pub mod hierarchy;
pub mod name;
pub mod ops;
pub mod snapshot;

pub use group::{GroupId, ResourceGroup, MAX_CHILDREN, MAX_GROUPS, MAX_TASKS_PER_GROUP};
pub use hierarchy::{Destroyed, Hierarchy};
pub use name::{GroupName, MAX_NAME_LEN};
pub use ops::{ResourceGroups, CGROUP_ADMIN_CAP};
pub use snapshot::GroupSnapshot;
