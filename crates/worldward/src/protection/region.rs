//! Protected regions: named zones with priority, shape, flags, and membership.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::geometry::RegionShape;
use crate::ActorId;

use super::flag::{FlagValue, RegionGroup};

/// Per-group flag assignments for a single flag key. Sparse: an absent group
/// means "unset for that group", which is distinct from an explicit deny.
pub type FlagAssignments = BTreeMap<RegionGroup, FlagValue>;

/// A named protected zone. The shape is fixed at construction; flags, priority,
/// membership, and the parent link are edited through the region manager so the
/// spatial index and parent chains stay consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    pub shape: RegionShape,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, FlagAssignments>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub owners: BTreeSet<ActorId>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub members: BTreeSet<ActorId>,
    /// Parent region, stored as a normalized name. Never a live reference, so
    /// a deleted parent is simply cleared by the manager.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Region {
    pub fn new(name: impl Into<String>, shape: RegionShape) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            shape,
            flags: BTreeMap::new(),
            owners: BTreeSet::new(),
            members: BTreeSet::new(),
            parent: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Normalized identifier: region names are case-insensitive.
    pub fn id(&self) -> String {
        normalize_name(&self.name)
    }

    /// Owner check against this region's own owner set.
    pub fn is_owner(&self, actor: &ActorId) -> bool {
        self.owners.contains(actor)
    }

    /// Member check against this region's own sets. Owners count as members.
    pub fn is_member(&self, actor: &ActorId) -> bool {
        self.owners.contains(actor) || self.members.contains(actor)
    }

    pub fn flag_assignments(&self, key: &str) -> Option<&FlagAssignments> {
        self.flags.get(key)
    }

    pub(super) fn set_flag(&mut self, key: &str, group: RegionGroup, value: FlagValue) {
        self.flags.entry(key.to_string()).or_default().insert(group, value);
    }

    pub(super) fn clear_flag(&mut self, key: &str, group: Option<RegionGroup>) {
        match group {
            Some(group) => {
                if let Some(assignments) = self.flags.get_mut(key) {
                    assignments.remove(&group);
                    if assignments.is_empty() {
                        self.flags.remove(key);
                    }
                }
            }
            None => {
                self.flags.remove(key);
            }
        }
    }
}

pub(super) fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}
