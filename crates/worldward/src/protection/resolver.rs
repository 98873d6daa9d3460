//! Flag and build-permission resolution over an applicable region set.

use std::sync::Arc;

use crate::ActorId;

use super::error::ProtectionError;
use super::flag::{keys, FlagKind, FlagRegistry, FlagValue, RegionGroup, State};
use super::region::Region;

/// A region paired with its resolved ancestor chain, snapshotted under the
/// manager's read lock. The chain is finite because parent assignment rejects
/// cycles.
#[derive(Debug, Clone)]
pub struct ResolvedRegion {
    region: Arc<Region>,
    ancestors: Vec<Arc<Region>>,
}

impl ResolvedRegion {
    pub(super) fn new(region: Arc<Region>, ancestors: Vec<Arc<Region>>) -> Self {
        Self { region, ancestors }
    }

    pub fn region(&self) -> &Arc<Region> {
        &self.region
    }

    /// Length of the parent chain. A strict descendant always has a longer
    /// chain than its ancestor, so chain length orders children first within a
    /// priority class.
    fn chain_depth(&self) -> usize {
        self.ancestors.len()
    }

    /// Ownership, inherited along the parent chain.
    fn is_owner(&self, actor: &ActorId) -> bool {
        self.region.is_owner(actor) || self.ancestors.iter().any(|a| a.is_owner(actor))
    }

    /// Membership (owners included), inherited along the parent chain.
    fn is_member(&self, actor: &ActorId) -> bool {
        self.region.is_member(actor) || self.ancestors.iter().any(|a| a.is_member(actor))
    }

    fn group_contains(&self, group: RegionGroup, actor: Option<&ActorId>) -> bool {
        match group {
            RegionGroup::All => true,
            RegionGroup::Owners => actor.map_or(false, |actor| self.is_owner(actor)),
            RegionGroup::Members => actor.map_or(false, |actor| self.is_member(actor)),
            // An absent actor is a non-member with no bypass.
            RegionGroup::NonMembers => actor.map_or(true, |actor| !self.is_member(actor)),
        }
    }

    /// The region's value for `key` that applies to this actor, narrowest
    /// group first. An unset flag is inherited from the nearest ancestor that
    /// sets it; group membership is always judged against this region. A
    /// region whose assignments apply only to other groups does not decide
    /// for this actor.
    fn applicable_value(&self, key: &str, actor: Option<&ActorId>) -> Option<&FlagValue> {
        for holder in std::iter::once(&self.region).chain(self.ancestors.iter()) {
            let Some(assignments) = holder.flag_assignments(key) else {
                continue;
            };
            for group in [
                RegionGroup::Owners,
                RegionGroup::Members,
                RegionGroup::NonMembers,
                RegionGroup::All,
            ] {
                if let Some(value) = assignments.get(&group) {
                    if self.group_contains(group, actor) {
                        return Some(value);
                    }
                }
            }
        }
        None
    }
}

/// The ordered, query-scoped set of regions overlapping a point or volume.
///
/// Entries are sorted by priority descending; among equal priority, longer
/// parent chains sort first so a region always precedes its strict ancestors
/// (inheritance, not competition), and remaining ties break by name so the
/// walk is deterministic. The global region sits after every entry, and the
/// flag registry's defaults sit after that.
pub struct ApplicableRegionSet {
    entries: Vec<ResolvedRegion>,
    global: ResolvedRegion,
    registry: Arc<FlagRegistry>,
}

impl ApplicableRegionSet {
    pub(super) fn new(
        mut entries: Vec<ResolvedRegion>,
        global: Arc<Region>,
        registry: Arc<FlagRegistry>,
    ) -> Self {
        entries.sort_by(|a, b| {
            b.region
                .priority
                .cmp(&a.region.priority)
                .then_with(|| b.chain_depth().cmp(&a.chain_depth()))
                .then_with(|| a.region.id().cmp(&b.region.id()))
        });
        Self {
            entries,
            global: ResolvedRegion::new(global, Vec::new()),
            registry,
        }
    }

    /// Number of overlapping regions, global region excluded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Regions in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Region>> {
        self.entries.iter().map(ResolvedRegion::region)
    }

    /// Whether the actor may place or break blocks here. Walks the regions in
    /// resolution order; in the deciding region, owners and members may always
    /// build, otherwise an explicit `build` assignment decides. Falls through
    /// to the global region and then the registered default (allow).
    ///
    /// Bypass permission is handled by the gate before this is consulted.
    pub fn can_build(&self, actor: Option<&ActorId>) -> bool {
        for entry in self.entries.iter().chain([&self.global]) {
            if let Some(actor) = actor {
                if entry.is_member(actor) {
                    return true;
                }
            }
            if let Some(state) = entry
                .applicable_value(keys::BUILD, actor)
                .and_then(FlagValue::as_state)
            {
                return state == State::Allow;
            }
        }
        self.default_state(keys::BUILD) == State::Allow
    }

    /// Stricter build variant: the deciding region's `construct` group must
    /// include the actor. With no explicit assignment anywhere, the registered
    /// default group is enforced against the covering regions; an uncovered
    /// point is unrestricted.
    pub fn can_construct(&self, actor: Option<&ActorId>) -> bool {
        for entry in self.entries.iter().chain([&self.global]) {
            if let Some(group) = entry
                .applicable_value(keys::CONSTRUCT, actor)
                .and_then(FlagValue::as_group)
            {
                return entry.group_contains(group, actor);
            }
        }
        if self.entries.is_empty() {
            return true;
        }
        let default_group = match self
            .registry
            .get(keys::CONSTRUCT)
            .and_then(|def| def.default.as_ref())
            .and_then(FlagValue::as_group)
        {
            Some(group) => group,
            None => return true,
        };
        self.entries
            .iter()
            .any(|entry| entry.group_contains(default_group, actor))
    }

    /// Resolve a flag to its effective value for this actor: the first region
    /// in resolution order with an applicable explicit assignment wins; unset
    /// falls through to the global region, then the registered default.
    pub fn resolve(
        &self,
        key: &str,
        actor: Option<&ActorId>,
    ) -> Result<Option<FlagValue>, ProtectionError> {
        let def = self.registry.require(key)?;
        for entry in self.entries.iter().chain([&self.global]) {
            if let Some(value) = entry.applicable_value(key, actor) {
                return Ok(Some(value.clone()));
            }
        }
        Ok(def.default.clone())
    }

    /// State-flag convenience: `true` unless the effective value is deny.
    pub fn allows(&self, key: &str, actor: Option<&ActorId>) -> Result<bool, ProtectionError> {
        let def = self.registry.require(key)?;
        if def.kind != FlagKind::State {
            return Err(ProtectionError::FlagKindMismatch {
                key: key.to_string(),
                expected: def.kind,
            });
        }
        let resolved = self.resolve(key, actor)?;
        Ok(resolved.and_then(|value| value.as_state()).map_or(true, |state| state == State::Allow))
    }

    fn default_state(&self, key: &str) -> State {
        self.registry
            .get(key)
            .and_then(|def| def.default.as_ref())
            .and_then(FlagValue::as_state)
            .unwrap_or(State::Allow)
    }
}
