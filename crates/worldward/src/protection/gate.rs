//! The permission gate: the decision primitives consumed by the event layer.
//!
//! Veto-source ordering is a deliberate, fixed policy rather than an ad hoc
//! per-event choice: configuration vetoes (fire-spread disable) come first,
//! then configuration always-allows (high-frequency flags off), then bypass,
//! then region resolution. The rule pipeline is an independent veto source the
//! event layer combines with these results; neither side outvotes the other.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::config::WorldToggles;
use crate::geometry::BlockPos;
use crate::{ActorId, WorldId};

use super::error::ProtectionError;
use super::flag::{keys, FlagRegistry};
use super::manager::RegionManager;

/// External identity/permission provider. Resolves a transient actor handle to
/// a permission decision; the core never interprets permission strings itself.
pub trait PermissionProvider {
    fn has_permission(&self, actor: &ActorId, world: &WorldId, node: &str) -> bool;
}

/// A provider that grants nothing. Useful as a default and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllPermissions;

impl PermissionProvider for DenyAllPermissions {
    fn has_permission(&self, _actor: &ActorId, _world: &WorldId, _node: &str) -> bool {
        false
    }
}

/// A world plus a block position, as seen by gate queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub world: WorldId,
    pub pos: BlockPos,
}

impl Location {
    pub fn new(world: impl Into<WorldId>, pos: BlockPos) -> Self {
        Self {
            world: world.into(),
            pos,
        }
    }
}

/// Region managers for every world, sharing one flag registry. Managers are
/// created lazily and live for the process.
pub struct RegionDirectory {
    registry: Arc<FlagRegistry>,
    worlds: RwLock<BTreeMap<WorldId, Arc<RegionManager>>>,
}

impl RegionDirectory {
    pub fn new(registry: Arc<FlagRegistry>) -> Self {
        Self {
            registry,
            worlds: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<FlagRegistry> {
        &self.registry
    }

    pub fn get(&self, world: &WorldId) -> Option<Arc<RegionManager>> {
        self.worlds
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(world)
            .map(Arc::clone)
    }

    pub fn get_or_create(&self, world: &WorldId) -> Arc<RegionManager> {
        let mut worlds = self
            .worlds
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(
            worlds
                .entry(world.clone())
                .or_insert_with(|| Arc::new(RegionManager::new(Arc::clone(&self.registry)))),
        )
    }
}

/// Exposes exactly four decision primitives: `can_build`, `can_construct`,
/// `allows`, and `has_bypass`. Each is a pure function of current region state
/// plus the permission provider; none mutates manager state.
pub struct ProtectionGate<P> {
    directory: Arc<RegionDirectory>,
    permissions: P,
}

impl<P: PermissionProvider> ProtectionGate<P> {
    pub fn new(directory: Arc<RegionDirectory>, permissions: P) -> Self {
        Self {
            directory,
            permissions,
        }
    }

    pub fn directory(&self) -> &Arc<RegionDirectory> {
        &self.directory
    }

    /// Global bypass. Evaluated first in every other entry point so bypass
    /// semantics stay uniform and auditable.
    pub fn has_bypass(&self, actor: &ActorId, world: &WorldId) -> bool {
        let node = format!("worldward.region.bypass.{world}");
        self.permissions.has_permission(actor, world, &node)
    }

    /// Whether the actor may place or break blocks at the location.
    pub fn can_build(&self, actor: &ActorId, location: &Location) -> bool {
        if self.has_bypass(actor, &location.world) {
            return true;
        }
        match self.directory.get(&location.world) {
            Some(manager) => manager.applicable_at(location.pos).can_build(Some(actor)),
            None => true,
        }
    }

    /// Stricter build variant requiring construction-specific membership.
    pub fn can_construct(&self, actor: &ActorId, location: &Location) -> bool {
        if self.has_bypass(actor, &location.world) {
            return true;
        }
        match self.directory.get(&location.world) {
            Some(manager) => manager.applicable_at(location.pos).can_construct(Some(actor)),
            None => true,
        }
    }

    /// Resolve a state flag at the location. An absent actor is a non-member
    /// with no bypass.
    pub fn allows(
        &self,
        key: &str,
        location: &Location,
        actor: Option<&ActorId>,
    ) -> Result<bool, ProtectionError> {
        if let Some(actor) = actor {
            if self.has_bypass(actor, &location.world) {
                return Ok(true);
            }
        }
        match self.directory.get(&location.world) {
            Some(manager) => manager.applicable_at(location.pos).allows(key, actor),
            None => {
                // No regions defined for the world: the registered default
                // decides, which for state flags is allow.
                self.directory.registry().require(key)?;
                Ok(true)
            }
        }
    }

    /// High-frequency check wrapper: when the toggle is off the flag is treated
    /// as always-allow without consulting the resolver.
    pub fn allows_frequent(
        &self,
        toggles: &WorldToggles,
        key: &str,
        location: &Location,
    ) -> Result<bool, ProtectionError> {
        if !toggles.high_freq_flags {
            return Ok(true);
        }
        self.allows(key, location, None)
    }

    /// Fire-spread ignition/burn decision: the configuration veto runs before
    /// the resolver, then the high-frequency `fire-spread` flag applies.
    pub fn allows_fire_spread(
        &self,
        toggles: &WorldToggles,
        location: &Location,
    ) -> Result<bool, ProtectionError> {
        if toggles.blocks_fire_spread() {
            return Ok(false);
        }
        self.allows_frequent(toggles, keys::FIRE_SPREAD, location)
    }
}
