//! Per-world region container and spatial index.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use crate::geometry::{BlockCuboid, BlockPos, RegionShape};
use crate::ActorId;

use super::error::ProtectionError;
use super::flag::{FlagRegistry, FlagValue, RegionGroup};
use super::region::{normalize_name, Region};
use super::resolver::{ApplicableRegionSet, ResolvedRegion};

/// Addressable name of the per-world global region. It has no shape, the
/// lowest implicit priority, and supports flag and membership edits only.
pub const GLOBAL_REGION: &str = "__global__";

/// Chunk columns are 16x16 blocks on the x/z plane.
const CHUNK_BITS: i32 = 4;

type ChunkKey = (i32, i32);

fn chunk_of(pos: BlockPos) -> ChunkKey {
    (pos.x >> CHUNK_BITS, pos.z >> CHUNK_BITS)
}

struct ManagerInner {
    /// Normalized name -> region. Regions are replaced wholesale on mutation
    /// so queries holding an `Arc` never observe a half-applied edit.
    regions: BTreeMap<String, Arc<Region>>,
    /// Chunk-column buckets over every bounded shape. Point lookups touch one
    /// bucket instead of scanning the whole region table.
    buckets: HashMap<ChunkKey, Vec<String>>,
    /// Regions whose shape has no bounding box; checked on every query.
    unbounded: BTreeSet<String>,
    global: Arc<Region>,
}

impl ManagerInner {
    fn index_add(&mut self, id: &str, shape: &RegionShape) {
        match shape.bounds() {
            Some(bounds) => {
                let (min_cx, min_cz) = chunk_of(bounds.min);
                let (max_cx, max_cz) = chunk_of(bounds.max);
                for cx in min_cx..=max_cx {
                    for cz in min_cz..=max_cz {
                        self.buckets.entry((cx, cz)).or_default().push(id.to_string());
                    }
                }
            }
            None => {
                self.unbounded.insert(id.to_string());
            }
        }
    }

    fn index_remove(&mut self, id: &str, shape: &RegionShape) {
        match shape.bounds() {
            Some(bounds) => {
                let (min_cx, min_cz) = chunk_of(bounds.min);
                let (max_cx, max_cz) = chunk_of(bounds.max);
                for cx in min_cx..=max_cx {
                    for cz in min_cz..=max_cz {
                        if let Some(bucket) = self.buckets.get_mut(&(cx, cz)) {
                            bucket.retain(|name| name != id);
                            if bucket.is_empty() {
                                self.buckets.remove(&(cx, cz));
                            }
                        }
                    }
                }
            }
            None => {
                self.unbounded.remove(id);
            }
        }
    }

    /// Walk the parent chain of `region`. The chain is kept acyclic by
    /// `set_parent`, and a missing parent simply ends the walk.
    fn ancestors_of(&self, region: &Region) -> Vec<Arc<Region>> {
        let mut ancestors = Vec::new();
        let mut seen = BTreeSet::new();
        let mut next = region.parent.clone();
        while let Some(id) = next {
            if !seen.insert(id.clone()) {
                break;
            }
            match self.regions.get(&id) {
                Some(parent) => {
                    next = parent.parent.clone();
                    ancestors.push(Arc::clone(parent));
                }
                None => break,
            }
        }
        ancestors
    }

    fn resolve_entry(&self, region: &Arc<Region>) -> ResolvedRegion {
        ResolvedRegion::new(Arc::clone(region), self.ancestors_of(region))
    }
}

/// Owns the regions of one world. Reads take a shared lock; every structural
/// change (add, remove, reparent, flag edit) happens under one write lock so
/// the spatial index is always consistent with the region table.
pub struct RegionManager {
    registry: Arc<FlagRegistry>,
    inner: RwLock<ManagerInner>,
}

impl RegionManager {
    pub fn new(registry: Arc<FlagRegistry>) -> Self {
        Self {
            registry,
            inner: RwLock::new(ManagerInner {
                regions: BTreeMap::new(),
                buckets: HashMap::new(),
                unbounded: BTreeSet::new(),
                global: Arc::new(Region::new(GLOBAL_REGION, RegionShape::Global)),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<FlagRegistry> {
        &self.registry
    }

    /// Insert a new region. The parent, if preset, must already exist.
    pub fn add(&self, mut region: Region) -> Result<(), ProtectionError> {
        let id = region.id();
        let mut inner = self.write();
        if id == GLOBAL_REGION || inner.regions.contains_key(&id) {
            return Err(ProtectionError::DuplicateName { name: region.name });
        }
        if let Some(parent) = region.parent.take() {
            let parent_id = normalize_name(&parent);
            if !inner.regions.contains_key(&parent_id) {
                return Err(ProtectionError::NotFound { name: parent });
            }
            region.parent = Some(parent_id);
        }
        inner.index_add(&id, &region.shape);
        inner.regions.insert(id, Arc::new(region));
        Ok(())
    }

    /// Remove a region. Children referencing it as parent have their parent
    /// cleared in the same critical section.
    pub fn remove(&self, name: &str) -> Result<Arc<Region>, ProtectionError> {
        let id = normalize_name(name);
        let mut inner = self.write();
        let removed = inner
            .regions
            .remove(&id)
            .ok_or_else(|| ProtectionError::NotFound {
                name: name.to_string(),
            })?;
        inner.index_remove(&id, &removed.shape);

        let orphaned: Vec<String> = inner
            .regions
            .iter()
            .filter(|(_, region)| region.parent.as_deref() == Some(id.as_str()))
            .map(|(child_id, _)| child_id.clone())
            .collect();
        for child_id in orphaned {
            if let Some(child) = inner.regions.get_mut(&child_id) {
                let mut updated = Region::clone(child);
                updated.parent = None;
                *child = Arc::new(updated);
            }
        }
        Ok(removed)
    }

    /// Set or clear a region's parent, rejecting assignments that would make
    /// the region its own ancestor. The prospective chain is walked before
    /// anything is committed.
    pub fn set_parent(&self, name: &str, parent: Option<&str>) -> Result<(), ProtectionError> {
        let id = normalize_name(name);
        let mut inner = self.write();
        if !inner.regions.contains_key(&id) {
            return Err(ProtectionError::NotFound {
                name: name.to_string(),
            });
        }
        let parent_id = match parent {
            Some(parent_name) => {
                let parent_id = normalize_name(parent_name);
                let mut cursor = Some(parent_id.clone());
                while let Some(ancestor_id) = cursor {
                    if ancestor_id == id {
                        return Err(ProtectionError::ParentCycle {
                            name: name.to_string(),
                            parent: parent_name.to_string(),
                        });
                    }
                    cursor = match inner.regions.get(&ancestor_id) {
                        Some(ancestor) => ancestor.parent.clone(),
                        None => {
                            return Err(ProtectionError::NotFound {
                                name: parent_name.to_string(),
                            })
                        }
                    };
                }
                Some(parent_id)
            }
            None => None,
        };
        inner.update(&id, |region| region.parent = parent_id);
        Ok(())
    }

    pub fn set_priority(&self, name: &str, priority: i32) -> Result<(), ProtectionError> {
        self.edit(name, |region| region.priority = priority)
    }

    /// Assign a flag value to a region (or to the global region). The key must
    /// be registered and the value must match the registered kind; `group`
    /// defaults to the flag's declared scope.
    pub fn set_flag(
        &self,
        name: &str,
        key: &str,
        group: Option<RegionGroup>,
        value: FlagValue,
    ) -> Result<(), ProtectionError> {
        let def = self.registry.require(key)?;
        if value.kind() != def.kind {
            return Err(ProtectionError::FlagKindMismatch {
                key: key.to_string(),
                expected: def.kind,
            });
        }
        let group = group.unwrap_or(def.scope);
        self.edit_or_global(name, |region| region.set_flag(key, group, value))
    }

    pub fn clear_flag(
        &self,
        name: &str,
        key: &str,
        group: Option<RegionGroup>,
    ) -> Result<(), ProtectionError> {
        self.registry.require(key)?;
        self.edit_or_global(name, |region| region.clear_flag(key, group))
    }

    pub fn add_owner(&self, name: &str, actor: ActorId) -> Result<(), ProtectionError> {
        self.edit_or_global(name, |region| {
            region.owners.insert(actor);
        })
    }

    pub fn remove_owner(&self, name: &str, actor: &ActorId) -> Result<(), ProtectionError> {
        self.edit_or_global(name, |region| {
            region.owners.remove(actor);
        })
    }

    pub fn add_member(&self, name: &str, actor: ActorId) -> Result<(), ProtectionError> {
        self.edit_or_global(name, |region| {
            region.members.insert(actor);
        })
    }

    pub fn remove_member(&self, name: &str, actor: &ActorId) -> Result<(), ProtectionError> {
        self.edit_or_global(name, |region| {
            region.members.remove(actor);
        })
    }

    pub fn get(&self, name: &str) -> Option<Arc<Region>> {
        let id = normalize_name(name);
        let inner = self.read();
        if id == GLOBAL_REGION {
            return Some(Arc::clone(&inner.global));
        }
        inner.regions.get(&id).map(Arc::clone)
    }

    pub fn global(&self) -> Arc<Region> {
        Arc::clone(&self.read().global)
    }

    pub fn names(&self) -> Vec<String> {
        self.read().regions.values().map(|r| r.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().regions.is_empty()
    }

    /// Every region whose shape contains the point, resolved for the caller.
    pub fn applicable_at(&self, pos: BlockPos) -> ApplicableRegionSet {
        let inner = self.read();
        let mut entries = Vec::new();
        if let Some(bucket) = inner.buckets.get(&chunk_of(pos)) {
            for id in bucket {
                if let Some(region) = inner.regions.get(id) {
                    if region.shape.contains(pos) {
                        entries.push(inner.resolve_entry(region));
                    }
                }
            }
        }
        for id in &inner.unbounded {
            if let Some(region) = inner.regions.get(id) {
                if region.shape.contains(pos) {
                    entries.push(inner.resolve_entry(region));
                }
            }
        }
        ApplicableRegionSet::new(entries, Arc::clone(&inner.global), Arc::clone(&self.registry))
    }

    /// Every region intersecting any part of the volume (multi-block
    /// operations, e.g. piston extension).
    pub fn applicable_in(&self, volume: &BlockCuboid) -> ApplicableRegionSet {
        let inner = self.read();
        let (min_cx, min_cz) = chunk_of(volume.min);
        let (max_cx, max_cz) = chunk_of(volume.max);
        let mut hits: BTreeSet<String> = BTreeSet::new();
        for cx in min_cx..=max_cx {
            for cz in min_cz..=max_cz {
                if let Some(bucket) = inner.buckets.get(&(cx, cz)) {
                    for id in bucket {
                        hits.insert(id.clone());
                    }
                }
            }
        }
        hits.extend(inner.unbounded.iter().cloned());

        let mut entries = Vec::new();
        for id in &hits {
            if let Some(region) = inner.regions.get(id) {
                if region.shape.intersects_volume(volume) {
                    entries.push(inner.resolve_entry(region));
                }
            }
        }
        ApplicableRegionSet::new(entries, Arc::clone(&inner.global), Arc::clone(&self.registry))
    }

    fn edit<F: FnOnce(&mut Region)>(&self, name: &str, edit: F) -> Result<(), ProtectionError> {
        let id = normalize_name(name);
        let mut inner = self.write();
        if !inner.regions.contains_key(&id) {
            return Err(ProtectionError::NotFound {
                name: name.to_string(),
            });
        }
        inner.update(&id, edit);
        Ok(())
    }

    fn edit_or_global<F: FnOnce(&mut Region)>(
        &self,
        name: &str,
        edit: F,
    ) -> Result<(), ProtectionError> {
        if normalize_name(name) == GLOBAL_REGION {
            let mut inner = self.write();
            let mut updated = Region::clone(&inner.global);
            edit(&mut updated);
            inner.global = Arc::new(updated);
            return Ok(());
        }
        self.edit(name, edit)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ManagerInner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ManagerInner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ManagerInner {
    fn update<F: FnOnce(&mut Region)>(&mut self, id: &str, edit: F) {
        if let Some(slot) = self.regions.get_mut(id) {
            let mut updated = Region::clone(slot);
            edit(&mut updated);
            *slot = Arc::new(updated);
        }
    }
}
