//! Permission flag definitions and the process-wide flag registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ProtectionError;

/// Allow/deny state carried by state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Allow,
    Deny,
}

/// Membership groups a flag assignment can be scoped to.
///
/// `Owners` is the narrowest group and `All` the widest; an actor that is an
/// owner of a region is also counted as a member of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionGroup {
    Owners,
    Members,
    NonMembers,
    All,
}

/// The value category of a flag definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// Boolean-state flag: allow or deny.
    State,
    /// Enum-state flag over membership groups (e.g. who may construct).
    Group,
    /// Free-form text value flag.
    Text,
}

/// A concrete flag value stored on a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FlagValue {
    State(State),
    Group(RegionGroup),
    Text(String),
}

impl FlagValue {
    pub fn kind(&self) -> FlagKind {
        match self {
            FlagValue::State(_) => FlagKind::State,
            FlagValue::Group(_) => FlagKind::Group,
            FlagValue::Text(_) => FlagKind::Text,
        }
    }

    pub fn as_state(&self) -> Option<State> {
        match self {
            FlagValue::State(state) => Some(*state),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<RegionGroup> {
        match self {
            FlagValue::Group(group) => Some(*group),
            _ => None,
        }
    }
}

/// An immutable flag definition. Created once at registry construction; the
/// registered set only ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagDef {
    pub key: String,
    pub kind: FlagKind,
    /// Process-wide default used when no region decides. `None` for flags with
    /// no meaningful default (text flags).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FlagValue>,
    /// The membership group an unqualified assignment of this flag applies to.
    pub scope: RegionGroup,
}

impl FlagDef {
    pub fn state(key: &str, default: State) -> Self {
        Self {
            key: key.to_string(),
            kind: FlagKind::State,
            default: Some(FlagValue::State(default)),
            scope: RegionGroup::All,
        }
    }

    pub fn group(key: &str, default: RegionGroup) -> Self {
        Self {
            key: key.to_string(),
            kind: FlagKind::Group,
            default: Some(FlagValue::Group(default)),
            scope: RegionGroup::All,
        }
    }

    pub fn text(key: &str) -> Self {
        Self {
            key: key.to_string(),
            kind: FlagKind::Text,
            default: None,
            scope: RegionGroup::All,
        }
    }
}

/// Well-known flag keys.
pub mod keys {
    pub const BUILD: &str = "build";
    pub const CONSTRUCT: &str = "construct";
    pub const WATER_FLOW: &str = "water-flow";
    pub const LAVA_FLOW: &str = "lava-flow";
    pub const FIRE_SPREAD: &str = "fire-spread";
    pub const LAVA_FIRE: &str = "lava-fire";
    pub const LIGHTER: &str = "lighter";
    pub const LIGHTNING: &str = "lightning";
    pub const LEAF_DECAY: &str = "leaf-decay";
    pub const ICE_FORM: &str = "ice-form";
    pub const ICE_MELT: &str = "ice-melt";
    pub const SNOW_FALL: &str = "snow-fall";
    pub const SNOW_MELT: &str = "snow-melt";
    pub const MUSHROOMS: &str = "mushrooms";
    pub const GRASS_SPREAD: &str = "grass-spread";
    pub const PISTONS: &str = "pistons";
    pub const GREETING: &str = "greeting";
    pub const FAREWELL: &str = "farewell";
}

/// The closed set of registered flags. Shared read-only across all worlds.
#[derive(Debug, Clone, Default)]
pub struct FlagRegistry {
    defs: BTreeMap<String, FlagDef>,
}

impl FlagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard flag set.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(FlagDef::state(keys::BUILD, State::Allow));
        registry.register(FlagDef::group(keys::CONSTRUCT, RegionGroup::Members));
        for key in [
            keys::WATER_FLOW,
            keys::LAVA_FLOW,
            keys::FIRE_SPREAD,
            keys::LAVA_FIRE,
            keys::LIGHTER,
            keys::LIGHTNING,
            keys::LEAF_DECAY,
            keys::ICE_FORM,
            keys::ICE_MELT,
            keys::SNOW_FALL,
            keys::SNOW_MELT,
            keys::MUSHROOMS,
            keys::GRASS_SPREAD,
            keys::PISTONS,
        ] {
            registry.register(FlagDef::state(key, State::Allow));
        }
        registry.register(FlagDef::text(keys::GREETING));
        registry.register(FlagDef::text(keys::FAREWELL));
        registry
    }

    /// Register a flag definition. Later registrations with the same key
    /// replace the earlier one; flags are never removed.
    pub fn register(&mut self, def: FlagDef) {
        self.defs.insert(def.key.clone(), def);
    }

    pub fn get(&self, key: &str) -> Option<&FlagDef> {
        self.defs.get(key)
    }

    pub fn require(&self, key: &str) -> Result<&FlagDef, ProtectionError> {
        self.get(key).ok_or_else(|| ProtectionError::UnknownFlag {
            key: key.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlagDef> {
        self.defs.values()
    }
}
