//! Decides whether world-mutating actions in a shared virtual environment are
//! permitted, by combining hierarchical spatial regions carrying permission
//! flags with an ordered, attachment-keyed rule pipeline.
//!
//! The event layer builds a [`rules::Context`] per event, asks the
//! [`protection::ProtectionGate`] whether the action is allowed here for this
//! actor, asks the [`rules::RuleList`] whether any rule vetoes it, and cancels
//! the event if either says no. Gates and rules are independent veto sources;
//! neither outvotes the other.

pub mod config;
pub mod geometry;
pub mod protection;
pub mod rules;

/// Stable identity of an in-world actor, as resolved by the external identity
/// provider.
pub type ActorId = String;

/// Identifier of a world; each world has its own region manager and rule list.
pub type WorldId = String;

pub use config::WorldToggles;
pub use geometry::{BlockCuboid, BlockPos, PolygonPrism, RegionShape};
pub use protection::{
    keys, ApplicableRegionSet, DenyAllPermissions, FlagDef, FlagKind, FlagRegistry, FlagValue,
    Location, PermissionProvider, ProtectionError, ProtectionGate, Region, RegionDirectory,
    RegionGroup, RegionManager, State, GLOBAL_REGION,
};
pub use rules::{
    Attachment, BlockState, Context, ItemStack, Predicate, PredicateError, Rule, RuleAction,
    RuleList, RuleListConfig, RuleOutcome, RuleSet,
};
