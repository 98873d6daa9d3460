//! Region protection: flags, regions, the per-world manager, the resolver,
//! and the permission gate.

mod error;
mod flag;
mod gate;
mod manager;
mod region;
mod resolver;

#[cfg(test)]
mod tests;

pub use error::ProtectionError;
pub use flag::{keys, FlagDef, FlagKind, FlagRegistry, FlagValue, RegionGroup, State};
pub use gate::{
    DenyAllPermissions, Location, PermissionProvider, ProtectionGate, RegionDirectory,
};
pub use manager::{RegionManager, GLOBAL_REGION};
pub use region::{FlagAssignments, Region};
pub use resolver::{ApplicableRegionSet, ResolvedRegion};
