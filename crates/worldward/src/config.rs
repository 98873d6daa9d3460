//! Per-world evaluation toggles.
//!
//! Toggles are plain values threaded into gate calls for one evaluation, never
//! ambient global state, so concurrent per-world configurations cannot bleed
//! into each other.

use serde::{Deserialize, Serialize};

/// Read-only configuration consumed by the gate during one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldToggles {
    /// When off, the cheap-but-frequent checks (water/lava flow, fire spread,
    /// lava fire) are treated as always-allow without consulting the resolver.
    #[serde(default)]
    pub high_freq_flags: bool,
    /// When on, fire-spread-caused ignition and burning are vetoed before the
    /// resolver or rule pipeline run.
    #[serde(default)]
    pub fire_spread_disable: bool,
}

impl WorldToggles {
    /// Unconditional fire-spread veto; checked before any other veto source.
    pub fn blocks_fire_spread(&self) -> bool {
        self.fire_spread_disable
    }
}
