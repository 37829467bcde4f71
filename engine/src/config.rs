//! Engine configuration, deserialisable from partial TOML documents.

use bubble_merge_core::GridLayout;
use bubble_merge_system_cascade as cascade;
use bubble_merge_system_merge as merge;
use bubble_merge_system_placement::{self as placement, SearchRadius};
use serde::{Deserialize, Serialize};

/// Grid and tuning values used to build an [`Engine`](crate::Engine).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Dimensions and permanent cells of the grid.
    pub grid: GridLayout,
    /// Policy values for placement, merging and cascades.
    pub tuning: Tuning,
}

/// Policy values. Only magnitudes are tunable; the ranking order is fixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Ring cap when placing basic pieces.
    pub search_radius_basic: u32,
    /// Ring cap when placing tier1 pieces.
    pub search_radius_tier1: u32,
    /// Ring cap when placing tier2 pieces.
    pub search_radius_tier2: u32,
    /// Ring cap when placing tier3 pieces.
    pub search_radius_tier3: u32,
    /// Ticks between a composite landing and its merge re-check.
    pub cascade_delay_frames: u32,
    /// Connected same-type basics needed for a merge.
    pub min_cluster_size: usize,
    /// Multiplier on a tier1 candidate's distance from the merge origin.
    pub tier1_origin_weight: u32,
}

impl Tuning {
    pub(crate) fn placement(&self) -> placement::Config {
        placement::Config::new(
            SearchRadius {
                basic: self.search_radius_basic,
                tier1: self.search_radius_tier1,
                tier2: self.search_radius_tier2,
                tier3: self.search_radius_tier3,
            },
            self.tier1_origin_weight,
        )
    }

    pub(crate) fn merge(&self) -> merge::Config {
        merge::Config::new(self.min_cluster_size)
    }

    pub(crate) fn cascade(&self) -> cascade::Config {
        cascade::Config::new(self.cascade_delay_frames)
    }
}

impl Default for Tuning {
    fn default() -> Self {
        let radius = SearchRadius::default();
        let placement = placement::Config::default();
        Self {
            search_radius_basic: radius.basic,
            search_radius_tier1: radius.tier1,
            search_radius_tier2: radius.tier2,
            search_radius_tier3: radius.tier3,
            cascade_delay_frames: cascade::Config::default().delay_frames(),
            min_cluster_size: merge::Config::default().min_cluster_size(),
            tier1_origin_weight: placement.tier1_origin_weight(),
        }
    }
}
