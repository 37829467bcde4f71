#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that detects merges from grid snapshots.
//!
//! Basic assets merge through a same-type flood fill across hex neighbours.
//! Multi-cell assets merge through adjacency of any footprint cell, using the
//! fixed combination tables. The resolver never mutates the grid; it returns
//! a [`MergeDescriptor`] that the caller executes.

use std::{cmp::Ordering, collections::VecDeque};

use bubble_merge_core::{
    combinations, Asset, AssetId, BubbleType, CellCoord, CellPoint, GridView, Tier,
};

const DEFAULT_MIN_CLUSTER_SIZE: usize = 3;

/// Tunables for merge detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    min_cluster_size: usize,
}

impl Config {
    /// Creates a configuration with the provided basic cluster threshold.
    ///
    /// Thresholds below two are raised to two so a merge always consumes a partner.
    #[must_use]
    pub fn new(min_cluster_size: usize) -> Self {
        Self {
            min_cluster_size: min_cluster_size.max(2),
        }
    }

    /// Number of connected same-type basics required to merge.
    #[must_use]
    pub const fn min_cluster_size(&self) -> usize {
        self.min_cluster_size
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CLUSTER_SIZE)
    }
}

/// Best merge an asset could take part in, ordered from weakest to strongest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CascadePotential {
    /// No merge reachable.
    None,
    /// Completes a same-type basic cluster.
    BasicMerge,
    /// Forms a tier2 asset with an adjacent tier1.
    Tier2Forming,
    /// Forms a tier3 asset.
    Tier3Forming,
}

/// Cascade potential plus the raw number of partners backing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CascadeScore {
    potential: CascadePotential,
    partners: u32,
}

impl CascadeScore {
    /// Score of a placement that reaches nothing.
    pub const NONE: Self = Self {
        potential: CascadePotential::None,
        partners: 0,
    };

    /// Creates a score.
    #[must_use]
    pub const fn new(potential: CascadePotential, partners: u32) -> Self {
        Self {
            potential,
            partners,
        }
    }

    /// Strongest merge class reachable.
    #[must_use]
    pub const fn potential(&self) -> CascadePotential {
        self.potential
    }

    /// Raw partner count; the size of the cluster for basics.
    #[must_use]
    pub const fn partners(&self) -> u32 {
        self.partners
    }
}

/// One resolved merge, consumed immediately by the executor.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeDescriptor {
    trigger: AssetId,
    consumed: Vec<AssetId>,
    result_tier: Tier,
    result_type: BubbleType,
    front_anchor: CellCoord,
    target_anchor: CellCoord,
    origin: CellCoord,
}

impl MergeDescriptor {
    /// Asset whose placement triggered the merge.
    #[must_use]
    pub const fn trigger(&self) -> AssetId {
        self.trigger
    }

    /// Assets removed by the merge, trigger first.
    #[must_use]
    pub fn consumed(&self) -> &[AssetId] {
        &self.consumed
    }

    /// Tier of the composite asset.
    #[must_use]
    pub const fn result_tier(&self) -> Tier {
        self.result_tier
    }

    /// Bubble type of the composite asset.
    #[must_use]
    pub const fn result_type(&self) -> BubbleType {
        self.result_type
    }

    /// Frontmost anchor among the consumed assets.
    #[must_use]
    pub const fn front_anchor(&self) -> CellCoord {
        self.front_anchor
    }

    /// Preferred anchor for the composite after the per-tier row shift.
    #[must_use]
    pub const fn target_anchor(&self) -> CellCoord {
        self.target_anchor
    }

    /// Anchor of the trigger, used as the origin for placement tie-breaks.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }
}

/// Merge detector that reuses scratch buffers between checks.
#[derive(Debug, Default)]
pub struct MergeResolver {
    config: Config,
    visited: Vec<bool>,
    frontier: VecDeque<CellCoord>,
    cluster: Vec<AssetId>,
    adjacent: Vec<AssetId>,
}

impl MergeResolver {
    /// Creates a resolver with empty scratch buffers.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Looks for a merge triggered by the provided asset.
    ///
    /// Returns `None` when the asset no longer exists or nothing combines.
    pub fn check_for_merge(
        &mut self,
        view: &GridView<'_>,
        trigger: AssetId,
    ) -> Option<MergeDescriptor> {
        let asset = view.asset(trigger)?;
        let (result_type, partners) = match asset.tier() {
            Tier::Basic => self.basic_merge(view, asset)?,
            Tier::Tier1 => {
                self.collect_adjacent(view, asset.footprint(), &[asset.id()]);
                let partner = self
                    .best_partner(view, asset, Tier::Tier2)
                    .or_else(|| self.best_partner(view, asset, Tier::Tier1))?;
                (partner.1, vec![partner.0])
            }
            Tier::Tier2 => {
                self.collect_adjacent(view, asset.footprint(), &[asset.id()]);
                let partner = self.best_partner(view, asset, Tier::Tier1)?;
                (partner.1, vec![partner.0])
            }
            Tier::Tier3 => return None,
        };
        let result_tier = result_type.tier()?;

        let mut consumed = Vec::with_capacity(partners.len() + 1);
        consumed.push(asset.id());
        consumed.extend(partners);

        let front_anchor = front_anchor(view, asset, &consumed);
        Some(MergeDescriptor {
            trigger: asset.id(),
            consumed,
            result_tier,
            result_type,
            front_anchor,
            target_anchor: shift_for_tier(front_anchor, result_tier),
            origin: asset.anchor(),
        })
    }

    /// Scores the merge a hypothetical asset would trigger if placed on `footprint`.
    ///
    /// Assets listed in `ignored` are treated as already gone, which lets the
    /// placement search score candidates that evict occupants.
    pub fn cascade_potential(
        &mut self,
        view: &GridView<'_>,
        tier: Tier,
        bubble_type: BubbleType,
        footprint: &[CellCoord],
        ignored: &[AssetId],
    ) -> CascadeScore {
        match tier {
            Tier::Basic => {
                self.flood_basic(view, footprint, bubble_type, ignored);
                let size = self.cluster.len() + 1;
                if size >= self.config.min_cluster_size {
                    CascadeScore::new(CascadePotential::BasicMerge, count(size))
                } else {
                    CascadeScore::new(CascadePotential::None, count(self.cluster.len()))
                }
            }
            Tier::Tier1 => {
                self.collect_adjacent(view, footprint, ignored);
                let forming_tier3 = self.count_partners(view, tier, bubble_type, Tier::Tier2);
                if forming_tier3 > 0 {
                    return CascadeScore::new(CascadePotential::Tier3Forming, forming_tier3);
                }
                let forming_tier2 = self.count_partners(view, tier, bubble_type, Tier::Tier1);
                if forming_tier2 > 0 {
                    return CascadeScore::new(CascadePotential::Tier2Forming, forming_tier2);
                }
                CascadeScore::NONE
            }
            Tier::Tier2 => {
                self.collect_adjacent(view, footprint, ignored);
                let forming_tier3 = self.count_partners(view, tier, bubble_type, Tier::Tier1);
                if forming_tier3 > 0 {
                    CascadeScore::new(CascadePotential::Tier3Forming, forming_tier3)
                } else {
                    CascadeScore::NONE
                }
            }
            Tier::Tier3 => CascadeScore::NONE,
        }
    }

    fn basic_merge(
        &mut self,
        view: &GridView<'_>,
        trigger: &Asset,
    ) -> Option<(BubbleType, Vec<AssetId>)> {
        let result = combinations::tier1_for(trigger.bubble_type())?;
        self.flood_basic(view, trigger.footprint(), trigger.bubble_type(), &[trigger.id()]);
        if self.cluster.len() + 1 < self.config.min_cluster_size {
            return None;
        }

        let origin = trigger.center();
        let mut nearest: Vec<&Asset> = self
            .cluster
            .iter()
            .filter_map(|id| view.asset(*id))
            .collect();
        nearest.sort_by(|a, b| closer(origin, a, b));
        let partners = nearest
            .into_iter()
            .take(self.config.min_cluster_size - 1)
            .map(Asset::id)
            .collect();
        Some((result, partners))
    }

    /// Breadth-first flood fill over same-type basics, starting next to `seeds`.
    ///
    /// Leaves the connected asset ids, excluding anything in `skip`, in `self.cluster`.
    fn flood_basic(
        &mut self,
        view: &GridView<'_>,
        seeds: &[CellCoord],
        bubble_type: BubbleType,
        skip: &[AssetId],
    ) {
        let layout = view.layout();
        self.visited.clear();
        self.visited.resize(layout.cell_count(), false);
        self.frontier.clear();
        self.cluster.clear();

        for seed in seeds {
            if let Some(index) = layout.index(*seed) {
                self.visited[index] = true;
                self.frontier.push_back(*seed);
            }
        }

        while let Some(cell) = self.frontier.pop_front() {
            for neighbor in layout.valid_neighbors(cell) {
                let Some(index) = layout.index(neighbor) else {
                    continue;
                };
                if self.visited[index] {
                    continue;
                }
                self.visited[index] = true;

                let Some(asset) = view.asset_at(neighbor) else {
                    continue;
                };
                if asset.tier() != Tier::Basic
                    || asset.bubble_type() != bubble_type
                    || skip.contains(&asset.id())
                {
                    continue;
                }
                if !self.cluster.contains(&asset.id()) {
                    self.cluster.push(asset.id());
                }
                self.frontier.push_back(neighbor);
            }
        }
    }

    /// Collects distinct assets touching any cell of `footprint` into `self.adjacent`.
    fn collect_adjacent(&mut self, view: &GridView<'_>, footprint: &[CellCoord], skip: &[AssetId]) {
        let layout = view.layout();
        self.adjacent.clear();
        for cell in footprint {
            for neighbor in layout.valid_neighbors(*cell) {
                if footprint.contains(&neighbor) {
                    continue;
                }
                let Some(occupant) = view.occupant(neighbor) else {
                    continue;
                };
                if skip.contains(&occupant) || self.adjacent.contains(&occupant) {
                    continue;
                }
                if view.asset(occupant).is_some() {
                    self.adjacent.push(occupant);
                }
            }
        }
        self.adjacent.sort_unstable();
    }

    fn count_partners(
        &self,
        view: &GridView<'_>,
        tier: Tier,
        bubble_type: BubbleType,
        partner_tier: Tier,
    ) -> u32 {
        let partners = self
            .adjacent
            .iter()
            .filter_map(|id| view.asset(*id))
            .filter(|partner| partner.tier() == partner_tier)
            .filter(|partner| combine(tier, bubble_type, partner).is_some())
            .count();
        count(partners)
    }

    /// Nearest adjacent asset of `partner_tier` that combines with `trigger`.
    fn best_partner(
        &self,
        view: &GridView<'_>,
        trigger: &Asset,
        partner_tier: Tier,
    ) -> Option<(AssetId, BubbleType)> {
        let origin = trigger.center();
        self.adjacent
            .iter()
            .filter_map(|id| view.asset(*id))
            .filter(|partner| partner.tier() == partner_tier)
            .filter_map(|partner| {
                combine(trigger.tier(), trigger.bubble_type(), partner).map(|result| (partner, result))
            })
            .min_by(|(a, _), (b, _)| closer(origin, a, b))
            .map(|(partner, result)| (partner.id(), result))
    }
}

/// Composite produced when an asset of `tier`/`bubble_type` meets `partner`.
fn combine(tier: Tier, bubble_type: BubbleType, partner: &Asset) -> Option<BubbleType> {
    match (tier, partner.tier()) {
        (Tier::Tier1, Tier::Tier1) if bubble_type != partner.bubble_type() => {
            combinations::tier2_for(bubble_type, partner.bubble_type())
        }
        (Tier::Tier1, Tier::Tier2) => combinations::tier3_for(partner.bubble_type(), bubble_type),
        (Tier::Tier2, Tier::Tier1) => combinations::tier3_for(bubble_type, partner.bubble_type()),
        _ => None,
    }
}

/// Orders assets by centre distance to `origin`, then by id.
fn closer(origin: CellPoint, a: &Asset, b: &Asset) -> Ordering {
    let da = origin.distance_squared(a.center());
    let db = origin.distance_squared(b.center());
    da.total_cmp(&db).then_with(|| a.id().cmp(&b.id()))
}

/// Frontmost consumed anchor: largest row, then nearest to the trigger, then lowest column.
fn front_anchor(view: &GridView<'_>, trigger: &Asset, consumed: &[AssetId]) -> CellCoord {
    let origin = trigger.center();
    consumed
        .iter()
        .filter_map(|id| view.asset(*id))
        .min_by(|a, b| {
            b.anchor()
                .row()
                .cmp(&a.anchor().row())
                .then_with(|| {
                    origin
                        .distance_squared(a.center())
                        .total_cmp(&origin.distance_squared(b.center()))
                })
                .then_with(|| a.anchor().column().cmp(&b.anchor().column()))
        })
        .map_or(trigger.anchor(), Asset::anchor)
}

/// Moves centred composites back so their footprint grows away from the front.
fn shift_for_tier(anchor: CellCoord, tier: Tier) -> CellCoord {
    let rows_back = match tier {
        Tier::Basic | Tier::Tier1 => 0,
        Tier::Tier2 => 1,
        Tier::Tier3 => 2,
    };
    CellCoord::new((anchor.row() - rows_back).max(0), anchor.column())
}

fn count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
