#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that chooses where an asset lands on the hex grid.
//!
//! The resolver first tries the preferred anchor as-is. When that fails it
//! walks Manhattan rings around the preferred anchor, filters out illegal
//! candidates and keeps the best survivor under a strict, total comparator.
//! The outcome is a [`PlacementPlan`] listing the anchor and the occupants
//! that must be evicted; the world executes it through
//! [`Command::PlaceAsset`].

use bubble_merge_core::{
    registry, AssetId, BubbleType, CellCoord, Command, GridView, PlacementError, Tier,
};
use bubble_merge_system_merge::{CascadePotential, CascadeScore, MergeResolver};

const DEFAULT_TIER1_ORIGIN_WEIGHT: u32 = 2;

/// Maximum ring distance searched for each tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchRadius {
    /// Radius for basic pieces.
    pub basic: u32,
    /// Radius for tier1 pieces.
    pub tier1: u32,
    /// Radius for tier2 pieces.
    pub tier2: u32,
    /// Radius for tier3 pieces.
    pub tier3: u32,
}

impl SearchRadius {
    /// Radius configured for the tier.
    #[must_use]
    pub const fn for_tier(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Basic => self.basic,
            Tier::Tier1 => self.tier1,
            Tier::Tier2 => self.tier2,
            Tier::Tier3 => self.tier3,
        }
    }
}

impl Default for SearchRadius {
    fn default() -> Self {
        Self {
            basic: 1,
            tier1: 2,
            tier2: 3,
            tier3: 5,
        }
    }
}

/// Tunables for the placement search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    search_radius: SearchRadius,
    tier1_origin_weight: u32,
}

impl Config {
    /// Creates a configuration.
    #[must_use]
    pub const fn new(search_radius: SearchRadius, tier1_origin_weight: u32) -> Self {
        Self {
            search_radius,
            tier1_origin_weight,
        }
    }

    /// Per-tier search caps.
    #[must_use]
    pub const fn search_radius(&self) -> SearchRadius {
        self.search_radius
    }

    /// Multiplier applied to a tier1 candidate's distance from the merge origin.
    #[must_use]
    pub const fn tier1_origin_weight(&self) -> u32 {
        self.tier1_origin_weight
    }

    fn origin_weight(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Tier1 => self.tier1_origin_weight,
            Tier::Basic | Tier::Tier2 | Tier::Tier3 => 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(SearchRadius::default(), DEFAULT_TIER1_ORIGIN_WEIGHT)
    }
}

/// Describes an asset awaiting placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementRequest {
    tier: Tier,
    bubble_type: BubbleType,
    preferred: CellCoord,
    origin: Option<CellCoord>,
    max_distance: Option<u32>,
}

impl PlacementRequest {
    /// Creates a request for the preferred anchor, searching the tier's default radius.
    #[must_use]
    pub const fn new(tier: Tier, bubble_type: BubbleType, preferred: CellCoord) -> Self {
        Self {
            tier,
            bubble_type,
            preferred,
            origin: None,
            max_distance: None,
        }
    }

    /// Records the cell that triggered the placement, used as a tie-break.
    #[must_use]
    pub const fn with_origin(mut self, origin: CellCoord) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Overrides the configured search radius.
    #[must_use]
    pub const fn with_max_distance(mut self, max_distance: u32) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    /// Tier of the asset.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// Bubble type of the asset.
    #[must_use]
    pub const fn bubble_type(&self) -> BubbleType {
        self.bubble_type
    }

    /// Anchor the search starts from.
    #[must_use]
    pub const fn preferred(&self) -> CellCoord {
        self.preferred
    }

    /// Cell that triggered the placement, if any.
    #[must_use]
    pub const fn origin(&self) -> Option<CellCoord> {
        self.origin
    }
}

/// Winning placement and the occupants it stomps.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementPlan {
    tier: Tier,
    bubble_type: BubbleType,
    anchor: CellCoord,
    footprint: Vec<CellCoord>,
    evict: Vec<AssetId>,
    cascade: CascadeScore,
    direct: bool,
}

impl PlacementPlan {
    /// Tier of the asset.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// Bubble type of the asset.
    #[must_use]
    pub const fn bubble_type(&self) -> BubbleType {
        self.bubble_type
    }

    /// Anchor selected for the asset.
    #[must_use]
    pub const fn anchor(&self) -> CellCoord {
        self.anchor
    }

    /// Cells the asset will occupy.
    #[must_use]
    pub fn footprint(&self) -> &[CellCoord] {
        &self.footprint
    }

    /// Occupants that must be evicted, ascending by id.
    #[must_use]
    pub fn evict(&self) -> &[AssetId] {
        &self.evict
    }

    /// Cascade potential of the chosen anchor.
    #[must_use]
    pub const fn cascade(&self) -> CascadeScore {
        self.cascade
    }

    /// Reports whether the preferred anchor was accepted without a search.
    #[must_use]
    pub const fn is_direct(&self) -> bool {
        self.direct
    }

    /// Converts the plan into the world command that executes it.
    #[must_use]
    pub fn into_command(self) -> Command {
        Command::PlaceAsset {
            tier: self.tier,
            bubble_type: self.bubble_type,
            anchor: self.anchor,
            evict: self.evict,
        }
    }
}

/// Placement search that reuses its ring buffer between requests.
#[derive(Debug, Default)]
pub struct PlacementResolver {
    config: Config,
    offsets: Vec<(i32, i32)>,
}

impl PlacementResolver {
    /// Creates a resolver with the provided configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            offsets: Vec::new(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Chooses the anchor for the request.
    ///
    /// Fails with [`PlacementError::NoLegalCandidate`] when nothing within the
    /// search radius is legal; callers despawn the piece in that case.
    pub fn resolve(
        &mut self,
        view: &GridView<'_>,
        request: &PlacementRequest,
        merges: &mut MergeResolver,
    ) -> Result<PlacementPlan, PlacementError> {
        let tier = request.tier;
        if request.bubble_type.tier() != Some(tier) {
            return Err(PlacementError::TierMismatch);
        }

        if let Some(fit) = evaluate(view, tier, request.preferred) {
            if tier != Tier::Tier1 || !fit.floating {
                let cascade = merges.cascade_potential(
                    view,
                    tier,
                    request.bubble_type,
                    &fit.footprint,
                    &fit.evict,
                );
                return Ok(fit.into_plan(request, request.preferred, cascade, true));
            }
        }

        let radius = request
            .max_distance
            .unwrap_or_else(|| self.config.search_radius.for_tier(tier));
        let origin_weight = self.config.origin_weight(tier);
        let mut best: Option<Candidate> = None;

        for ring in 0..=radius {
            self.fill_ring(ring, tier);
            for (rows, columns) in &self.offsets {
                let anchor = request.preferred.offset(*rows, *columns);
                let Some(fit) = evaluate(view, tier, anchor) else {
                    continue;
                };
                let cascade = merges.cascade_potential(
                    view,
                    tier,
                    request.bubble_type,
                    &fit.footprint,
                    &fit.evict,
                );
                let origin_penalty = request
                    .origin
                    .map_or(0, |origin| anchor.manhattan_distance(origin) * origin_weight);
                let candidate = Candidate {
                    tier,
                    anchor,
                    distance: ring,
                    origin_penalty,
                    cascade,
                    stomp: fit.stomp_cost(),
                    fit,
                };

                match &mut best {
                    Some(existing) => {
                        if candidate.precedes(existing) {
                            *existing = candidate;
                        }
                    }
                    None => best = Some(candidate),
                }
            }
        }

        best.map(|winner| {
            winner
                .fit
                .into_plan(request, winner.anchor, winner.cascade, false)
        })
        .ok_or(PlacementError::NoLegalCandidate)
    }

    /// Offsets at exactly `ring` Manhattan steps, in search order.
    fn fill_ring(&mut self, ring: u32, tier: Tier) {
        self.offsets.clear();
        let ring = i32::try_from(ring).unwrap_or(i32::MAX);
        if ring == 0 {
            self.offsets.push((0, 0));
            return;
        }
        for rows in -ring..=ring {
            let remaining = ring - rows.abs();
            self.offsets.push((rows, -remaining));
            if remaining != 0 {
                self.offsets.push((rows, remaining));
            }
        }
        if tier == Tier::Tier1 {
            self.offsets.sort_by_key(|(rows, columns)| {
                let direction = match (*rows, *columns) {
                    (0, columns) if columns < 0 => 0,
                    (rows, columns) if rows > 0 && columns < 0 => 1,
                    _ => 2,
                };
                (direction, *rows, *columns)
            });
        }
    }
}

/// Legal footprint at one anchor.
#[derive(Clone, Debug, PartialEq)]
struct Fit {
    footprint: Vec<CellCoord>,
    evict: Vec<AssetId>,
    highest_evicted: Option<Tier>,
    floating: bool,
}

impl Fit {
    fn stomp_cost(&self) -> StompCost {
        let class = match self.highest_evicted {
            None => StompClass::Clear,
            Some(Tier::Basic) => StompClass::BasicOnly,
            Some(_) => StompClass::HigherTier,
        };
        StompCost {
            class,
            evicted: self.evict.len(),
        }
    }

    fn into_plan(
        self,
        request: &PlacementRequest,
        anchor: CellCoord,
        cascade: CascadeScore,
        direct: bool,
    ) -> PlacementPlan {
        PlacementPlan {
            tier: request.tier,
            bubble_type: request.bubble_type,
            anchor,
            footprint: self.footprint,
            evict: self.evict,
            cascade,
            direct,
        }
    }
}

/// Checks footprint completeness, permanent cells and the stomping policy.
fn evaluate(view: &GridView<'_>, tier: Tier, anchor: CellCoord) -> Option<Fit> {
    let layout = view.layout();
    let footprint = registry::footprint_cells(layout, tier, anchor);
    if footprint.len() != tier.footprint_size() {
        return None;
    }
    if footprint.iter().any(|cell| view.is_permanent(*cell)) {
        return None;
    }

    let mut evict: Vec<AssetId> = Vec::new();
    let mut highest_evicted = None;
    for cell in &footprint {
        let Some(occupant) = view.occupant(*cell) else {
            continue;
        };
        if evict.contains(&occupant) {
            continue;
        }
        let victim = view.asset(occupant)?;
        if !tier.can_stomp(victim.tier()) {
            return None;
        }
        highest_evicted = highest_evicted.max(Some(victim.tier()));
        evict.push(occupant);
    }
    evict.sort_unstable();

    let floating = tier == Tier::Tier1 && is_floating(view, &footprint, &evict);
    Some(Fit {
        footprint,
        evict,
        highest_evicted,
        floating,
    })
}

/// A footprint floats when nothing supports any cell of its bottom row.
///
/// The bottom edge of the grid and permanent cells count as support;
/// occupants about to be evicted do not. Cells that fall off the side of a
/// short row support nothing.
fn is_floating(view: &GridView<'_>, footprint: &[CellCoord], evict: &[AssetId]) -> bool {
    let Some(bottom) = footprint.iter().map(CellCoord::row).max() else {
        return false;
    };
    let layout = view.layout();
    let supported = footprint
        .iter()
        .filter(|cell| cell.row() == bottom)
        .flat_map(|cell| layout.cells_below(*cell))
        .any(|below| {
            u32::try_from(below.row()).is_ok_and(|row| row >= layout.rows())
                || view.is_permanent(below)
                || view
                    .occupant(below)
                    .is_some_and(|occupant| !evict.contains(&occupant))
        });
    !supported
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum StompClass {
    Clear,
    BasicOnly,
    HigherTier,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct StompCost {
    class: StompClass,
    evicted: usize,
}

#[derive(Clone, Debug, PartialEq)]
struct Candidate {
    tier: Tier,
    anchor: CellCoord,
    distance: u32,
    origin_penalty: u32,
    cascade: CascadeScore,
    stomp: StompCost,
    fit: Fit,
}

impl Candidate {
    fn potential(&self) -> CascadePotential {
        self.cascade.potential()
    }

    /// Strict priority order. Off-screen tier3 candidates never get here, so
    /// on-screen validity needs no key of its own, and distance zero wins
    /// through the ascending distance key.
    fn precedes(&self, other: &Self) -> bool {
        if self.potential() != other.potential() {
            return self.potential() > other.potential();
        }

        if self.tier == Tier::Tier1 && self.fit.floating != other.fit.floating {
            return !self.fit.floating;
        }

        if self.distance != other.distance {
            return self.distance < other.distance;
        }

        if self.cascade.partners() != other.cascade.partners() {
            return self.cascade.partners() > other.cascade.partners();
        }

        if self.origin_penalty != other.origin_penalty {
            return self.origin_penalty < other.origin_penalty;
        }

        if self.stomp != other.stomp {
            return self.stomp < other.stomp;
        }

        if self.anchor.row() != other.anchor.row() {
            return if self.tier == Tier::Tier1 {
                self.anchor.row() > other.anchor.row()
            } else {
                self.anchor.row() < other.anchor.row()
            };
        }

        self.anchor.column() < other.anchor.column()
    }
}
