#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shot resolution and cascade orchestration for Bubble Merge.
//!
//! The engine wires the pure systems to the authoritative world. A shot is
//! placed through the placement search, checked for a merge immediately,
//! and any composite created by a merge is queued for a deferred re-check.
//! Every mutation goes through [`bubble_merge_world::apply`].

mod config;

use bubble_merge_core::{
    Asset, AssetId, AssetView, BubbleType, CellCoord, Command, Event, PlacementError, Tier,
};
use bubble_merge_system_cascade::CascadeScheduler;
use bubble_merge_system_merge::{MergeDescriptor, MergeResolver};
use bubble_merge_system_placement::{PlacementRequest, PlacementResolver};
use bubble_merge_world::{apply, query, World};

pub use config::{EngineConfig, Tuning};

/// Result of firing a basic piece into the grid.
#[derive(Clone, Debug, PartialEq)]
pub enum ShotOutcome {
    /// The piece landed, possibly triggering a merge.
    Placed(ShotReport),
    /// No legal anchor existed; the piece was discarded.
    Despawned(PlacementError),
}

impl ShotOutcome {
    /// Report of the landed piece, if it landed.
    #[must_use]
    pub fn placed(&self) -> Option<&ShotReport> {
        match self {
            Self::Placed(report) => Some(report),
            Self::Despawned(_) => None,
        }
    }
}

/// Details of a landed shot.
#[derive(Clone, Debug, PartialEq)]
pub struct ShotReport {
    /// Snapshot of the piece as it landed.
    pub asset: Asset,
    /// Merge triggered by the landing, if any.
    pub merge: Option<MergeReport>,
}

/// Occupant removed to make room for a placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvictedAsset {
    /// Identifier of the evicted asset.
    pub asset: AssetId,
    /// Tier of the evicted asset.
    pub tier: Tier,
}

/// Asset removed because a merge consumed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsumedAsset {
    /// Identifier of the consumed asset.
    pub asset: AssetId,
    /// Tier of the consumed asset.
    pub tier: Tier,
    /// Bubble type of the consumed asset.
    pub bubble_type: BubbleType,
}

/// Result of executing a merge descriptor.
#[derive(Clone, Debug, PartialEq)]
pub enum MergeReport {
    /// The composite was placed and queued for its own re-check.
    Executed {
        /// Assets removed by the merge.
        consumed: Vec<ConsumedAsset>,
        /// Snapshot of the composite as it landed.
        created: Asset,
        /// Occupants the composite stomped.
        evicted: Vec<EvictedAsset>,
    },
    /// The composite found no legal anchor. The consumed assets stay removed.
    Abandoned {
        /// Assets removed by the merge.
        consumed: Vec<ConsumedAsset>,
        /// Tier the composite would have had.
        result_tier: Tier,
        /// Bubble type the composite would have had.
        result_type: BubbleType,
        /// Why the composite could not be placed.
        reason: PlacementError,
    },
}

impl MergeReport {
    /// Assets removed by the merge.
    #[must_use]
    pub fn consumed(&self) -> &[ConsumedAsset] {
        match self {
            Self::Executed { consumed, .. } | Self::Abandoned { consumed, .. } => consumed,
        }
    }

    /// Composite created by the merge, if it landed.
    #[must_use]
    pub fn created(&self) -> Option<&Asset> {
        match self {
            Self::Executed { created, .. } => Some(created),
            Self::Abandoned { .. } => None,
        }
    }
}

/// Merge fired by a deferred cascade check.
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeReport {
    /// Asset whose re-check triggered the merge.
    pub trigger: AssetId,
    /// Outcome of the merge.
    pub merge: MergeReport,
}

/// Asset written through the forced placement path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForcedPlacement {
    /// Identifier of the forced asset.
    pub asset: AssetId,
    /// Previous owners of overwritten cells.
    pub overwritten: Vec<AssetId>,
}

/// Owns the world and the systems that operate on it.
#[derive(Debug)]
pub struct Engine {
    world: World,
    placement: PlacementResolver,
    merges: MergeResolver,
    scheduler: CascadeScheduler,
    events: Vec<Event>,
    due: Vec<AssetId>,
    frame: u64,
}

impl Engine {
    /// Creates an engine with an empty grid built from the configuration.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            world: World::with_layout(&config.grid),
            placement: PlacementResolver::new(config.tuning.placement()),
            merges: MergeResolver::new(config.tuning.merge()),
            scheduler: CascadeScheduler::new(config.tuning.cascade()),
            events: Vec::new(),
            due: Vec::new(),
            frame: 0,
        }
    }

    /// Fires a basic piece at the target anchor.
    ///
    /// The landed piece is checked for a merge straight away. Failing to
    /// find an anchor despawns the piece and leaves the grid unchanged.
    pub fn attempt_shot(&mut self, bubble_type: BubbleType, target: CellCoord) -> ShotOutcome {
        if bubble_type.tier() != Some(Tier::Basic) {
            return ShotOutcome::Despawned(PlacementError::TierMismatch);
        }

        let request =
            PlacementRequest::new(Tier::Basic, bubble_type, target).with_origin(target);
        let (asset, _) = match self.place(&request) {
            Ok(placed) => placed,
            Err(reason) => {
                tracing::debug!(?target, %reason, "shot despawned");
                return ShotOutcome::Despawned(reason);
            }
        };

        let merge = self
            .check_merge(asset.id())
            .map(|descriptor| self.execute_merge(&descriptor));
        ShotOutcome::Placed(ShotReport { asset, merge })
    }

    /// Advances cascade processing by one frame.
    ///
    /// Merges fired this frame are written to `out`, which is cleared first.
    /// Checks whose asset was consumed in the meantime are dropped.
    pub fn tick(&mut self, out: &mut Vec<CascadeReport>) {
        out.clear();
        self.frame = self.frame.saturating_add(1);

        let mut due = std::mem::take(&mut self.due);
        self.scheduler.tick(&mut due);
        for trigger in &due {
            if query::asset(&self.world, *trigger).is_none() {
                tracing::trace!(asset = trigger.get(), "dropping stale cascade check");
                continue;
            }
            if let Some(descriptor) = self.check_merge(*trigger) {
                let merge = self.execute_merge(&descriptor);
                out.push(CascadeReport {
                    trigger: *trigger,
                    merge,
                });
            }
        }
        self.due = due;
    }

    /// Ticks until no cascade check is pending or `max_ticks` elapse.
    ///
    /// Returns the number of ticks taken and appends every fired merge to `out`.
    pub fn settle(&mut self, max_ticks: u32, out: &mut Vec<CascadeReport>) -> u32 {
        let mut fired = Vec::new();
        let mut ticks = 0;
        while ticks < max_ticks && !self.scheduler.is_idle() {
            self.tick(&mut fired);
            out.append(&mut fired);
            ticks += 1;
        }
        ticks
    }

    /// Removes every asset, clears pending checks and rewinds identifiers.
    pub fn reset_all(&mut self) {
        self.scheduler.clear();
        self.events.clear();
        apply(&mut self.world, Command::ResetAll, &mut self.events);
        tracing::debug!("grid reset");
    }

    /// Places an asset exactly at `anchor` without searching or merging.
    ///
    /// Used to build level layouts; the tier follows from the bubble type.
    pub fn seed_asset(
        &mut self,
        bubble_type: BubbleType,
        anchor: CellCoord,
    ) -> Result<AssetId, PlacementError> {
        let tier = bubble_type.tier().ok_or(PlacementError::TierMismatch)?;
        self.events.clear();
        apply(
            &mut self.world,
            Command::PlaceAsset {
                tier,
                bubble_type,
                anchor,
                evict: Vec::new(),
            },
            &mut self.events,
        );
        self.events
            .iter()
            .find_map(|event| match event {
                Event::AssetPlaced { asset, .. } => Some(Ok(*asset)),
                Event::PlacementRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(PlacementError::NoLegalCandidate))
    }

    /// Lands an asset unconditionally, overwriting whatever occupies its cells.
    ///
    /// Breaks the single-owner invariant whenever it overwrites another
    /// asset; reserved for pieces that must land somewhere.
    pub fn force_shot(
        &mut self,
        bubble_type: BubbleType,
        anchor: CellCoord,
    ) -> Result<ForcedPlacement, PlacementError> {
        let tier = bubble_type.tier().ok_or(PlacementError::TierMismatch)?;
        self.events.clear();
        apply(
            &mut self.world,
            Command::ForcePlaceAsset {
                tier,
                bubble_type,
                anchor,
            },
            &mut self.events,
        );
        self.events
            .drain(..)
            .find_map(|event| match event {
                Event::AssetForcePlaced {
                    asset, overwritten, ..
                } => Some(Ok(ForcedPlacement { asset, overwritten })),
                Event::PlacementRejected { reason, .. } => Some(Err(reason)),
                _ => None,
            })
            .unwrap_or(Err(PlacementError::NoLegalCandidate))
    }

    /// Queues a deferred merge check for an asset.
    pub fn schedule_check(&mut self, asset: AssetId) {
        self.scheduler.schedule(asset);
    }

    /// Removes the consumed assets and places the composite described by `descriptor`.
    ///
    /// A composite that cannot be placed abandons the merge without restoring
    /// the consumed assets.
    pub fn execute_merge(&mut self, descriptor: &MergeDescriptor) -> MergeReport {
        let mut consumed = Vec::with_capacity(descriptor.consumed().len());
        for id in descriptor.consumed() {
            let Some(asset) = query::asset(&self.world, *id) else {
                continue;
            };
            consumed.push(ConsumedAsset {
                asset: *id,
                tier: asset.tier(),
                bubble_type: asset.bubble_type(),
            });
            self.events.clear();
            apply(
                &mut self.world,
                Command::RemoveAsset { asset: *id },
                &mut self.events,
            );
        }

        let request = PlacementRequest::new(
            descriptor.result_tier(),
            descriptor.result_type(),
            descriptor.target_anchor(),
        )
        .with_origin(descriptor.origin());

        match self.place(&request) {
            Ok((created, evicted)) => {
                tracing::debug!(
                    asset = created.id().get(),
                    tier = created.tier().label(),
                    kind = created.bubble_type().name(),
                    consumed = consumed.len(),
                    "merge executed"
                );
                self.scheduler.schedule(created.id());
                MergeReport::Executed {
                    consumed,
                    created,
                    evicted,
                }
            }
            Err(reason) => {
                tracing::info!(
                    tier = descriptor.result_tier().label(),
                    kind = descriptor.result_type().name(),
                    %reason,
                    "merge abandoned"
                );
                MergeReport::Abandoned {
                    consumed,
                    result_tier: descriptor.result_tier(),
                    result_type: descriptor.result_type(),
                    reason,
                }
            }
        }
    }

    /// Snapshot of every live asset.
    #[must_use]
    pub fn assets(&self) -> AssetView {
        query::asset_view(&self.world)
    }

    /// Current record of an asset.
    #[must_use]
    pub fn asset(&self, id: AssetId) -> Option<&Asset> {
        query::asset(&self.world, id)
    }

    /// Cells breaking the single-owner invariant.
    #[must_use]
    pub fn ownership_violations(&self) -> Vec<CellCoord> {
        query::ownership_violations(&self.world)
    }

    /// Reports whether no cascade check is pending.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Read-only access to the world for adapters.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Number of ticks processed since construction.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    fn check_merge(&mut self, trigger: AssetId) -> Option<MergeDescriptor> {
        let view = query::grid_view(&self.world);
        self.merges.check_for_merge(&view, trigger)
    }

    /// Resolves and executes a placement, returning the landed asset and its evictions.
    fn place(
        &mut self,
        request: &PlacementRequest,
    ) -> Result<(Asset, Vec<EvictedAsset>), PlacementError> {
        let plan = {
            let view = query::grid_view(&self.world);
            self.placement.resolve(&view, request, &mut self.merges)?
        };

        self.events.clear();
        apply(&mut self.world, plan.into_command(), &mut self.events);

        let mut evicted = Vec::new();
        let mut placed = None;
        for event in self.events.drain(..) {
            match event {
                Event::AssetEvicted { asset, tier } => evicted.push(EvictedAsset { asset, tier }),
                Event::AssetPlaced { asset, .. } => placed = Some(asset),
                Event::PlacementRejected { reason, .. } => return Err(reason),
                _ => {}
            }
        }

        placed
            .and_then(|id| query::asset(&self.world, id).cloned())
            .map(|asset| (asset, evicted))
            .ok_or(PlacementError::NoLegalCandidate)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
