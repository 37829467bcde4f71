#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state management for Bubble Merge.
//!
//! The world owns the hex grid, the occupancy index and the asset table. It
//! changes only through [`apply`], which validates each [`Command`] and
//! reports the outcome as [`Event`] values.

mod assets;
mod grid;

use bubble_merge_core::{
    registry, Asset, AssetId, BubbleType, CellCoord, Command, Event, GridLayout, PlacementError,
    RemovalError, Tier, WELCOME_BANNER,
};

use crate::{assets::AssetTable, grid::HexGrid};

/// Represents the authoritative Bubble Merge grid state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    grid_layout: GridLayout,
    grid: HexGrid,
    assets: AssetTable,
}

impl World {
    /// Creates an empty world on the default grid.
    #[must_use]
    pub fn new() -> Self {
        Self::with_layout(&GridLayout::default())
    }

    /// Creates an empty world on the provided grid.
    #[must_use]
    pub fn with_layout(layout: &GridLayout) -> Self {
        Self {
            banner: WELCOME_BANNER,
            grid_layout: layout.clone(),
            grid: HexGrid::from_layout(layout),
            assets: AssetTable::new(),
        }
    }

    fn validate_placement(
        &self,
        tier: Tier,
        bubble_type: BubbleType,
        anchor: CellCoord,
        evict: &[AssetId],
    ) -> Result<Vec<CellCoord>, PlacementError> {
        if bubble_type.tier() != Some(tier) {
            return Err(PlacementError::TierMismatch);
        }

        let footprint = registry::footprint_cells(self.grid.layout(), tier, anchor);
        if footprint.len() != tier.footprint_size() {
            return Err(PlacementError::IncompleteFootprint);
        }
        if footprint.iter().any(|cell| self.grid.is_permanent(*cell)) {
            return Err(PlacementError::PermanentCell);
        }

        for id in evict {
            let victim = self
                .assets
                .get(*id)
                .ok_or(PlacementError::UnknownEviction)?;
            if !tier.can_stomp(victim.tier()) {
                return Err(PlacementError::StompForbidden);
            }
        }

        let unlisted = footprint.iter().any(|cell| {
            self.grid
                .occupant_at(*cell)
                .is_some_and(|occupant| !evict.contains(&occupant))
        });
        if unlisted {
            return Err(PlacementError::UnlistedConflict);
        }

        Ok(footprint)
    }

    fn insert_asset(
        &mut self,
        tier: Tier,
        bubble_type: BubbleType,
        anchor: CellCoord,
        footprint: Vec<CellCoord>,
    ) -> AssetId {
        let id = self
            .assets
            .create(self.grid.layout(), tier, bubble_type, anchor, footprint.clone());
        for cell in footprint {
            self.grid.mark_occupied(cell, id);
        }
        id
    }

    fn remove_asset(&mut self, id: AssetId) -> Option<Asset> {
        let asset = self.assets.remove(id)?;
        for cell in asset.footprint() {
            self.grid.clear_occupied(*cell, id);
        }
        Some(asset)
    }

    fn force_insert_asset(
        &mut self,
        tier: Tier,
        bubble_type: BubbleType,
        anchor: CellCoord,
    ) -> (AssetId, Vec<AssetId>) {
        let footprint: Vec<CellCoord> = registry::footprint_cells(self.grid.layout(), tier, anchor)
            .into_iter()
            .filter(|cell| !self.grid.is_permanent(*cell))
            .collect();

        let mut overwritten = Vec::new();
        for cell in &footprint {
            if let Some(previous) = self.grid.occupant_at(*cell) {
                if !overwritten.contains(&previous) {
                    overwritten.push(previous);
                }
            }
        }

        let id = self.insert_asset(tier, bubble_type, anchor, footprint);
        (id, overwritten)
    }

    fn reset(&mut self) {
        self.grid.clear_all();
        self.assets.clear();
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { layout } => {
            world.grid = HexGrid::from_layout(&layout);
            world.assets.clear();
            out_events.push(Event::GridConfigured {
                rows: layout.rows,
                columns: layout.columns,
            });
            world.grid_layout = layout;
        }
        Command::PlaceAsset {
            tier,
            bubble_type,
            anchor,
            evict,
        } => match world.validate_placement(tier, bubble_type, anchor, &evict) {
            Ok(footprint) => {
                for victim in evict {
                    if let Some(removed) = world.remove_asset(victim) {
                        out_events.push(Event::AssetEvicted {
                            asset: victim,
                            tier: removed.tier(),
                        });
                    }
                }
                let asset = world.insert_asset(tier, bubble_type, anchor, footprint);
                out_events.push(Event::AssetPlaced {
                    asset,
                    tier,
                    bubble_type,
                    anchor,
                });
            }
            Err(reason) => {
                tracing::debug!(?tier, ?anchor, %reason, "placement rejected");
                out_events.push(Event::PlacementRejected {
                    tier,
                    bubble_type,
                    anchor,
                    reason,
                });
            }
        },
        Command::ForcePlaceAsset {
            tier,
            bubble_type,
            anchor,
        } => {
            if bubble_type.tier() != Some(tier) {
                out_events.push(Event::PlacementRejected {
                    tier,
                    bubble_type,
                    anchor,
                    reason: PlacementError::TierMismatch,
                });
                return;
            }
            let (asset, overwritten) = world.force_insert_asset(tier, bubble_type, anchor);
            tracing::warn!(
                asset = asset.get(),
                ?anchor,
                overwritten = overwritten.len(),
                "asset force-placed over existing occupancy"
            );
            out_events.push(Event::AssetForcePlaced {
                asset,
                tier,
                bubble_type,
                anchor,
                overwritten,
            });
        }
        Command::RemoveAsset { asset } => match world.remove_asset(asset) {
            Some(removed) => out_events.push(Event::AssetRemoved {
                asset,
                tier: removed.tier(),
            }),
            None => out_events.push(Event::RemovalRejected {
                asset,
                reason: RemovalError::MissingAsset,
            }),
        },
        Command::ResetAll => {
            world.reset();
            out_events.push(Event::AssetsCleared);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::BTreeSet;

    use super::World;
    use bubble_merge_core::{Asset, AssetId, AssetView, CellCoord, GridLayout, GridView, HexLayout};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Geometry of the current grid.
    #[must_use]
    pub fn layout(world: &World) -> &HexLayout {
        world.grid.layout()
    }

    /// Layout the current grid was configured from.
    #[must_use]
    pub fn grid_layout(world: &World) -> &GridLayout {
        &world.grid_layout
    }

    /// Borrowed view over topology, occupancy and assets for read-only systems.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        GridView::new(
            world.grid.layout(),
            world.grid.permanent_mask(),
            world.grid.occupancy(),
            world.assets.entries(),
        )
    }

    /// Looks up a live asset.
    #[must_use]
    pub fn asset(world: &World, id: AssetId) -> Option<&Asset> {
        world.assets.get(id)
    }

    /// Captures an owned snapshot of every live asset.
    #[must_use]
    pub fn asset_view(world: &World) -> AssetView {
        AssetView::from_snapshots(world.assets.entries().values().cloned().collect())
    }

    /// Number of live assets.
    #[must_use]
    pub fn asset_count(world: &World) -> usize {
        world.assets.len()
    }

    /// Asset recorded in the occupancy index for a cell.
    #[must_use]
    pub fn occupant_at(world: &World, cell: CellCoord) -> Option<AssetId> {
        world.grid.occupant_at(cell)
    }

    /// Reports whether the cell is a permanent obstacle.
    #[must_use]
    pub fn is_permanent(world: &World, cell: CellCoord) -> bool {
        world.grid.is_permanent(cell)
    }

    /// Permanent cells in ascending order.
    #[must_use]
    pub fn permanent_cells(world: &World) -> &[CellCoord] {
        world.grid.permanent_cells()
    }

    /// Cells where the occupancy index and the asset table disagree.
    ///
    /// Empty unless a forced placement overwrote another asset's cells.
    #[must_use]
    pub fn ownership_violations(world: &World) -> Vec<CellCoord> {
        let mut violations = BTreeSet::new();
        for asset in world.assets.entries().values() {
            for cell in asset.footprint() {
                if world.grid.occupant_at(*cell) != Some(asset.id()) {
                    let _ = violations.insert(*cell);
                }
            }
        }
        for cell in world.grid.layout().cells() {
            let Some(occupant) = world.grid.occupant_at(cell) else {
                continue;
            };
            let owned = world
                .assets
                .get(occupant)
                .is_some_and(|asset| asset.footprint().contains(&cell));
            if !owned {
                let _ = violations.insert(cell);
            }
        }
        violations.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::with_layout(&GridLayout::new(10, 10, 20.0))
    }

    fn place(
        world: &mut World,
        tier: Tier,
        bubble_type: BubbleType,
        anchor: CellCoord,
        evict: Vec<AssetId>,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::PlaceAsset {
                tier,
                bubble_type,
                anchor,
                evict,
            },
            &mut events,
        );
        events
    }

    fn placed_id(events: &[Event]) -> AssetId {
        events
            .iter()
            .find_map(|event| match event {
                Event::AssetPlaced { asset, .. } => Some(*asset),
                _ => None,
            })
            .expect("asset placed")
    }

    fn rejection(events: &[Event]) -> Option<PlacementError> {
        events.iter().find_map(|event| match event {
            Event::PlacementRejected { reason, .. } => Some(*reason),
            _ => None,
        })
    }

    #[test]
    fn apply_configures_grid() {
        let mut world = world();
        let _ = place(
            &mut world,
            Tier::Basic,
            BubbleType::FIRE,
            CellCoord::new(1, 1),
            Vec::new(),
        );
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureGrid {
                layout: GridLayout::new(6, 7, 12.0).with_permanent(vec![CellCoord::new(0, 0)]),
            },
            &mut events,
        );

        assert_eq!(events, vec![Event::GridConfigured { rows: 6, columns: 7 }]);
        assert_eq!(query::asset_count(&world), 0);
        assert_eq!(query::layout(&world).rows(), 6);
        assert_eq!(query::grid_layout(&world).columns, 7);
        assert!(query::is_permanent(&world, CellCoord::new(0, 0)));
    }

    #[test]
    fn placement_marks_every_footprint_cell() {
        let mut world = world();
        let anchor = CellCoord::new(3, 3);
        let events = place(&mut world, Tier::Tier1, BubbleType::FLAME, anchor, Vec::new());
        let id = placed_id(&events);

        let asset = query::asset(&world, id).expect("asset exists");
        assert_eq!(asset.footprint().len(), 4);
        for cell in asset.footprint() {
            assert_eq!(query::occupant_at(&world, *cell), Some(id));
        }
        assert!(query::ownership_violations(&world).is_empty());
    }

    #[test]
    fn rejections_follow_validation_order() {
        let mut world = World::with_layout(
            &GridLayout::new(10, 10, 20.0).with_permanent(vec![CellCoord::new(5, 5)]),
        );

        let mismatch = place(
            &mut world,
            Tier::Tier1,
            BubbleType::FIRE,
            CellCoord::new(9, 9),
            Vec::new(),
        );
        assert_eq!(rejection(&mismatch), Some(PlacementError::TierMismatch));

        let incomplete = place(
            &mut world,
            Tier::Tier1,
            BubbleType::FLAME,
            CellCoord::new(9, 0),
            Vec::new(),
        );
        assert_eq!(rejection(&incomplete), Some(PlacementError::IncompleteFootprint));

        let permanent = place(
            &mut world,
            Tier::Tier2,
            BubbleType::STEAM,
            CellCoord::new(5, 5),
            Vec::new(),
        );
        assert_eq!(rejection(&permanent), Some(PlacementError::PermanentCell));

        let unknown = place(
            &mut world,
            Tier::Tier1,
            BubbleType::FLAME,
            CellCoord::new(1, 1),
            vec![AssetId::new(99)],
        );
        assert_eq!(rejection(&unknown), Some(PlacementError::UnknownEviction));
        assert_eq!(query::asset_count(&world), 0);
    }

    #[test]
    fn equal_tier_occupants_cannot_be_stomped() {
        let mut world = world();
        let first = placed_id(&place(
            &mut world,
            Tier::Tier1,
            BubbleType::FLAME,
            CellCoord::new(2, 2),
            Vec::new(),
        ));

        let listed = place(
            &mut world,
            Tier::Tier1,
            BubbleType::RAIN,
            CellCoord::new(2, 3),
            vec![first],
        );
        assert_eq!(rejection(&listed), Some(PlacementError::StompForbidden));

        let unlisted = place(
            &mut world,
            Tier::Tier1,
            BubbleType::RAIN,
            CellCoord::new(2, 3),
            Vec::new(),
        );
        assert_eq!(rejection(&unlisted), Some(PlacementError::UnlistedConflict));
        assert_eq!(query::asset_count(&world), 1);
    }

    #[test]
    fn higher_tier_placement_evicts_listed_occupants() {
        let mut world = world();
        let basic = placed_id(&place(
            &mut world,
            Tier::Basic,
            BubbleType::WATER,
            CellCoord::new(4, 4),
            Vec::new(),
        ));

        let events = place(
            &mut world,
            Tier::Tier2,
            BubbleType::STEAM,
            CellCoord::new(4, 4),
            vec![basic],
        );

        assert_eq!(
            events[0],
            Event::AssetEvicted {
                asset: basic,
                tier: Tier::Basic,
            }
        );
        let steam = placed_id(&events);
        assert!(query::asset(&world, basic).is_none());
        assert_eq!(query::occupant_at(&world, CellCoord::new(4, 4)), Some(steam));
        assert!(query::ownership_violations(&world).is_empty());
    }

    #[test]
    fn removal_clears_cells_and_rejects_unknown_ids() {
        let mut world = world();
        let id = placed_id(&place(
            &mut world,
            Tier::Tier1,
            BubbleType::STONE,
            CellCoord::new(6, 2),
            Vec::new(),
        ));

        let mut events = Vec::new();
        apply(&mut world, Command::RemoveAsset { asset: id }, &mut events);
        apply(&mut world, Command::RemoveAsset { asset: id }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::AssetRemoved {
                    asset: id,
                    tier: Tier::Tier1,
                },
                Event::RemovalRejected {
                    asset: id,
                    reason: RemovalError::MissingAsset,
                },
            ]
        );
        assert!(query::grid_view(&world)
            .layout()
            .cells()
            .all(|cell| query::occupant_at(&world, cell).is_none()));
    }

    #[test]
    fn reset_rewinds_identifiers() {
        let mut world = world();
        let _ = place(
            &mut world,
            Tier::Basic,
            BubbleType::AIR,
            CellCoord::new(0, 0),
            Vec::new(),
        );
        let second = placed_id(&place(
            &mut world,
            Tier::Basic,
            BubbleType::AIR,
            CellCoord::new(0, 1),
            Vec::new(),
        ));
        assert_eq!(second.get(), 1);

        let mut events = Vec::new();
        apply(&mut world, Command::ResetAll, &mut events);
        assert_eq!(events, vec![Event::AssetsCleared]);
        assert_eq!(query::asset_count(&world), 0);

        let fresh = placed_id(&place(
            &mut world,
            Tier::Basic,
            BubbleType::AIR,
            CellCoord::new(0, 0),
            Vec::new(),
        ));
        assert_eq!(fresh.get(), 0);
    }

    #[test]
    fn forced_placement_overwrites_and_is_detectable() {
        let mut world = World::with_layout(
            &GridLayout::new(10, 10, 20.0).with_permanent(vec![CellCoord::new(3, 4)]),
        );
        let fire = placed_id(&place(
            &mut world,
            Tier::Basic,
            BubbleType::FIRE,
            CellCoord::new(3, 3),
            Vec::new(),
        ));

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ForcePlaceAsset {
                tier: Tier::Tier2,
                bubble_type: BubbleType::STEAM,
                anchor: CellCoord::new(3, 3),
            },
            &mut events,
        );

        let Some(Event::AssetForcePlaced {
            asset, overwritten, ..
        }) = events.first()
        else {
            panic!("expected a forced placement event, got {events:?}");
        };
        assert_eq!(overwritten, &vec![fire]);
        let steam = query::asset(&world, *asset).expect("forced asset exists");
        assert_eq!(steam.footprint().len(), 6, "permanent cell is skipped");
        assert!(!query::ownership_violations(&world).is_empty());
        assert!(query::asset(&world, fire).is_some());
    }

    #[test]
    fn asset_view_lists_towers_separately() {
        let mut world = world();
        let _ = place(
            &mut world,
            Tier::Basic,
            BubbleType::EARTH,
            CellCoord::new(0, 0),
            Vec::new(),
        );
        let _ = place(
            &mut world,
            Tier::Tier1,
            BubbleType::GUST,
            CellCoord::new(4, 4),
            Vec::new(),
        );
        let view = query::asset_view(&world);
        assert_eq!(view.len(), 2);
        assert_eq!(view.towers().count(), 1);
    }
}
