#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Bubble Merge engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Callers submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! actually happened. Systems read borrowed [`GridView`] snapshots and answer
//! with plans or new commands, never with direct mutation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod combinations;
pub mod hex;
pub mod registry;

pub use hex::HexLayout;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Bubble Merge.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the hex grid from the provided layout, discarding every asset.
    ConfigureGrid {
        /// Dimensions, cell size and permanent obstacles of the new grid.
        layout: GridLayout,
    },
    /// Places an asset at an exact anchor, evicting the listed occupants first.
    PlaceAsset {
        /// Tier of the asset being created.
        tier: Tier,
        /// Element or combination identity of the asset.
        bubble_type: BubbleType,
        /// Anchor cell the footprint template is translated to.
        anchor: CellCoord,
        /// Occupants that must be removed to make room for the footprint.
        evict: Vec<AssetId>,
    },
    /// Writes an asset into the occupancy index without any conflict checks.
    ///
    /// Overwritten cells keep their previous owners' records alive, so this
    /// deliberately breaks the single-owner invariant. Reserved for
    /// last-resort placements that must land unconditionally.
    ForcePlaceAsset {
        /// Tier of the asset being created.
        tier: Tier,
        /// Element or combination identity of the asset.
        bubble_type: BubbleType,
        /// Anchor cell the footprint template is translated to.
        anchor: CellCoord,
    },
    /// Removes an existing asset and clears its footprint.
    RemoveAsset {
        /// Identifier of the asset targeted for removal.
        asset: AssetId,
    },
    /// Clears every asset and occupancy entry and rewinds the id counter.
    ResetAll,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the grid was rebuilt.
    GridConfigured {
        /// Number of rows in the new grid.
        rows: u32,
        /// Number of cells in each even row.
        columns: u32,
    },
    /// Confirms that an asset was placed into the world.
    AssetPlaced {
        /// Identifier assigned to the asset by the world.
        asset: AssetId,
        /// Tier of the placed asset.
        tier: Tier,
        /// Element or combination identity of the placed asset.
        bubble_type: BubbleType,
        /// Anchor cell of the placed asset.
        anchor: CellCoord,
    },
    /// Reports that an asset was written into the grid through the forced path.
    AssetForcePlaced {
        /// Identifier assigned to the asset by the world.
        asset: AssetId,
        /// Tier of the placed asset.
        tier: Tier,
        /// Element or combination identity of the placed asset.
        bubble_type: BubbleType,
        /// Anchor cell of the placed asset.
        anchor: CellCoord,
        /// Previous owners of cells that were overwritten.
        overwritten: Vec<AssetId>,
    },
    /// Reports that an occupant was stomped to make room for a placement.
    AssetEvicted {
        /// Identifier of the evicted asset.
        asset: AssetId,
        /// Tier of the evicted asset.
        tier: Tier,
    },
    /// Confirms that an asset was removed on request.
    AssetRemoved {
        /// Identifier of the removed asset.
        asset: AssetId,
        /// Tier of the removed asset.
        tier: Tier,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Tier requested for placement.
        tier: Tier,
        /// Element or combination identity requested for placement.
        bubble_type: BubbleType,
        /// Anchor provided in the placement request.
        anchor: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a removal request was rejected.
    RemovalRejected {
        /// Identifier of the asset targeted for removal.
        asset: AssetId,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Confirms that every asset was cleared from the grid.
    AssetsCleared,
}

/// Unique identifier assigned to a placed asset. Never reused until a reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(u32);

impl AssetId {
    /// Creates a new asset identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single hex cell expressed as row and column.
///
/// Coordinates are signed so that search offsets may step off the grid;
/// [`HexLayout::contains`] decides whether a coordinate is playable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: i32,
    column: i32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Returns the coordinate translated by the provided row and column deltas.
    #[must_use]
    pub const fn offset(self, rows: i32, columns: i32) -> Self {
        Self {
            row: self.row + rows,
            column: self.column + columns,
        }
    }

    /// Reports whether the cell sits on an odd (shifted) row.
    #[must_use]
    pub const fn is_odd_row(&self) -> bool {
        self.row.rem_euclid(2) == 1
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column)
    }
}

/// Continuous screen-space position measured in world units.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct CellPoint {
    x: f32,
    y: f32,
}

impl CellPoint {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component, growing towards the bottom of the screen.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: CellPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Progression level of an asset. Later variants strictly outrank earlier ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Single-cell piece fired by the player.
    Basic,
    /// Four-cell piece formed from three connected basics.
    Tier1,
    /// Seven-cell piece formed from two different tier1 pieces.
    Tier2,
    /// Nineteen-cell piece formed from a tier2 and a tier1 piece.
    Tier3,
}

impl Tier {
    /// Every tier in ascending order.
    pub const ALL: [Tier; 4] = [Tier::Basic, Tier::Tier1, Tier::Tier2, Tier::Tier3];

    /// Number of cells a complete footprint of this tier occupies.
    #[must_use]
    pub const fn footprint_size(self) -> usize {
        match self {
            Self::Basic => 1,
            Self::Tier1 => 4,
            Self::Tier2 => 7,
            Self::Tier3 => 19,
        }
    }

    /// Reports whether a placement of this tier may evict an occupant of `occupant` tier.
    ///
    /// Only strictly lower tiers can be stomped; basics stomp nothing.
    #[must_use]
    pub fn can_stomp(self, occupant: Tier) -> bool {
        occupant < self
    }

    /// Short lowercase label used by logs and adapters.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Tier1 => "tier1",
            Self::Tier2 => "tier2",
            Self::Tier3 => "tier3",
        }
    }
}

/// Element or combination identity of an asset, encoded as a small integer.
///
/// Codes 1-5 are basic elements, 6-10 tier1, 11-20 tier2 and 21-30 tier3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BubbleType(u8);

impl BubbleType {
    /// Basic fire element.
    pub const FIRE: Self = Self(1);
    /// Basic water element.
    pub const WATER: Self = Self(2);
    /// Basic earth element.
    pub const EARTH: Self = Self(3);
    /// Basic air element.
    pub const AIR: Self = Self(4);
    /// Basic lightning element.
    pub const LIGHTNING: Self = Self(5);
    /// Tier1 form of fire.
    pub const FLAME: Self = Self(6);
    /// Tier1 form of water.
    pub const RAIN: Self = Self(7);
    /// Tier1 form of earth.
    pub const STONE: Self = Self(8);
    /// Tier1 form of air.
    pub const GUST: Self = Self(9);
    /// Tier1 form of lightning.
    pub const SPARK: Self = Self(10);
    /// Tier2 combination of flame and rain.
    pub const STEAM: Self = Self(11);

    /// Creates a bubble type from its numeric code.
    #[must_use]
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    /// Retrieves the numeric code.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Tier implied by the code, or `None` for codes outside the tables.
    #[must_use]
    pub const fn tier(&self) -> Option<Tier> {
        match self.0 {
            1..=5 => Some(Tier::Basic),
            6..=10 => Some(Tier::Tier1),
            11..=20 => Some(Tier::Tier2),
            21..=30 => Some(Tier::Tier3),
            _ => None,
        }
    }

    /// Display name of the element or combination.
    #[must_use]
    pub fn name(&self) -> &'static str {
        combinations::name_of(*self)
    }
}

/// Placed game piece owned exclusively by the world's asset table.
#[derive(Clone, Debug, PartialEq)]
pub struct Asset {
    id: AssetId,
    tier: Tier,
    bubble_type: BubbleType,
    anchor: CellCoord,
    footprint: Vec<CellCoord>,
    center: CellPoint,
}

impl Asset {
    /// Assembles an asset record. Only the world's factory should call this.
    #[must_use]
    pub fn new(
        id: AssetId,
        tier: Tier,
        bubble_type: BubbleType,
        anchor: CellCoord,
        footprint: Vec<CellCoord>,
        center: CellPoint,
    ) -> Self {
        Self {
            id,
            tier,
            bubble_type,
            anchor,
            footprint,
            center,
        }
    }

    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> AssetId {
        self.id
    }

    /// Tier of the asset.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// Element or combination identity.
    #[must_use]
    pub const fn bubble_type(&self) -> BubbleType {
        self.bubble_type
    }

    /// Anchor cell used for placement and geometric reference.
    #[must_use]
    pub const fn anchor(&self) -> CellCoord {
        self.anchor
    }

    /// Cells occupied by the asset, anchor template order.
    #[must_use]
    pub fn footprint(&self) -> &[CellCoord] {
        &self.footprint
    }

    /// Screen-space centre used for rendering, collision and distance maths.
    #[must_use]
    pub const fn center(&self) -> CellPoint {
        self.center
    }
}

/// Read-only snapshot describing every live asset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetView {
    snapshots: Vec<Asset>,
}

impl AssetView {
    /// Creates a new asset view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<Asset>) -> Self {
        snapshots.sort_by_key(Asset::id);
        Self { snapshots }
    }

    /// Iterator over the captured assets in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.snapshots.iter()
    }

    /// Looks up a captured asset by identifier.
    #[must_use]
    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.snapshots
            .binary_search_by_key(&id, Asset::id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Assets of tier1 and above, which the tower layer reads as tower definitions.
    pub fn towers(&self) -> impl Iterator<Item = &Asset> {
        self.snapshots
            .iter()
            .filter(|asset| asset.tier() >= Tier::Tier1)
    }

    /// Number of captured assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no assets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<Asset> {
        self.snapshots
    }
}

/// Borrowed view over the grid's topology, occupancy index and asset table.
///
/// Systems receive this instead of the world itself so that every lookup goes
/// through an id and may come back empty after a removal.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    layout: &'a HexLayout,
    permanent: &'a [bool],
    occupancy: &'a [Option<AssetId>],
    assets: &'a BTreeMap<AssetId, Asset>,
}

impl<'a> GridView<'a> {
    /// Captures a view over the provided storage. Both slices are indexed by
    /// [`HexLayout::index`].
    #[must_use]
    pub fn new(
        layout: &'a HexLayout,
        permanent: &'a [bool],
        occupancy: &'a [Option<AssetId>],
        assets: &'a BTreeMap<AssetId, Asset>,
    ) -> Self {
        Self {
            layout,
            permanent,
            occupancy,
            assets,
        }
    }

    /// Geometry of the grid.
    #[must_use]
    pub const fn layout(&self) -> &'a HexLayout {
        self.layout
    }

    /// Reports whether the cell lies inside the playable bounds.
    #[must_use]
    pub fn is_valid(&self, cell: CellCoord) -> bool {
        self.layout.contains(cell)
    }

    /// Reports whether the cell is a permanent obstacle.
    #[must_use]
    pub fn is_permanent(&self, cell: CellCoord) -> bool {
        self.layout
            .index(cell)
            .and_then(|index| self.permanent.get(index).copied())
            .unwrap_or(false)
    }

    /// Returns the asset occupying the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<AssetId> {
        self.layout
            .index(cell)
            .and_then(|index| self.occupancy.get(index).copied().flatten())
    }

    /// Looks up the current record of an asset.
    #[must_use]
    pub fn asset(&self, id: AssetId) -> Option<&'a Asset> {
        self.assets.get(&id)
    }

    /// Looks up the record of the asset occupying the provided cell.
    #[must_use]
    pub fn asset_at(&self, cell: CellCoord) -> Option<&'a Asset> {
        self.occupant(cell).and_then(|id| self.asset(id))
    }

    /// Iterator over every live asset in ascending id order.
    pub fn assets(&self) -> impl Iterator<Item = &'a Asset> {
        self.assets.values()
    }
}

/// Dimensions and obstacles describing a hex grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    /// Number of rows.
    pub rows: u32,
    /// Number of cells in each even row; odd rows hold one fewer.
    pub columns: u32,
    /// Horizontal distance between neighbouring cell centres in world units.
    pub cell_size: f32,
    /// Boundary and obstacle cells that can never be occupied.
    pub permanent: Vec<CellCoord>,
}

impl GridLayout {
    /// Creates a layout without permanent cells.
    #[must_use]
    pub fn new(rows: u32, columns: u32, cell_size: f32) -> Self {
        Self {
            rows,
            columns,
            cell_size,
            permanent: Vec::new(),
        }
    }

    /// Returns the layout with the provided permanent cells.
    #[must_use]
    pub fn with_permanent(mut self, permanent: Vec<CellCoord>) -> Self {
        self.permanent = permanent;
        self
    }

    /// Geometry derived from the layout.
    #[must_use]
    pub fn hex_layout(&self) -> HexLayout {
        HexLayout::new(self.rows, self.columns, self.cell_size)
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(14, 12, 32.0)
    }
}

/// Reasons a placement request may be rejected.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum PlacementError {
    /// The bubble type does not belong to the requested tier.
    #[error("bubble type does not belong to the requested tier")]
    TierMismatch,
    /// Part of the footprint falls outside the playable bounds.
    #[error("footprint extends beyond the grid")]
    IncompleteFootprint,
    /// The footprint covers a permanent obstacle.
    #[error("footprint covers a permanent cell")]
    PermanentCell,
    /// An occupant of equal or higher tier would have to be evicted.
    #[error("occupant tier may not be stomped by this placement")]
    StompForbidden,
    /// The footprint overlaps an occupant missing from the eviction list.
    #[error("footprint overlaps an occupant that was not listed for eviction")]
    UnlistedConflict,
    /// An eviction names an asset that no longer exists.
    #[error("eviction names an unknown asset")]
    UnknownEviction,
    /// No legal anchor was found within the search radius.
    #[error("no legal placement within the search radius")]
    NoLegalCandidate,
}

/// Reasons a removal request may be rejected.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum RemovalError {
    /// No asset with the provided identifier exists.
    #[error("no asset with the provided identifier exists")]
    MissingAsset,
}

#[cfg(test)]
mod tests {
    use super::{AssetId, BubbleType, CellCoord, PlacementError, Tier};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
        assert_eq!(origin.manhattan_distance(CellCoord::new(-1, 0)), 3);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn wire_types_round_trip_through_bincode() {
        assert_round_trip(&AssetId::new(42));
        assert_round_trip(&CellCoord::new(-3, 7));
        assert_round_trip(&PlacementError::StompForbidden);
    }

    #[test]
    fn stomp_policy_only_allows_strictly_lower_tiers() {
        assert!(!Tier::Basic.can_stomp(Tier::Basic));
        assert!(Tier::Tier1.can_stomp(Tier::Basic));
        assert!(!Tier::Tier1.can_stomp(Tier::Tier1));
        assert!(!Tier::Tier1.can_stomp(Tier::Tier2));
        assert!(Tier::Tier2.can_stomp(Tier::Tier1));
        assert!(!Tier::Tier2.can_stomp(Tier::Tier2));
        assert!(Tier::Tier3.can_stomp(Tier::Tier2));
        assert!(!Tier::Tier3.can_stomp(Tier::Tier3));
    }

    #[test]
    fn bubble_codes_map_to_tiers() {
        assert_eq!(BubbleType::FIRE.tier(), Some(Tier::Basic));
        assert_eq!(BubbleType::FLAME.tier(), Some(Tier::Tier1));
        assert_eq!(BubbleType::STEAM.tier(), Some(Tier::Tier2));
        assert_eq!(BubbleType::new(30).tier(), Some(Tier::Tier3));
        assert_eq!(BubbleType::new(0).tier(), None);
        assert_eq!(BubbleType::new(31).tier(), None);
    }

    #[test]
    fn odd_rows_detected_for_negative_coordinates() {
        assert!(CellCoord::new(-1, 0).is_odd_row());
        assert!(!CellCoord::new(-2, 0).is_odd_row());
        assert!(CellCoord::new(3, 0).is_odd_row());
    }
}
