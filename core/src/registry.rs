//! Asset footprint templates and the centre-point rule for each tier.
//!
//! Templates are keyed by anchor-row parity because the hex stagger shifts
//! the shape by half a cell between even and odd rows. Offsets are
//! `(rows, columns)` relative to the anchor, anchor first.

use crate::{hex::HexLayout, CellCoord, CellPoint, Tier};

const BASIC: [(i32, i32); 1] = [(0, 0)];

const TIER1_EVEN: [(i32, i32); 4] = [(0, 0), (0, 1), (1, 0), (1, 1)];
const TIER1_ODD: [(i32, i32); 4] = [(0, 0), (0, 1), (1, 1), (1, 2)];

const TIER2_EVEN: [(i32, i32); 7] = [
    (0, 0),
    (-1, -1),
    (-1, 0),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
];
const TIER2_ODD: [(i32, i32); 7] = [(0, 0), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, 0), (1, 1)];

const TIER3_EVEN: [(i32, i32); 19] = [
    (0, 0),
    (-2, -1),
    (-2, 0),
    (-2, 1),
    (-1, -2),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -2),
    (0, -1),
    (0, 1),
    (0, 2),
    (1, -2),
    (1, -1),
    (1, 0),
    (1, 1),
    (2, -1),
    (2, 0),
    (2, 1),
];
const TIER3_ODD: [(i32, i32); 19] = [
    (0, 0),
    (-2, -1),
    (-2, 0),
    (-2, 1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (-1, 2),
    (0, -2),
    (0, -1),
    (0, 1),
    (0, 2),
    (1, -1),
    (1, 0),
    (1, 1),
    (1, 2),
    (2, -1),
    (2, 0),
    (2, 1),
];

/// Horizontal offset of the tier1 centre from its anchor, in cell sizes.
const TIER1_CENTER_COLUMNS: f32 = 0.75;
/// Vertical offset of the tier1 centre from its anchor, in row spacings.
const TIER1_CENTER_ROWS: f32 = 0.5;

/// Shape template for a tier at an anchor row.
#[must_use]
pub fn footprint_template(tier: Tier, anchor_row: i32) -> &'static [(i32, i32)] {
    let odd = anchor_row.rem_euclid(2) == 1;
    match (tier, odd) {
        (Tier::Basic, _) => &BASIC,
        (Tier::Tier1, false) => &TIER1_EVEN,
        (Tier::Tier1, true) => &TIER1_ODD,
        (Tier::Tier2, false) => &TIER2_EVEN,
        (Tier::Tier2, true) => &TIER2_ODD,
        (Tier::Tier3, false) => &TIER3_EVEN,
        (Tier::Tier3, true) => &TIER3_ODD,
    }
}

/// Cells covered by a tier anchored at `anchor`, filtered to the grid.
///
/// The result is shorter than [`Tier::footprint_size`] whenever part of the
/// template falls off the grid; callers treat that as an illegal footprint.
#[must_use]
pub fn footprint_cells(layout: &HexLayout, tier: Tier, anchor: CellCoord) -> Vec<CellCoord> {
    footprint_template(tier, anchor.row())
        .iter()
        .map(|(rows, columns)| anchor.offset(*rows, *columns))
        .filter(|cell| layout.contains(*cell))
        .collect()
}

/// Screen-space centre of an asset of `tier` anchored at `anchor`.
///
/// Basic, tier2 and tier3 shapes are centred on their anchor. The tier1
/// anchor is the top-left cell of its rhombus, so its centre is offset.
#[must_use]
pub fn center_point(layout: &HexLayout, tier: Tier, anchor: CellCoord) -> CellPoint {
    let base = layout.cell_center(anchor);
    match tier {
        Tier::Basic | Tier::Tier2 | Tier::Tier3 => base,
        Tier::Tier1 => CellPoint::new(
            base.x() + layout.cell_size() * TIER1_CENTER_COLUMNS,
            base.y() + layout.row_spacing() * TIER1_CENTER_ROWS,
        ),
    }
}
