//! Staggered-row hex grid geometry.
//!
//! Even rows hold `columns` cells, odd rows hold `columns - 1` cells shifted
//! right by half a cell. Every caller that needs a centre point or a
//! neighbour set goes through [`HexLayout`] so placement, collision and
//! rendering agree on the same numbers.

use crate::{CellCoord, CellPoint};

/// Vertical distance between row centres relative to the cell size (√3 / 2).
pub const ROW_SPACING_RATIO: f32 = 0.866_025_4;

const EVEN_ROW_NEIGHBORS: [(i32, i32); 6] = [(0, -1), (0, 1), (-1, -1), (-1, 0), (1, -1), (1, 0)];
const ODD_ROW_NEIGHBORS: [(i32, i32); 6] = [(0, -1), (0, 1), (-1, 0), (-1, 1), (1, 0), (1, 1)];

/// Immutable geometry of a staggered hex grid.
#[derive(Clone, Debug, PartialEq)]
pub struct HexLayout {
    rows: u32,
    columns: u32,
    cell_size: f32,
}

impl HexLayout {
    /// Creates a layout with the provided dimensions.
    #[must_use]
    pub const fn new(rows: u32, columns: u32, cell_size: f32) -> Self {
        Self {
            rows,
            columns,
            cell_size,
        }
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of cells in each even row.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Horizontal distance between neighbouring cell centres.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Vertical distance between neighbouring row centres.
    #[must_use]
    pub fn row_spacing(&self) -> f32 {
        self.cell_size * ROW_SPACING_RATIO
    }

    /// Number of cells in the provided row; zero for rows outside the grid.
    #[must_use]
    pub fn row_length(&self, row: i32) -> u32 {
        if row < 0 || row as u32 >= self.rows {
            return 0;
        }
        if row % 2 == 1 {
            self.columns.saturating_sub(1)
        } else {
            self.columns
        }
    }

    /// Reports whether the cell lies inside the playable bounds.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.column() >= 0 && (cell.column() as u32) < self.row_length(cell.row())
    }

    /// Total number of cells across all rows.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.row_offset(self.rows)
    }

    /// Dense index of the cell, row-major, or `None` when off the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = u32::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        Some(self.row_offset(row) + column)
    }

    /// Screen-space centre of the cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> CellPoint {
        let half = self.cell_size / 2.0;
        let stagger = if cell.is_odd_row() { half } else { 0.0 };
        CellPoint::new(
            cell.column() as f32 * self.cell_size + half + stagger,
            cell.row() as f32 * self.row_spacing() + half,
        )
    }

    /// The six hex neighbours of a cell, including ones that fall off the grid.
    #[must_use]
    pub fn neighbors(&self, cell: CellCoord) -> [CellCoord; 6] {
        let deltas = if cell.is_odd_row() {
            ODD_ROW_NEIGHBORS
        } else {
            EVEN_ROW_NEIGHBORS
        };
        deltas.map(|(rows, columns)| cell.offset(rows, columns))
    }

    /// Neighbours of a cell that lie inside the grid.
    pub fn valid_neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        self.neighbors(cell)
            .into_iter()
            .filter(move |neighbor| self.contains(*neighbor))
    }

    /// The two neighbours directly beneath a cell (down-left, down-right).
    #[must_use]
    pub fn cells_below(&self, cell: CellCoord) -> [CellCoord; 2] {
        if cell.is_odd_row() {
            [cell.offset(1, 0), cell.offset(1, 1)]
        } else {
            [cell.offset(1, -1), cell.offset(1, 0)]
        }
    }

    /// Iterator over every cell of the grid in index order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (0..self.rows as i32).flat_map(move |row| {
            (0..self.row_length(row) as i32).map(move |column| CellCoord::new(row, column))
        })
    }

    fn row_offset(&self, row: u32) -> usize {
        let pair = (self.columns as usize * 2).saturating_sub(1);
        (row as usize / 2) * pair + (row as usize % 2) * self.columns as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> HexLayout {
        HexLayout::new(6, 5, 10.0)
    }

    #[test]
    fn rows_alternate_between_two_lengths() {
        let layout = layout();
        assert_eq!(layout.row_length(0), 5);
        assert_eq!(layout.row_length(1), 4);
        assert_eq!(layout.row_length(5), 4);
        assert_eq!(layout.row_length(6), 0);
        assert_eq!(layout.row_length(-1), 0);
        assert_eq!(layout.cell_count(), 27);
    }

    #[test]
    fn index_is_dense_and_row_major() {
        let layout = layout();
        let indices: Vec<usize> = layout
            .cells()
            .map(|cell| layout.index(cell).expect("cell inside grid"))
            .collect();
        let expected: Vec<usize> = (0..layout.cell_count()).collect();
        assert_eq!(indices, expected);
        assert_eq!(layout.index(CellCoord::new(1, 4)), None);
        assert_eq!(layout.index(CellCoord::new(2, 0)), Some(9));
    }

    #[test]
    fn neighbor_deltas_depend_on_row_parity() {
        let layout = layout();
        let even = layout.neighbors(CellCoord::new(2, 2));
        assert!(even.contains(&CellCoord::new(1, 1)));
        assert!(even.contains(&CellCoord::new(1, 2)));
        assert!(even.contains(&CellCoord::new(3, 1)));
        assert!(even.contains(&CellCoord::new(3, 2)));

        let odd = layout.neighbors(CellCoord::new(3, 2));
        assert!(odd.contains(&CellCoord::new(2, 2)));
        assert!(odd.contains(&CellCoord::new(2, 3)));
        assert!(odd.contains(&CellCoord::new(4, 2)));
        assert!(odd.contains(&CellCoord::new(4, 3)));
    }

    #[test]
    fn neighbors_are_exactly_one_cell_apart() {
        let layout = layout();
        for cell in layout.cells() {
            let center = layout.cell_center(cell);
            for neighbor in layout.valid_neighbors(cell) {
                let distance = center.distance_squared(layout.cell_center(neighbor)).sqrt();
                assert!(
                    (distance - layout.cell_size()).abs() < 1e-3,
                    "{cell:?} -> {neighbor:?} measured {distance}"
                );
            }
        }
    }

    #[test]
    fn odd_rows_are_shifted_by_half_a_cell() {
        let layout = layout();
        let even = layout.cell_center(CellCoord::new(0, 0));
        let odd = layout.cell_center(CellCoord::new(1, 0));
        assert!((even.x() - 5.0).abs() < f32::EPSILON);
        assert!((odd.x() - 10.0).abs() < f32::EPSILON);
        assert!((odd.y() - even.y() - layout.row_spacing()).abs() < 1e-4);
    }

    #[test]
    fn cells_below_match_lower_neighbors() {
        let layout = layout();
        for cell in [CellCoord::new(2, 2), CellCoord::new(3, 2)] {
            let neighbors = layout.neighbors(cell);
            for below in layout.cells_below(cell) {
                assert!(neighbors.contains(&below));
                assert_eq!(below.row(), cell.row() + 1);
            }
        }
    }
}
