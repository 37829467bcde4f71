//! Hex grid topology, permanent markers and the occupancy index.

use bubble_merge_core::{AssetId, CellCoord, GridLayout, HexLayout};

/// Dense storage for a staggered hex grid.
#[derive(Clone, Debug)]
pub(crate) struct HexGrid {
    layout: HexLayout,
    permanent: Vec<bool>,
    permanent_cells: Vec<CellCoord>,
    occupancy: Vec<Option<AssetId>>,
}

impl HexGrid {
    /// Builds an empty grid, marking permanent cells once.
    ///
    /// Permanent cells outside the layout are ignored.
    pub(crate) fn from_layout(layout: &GridLayout) -> Self {
        let geometry = layout.hex_layout();
        let capacity = geometry.cell_count();
        let mut permanent = vec![false; capacity];
        let mut permanent_cells = Vec::with_capacity(layout.permanent.len());
        for cell in &layout.permanent {
            match geometry.index(*cell) {
                Some(index) => {
                    if !permanent[index] {
                        permanent[index] = true;
                        permanent_cells.push(*cell);
                    }
                }
                None => tracing::debug!(?cell, "ignoring permanent cell outside the grid"),
            }
        }
        permanent_cells.sort_unstable();

        Self {
            layout: geometry,
            permanent,
            permanent_cells,
            occupancy: vec![None; capacity],
        }
    }

    pub(crate) fn layout(&self) -> &HexLayout {
        &self.layout
    }

    pub(crate) fn is_permanent(&self, cell: CellCoord) -> bool {
        self.layout
            .index(cell)
            .and_then(|index| self.permanent.get(index).copied())
            .unwrap_or(false)
    }

    pub(crate) fn occupant_at(&self, cell: CellCoord) -> Option<AssetId> {
        self.layout
            .index(cell)
            .and_then(|index| self.occupancy.get(index).copied().flatten())
    }

    pub(crate) fn mark_occupied(&mut self, cell: CellCoord, asset: AssetId) {
        if let Some(index) = self.layout.index(cell) {
            if let Some(slot) = self.occupancy.get_mut(index) {
                *slot = Some(asset);
            }
        }
    }

    /// Clears the cell only while it is still owned by `owner`.
    pub(crate) fn clear_occupied(&mut self, cell: CellCoord, owner: AssetId) {
        if let Some(index) = self.layout.index(cell) {
            if let Some(slot) = self.occupancy.get_mut(index) {
                if *slot == Some(owner) {
                    *slot = None;
                }
            }
        }
    }

    pub(crate) fn clear_all(&mut self) {
        self.occupancy.fill(None);
    }

    pub(crate) fn permanent_cells(&self) -> &[CellCoord] {
        &self.permanent_cells
    }

    pub(crate) fn permanent_mask(&self) -> &[bool] {
        &self.permanent
    }

    pub(crate) fn occupancy(&self) -> &[Option<AssetId>] {
        &self.occupancy
    }
}
