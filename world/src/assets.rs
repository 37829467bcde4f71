//! Authoritative asset storage and identifier allocation.

use std::collections::BTreeMap;

use bubble_merge_core::{registry, Asset, AssetId, BubbleType, CellCoord, HexLayout, Tier};

/// Table that owns every live asset and hands out identifiers.
#[derive(Debug)]
pub(crate) struct AssetTable {
    entries: BTreeMap<AssetId, Asset>,
    next_asset_id: AssetId,
}

impl AssetTable {
    /// Creates an empty table with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_asset_id: AssetId::new(0),
        }
    }

    /// Builds and stores an asset, deriving its centre from the tier's template.
    pub(crate) fn create(
        &mut self,
        layout: &HexLayout,
        tier: Tier,
        bubble_type: BubbleType,
        anchor: CellCoord,
        footprint: Vec<CellCoord>,
    ) -> AssetId {
        let id = self.next_asset_id;
        self.next_asset_id = AssetId::new(id.get().saturating_add(1));
        let center = registry::center_point(layout, tier, anchor);
        let asset = Asset::new(id, tier, bubble_type, anchor, footprint, center);
        let _ = self.entries.insert(id, asset);
        id
    }

    pub(crate) fn get(&self, id: AssetId) -> Option<&Asset> {
        self.entries.get(&id)
    }

    pub(crate) fn remove(&mut self, id: AssetId) -> Option<Asset> {
        self.entries.remove(&id)
    }

    /// Drops every asset and rewinds the identifier counter.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_asset_id = AssetId::new(0);
    }

    pub(crate) fn entries(&self) -> &BTreeMap<AssetId, Asset> {
        &self.entries
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
