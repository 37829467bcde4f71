//! Single-line board snapshots for sharing layouts between runs.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use bubble_merge_core::{BubbleType, CellCoord, GridLayout, PlacementError};
use bubble_merge_engine::Engine;
use bubble_merge_world::query;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "bubbles";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "bubbles:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of the grid configuration and every asset resting on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct LayoutSnapshot {
    /// Number of rows in the grid.
    pub rows: u32,
    /// Number of cells in each even row.
    pub columns: u32,
    /// Horizontal distance between neighbouring cell centres.
    pub cell_size: f32,
    /// Cells that can never be occupied.
    pub permanent: Vec<CellCoord>,
    /// Assets in ascending id order.
    pub assets: Vec<LayoutAsset>,
}

/// Asset description captured within a layout snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct LayoutAsset {
    /// Element or combination occupying the footprint.
    pub bubble_type: BubbleType,
    /// Anchor cell of the footprint.
    pub anchor: CellCoord,
}

#[derive(Serialize, Deserialize)]
struct SerializableSnapshot {
    cell_size: f32,
    permanent: Vec<CellCoord>,
    assets: Vec<LayoutAsset>,
}

impl LayoutSnapshot {
    /// Captures the engine's current grid and assets.
    #[must_use]
    pub(crate) fn capture(engine: &Engine) -> Self {
        let layout = query::grid_layout(engine.world());
        Self {
            rows: layout.rows,
            columns: layout.columns,
            cell_size: layout.cell_size,
            permanent: query::permanent_cells(engine.world()).to_vec(),
            assets: engine
                .assets()
                .iter()
                .map(|asset| LayoutAsset {
                    bubble_type: asset.bubble_type(),
                    anchor: asset.anchor(),
                })
                .collect(),
        }
    }

    /// Grid configuration described by the snapshot.
    #[must_use]
    pub(crate) fn grid_layout(&self) -> GridLayout {
        GridLayout::new(self.rows, self.columns, self.cell_size)
            .with_permanent(self.permanent.clone())
    }

    /// Seeds every captured asset into `engine`, in snapshot order.
    pub(crate) fn seed(&self, engine: &mut Engine) -> Result<(), LayoutTransferError> {
        for asset in &self.assets {
            let _ = engine
                .seed_asset(asset.bubble_type, asset.anchor)
                .map_err(|source| LayoutTransferError::Seed {
                    anchor: asset.anchor,
                    source,
                })?;
        }
        Ok(())
    }

    /// Encodes the snapshot into a single-line string.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let payload = SerializableSnapshot {
            cell_size: self.cell_size,
            permanent: self.permanent.clone(),
            assets: self.assets.clone(),
        };
        let json = serde_json::to_vec(&payload).map_err(LayoutTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
            self.rows, self.columns
        ))
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (rows, columns) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let decoded: SerializableSnapshot =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        Ok(Self {
            rows,
            columns,
            cell_size: decoded.cell_size,
            permanent: decoded.permanent,
            assets: decoded.assets,
        })
    }
}

/// Errors raised while encoding, decoding or seeding layout strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("layout string is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("layout string is missing the version")]
    MissingVersion,
    /// The grid dimensions were missing.
    #[error("layout string is missing the grid dimensions")]
    MissingDimensions,
    /// The payload segment was missing.
    #[error("layout string is missing the payload")]
    MissingPayload,
    /// The prefix did not name a bubble layout.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version is not understood by this build.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The dimensions segment could not be parsed.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    #[error("could not parse layout payload")]
    InvalidPayload(#[source] serde_json::Error),
    /// A captured asset was rejected by the world.
    #[error("asset anchored at {anchor:?} could not be seeded")]
    Seed {
        /// Anchor of the rejected asset.
        anchor: CellCoord,
        /// Reason reported by the world.
        #[source]
        source: PlacementError,
    },
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (rows, columns) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;
    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;

    if rows == 0 || columns < 2 {
        return Err(invalid());
    }

    Ok((rows, columns))
}
