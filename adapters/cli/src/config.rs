//! Loading and validation of engine configuration files.

use std::{fs, path::Path};

use bubble_merge_core::CellCoord;
use bubble_merge_engine::EngineConfig;
use thiserror::Error;

/// Problems found while loading a configuration file.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The file could not be read.
    #[error("could not read configuration file")]
    Io(#[from] std::io::Error),
    /// The file is not a valid configuration document.
    #[error("could not parse configuration file")]
    Parse(#[from] toml::de::Error),
    /// The grid has no rows.
    #[error("grid must contain at least one row")]
    NoRows,
    /// Odd rows would be empty.
    #[error("grid must contain at least two columns, found {0}")]
    TooFewColumns(u32),
    /// Every basic would merge on its own.
    #[error("min_cluster_size must be positive")]
    ZeroClusterSize,
    /// A permanent cell lies outside the grid.
    #[error("permanent cell {0:?} lies outside the grid")]
    PermanentOutsideGrid(CellCoord),
}

/// Reads `path` as TOML, filling omitted fields with defaults.
pub(crate) fn load(path: &Path) -> Result<EngineConfig, ConfigError> {
    let text = fs::read_to_string(path)?;
    parse(&text)
}

fn parse(text: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(text)?;
    validate(&config)?;
    Ok(config)
}

/// Rejects configurations the engine cannot run.
pub(crate) fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.grid.rows == 0 {
        return Err(ConfigError::NoRows);
    }
    if config.grid.columns < 2 {
        return Err(ConfigError::TooFewColumns(config.grid.columns));
    }
    if config.tuning.min_cluster_size == 0 {
        return Err(ConfigError::ZeroClusterSize);
    }
    let layout = config.grid.hex_layout();
    if let Some(cell) = config
        .grid
        .permanent
        .iter()
        .find(|cell| !layout.contains(**cell))
    {
        return Err(ConfigError::PermanentOutsideGrid(*cell));
    }
    Ok(())
}
