#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame-counted queue of deferred merge re-checks.
//!
//! Each entry pairs an asset id with the number of ticks left before its
//! merge check fires. The scheduler never looks at the grid; whoever drains
//! it is responsible for dropping ids that no longer exist.

use bubble_merge_core::AssetId;

const DEFAULT_DELAY_FRAMES: u32 = 8;

/// Tunables for the cascade scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    delay_frames: u32,
}

impl Config {
    /// Creates a configuration with the provided delay.
    #[must_use]
    pub const fn new(delay_frames: u32) -> Self {
        Self { delay_frames }
    }

    /// Ticks between scheduling a check and running it.
    #[must_use]
    pub const fn delay_frames(&self) -> u32 {
        self.delay_frames
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY_FRAMES)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingCheck {
    asset: AssetId,
    remaining: u32,
}

/// Queue of pending merge checks, drained once per tick.
#[derive(Debug, Default)]
pub struct CascadeScheduler {
    config: Config,
    pending: Vec<PendingCheck>,
}

impl CascadeScheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            pending: Vec::new(),
        }
    }

    /// Queues a merge check for the asset after the configured delay.
    ///
    /// An asset that is already queued keeps its original countdown.
    pub fn schedule(&mut self, asset: AssetId) {
        if self.pending.iter().any(|check| check.asset == asset) {
            return;
        }
        self.pending.push(PendingCheck {
            asset,
            remaining: self.config.delay_frames.max(1),
        });
    }

    /// Advances every countdown by one tick and moves due ids into `out`.
    ///
    /// Due ids come out in scheduling order. The output buffer is cleared first.
    pub fn tick(&mut self, out: &mut Vec<AssetId>) {
        out.clear();
        self.pending.retain_mut(|check| {
            check.remaining -= 1;
            if check.remaining == 0 {
                out.push(check.asset);
                false
            } else {
                true
            }
        });
    }

    /// Drops every pending check.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Reports whether no check is pending.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of pending checks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Reports whether no check is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_idle()
    }
}
