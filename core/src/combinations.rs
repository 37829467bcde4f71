//! Static combination tables.
//!
//! Basic elements promote 1:1 into tier1, unordered pairs of distinct tier1
//! elements form tier2, and ten fixed tier2 + tier1 pairs form tier3. Tier3
//! has no outgoing combination, which bounds every cascade.

use crate::BubbleType;

const TIER1_OFFSET: u8 = 5;

const TIER2_TABLE: [(u8, u8, u8); 10] = [
    (6, 7, 11),
    (6, 8, 12),
    (6, 9, 13),
    (6, 10, 14),
    (7, 8, 15),
    (7, 9, 16),
    (7, 10, 17),
    (8, 9, 18),
    (8, 10, 19),
    (9, 10, 20),
];

const TIER3_TABLE: [(u8, u8, u8); 10] = [
    (11, 8, 21),
    (12, 9, 22),
    (13, 10, 23),
    (14, 7, 24),
    (15, 6, 25),
    (16, 10, 26),
    (17, 8, 27),
    (18, 7, 28),
    (19, 6, 29),
    (20, 7, 30),
];

const NAMES: [&str; 30] = [
    "Fire",
    "Water",
    "Earth",
    "Air",
    "Lightning",
    "Flame",
    "Rain",
    "Stone",
    "Gust",
    "Spark",
    "Steam",
    "Magma",
    "Wildfire",
    "Plasma",
    "Mud",
    "Storm",
    "Thunder",
    "Sandstorm",
    "Crystal",
    "Tempest",
    "Geyser",
    "Eruption",
    "Firestorm",
    "Nova",
    "Golem",
    "Hurricane",
    "Avalanche",
    "Quicksand",
    "Prism",
    "Maelstrom",
];

/// Tier1 equivalent of a basic element.
#[must_use]
pub fn tier1_for(basic: BubbleType) -> Option<BubbleType> {
    match basic.get() {
        1..=5 => Some(BubbleType::new(basic.get() + TIER1_OFFSET)),
        _ => None,
    }
}

/// Tier2 outcome of two tier1 elements, independent of argument order.
#[must_use]
pub fn tier2_for(first: BubbleType, second: BubbleType) -> Option<BubbleType> {
    let (low, high) = if first <= second {
        (first.get(), second.get())
    } else {
        (second.get(), first.get())
    };
    TIER2_TABLE
        .iter()
        .find(|(a, b, _)| *a == low && *b == high)
        .map(|(_, _, result)| BubbleType::new(*result))
}

/// Tier3 outcome of a tier2 element joined by a tier1 element.
#[must_use]
pub fn tier3_for(tier2: BubbleType, tier1: BubbleType) -> Option<BubbleType> {
    TIER3_TABLE
        .iter()
        .find(|(a, b, _)| *a == tier2.get() && *b == tier1.get())
        .map(|(_, _, result)| BubbleType::new(*result))
}

/// Display name of a bubble type, or `"Unknown"` for codes outside the tables.
#[must_use]
pub fn name_of(bubble_type: BubbleType) -> &'static str {
    usize::from(bubble_type.get())
        .checked_sub(1)
        .and_then(|index| NAMES.get(index).copied())
        .unwrap_or("Unknown")
}
