//! ASCII rendering of the hex board.

use std::fmt::Write as _;

use bubble_merge_core::{CellCoord, Tier};
use bubble_merge_engine::Engine;
use bubble_merge_world::query;

const PERMANENT: char = '#';
const EMPTY: char = '.';

/// Draws one line per row, odd rows indented by half a cell.
///
/// Basics print the lowercase initial of their element, composites print
/// their tier digit.
pub(crate) fn render(engine: &Engine) -> String {
    let world = engine.world();
    let layout = query::layout(world);
    let mut board = String::new();

    for row in 0..layout.rows() as i32 {
        let mut line = String::new();
        if row % 2 == 1 {
            line.push(' ');
        }
        for column in 0..layout.row_length(row) as i32 {
            if column > 0 {
                line.push(' ');
            }
            line.push(glyph(engine, CellCoord::new(row, column)));
        }
        let _ = writeln!(board, "{}", line.trim_end());
    }
    board
}

fn glyph(engine: &Engine, cell: CellCoord) -> char {
    if query::is_permanent(engine.world(), cell) {
        return PERMANENT;
    }
    let Some(asset) = query::occupant_at(engine.world(), cell).and_then(|id| engine.asset(id))
    else {
        return EMPTY;
    };
    match asset.tier() {
        Tier::Basic => asset
            .bubble_type()
            .name()
            .chars()
            .next()
            .map_or('?', |initial| initial.to_ascii_lowercase()),
        Tier::Tier1 => '1',
        Tier::Tier2 => '2',
        Tier::Tier3 => '3',
    }
}
