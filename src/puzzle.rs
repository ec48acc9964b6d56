pub use base::{clue_for_line, clues_from_grid, Cell, Clue, Contradiction, Run};

pub mod base;
pub mod colored;
pub mod mono;
