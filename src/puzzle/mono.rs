use std::fmt;
use std::ops::{BitAnd, BitOr, Sub};

use crate::puzzle::base::{
    palette::{ColorId, Palette},
    Cell, Contradiction, Run,
};

const SPACE_BIT: u8 = 0b01;
const INK_BIT: u8 = 0b10;

/// A black-and-white cell: a two-bit mask over {space, ink}.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, PartialOrd, Ord)]
pub struct MonoCell(u8);

impl MonoCell {
    pub const UNKNOWN: Self = Self(SPACE_BIT | INK_BIT);
    pub const SPACE: Self = Self(SPACE_BIT);
    pub const INK: Self = Self(INK_BIT);
}

impl Cell for MonoCell {
    fn unknown(_all_colors: ColorId) -> Self {
        Self::UNKNOWN
    }

    fn space() -> Self {
        Self::SPACE
    }

    fn is_resolved(self) -> bool {
        self.0.is_power_of_two()
    }

    fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn admits_space(self) -> bool {
        self.0 & SPACE_BIT != 0
    }

    fn admits(self, color: Self) -> bool {
        self.0 & color.0 != 0
    }

    fn variants(self) -> Vec<Self> {
        [Self::SPACE, Self::INK]
            .iter()
            .cloned()
            .filter(|&single| self.admits(single))
            .collect()
    }

    fn solution_rate(self, _all_colors: ColorId) -> f64 {
        if self.is_resolved() {
            1.0
        } else {
            0.0
        }
    }

    fn as_color_id(self) -> Option<ColorId> {
        None
    }

    fn from_color_ids(ids: &[ColorId]) -> Self {
        ids.iter().fold(Self(0), |acc, &id| {
            let bit = if id == Palette::SPACE_ID {
                Self::SPACE
            } else {
                Self::INK
            };
            acc | bit
        })
    }
}

impl BitAnd for MonoCell {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for MonoCell {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Sub for MonoCell {
    type Output = Result<Self, Contradiction>;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.is_resolved() {
            return Err(Contradiction);
        }

        let left = Self(self.0 & !rhs.0);
        if left.is_empty() {
            Err(Contradiction)
        } else {
            Ok(left)
        }
    }
}

impl fmt::Display for MonoCell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match *self {
            Self::SPACE => '.',
            Self::INK => '#',
            _undetermined => '?',
        };
        write!(f, "{}", symbol)
    }
}

/// A black run: only the length matters, the ink color is implicit.
#[derive(Debug, PartialEq, Eq, Hash, Default, Clone, Copy)]
pub struct MonoRun(pub usize);

impl Run for MonoRun {
    type Cell = MonoCell;

    fn from_len_and_color(len: usize, _color: Option<ColorId>) -> Self {
        Self(len)
    }

    fn len(self) -> usize {
        self.0
    }

    fn cell(self) -> MonoCell {
        MonoCell::INK
    }

    fn min_span(runs: &[Self]) -> Vec<usize> {
        runs.iter()
            .scan(None, |prev, run| {
                // neighbouring black runs always need a separating space
                let current = match *prev {
                    Some(prev_span) => prev_span + run.0 + 1,
                    None => run.0,
                };
                *prev = Some(current);
                *prev
            })
            .collect()
    }
}

impl fmt::Display for MonoRun {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
