use std::fmt;
use std::ops::{BitAnd, BitOr, Sub};

use crate::puzzle::base::{
    palette::{ColorId, Palette},
    Cell, Contradiction, Run,
};
use crate::utils::{from_two_powers, two_powers};

/// A multi-color cell: the mask of palette codes still possible.
#[derive(Debug, PartialEq, Eq, Hash, Default, Copy, Clone, PartialOrd, Ord)]
pub struct ColorMask(pub ColorId);

impl Cell for ColorMask {
    fn unknown(all_colors: ColorId) -> Self {
        Self(all_colors)
    }

    fn space() -> Self {
        Self(Palette::SPACE_ID)
    }

    fn is_resolved(self) -> bool {
        self.0.is_power_of_two()
    }

    fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn admits_space(self) -> bool {
        self.0 & Palette::SPACE_ID != 0
    }

    fn admits(self, color: Self) -> bool {
        self.0 & color.0 != 0
    }

    fn variants(self) -> Vec<Self> {
        two_powers(self.0).map(Self).collect()
    }

    /// `rate = (N - n) / (N - 1)` for a palette of N colors and a cell
    /// that still admits n of them: 0.0 fully open, 1.0 resolved.
    fn solution_rate(self, all_colors: ColorId) -> f64 {
        let full_size = all_colors.count_ones();
        let current_size = (self.0 & all_colors).count_ones();

        match current_size {
            0 => 0.0,
            1 => 1.0,
            _ => f64::from(full_size - current_size) / f64::from(full_size - 1),
        }
    }

    fn as_color_id(self) -> Option<ColorId> {
        Some(self.0)
    }

    fn from_color_ids(ids: &[ColorId]) -> Self {
        Self(from_two_powers(ids))
    }
}

impl BitAnd for ColorMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for ColorMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Sub for ColorMask {
    type Output = Result<Self, Contradiction>;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.is_resolved() {
            return Err(Contradiction);
        }

        let left = Self(self.0 & !rhs.0);
        debug!("Eliminating {:?} from {:?}: left {:?}", rhs, self, left);

        if left.is_empty() {
            Err(Contradiction)
        } else {
            Ok(left)
        }
    }
}

impl fmt::Display for ColorMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_resolved() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "?")
        }
    }
}

/// A clue run carrying its palette code.
#[derive(Debug, PartialEq, Eq, Hash, Default, Clone, Copy)]
pub struct ColoredRun {
    len: usize,
    color: ColorId,
}

impl ColoredRun {
    pub const fn new(len: usize, color: ColorId) -> Self {
        Self { len, color }
    }

    pub fn color_id(self) -> ColorId {
        self.color
    }
}

impl Run for ColoredRun {
    type Cell = ColorMask;

    fn from_len_and_color(len: usize, color: Option<ColorId>) -> Self {
        let color = color.expect("Color not provided for a colored run");
        Self { len, color }
    }

    fn len(self) -> usize {
        self.len
    }

    fn cell(self) -> ColorMask {
        ColorMask(self.color)
    }

    fn min_span(runs: &[Self]) -> Vec<usize> {
        runs.iter()
            .scan(None, |prev: &mut Option<Self>, run| {
                let current = match *prev {
                    Some(prev_run) => {
                        let span = prev_run.len + run.len;
                        // only equal-colored neighbours must be separated
                        if prev_run.color == run.color {
                            span + 1
                        } else {
                            span
                        }
                    }
                    None => run.len,
                };

                *prev = Some(Self::new(current, run.color));
                Some(current)
            })
            .collect()
    }
}

impl fmt::Display for ColoredRun {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.len)
    }
}
