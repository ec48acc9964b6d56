use std::fmt::{self, Debug};
use std::hash::Hash;
use std::ops::{BitAnd, BitOr, Sub};

use smallvec::SmallVec;

use self::palette::ColorId;

/// The signal that a cell (or a whole line) ran out of admissible colors.
///
/// It is an expected value during probing and search, not a failure:
/// every in-solve dead end travels through this type.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Contradiction;

impl fmt::Display for Contradiction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "no admissible color left")
    }
}

/// A cell under partial information: an integer bitmask over color codes.
///
/// A single set bit means the cell is resolved, several bits enumerate the
/// colors still possible, an empty mask is a contradiction. Refinement is
/// `&`, the envelope union of the line solver is `|`, and `-` eliminates
/// colors (probing deductions).
pub trait Cell
where
    Self: Debug
        + Eq
        + Hash
        + Ord
        + Copy
        + Send
        + Sync
        + BitAnd<Output = Self>
        + BitOr<Output = Self>
        + Sub<Output = Result<Self, Contradiction>>,
{
    /// The initial mask: every color of the palette is still possible.
    fn unknown(all_colors: ColorId) -> Self;
    fn space() -> Self;

    fn is_resolved(self) -> bool;
    fn is_empty(self) -> bool;

    fn admits_space(self) -> bool;
    fn admits(self, color: Self) -> bool;

    /// Resolved single-color masks this cell can still become.
    fn variants(self) -> Vec<Self>;

    /// How close the cell is to resolved: 0.0 fully open, 1.0 resolved.
    fn solution_rate(self, all_colors: ColorId) -> f64;

    fn as_color_id(self) -> Option<ColorId>;
    fn from_color_ids(ids: &[ColorId]) -> Self;
}

/// One clue entry: a maximal block of `len` cells of a single color.
pub trait Run
where
    Self: Debug + Eq + Hash + Default + Copy + Send + Sync,
{
    type Cell: Cell;

    fn from_len_and_color(len: usize, color: Option<ColorId>) -> Self;

    fn from_str_and_color(s: &str, color: Option<ColorId>) -> Self {
        let len = s.parse::<usize>().expect("Non-integer run length given");
        Self::from_len_and_color(len, color)
    }

    fn len(self) -> usize;

    /// The resolved cell mask every cell inside this run takes.
    fn cell(self) -> Self::Cell;

    /// Cumulative minimal space for every clue prefix, counting the
    /// mandatory separator between neighbouring runs of the same color.
    fn min_span(runs: &[Self]) -> Vec<usize>;
}

pub type Runs<R> = SmallVec<[R; 8]>;

/// An ordered clue sequence for a single line.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Clue<R: Run> {
    pub runs: Runs<R>,
}

impl<R: Run> Clue<R> {
    pub fn new(runs: Vec<R>) -> Self {
        let mut runs: Runs<R> = runs.into_iter().collect();
        // zero-length runs denote an empty clue in several input formats
        runs.retain(|run| *run != R::default());
        Self { runs }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// The smallest line this clue fits into.
    pub fn min_len(&self) -> usize {
        R::min_span(&self.runs).last().copied().unwrap_or(0)
    }
}

/// Read the clue off a fully colored line.
pub fn clue_for_line<R>(line: &[ColorId], space: ColorId) -> Clue<R>
where
    R: Run,
{
    let mut runs = vec![];
    let mut index = 0;

    while index < line.len() {
        let run_start = index;
        let color = line[index];

        while index < line.len() && line[index] == color {
            index += 1;
        }

        if color != space {
            runs.push(R::from_len_and_color(index - run_start, Some(color)));
        }
    }

    Clue::new(runs)
}

/// Derive the row and column clues from a solved picture.
pub fn clues_from_grid<R>(
    solution: &[Vec<ColorId>],
    space: ColorId,
) -> (Vec<Clue<R>>, Vec<Clue<R>>)
where
    R: Run,
{
    let height = solution.len();
    let width = solution.first().map_or(0, Vec::len);
    if height == 0 || width == 0 {
        return (vec![], vec![]);
    }

    let rows = solution
        .iter()
        .map(|row| clue_for_line(row, space))
        .collect();
    let columns = (0..width)
        .map(|x| {
            let column: Vec<_> = (0..height).map(|y| solution[y][x]).collect();
            clue_for_line(&column, space)
        })
        .collect();

    (rows, columns)
}

pub mod palette {
    use hashbrown::HashMap;

    pub type ColorId = u32;

    #[derive(Debug, PartialEq, Clone)]
    pub enum ColorValue {
        // "red", "teal"
        CommonName(String),
        // (0, 255, 0) for green
        RgbTriplet(u8, u8, u8),
        // 0xFF00FF for magenta
        HexValue(u32),
    }

    /// ```
    /// use crosshatch::puzzle::base::palette::ColorValue;
    ///
    /// assert_eq!(ColorValue::parse("0000FF"), ColorValue::HexValue(255));
    /// assert_eq!(ColorValue::parse("white"), ColorValue::CommonName("white".to_string()));
    /// assert_eq!(ColorValue::parse("200, 16,0  "), ColorValue::RgbTriplet(200, 16, 0));
    /// // invalid triplet: G component is not an u8
    /// assert_eq!(ColorValue::parse("200, X, 16"), ColorValue::CommonName("200, X, 16".to_string()));
    /// ```
    impl ColorValue {
        pub fn parse(value: &str) -> Self {
            if value.len() == 6 {
                if let Ok(hex) = u32::from_str_radix(value, 16) {
                    return ColorValue::HexValue(hex);
                }
            }

            let rgb: Vec<_> = value.split(',').collect();
            if rgb.len() == 3 {
                let rgb: Vec<_> = rgb
                    .iter()
                    .filter_map(|component| component.trim().parse::<u8>().ok())
                    .collect();

                if rgb.len() == 3 {
                    return ColorValue::RgbTriplet(rgb[0], rgb[1], rgb[2]);
                }
            }

            ColorValue::CommonName(value.to_string())
        }

        pub fn to_rgb(&self) -> (u8, u8, u8) {
            match self {
                ColorValue::RgbTriplet(r, g, b) => (*r, *g, *b),
                ColorValue::HexValue(hex) => {
                    let (r, gb) = (hex / (1 << 16), hex % (1 << 16));
                    let (g, b) = (gb / 256, gb % 256);

                    (r as u8, g as u8, b as u8)
                }
                ColorValue::CommonName(name) => match name.to_lowercase().as_str() {
                    "white" => (255, 255, 255),
                    "red" => (255, 0, 0),
                    "lime" => (0, 255, 0),
                    "blue" => (0, 0, 255),
                    "yellow" => (255, 255, 0),
                    "cyan" => (0, 255, 255),
                    "magenta" => (255, 0, 255),
                    "gray" => (128, 128, 128),
                    "maroon" => (128, 0, 0),
                    "olive" => (128, 128, 0),
                    "green" => (0, 128, 0),
                    "purple" => (128, 0, 128),
                    "teal" => (0, 128, 128),
                    "navy" => (0, 0, 128),
                    _black_or_unknown => (0, 0, 0),
                },
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct ColorDesc {
        id: ColorId,
        name: String,
        value: ColorValue,
        symbol: char,
    }

    impl ColorDesc {
        pub fn id(&self) -> ColorId {
            self.id
        }

        pub fn name(&self) -> &str {
            self.name.as_str()
        }

        pub fn symbol(&self) -> String {
            self.symbol.to_string()
        }

        pub fn rgb_value(&self) -> (u8, u8, u8) {
            self.value.to_rgb()
        }
    }

    /// The ordered color set of a single puzzle. Every color gets a
    /// distinct power-of-two code, so a set of colors is a single mask.
    #[derive(Debug, Clone)]
    pub struct Palette {
        colors: HashMap<String, ColorDesc>,
        default_color: Option<String>,
    }

    impl Palette {
        /// The background code: bit 0 of every cell mask.
        pub const SPACE_ID: ColorId = 1;

        pub fn with_space(space_name: &str) -> Self {
            let mut this = Self {
                colors: HashMap::new(),
                default_color: None,
            };
            this.add_with_id(
                space_name,
                ColorValue::CommonName("white".to_string()),
                '.',
                Self::SPACE_ID,
            );
            this
        }

        pub fn with_space_and_ink(space_name: &str, ink_name: &str) -> Self {
            let mut this = Self::with_space(space_name);
            this.add(ink_name, ColorValue::CommonName("black".to_string()), 'X');
            let _ = this.set_default(ink_name);
            this
        }

        /// Register a color under the next free power-of-two code.
        pub fn add(&mut self, name: &str, value: ColorValue, symbol: char) {
            let current_max = self.colors.values().map(ColorDesc::id).max();
            let id = current_max.map_or(Self::SPACE_ID, |val| val * 2);
            self.add_with_id(name, value, symbol, id)
        }

        fn add_with_id(&mut self, name: &str, value: ColorValue, symbol: char, id: ColorId) {
            if !self.colors.contains_key(name) {
                let _ = self.colors.insert(
                    name.to_string(),
                    ColorDesc {
                        id,
                        name: name.to_string(),
                        value,
                        symbol,
                    },
                );
            }
        }

        pub fn set_default(&mut self, color_name: &str) -> bool {
            if self.colors.contains_key(color_name) {
                self.default_color = Some(color_name.to_string());
                return true;
            }

            false
        }

        pub fn get_default(&self) -> Option<String> {
            self.default_color.clone()
        }

        pub fn id_by_name(&self, name: &str) -> Option<ColorId> {
            self.colors.get(name).map(ColorDesc::id)
        }

        pub fn desc_by_id(&self, id: ColorId) -> Option<ColorDesc> {
            self.colors.values().find(|desc| desc.id == id).cloned()
        }

        /// OR of every registered code: the initial mask of every cell.
        pub fn full_mask(&self) -> ColorId {
            self.colors.values().fold(0, |acc, desc| acc | desc.id)
        }

        pub fn len(&self) -> usize {
            self.colors.len()
        }

        pub fn is_empty(&self) -> bool {
            self.colors.is_empty()
        }
    }
}
