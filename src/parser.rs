use std::fs;
use std::io;

#[cfg(feature = "ini")]
use serde_derive::Deserialize;

use crate::grid::Grid;
use crate::puzzle::base::palette::{ColorValue, Palette};
use crate::puzzle::{clues_from_grid, Clue, Run};

#[derive(Debug)]
pub struct ParseError(pub String);

impl From<io::Error> for ParseError {
    fn from(err: io::Error) -> Self {
        Self(format!("{:?}", err))
    }
}

#[cfg(feature = "ini")]
impl From<toml::de::Error> for ParseError {
    fn from(err: toml::de::Error) -> Self {
        Self(format!("{:?}", err))
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PuzzleScheme {
    BlackAndWhite,
    MultiColor,
}

pub trait BoardParser {
    fn with_content(content: String) -> Result<Self, ParseError>
    where
        Self: Sized;

    fn parse<R>(&self) -> Grid<R>
    where
        R: Run;

    fn infer_scheme(&self) -> PuzzleScheme;
}

pub trait LocalReader: BoardParser {
    fn read_local(file_name: &str) -> Result<Self, ParseError>
    where
        Self: Sized,
    {
        let content = fs::read_to_string(file_name)?;
        Self::with_content(content)
    }
}

pub trait Paletted {
    fn get_colors(&self) -> Vec<(String, char, String)>;
    fn get_palette(&self) -> Palette;
}

#[cfg(feature = "ini")]
mod own_format {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Clues {
        rows: String,
        columns: String,
    }

    #[derive(Debug, Deserialize)]
    struct Colors {
        defs: Option<Vec<String>>,
    }

    #[derive(Debug, Deserialize)]
    struct PuzzleToml {
        clues: Clues,
        colors: Option<Colors>,
    }

    /// The crate's own TOML puzzle format:
    ///
    /// ```toml
    /// [clues]
    /// rows = "2, 1 1, 2"
    /// columns = "2, 1 1, 2"
    /// ```
    ///
    /// Runs inside one clue are space-separated, clues are comma-separated
    /// and may continue over several lines. A run like `3r` refers to the
    /// color defined as `r = (red) %` in `[colors] defs`.
    #[derive(Debug)]
    pub struct MyFormat {
        structure: PuzzleToml,
    }

    impl LocalReader for MyFormat {}

    impl BoardParser for MyFormat {
        fn with_content(content: String) -> Result<Self, ParseError> {
            let structure = toml::from_str(&content)?;
            Ok(Self { structure })
        }

        fn parse<R>(&self) -> Grid<R>
        where
            R: Run,
        {
            let clues = &self.structure.clues;
            let palette = self.get_palette();
            Grid::with_clues_and_palette(
                Self::parse_clues(&clues.rows, &palette),
                Self::parse_clues(&clues.columns, &palette),
                Some(palette),
            )
        }

        fn infer_scheme(&self) -> PuzzleScheme {
            if let Some(colors) = &self.structure.colors {
                if let Some(defs) = &colors.defs {
                    if !defs.is_empty() {
                        return PuzzleScheme::MultiColor;
                    }
                }
            }

            PuzzleScheme::BlackAndWhite
        }
    }

    impl MyFormat {
        fn parse_run<R>(run: &str, palette: &Palette) -> R
        where
            R: Run,
        {
            let color_start = run.chars().position(|c| !c.is_digit(10));
            let (len, color_name) = match color_start {
                Some(pos) => {
                    let (len, color) = run.split_at(pos);
                    (len, Some(color.to_string()))
                }
                None => (run, palette.get_default()),
            };

            let color_id = color_name.and_then(|name| palette.id_by_name(&name));
            R::from_str_and_color(len, color_id)
        }

        fn parse_clue<R>(clue: &str, palette: &Palette) -> Option<Clue<R>>
        where
            R: Run,
        {
            let clue = clue.trim().trim_matches(|c| c == '\'' || c == '"');
            if clue.is_empty() {
                return None;
            }

            Some(Clue::new(
                clue.split_whitespace()
                    .map(|run| Self::parse_run(run, palette))
                    .collect(),
            ))
        }

        fn parse_clues<R>(descriptions: &str, palette: &Palette) -> Vec<Clue<R>>
        where
            R: Run,
        {
            descriptions
                .lines()
                .flat_map(|line| {
                    // strip trailing comments
                    let significant: &str = line
                        .splitn(2, |c| c == '#' || c == ';')
                        .next()
                        .unwrap_or("");
                    significant
                        .split(',')
                        .filter_map(|clue| Self::parse_clue(clue, palette))
                        .collect::<Vec<_>>()
                })
                .collect()
        }

        /// ```
        /// use crosshatch::parser::MyFormat;
        ///
        /// let def = "b = (blue) *";
        /// assert_eq!(MyFormat::parse_color_def(def), ("b".to_string(), '*', "blue".to_string()));
        /// ```
        pub fn parse_color_def(color_def: &str) -> (String, char, String) {
            let parts: Vec<_> = color_def.split('=').map(str::trim).collect();
            let name = parts[0];
            let mut desc = parts[1].to_string();
            let symbol = desc.pop().expect("Empty color description in definition");

            let value = desc
                .trim()
                .trim_matches(|c| c == '(' || c == ')')
                .to_string();
            (name.to_string(), symbol, value)
        }
    }

    impl Paletted for MyFormat {
        fn get_colors(&self) -> Vec<(String, char, String)> {
            if let Some(colors) = &self.structure.colors {
                if let Some(defs) = &colors.defs {
                    let mut colors: Vec<_> =
                        defs.iter().map(|def| Self::parse_color_def(def)).collect();
                    colors.sort_unstable_by(|(left, ..), (right, ..)| left.cmp(right));
                    return colors;
                }
            }

            vec![]
        }

        fn get_palette(&self) -> Palette {
            let mut palette = Palette::with_space_and_ink("W", "B");

            for (name, symbol, value) in self.get_colors() {
                palette.add(&name, ColorValue::parse(&value), symbol);
            }

            palette
        }
    }
}

#[cfg(feature = "ini")]
pub use self::own_format::MyFormat;

/// A monochrome puzzle given as its solved picture: `.` and space are
/// background, anything else is ink. The clues are derived, so the
/// resulting board is solvable by construction.
#[derive(Debug)]
pub struct CharGrid {
    picture: Vec<Vec<bool>>,
}

impl LocalReader for CharGrid {}

impl BoardParser for CharGrid {
    fn with_content(content: String) -> Result<Self, ParseError> {
        let picture: Vec<Vec<_>> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                line.chars()
                    .map(|symbol| symbol != '.' && symbol != ' ')
                    .collect()
            })
            .collect();

        if picture.is_empty() {
            return Err(ParseError("The picture is empty".to_string()));
        }

        let width = picture[0].len();
        if picture.iter().any(|row| row.len() != width) {
            return Err(ParseError("The picture is jagged".to_string()));
        }

        Ok(Self { picture })
    }

    fn parse<R>(&self) -> Grid<R>
    where
        R: Run,
    {
        let palette = Palette::with_space_and_ink("W", "B");
        let space = Palette::SPACE_ID;
        let ink = palette.id_by_name("B").expect("The ink is always present");

        let ids: Vec<Vec<_>> = self
            .picture
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&filled| if filled { ink } else { space })
                    .collect()
            })
            .collect();

        let (rows, columns) = clues_from_grid(&ids, space);
        Grid::with_clues_and_palette(rows, columns, Some(palette))
    }

    fn infer_scheme(&self) -> PuzzleScheme {
        PuzzleScheme::BlackAndWhite
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardParser, CharGrid};
    use crate::puzzle::mono::MonoRun;
    use crate::puzzle::Clue;

    #[test]
    fn char_grid_derives_clues() {
        let picture = "\
#..
##.
.##
";
        let parser = CharGrid::with_content(picture.to_string()).unwrap();
        let grid = parser.parse::<MonoRun>();

        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 3);
        assert_eq!(
            *grid.clues(true)[1],
            Clue::new(vec![MonoRun(2)])
        );
        assert_eq!(
            *grid.clues(false)[1],
            Clue::new(vec![MonoRun(2)])
        );
    }

    #[test]
    fn jagged_picture_is_rejected() {
        assert!(CharGrid::with_content("##\n#\n".to_string()).is_err());
    }
}

#[cfg(all(test, feature = "ini"))]
mod tests_toml {
    use super::{BoardParser, MyFormat, Paletted, PuzzleScheme};
    use crate::puzzle::colored::ColoredRun;
    use crate::puzzle::mono::MonoRun;
    use crate::puzzle::Clue;

    const MONO: &str = r#"
[clues]
rows = "2, 1 1, 2"
columns = "2, 1 1, 2"
"#;

    const COLORED: &str = r#"
[clues]
rows = "2r 1g, 1r, 1g 2r"
columns = "1r 1g, 3r, 1g 1r"

[colors]
defs = ["r = (red) %", "g = (00FF00) *"]
"#;

    #[test]
    fn mono_scheme_and_clues() {
        let parser = MyFormat::with_content(MONO.to_string()).unwrap();
        assert_eq!(parser.infer_scheme(), PuzzleScheme::BlackAndWhite);

        let grid = parser.parse::<MonoRun>();
        assert_eq!(grid.height(), 3);
        assert_eq!(
            *grid.clues(true)[1],
            Clue::new(vec![MonoRun(1), MonoRun(1)])
        );
    }

    #[test]
    fn colored_scheme_palette_and_clues() {
        let parser = MyFormat::with_content(COLORED.to_string()).unwrap();
        assert_eq!(parser.infer_scheme(), PuzzleScheme::MultiColor);

        let palette = parser.get_palette();
        assert_eq!(palette.id_by_name("W"), Some(1));
        assert_eq!(palette.id_by_name("B"), Some(2));
        assert_eq!(palette.id_by_name("g"), Some(4));
        assert_eq!(palette.id_by_name("r"), Some(8));

        let grid = parser.parse::<ColoredRun>();
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 3);
        assert_eq!(
            *grid.clues(true)[0],
            Clue::new(vec![ColoredRun::new(2, 8), ColoredRun::new(1, 4)])
        );
        assert!(grid.validate().is_ok());
    }
}
