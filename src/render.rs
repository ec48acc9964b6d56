use std::fmt::Display;

#[cfg(feature = "colors")]
use colored::{Color, ColoredString, Colorize};
use hashbrown::HashMap;

use crate::grid::Grid;
use crate::puzzle::base::palette::ColorDesc;
use crate::puzzle::{Cell, Clue, Run};
use crate::utils::{
    pad, pad_with,
    rc::{MutRc, ReadRc, ReadRef},
    transpose,
};

#[cfg(not(feature = "colors"))]
type ColoredString = String;

pub trait Renderer<R>
where
    R: Run,
{
    fn with_board(board: MutRc<Grid<R>>) -> Self;
    fn render(&self) -> String;
    fn render_simple(&self) -> String;

    fn concat(rows: impl Iterator<Item = Vec<String>>) -> String {
        rows.map(|line| line.concat())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Plain-text renderer: column clues on top, row clues on the side.
#[allow(missing_debug_implementations)]
pub struct ShellRenderer<R>
where
    R: Run,
{
    board: MutRc<Grid<R>>,
}

impl<R> Renderer<R> for ShellRenderer<R>
where
    R: Run + Display,
    R::Cell: Display,
{
    fn with_board(board: MutRc<Grid<R>>) -> Self {
        Self { board }
    }

    fn render(&self) -> String {
        let side_width = self.side_width();
        let full_width = side_width + self.board().width();

        let mut header = self.header_lines();
        for row in &mut header {
            pad_with(row, "#".to_string(), full_width, false);
        }

        let side = self.side_lines();
        let grid = self.grid_lines();
        let body = side.into_iter().zip(grid).map(|(mut row, cells)| {
            pad_with(&mut row, " ".to_string(), side_width, false);
            row.extend(cells.into_iter().map(|cell| cell.to_string()));
            row
        });

        Self::concat(
            header
                .into_iter()
                .chain(body)
                .map(|row| row.iter().map(|symbol| pad(symbol, 2, true)).collect()),
        )
    }

    fn render_simple(&self) -> String {
        Self::concat(
            self.grid_lines()
                .into_iter()
                .map(|row| row.into_iter().map(|cell| cell.to_string()).collect()),
        )
    }
}

impl<R> ShellRenderer<R>
where
    R: Run + Display,
{
    fn board(&self) -> ReadRef<Grid<R>> {
        self.board.read()
    }

    fn side_width(&self) -> usize {
        Self::clues_width(self.board().clues(true))
    }

    fn clues_width(clues: &[ReadRc<Clue<R>>]) -> usize {
        clues.iter().map(|clue| clue.runs.len()).max().unwrap_or(0)
    }

    fn clues_matrix(clues: &[ReadRc<Clue<R>>]) -> Vec<Vec<String>> {
        let width = Self::clues_width(clues);

        clues
            .iter()
            .map(|clue| {
                let mut row: Vec<_> = clue.runs.iter().map(ToString::to_string).collect();
                pad_with(&mut row, " ".to_string(), width, false);
                row
            })
            .collect()
    }

    fn side_lines(&self) -> Vec<Vec<String>> {
        Self::clues_matrix(self.board().clues(true))
    }

    fn header_lines(&self) -> Vec<Vec<String>> {
        transpose(&Self::clues_matrix(self.board().clues(false)))
            .expect("Clue matrices are rectangular")
    }
}

#[cfg(feature = "colors")]
fn to_color_string(color_desc: &ColorDesc) -> ColoredString {
    let known: Result<Color, _> = color_desc.name().parse();
    if let Ok(color) = known {
        " ".on_color(color)
    } else {
        let (r, g, b) = color_desc.rgb_value();
        " ".on_truecolor(r, g, b)
    }
}

#[cfg(not(feature = "colors"))]
fn to_color_string(color_desc: &ColorDesc) -> ColoredString {
    color_desc.symbol()
}

impl<R> ShellRenderer<R>
where
    R: Run + Display,
    R::Cell: Display,
{
    fn cell_symbol(&self, cell: R::Cell) -> ColoredString {
        cell.as_color_id()
            .and_then(|color_id| {
                self.board()
                    .palette()
                    .and_then(|palette| palette.desc_by_id(color_id))
                    .map(|color_desc| to_color_string(&color_desc))
            })
            .unwrap_or_else(|| cell.to_string().as_str().into())
    }

    fn grid_lines(&self) -> Vec<Vec<ColoredString>> {
        let mut symbol_cache = HashMap::new();
        self.board()
            .iter_rows()
            .map(|row| {
                row.iter()
                    .map(|&cell| {
                        symbol_cache
                            .entry(cell)
                            .or_insert_with(|| self.cell_symbol(cell))
                            .clone()
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Renderer, ShellRenderer};
    use crate::grid::Grid;
    use crate::puzzle::mono::MonoRun;
    use crate::puzzle::Clue;
    use crate::solver::propagation;
    use crate::utils::rc::MutRc;

    #[test]
    fn renders_a_solved_board() {
        let clue = |runs: &[usize]| Clue::new(runs.iter().map(|&len| MonoRun(len)).collect());

        let board = MutRc::new(Grid::with_clues(
            vec![clue(&[1]), clue(&[3]), clue(&[1])],
            vec![clue(&[1]), clue(&[3]), clue(&[1])],
        ));

        let mut solver: propagation::Solver<_> = propagation::Solver::new(MutRc::clone(&board));
        let _ = solver.run(None).unwrap();

        let renderer = ShellRenderer::with_board(board);
        assert_eq!(renderer.render_simple(), ".#.\n###\n.#.");
    }
}
