use std::fmt;
use std::slice::Chunks;

use crate::puzzle::base::palette::{ColorId, Palette};
use crate::puzzle::{Cell, Clue, Contradiction, Run};
use crate::utils::{dedup, rc::ReadRc};

/// Board coordinates: `x` is the column, `y` is the row.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, PartialOrd, Ord)]
pub struct Point {
    x: usize,
    y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn x(self) -> usize {
        self.x
    }

    pub fn y(self) -> usize {
        self.y
    }
}

/// Mask bits of a palette-less monochrome board: space and one ink color.
const MONO_COLORS: ColorId = 0b11;

/// The board: a mutable cell grid under frozen row and column clues.
///
/// Cells only ever lose colors while solving. Clues are shared between
/// clones, so a search fork copies nothing but the cell vector.
#[derive(Debug, Clone)]
pub struct Grid<R>
where
    R: Run,
{
    cells: Vec<R::Cell>,
    clue_rows: Vec<ReadRc<Clue<R>>>,
    clue_cols: Vec<ReadRc<Clue<R>>>,
    palette: Option<Palette>,
    all_colors: ColorId,
    row_cache_slots: Vec<usize>,
    col_cache_slots: Vec<usize>,
}

impl<R> Grid<R>
where
    R: Run,
{
    pub fn with_clues(rows: Vec<Clue<R>>, columns: Vec<Clue<R>>) -> Self {
        Self::with_clues_and_palette(rows, columns, None)
    }

    pub fn with_clues_and_palette(
        rows: Vec<Clue<R>>,
        columns: Vec<Clue<R>>,
        palette: Option<Palette>,
    ) -> Self {
        let height = rows.len();
        let width = columns.len();

        let all_colors = palette
            .as_ref()
            .map_or(MONO_COLORS, Palette::full_mask);
        let cells = vec![R::Cell::unknown(all_colors); width * height];

        // identical clue lines share one cache slot
        let row_cache_slots = Self::cache_slots(&rows);
        let col_cache_slots = Self::cache_slots(&columns);

        Self {
            cells,
            clue_rows: rows.into_iter().map(ReadRc::new).collect(),
            clue_cols: columns.into_iter().map(ReadRc::new).collect(),
            palette,
            all_colors,
            row_cache_slots,
            col_cache_slots,
        }
    }

    fn cache_slots(clues: &[Clue<R>]) -> Vec<usize> {
        let unique = dedup(clues.to_vec());
        clues
            .iter()
            .map(|clue| {
                unique
                    .iter()
                    .position(|uniq| uniq == clue)
                    .expect("Every clue is present among the unique ones")
            })
            .collect()
    }

    /// Reject clues that cannot be satisfied on any coloring at all.
    pub fn validate(&self) -> Result<(), String> {
        Self::validate_side(&self.clue_rows, self.width(), self.all_colors, "row")?;
        Self::validate_side(&self.clue_cols, self.height(), self.all_colors, "column")
    }

    fn validate_side(
        clues: &[ReadRc<Clue<R>>],
        line_len: usize,
        all_colors: ColorId,
        side: &str,
    ) -> Result<(), String> {
        for (index, clue) in clues.iter().enumerate() {
            let min_len = clue.min_len();
            if min_len > line_len {
                return Err(format!(
                    "The clue of {} {} needs {} cells, only {} available",
                    side, index, min_len, line_len
                ));
            }

            for run in &clue.runs {
                if let Some(id) = run.cell().as_color_id() {
                    if !id.is_power_of_two() || id & all_colors == 0 {
                        return Err(format!(
                            "The clue of {} {} uses color {} which is not in the palette",
                            side, index, id
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    pub fn height(&self) -> usize {
        self.clue_rows.len()
    }

    pub fn width(&self) -> usize {
        self.clue_cols.len()
    }

    pub fn all_colors(&self) -> ColorId {
        self.all_colors
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn clues(&self, rows: bool) -> &[ReadRc<Clue<R>>] {
        if rows {
            &self.clue_rows
        } else {
            &self.clue_cols
        }
    }

    pub fn iter_rows(&self) -> Chunks<R::Cell> {
        self.cells.chunks(self.width())
    }

    fn get_row_slice(&self, index: usize) -> &[R::Cell] {
        let start = self.linear_index(index, 0);
        &self.cells[start..start + self.width()]
    }

    pub fn get_row(&self, index: usize) -> Vec<R::Cell> {
        self.get_row_slice(index).to_vec()
    }

    pub fn get_column(&self, index: usize) -> Vec<R::Cell> {
        self.cells
            .iter()
            .skip(index)
            .step_by(self.width())
            .cloned()
            .collect()
    }

    fn linear_index(&self, row_index: usize, column_index: usize) -> usize {
        row_index * self.width() + column_index
    }

    pub fn set_row(&mut self, index: usize, new: &[R::Cell]) {
        let row_start = self.linear_index(index, 0);
        for (linear_index, &new_cell) in (row_start..).zip(new) {
            self.cells[linear_index] = new_cell;
        }
    }

    pub fn set_column(&mut self, index: usize, new: &[R::Cell]) {
        let width = self.width();
        for (i, &new_cell) in new.iter().enumerate() {
            self.cells[i * width + index] = new_cell;
        }
    }

    pub fn cell(&self, point: &Point) -> R::Cell {
        self.cells[self.linear_index(point.y, point.x)]
    }

    /// Fix a single cell (a probe assumption or a search guess).
    pub fn set_color(&mut self, point: &Point, color: R::Cell) {
        let index = self.linear_index(point.y, point.x);
        self.cells[index] = color;
    }

    /// Remove a refuted color from a cell: the sound deduction probing makes.
    pub fn unset_color(&mut self, point: &Point, color: R::Cell) -> Result<(), Contradiction> {
        let index = self.linear_index(point.y, point.x);
        self.cells[index] = (self.cells[index] - color)?;

        Ok(())
    }

    pub fn is_solved_full(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_resolved())
    }

    pub fn is_contradictory(&self) -> bool {
        self.cells.iter().any(|cell| cell.is_empty())
    }

    pub fn row_solution_rate(&self, index: usize) -> f64 {
        let solved: f64 = self
            .get_row_slice(index)
            .iter()
            .map(|cell| cell.solution_rate(self.all_colors))
            .sum();
        solved / self.width() as f64
    }

    pub fn column_solution_rate(&self, index: usize) -> f64 {
        let column = self.cells.iter().skip(index).step_by(self.width());

        let solved: f64 = column.map(|cell| cell.solution_rate(self.all_colors)).sum();
        solved / self.height() as f64
    }

    /// Resolved share of the whole board, from 0.0 to 1.0.
    pub fn solution_rate(&self) -> f64 {
        let solved: f64 = self
            .cells
            .iter()
            .map(|cell| cell.solution_rate(self.all_colors))
            .sum();
        solved / self.cells.len() as f64
    }

    pub fn unsolved_cells(&self) -> impl Iterator<Item = Point> + '_ {
        self.iter_rows().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().filter_map(move |(x, cell)| {
                if cell.is_resolved() {
                    None
                } else {
                    Some(Point::new(x, y))
                }
            })
        })
    }

    pub fn neighbours(&self, point: &Point) -> Vec<Point> {
        let Point { x, y } = *point;
        let mut res = Vec::with_capacity(4);
        if x > 0 {
            res.push(Point::new(x - 1, y));
        }
        if x < self.width() - 1 {
            res.push(Point::new(x + 1, y));
        }
        if y > 0 {
            res.push(Point::new(x, y - 1));
        }
        if y < self.height() - 1 {
            res.push(Point::new(x, y + 1));
        }
        res
    }

    pub fn unsolved_neighbours(&self, point: &Point) -> impl Iterator<Item = Point> + '_ {
        self.neighbours(point)
            .into_iter()
            .filter(move |n| !self.cell(n).is_resolved())
    }

    pub fn row_cache_slot(&self, row_index: usize) -> usize {
        self.row_cache_slots[row_index]
    }

    pub fn column_cache_slot(&self, column_index: usize) -> usize {
        self.col_cache_slots[column_index]
    }

    pub fn make_snapshot(&self) -> Vec<R::Cell> {
        self.cells.clone()
    }

    pub fn restore(&mut self, cells: Vec<R::Cell>) {
        self.cells = cells;
    }

    pub fn snapshot_eq(&self, other: &[R::Cell]) -> bool {
        self.cells == other
    }
}

impl<R> fmt::Display for Grid<R>
where
    R: Run,
    R::Cell: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.iter_rows() {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Grid, Point};
    use crate::puzzle::mono::{MonoCell, MonoRun};
    use crate::puzzle::{Cell, Clue};

    fn u_letter() -> Grid<MonoRun> {
        // X . X
        // X . X
        // X X X
        Grid::with_clues(
            vec![
                Clue::new(vec![MonoRun(1), MonoRun(1)]),
                Clue::new(vec![MonoRun(1), MonoRun(1)]),
                Clue::new(vec![MonoRun(3)]),
            ],
            vec![
                Clue::new(vec![MonoRun(3)]),
                Clue::new(vec![MonoRun(1)]),
                Clue::new(vec![MonoRun(3)]),
            ],
        )
    }

    #[test]
    fn fresh_board_is_unknown() {
        let grid = u_letter();
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.get_row(0), vec![MonoCell::UNKNOWN; 3]);
        assert_eq!(grid.unsolved_cells().count(), 9);
        assert!(!grid.is_solved_full());
        assert!(!grid.is_contradictory());
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn overlong_clue_is_rejected() {
        let grid = Grid::<MonoRun>::with_clues(
            vec![Clue::new(vec![MonoRun(2), MonoRun(2)])],
            vec![Clue::empty(); 4],
        );
        let message = grid.validate().unwrap_err();
        assert!(message.contains("row 0"), "unexpected: {}", message);
    }

    #[test]
    fn off_palette_color_is_rejected() {
        use crate::puzzle::colored::ColoredRun;

        // no palette given, so only the space and ink codes exist
        let grid = Grid::<ColoredRun>::with_clues(
            vec![Clue::new(vec![ColoredRun::new(1, 16)])],
            vec![Clue::new(vec![ColoredRun::new(1, 16)])],
        );
        let message = grid.validate().unwrap_err();
        assert!(message.contains("not in the palette"), "unexpected: {}", message);
    }

    #[test]
    fn clones_are_independent() {
        let original = u_letter();
        let mut fork = original.clone();

        fork.set_color(&Point::new(1, 1), MonoCell::INK);

        assert_eq!(fork.cell(&Point::new(1, 1)), MonoCell::INK);
        assert_eq!(original.cell(&Point::new(1, 1)), MonoCell::UNKNOWN);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut grid = u_letter();
        let save = grid.make_snapshot();

        grid.set_color(&Point::new(0, 0), MonoCell::SPACE);
        assert!(!grid.snapshot_eq(&save));

        grid.restore(save);
        assert_eq!(grid.cell(&Point::new(0, 0)), MonoCell::UNKNOWN);
    }

    #[test]
    fn corner_neighbours() {
        let grid = u_letter();
        assert_eq!(
            grid.neighbours(&Point::new(0, 0)),
            vec![Point::new(1, 0), Point::new(0, 1)]
        );
        assert_eq!(grid.neighbours(&Point::new(1, 1)).len(), 4);
    }

    #[test]
    fn equal_clue_lines_share_cache_slots() {
        let grid = u_letter();
        assert_eq!(grid.row_cache_slot(0), grid.row_cache_slot(1));
        assert_ne!(grid.row_cache_slot(0), grid.row_cache_slot(2));
        assert_eq!(grid.column_cache_slot(0), grid.column_cache_slot(2));
    }
}
