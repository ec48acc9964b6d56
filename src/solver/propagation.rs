use std::time::Instant;

use hashbrown::HashSet;
use log::Level;
use lru::LruCache;

use crate::grid::{Grid, Point};
use crate::puzzle::{Contradiction, Run};
use crate::solver::line::{BguSolver, LineSolver};
use crate::utils::rc::{MutRc, ReadRc};
use crate::utils::time;

/// A line still to be solved: `(is_column, index)`.
type Job = (bool, usize);

trait JobQueue {
    fn push(&mut self, job: Job);
    fn pop(&mut self) -> Option<Job>;
}

/// Queue for re-solving the two lines crossing at a single refined cell.
struct PointQueue {
    jobs: Vec<Job>,
}

impl PointQueue {
    fn with_point(point: Point) -> Self {
        Self {
            jobs: vec![(true, point.x()), (false, point.y())],
        }
    }
}

impl JobQueue for PointQueue {
    fn push(&mut self, job: Job) {
        self.jobs.push(job)
    }

    fn pop(&mut self) -> Option<Job> {
        let top = self.jobs.pop()?;
        // drop stale occurrences of the same line
        self.jobs.retain(|&job| job != top);
        Some(top)
    }
}

/// Queue seeding every line of the board; a visited set suppresses
/// repeats until a line really gets dirty again.
struct FullQueue {
    jobs: Vec<Job>,
    visited: HashSet<Job>,
}

impl FullQueue {
    fn with_all_lines(height: usize, width: usize) -> Self {
        // columns below rows, larger indexes below smaller:
        // row 0 pops first, then the other rows, then the columns
        let jobs = (0..width)
            .rev()
            .map(|x| (true, x))
            .chain((0..height).rev().map(|y| (false, y)))
            .collect();

        Self {
            jobs,
            visited: HashSet::new(),
        }
    }
}

impl JobQueue for FullQueue {
    fn push(&mut self, job: Job) {
        let _ = self.visited.remove(&job);
        self.jobs.push(job)
    }

    fn pop(&mut self) -> Option<Job> {
        let top = loop {
            let candidate = self.jobs.pop()?;
            if !self.visited.contains(&candidate) {
                break candidate;
            }
        };
        let _ = self.visited.insert(top);
        Some(top)
    }
}

type CacheKey<C> = (usize, ReadRc<Vec<C>>);
type CacheValue<C> = Result<ReadRc<Vec<C>>, Contradiction>;
type LineCache<C> = LruCache<CacheKey<C>, CacheValue<C>>;

const CACHE_LINES_PER_ROW: usize = 2_000;

/// The fixed-point engine: re-solves dirty lines until nothing changes.
#[allow(missing_debug_implementations)]
pub struct Solver<R, L = BguSolver<R>>
where
    R: Run,
    L: LineSolver<Run = R>,
{
    board: MutRc<Grid<R>>,
    line_solver: L,
    cache_rows: Option<LineCache<R::Cell>>,
    cache_cols: Option<LineCache<R::Cell>>,
    deadline: Option<Instant>,
}

impl<R, L> Solver<R, L>
where
    R: Run,
    L: LineSolver<Run = R>,
{
    pub fn new(board: MutRc<Grid<R>>) -> Self {
        Self {
            board,
            line_solver: L::default(),
            cache_rows: None,
            cache_cols: None,
            deadline: None,
        }
    }

    /// Probing and search re-solve the same lines over and over;
    /// they want the results cached.
    pub fn with_cache(board: MutRc<Grid<R>>) -> Self {
        let (height, width) = {
            let board = board.read();
            (board.height(), board.width())
        };

        let mut solver = Self::new(board);
        solver.cache_rows = Some(LruCache::new(CACHE_LINES_PER_ROW * height));
        solver.cache_cols = Some(LruCache::new(CACHE_LINES_PER_ROW * width));
        solver
    }

    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }

    /// Solve lines to the fixed point. `point` narrows the initial work
    /// set to the two lines crossing there; `None` seeds every line.
    ///
    /// Returns the refined cells. An expired deadline stops the loop
    /// early, which only means fewer deductions, never wrong ones.
    pub fn run(&mut self, point: Option<Point>) -> Result<Vec<Point>, Contradiction> {
        if let Some(point) = point {
            self.run_jobs(PointQueue::with_point(point))
        } else {
            let queue = {
                let board = self.board.read();
                FullQueue::with_all_lines(board.height(), board.width())
            };
            self.run_jobs(queue)
        }
    }

    fn run_jobs<Q>(&mut self, mut queue: Q) -> Result<Vec<Point>, Contradiction>
    where
        Q: JobQueue,
    {
        let mut lines_solved = 0_u32;
        let mut refined_cells = vec![];

        while let Some((is_column, index)) = queue.pop() {
            if time::expired(self.deadline) {
                info!("Propagation interrupted by the deadline");
                break;
            }

            if log_enabled!(Level::Debug) {
                let side = if is_column { "column" } else { "row" };
                debug!("Solving {} {}", side, index);
            }

            let refined_indexes = self.update_line(index, is_column)?;

            refined_cells.extend(refined_indexes.iter().map(|&other| {
                if is_column {
                    Point::new(index, other)
                } else {
                    Point::new(other, index)
                }
            }));

            // smaller perpendicular indexes pop first
            for &other in refined_indexes.iter().rev() {
                queue.push((!is_column, other));
            }

            lines_solved += 1;
        }

        info!("Lines solved: {}", lines_solved);
        Ok(refined_cells)
    }

    /// Solve a single line and write refinements back to the board.
    /// Returns the positions within the line that changed.
    fn update_line(&mut self, index: usize, is_column: bool) -> Result<Vec<usize>, Contradiction> {
        let (cache_key, line) = {
            let board = self.board.read();
            let line = ReadRc::new(if is_column {
                board.get_column(index)
            } else {
                board.get_row(index)
            });

            let slot = if is_column {
                board.column_cache_slot(index)
            } else {
                board.row_cache_slot(index)
            };

            ((slot, ReadRc::clone(&line)), line)
        };

        let cached = self.cache(is_column).and_then(|cache| cache.get(&cache_key).cloned());

        let solution = match cached {
            Some(solution) => solution,
            None => {
                let clue = {
                    let board = self.board.read();
                    ReadRc::clone(&board.clues(!is_column)[index])
                };

                let value = self
                    .line_solver
                    .solve(&clue, &line)
                    .map(ReadRc::new);

                if let Some(cache) = self.cache(is_column) {
                    let _ = cache.put(cache_key, value.clone());
                }
                value
            }
        }?;

        Ok(self.write_refinements(index, is_column, &line, &solution))
    }

    fn cache(&mut self, is_column: bool) -> Option<&mut LineCache<R::Cell>> {
        if is_column {
            self.cache_cols.as_mut()
        } else {
            self.cache_rows.as_mut()
        }
    }

    fn write_refinements(
        &mut self,
        index: usize,
        is_column: bool,
        old: &[R::Cell],
        new: &[R::Cell],
    ) -> Vec<usize> {
        if old == new {
            return vec![];
        }

        {
            let mut board = self.board.write();
            if is_column {
                board.set_column(index, new);
            } else {
                board.set_row(index, new);
            }
        }

        old.iter()
            .zip(new)
            .enumerate()
            .filter_map(|(i, (pre, post))| if pre == post { None } else { Some(i) })
            .collect()
    }
}
