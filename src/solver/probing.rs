use std::cmp::Reverse;
use std::time::Instant;

use hashbrown::hash_map::DefaultHashBuilder;
use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;

use crate::grid::{Grid, Point};
use crate::puzzle::{Cell, Contradiction, Run};
use crate::solver::line::{BguSolver, LineSolver};
use crate::solver::propagation;
use crate::utils::rc::{MutRc, ReadRef};
use crate::utils::time;

/// Probe order: the score first, then the point itself so that equal
/// scores still pop in a reproducible order.
pub type ProbePriority = (OrderedFloat<f64>, Reverse<Point>);

pub type OrderedPoints = PriorityQueue<Point, ProbePriority, DefaultHashBuilder>;

const PRIORITY_NEIGHBOUR_OF_REFINED: f64 = 10.0;
const PRIORITY_NEIGHBOUR_OF_CONTRADICTION: f64 = 20.0;

/// Bias towards cells with fewer colors left over every other signal.
const PRIORITY_PER_ELIMINATED_COLOR: f64 = 4.0;

fn priority(value: f64, point: Point) -> ProbePriority {
    (OrderedFloat(value), Reverse(point))
}

/// What a successful (non-contradicting) probe would deduce; the search
/// ranks its branching directions by these.
#[derive(Debug)]
pub struct ProbeImpact<C> {
    pub point: Point,
    pub color: C,
    pub cells_refined: usize,
    pub priority: f64,
}

pub type Impact<R> = Vec<ProbeImpact<<R as Run>::Cell>>;

/// Contradiction rounds: try every color of every unresolved cell on a
/// snapshot; colors whose propagation collapses are eliminated for real.
/// Rounds repeat while at least one color got eliminated.
#[allow(missing_debug_implementations)]
pub struct FullProbe<R, L = BguSolver<R>>
where
    R: Run,
    L: LineSolver<Run = R>,
{
    board: MutRc<Grid<R>>,
    propagation: propagation::Solver<R, L>,
    deadline: Option<Instant>,
    max_rounds: Option<usize>,
    pub rounds_run: u32,
    pub colors_eliminated: u32,
}

impl<R, L> FullProbe<R, L>
where
    R: Run,
    L: LineSolver<Run = R>,
{
    pub fn with_board(board: MutRc<Grid<R>>) -> Self {
        Self::with_options(board, None, None)
    }

    pub fn with_options(
        board: MutRc<Grid<R>>,
        deadline: Option<Instant>,
        max_rounds: Option<usize>,
    ) -> Self {
        let mut propagation = propagation::Solver::with_cache(MutRc::clone(&board));
        propagation.set_deadline(deadline);

        Self {
            board,
            propagation,
            deadline,
            max_rounds,
            rounds_run: 0,
            colors_eliminated: 0,
        }
    }

    fn board(&self) -> ReadRef<Grid<R>> {
        self.board.read()
    }

    fn is_solved(&self) -> bool {
        self.board().is_solved_full()
    }

    /// Queue every unresolved cell; almost-resolved cells go first,
    /// then cells next to resolved neighbours and almost-done lines.
    pub fn unsolved_cells(&self) -> OrderedPoints {
        let board = self.board();
        let all_colors = f64::from(board.all_colors().count_ones());

        let mut queue = OrderedPoints::with_default_hasher();
        queue.extend(board.unsolved_cells().map(|point| {
            let colors_left = board.cell(&point).variants().len() as f64;
            let solved_neighbours =
                (board.neighbours(&point).len() - board.unsolved_neighbours(&point).count()) as f64;
            let row_rate = board.row_solution_rate(point.y());
            let column_rate = board.column_solution_rate(point.x());

            let score = (all_colors - colors_left) * PRIORITY_PER_ELIMINATED_COLOR
                + solved_neighbours
                + row_rate
                + column_rate;
            (point, priority(score, point))
        }));

        queue
    }

    /// Commit deductions around `point` and return follow-up probes.
    pub fn propagate_point(
        &mut self,
        point: &Point,
    ) -> Result<Vec<(Point, ProbePriority)>, Contradiction> {
        let refined = self.propagation.run(Some(*point))?;
        let board = self.board();

        let follow_up = refined
            .iter()
            .flat_map(|refined_point| {
                board.unsolved_neighbours(refined_point).map(|neighbour| {
                    (
                        neighbour,
                        priority(PRIORITY_NEIGHBOUR_OF_REFINED, neighbour),
                    )
                })
            })
            .chain(board.unsolved_neighbours(point).map(|neighbour| {
                (
                    neighbour,
                    priority(PRIORITY_NEIGHBOUR_OF_CONTRADICTION, neighbour),
                )
            }))
            .collect();

        Ok(follow_up)
    }

    pub fn run_unsolved(&mut self) -> Result<Impact<R>, Contradiction> {
        self.run(None)
    }

    /// Run probing rounds until a round eliminates nothing (or the board
    /// solves, or a limit fires). `seed` primes the first round with the
    /// queue the search prepared; later rounds re-collect every
    /// unresolved cell.
    pub fn run(&mut self, seed: Option<OrderedPoints>) -> Result<Impact<R>, Contradiction> {
        let mut probes = match seed {
            Some(seed) => seed,
            None => self.unsolved_cells(),
        };

        loop {
            let mut impact = Impact::<R>::new();

            if self.is_solved() || self.rounds_exhausted() || time::expired(self.deadline) {
                return Ok(impact);
            }

            let mut eliminated = 0_u32;

            while let Some((point, (score, _order))) = probes.pop() {
                if time::expired(self.deadline) {
                    break;
                }
                if self.board().cell(&point).is_resolved() {
                    continue;
                }

                debug!("Trying probe {:?} with score {}", point, score.0);
                let (bad_colors, refinements) = self.probe(point);

                if bad_colors.is_empty() {
                    impact.extend(refinements.into_iter().map(|(color, cells_refined)| {
                        ProbeImpact {
                            point,
                            color,
                            cells_refined,
                            priority: score.0,
                        }
                    }));
                    continue;
                }

                for color in bad_colors {
                    info!("Probe {:?}: color {:?} is impossible", point, color);
                    eliminated += 1;
                    self.board.write().unset_color(&point, color)?;
                }

                let follow_up = self.propagate_point(&point)?;
                probes.extend(follow_up);
            }

            self.rounds_run += 1;
            self.colors_eliminated += eliminated;

            if eliminated == 0 {
                if self.colors_eliminated > 0 {
                    warn!(
                        "Probing done: {} rounds, {} colors eliminated",
                        self.rounds_run, self.colors_eliminated
                    );
                }
                return Ok(impact);
            }

            probes = self.unsolved_cells();
        }
    }

    fn rounds_exhausted(&self) -> bool {
        self.max_rounds
            .map_or(false, |max| self.rounds_run >= max as u32)
    }

    /// Try every color of the cell on a snapshot. Returns the refuted
    /// colors and, for the viable ones, how many cells the trial refined.
    fn probe(&mut self, point: Point) -> (Vec<R::Cell>, Vec<(R::Cell, usize)>) {
        let variants = self.board().cell(&point).variants();

        let mut bad_colors = vec![];
        let mut refinements = vec![];

        for assumption in variants {
            let save = self.board().make_snapshot();
            self.board.write().set_color(&point, assumption);

            let trial = self.propagation.run(Some(point));
            self.board.write().restore(save);

            match trial {
                Ok(refined) => refinements.push((assumption, refined.len())),
                Err(Contradiction) => bad_colors.push(assumption),
            }
        }

        (bad_colors, refinements)
    }
}
