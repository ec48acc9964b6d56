use std::cmp::Reverse;
use std::time::Instant;

use hashbrown::HashMap;
use ordered_float::OrderedFloat;

use crate::grid::{Grid, Point};
use crate::puzzle::{Cell, Contradiction, Run};
use crate::solver::line::{BguSolver, LineSolver};
use crate::solver::probing::{FullProbe, Impact};
use crate::utils::rc::{MutRc, ReadRef};
use crate::utils::time;

type Direction<C> = (Point, C);
type Solution<C> = Vec<C>;

/// How a branching point is scored from the impacts of its colors.
/// `Sqrt` balances the most and the least promising color; see
/// <https://ieeexplore.ieee.org/document/6476646> for a comparison.
#[derive(Debug, Clone, Copy)]
enum RankStrategy {
    Min,
    Max,
    Sqrt,
}

const RANK_STRATEGY: RankStrategy = RankStrategy::Sqrt;

/// Depth-first search with probing look-ahead at every node.
#[allow(missing_debug_implementations)]
pub struct Solver<R, L = BguSolver<R>>
where
    R: Run,
    L: LineSolver<Run = R>,
{
    board: MutRc<Grid<R>>,
    probe_solver: FullProbe<R, L>,

    max_solutions: Option<usize>,
    max_depth: Option<usize>,
    deadline: Option<Instant>,

    pub solutions: Vec<Solution<R::Cell>>,
    pub depth_reached: usize,
    pub nodes_explored: u32,
    depth_limited: bool,
}

impl<R, L> Solver<R, L>
where
    R: Run,
    L: LineSolver<Run = R>,
{
    pub fn with_options(
        board: MutRc<Grid<R>>,
        probe_solver: FullProbe<R, L>,
        max_solutions: Option<usize>,
        max_depth: Option<usize>,
        deadline: Option<Instant>,
    ) -> Self {
        Self {
            board,
            probe_solver,
            max_solutions,
            max_depth,
            deadline,
            solutions: vec![],
            depth_reached: 0,
            nodes_explored: 0,
            depth_limited: false,
        }
    }

    /// Whether some branch was cut off by the depth limit (so an empty
    /// solution list does not prove unsatisfiability).
    pub fn hit_depth_limit(&self) -> bool {
        self.depth_limited
    }

    pub fn probe_rounds(&self) -> u32 {
        self.probe_solver.rounds_run
    }

    pub fn colors_eliminated(&self) -> u32 {
        self.probe_solver.colors_eliminated
    }

    fn board(&self) -> ReadRef<Grid<R>> {
        self.board.read()
    }

    fn is_solved(&self) -> bool {
        self.board().is_solved_full()
    }

    /// Search the whole tree under the current board.
    /// `Ok(false)` means every direction under the root is a dead end.
    pub fn run(&mut self, root_impact: Impact<R>) -> Result<bool, Contradiction> {
        if self.is_solved() {
            self.add_solution();
            return Ok(true);
        }

        let mut directions = self.choose_directions(root_impact);
        if directions.is_empty() {
            directions = self.fallback_directions();
        }

        warn!(
            "Starting depth-first search (initial rate {:.4})",
            self.board().solution_rate()
        );
        let success = self.search(&directions, &[])?;

        warn!(
            "Search done: depth reached {}, nodes explored {}, solutions {}",
            self.depth_reached,
            self.nodes_explored,
            self.solutions.len()
        );
        Ok(success)
    }

    fn already_found(&self) -> bool {
        self.solutions
            .iter()
            .any(|solution| self.board().snapshot_eq(solution))
    }

    fn add_solution(&mut self) {
        if self.already_found() {
            info!("The solution was found before");
        } else {
            info!("Found a solution");
            let cells = self.board().make_snapshot();
            self.solutions.push(cells);
        }
    }

    /// The most promising (point, color) pairs go first.
    fn choose_directions(&self, impact: Impact<R>) -> Vec<Direction<R::Cell>> {
        let mut point_wise: HashMap<Point, Vec<(R::Cell, usize)>> = HashMap::new();

        for probe in impact {
            if self.board().cell(&probe.point).is_resolved() {
                continue;
            }
            point_wise
                .entry(probe.point)
                .or_insert_with(Vec::new)
                .push((probe.color, probe.cells_refined));
        }

        let mut ranked_points: Vec<_> = point_wise
            .iter()
            .map(|(&point, color_impacts)| {
                let refined: Vec<_> = color_impacts.iter().map(|&(_color, size)| size).collect();
                (point, OrderedFloat(Self::rate_by_impact(&refined)))
            })
            .collect();
        ranked_points.sort_by_key(|&(point, rate)| (Reverse(rate), point));

        ranked_points
            .into_iter()
            .flat_map(|(point, _rate)| {
                let mut colors = point_wise[&point].clone();
                // the most impacting color goes first
                colors.sort_by_key(|&(color, refined)| (Reverse(refined), color));
                colors
                    .into_iter()
                    .map(move |(color, _refined)| (point, color))
            })
            .collect()
    }

    /// No impact information (probing disabled or interrupted):
    /// fall back to the plain probe ordering of the unresolved cells.
    fn fallback_directions(&mut self) -> Vec<Direction<R::Cell>> {
        let mut queue = self.probe_solver.unsolved_cells();
        let mut directions = vec![];

        while let Some((point, _priority)) = queue.pop() {
            for color in self.board().cell(&point).variants() {
                directions.push((point, color));
            }
        }

        directions
    }

    fn rate_by_impact(refined: &[usize]) -> f64 {
        let min = refined.iter().min().copied().unwrap_or(0);
        let max = refined.iter().max().copied().unwrap_or(0);

        match RANK_STRATEGY {
            RankStrategy::Min => min as f64,
            RankStrategy::Max => max as f64,
            RankStrategy::Sqrt => (max as f64 / (min + 1) as f64).sqrt() + min as f64,
        }
    }

    /// One search node: try the directions on a snapshot and restore it
    /// afterwards (deductions at the root are sound and stay).
    fn search(
        &mut self,
        directions: &[Direction<R::Cell>],
        path: &[Direction<R::Cell>],
    ) -> Result<bool, Contradiction> {
        if self.limits_reached(path.len()) {
            return Ok(true);
        }

        self.nodes_explored += 1;

        let save = self.board().make_snapshot();
        let result = self.search_mutable(directions, path);

        if !path.is_empty() {
            self.board.write().restore(save);
        }

        result
    }

    fn search_mutable(
        &mut self,
        directions: &[Direction<R::Cell>],
        path: &[Direction<R::Cell>],
    ) -> Result<bool, Contradiction> {
        let depth = path.len();
        self.depth_reached = self.depth_reached.max(depth + 1);

        // suppresses re-probing an unchanged board
        let mut board_changed = true;

        let mut directions = directions.to_vec();
        // pop from the end: the best direction sits on top
        directions.reverse();

        while let Some(direction) = directions.pop() {
            if self.limits_reached(depth) {
                return Ok(true);
            }

            if path.contains(&direction) {
                continue;
            }

            let (point, color) = direction;
            let colors_left = self.board().cell(&point).variants();

            if !colors_left.contains(&color) {
                // refuted while trying a sibling direction
                continue;
            }

            if colors_left.len() == 1 {
                // not a guess anymore; commit it and deduce
                if !board_changed {
                    continue;
                }

                let impact = self.probe_solver.run_unsolved();
                board_changed = false;

                if impact.is_err() {
                    info!(
                        "The last color {:?} of {:?} contradicts: the whole branch is dead",
                        color, point
                    );
                    return Ok(false);
                }

                if self.is_solved() {
                    self.add_solution();
                    return Ok(true);
                }
                continue;
            }

            let mut full_path = path.to_vec();
            full_path.push(direction);

            debug!(
                "Trying direction {:?} at depth {} (rate {:.4})",
                direction,
                depth,
                self.board().solution_rate()
            );

            let guess_save = self.board().make_snapshot();
            let state_result = self.try_direction(&full_path);
            self.board.write().restore(guess_save);

            let success = state_result?;

            if !success {
                // the guess is refuted for good: a sound deduction
                if self.board.write().unset_color(&point, color).is_err() {
                    return Ok(false);
                }

                let impact = self.probe_solver.run_unsolved();
                board_changed = false;
                if impact.is_err() {
                    return Ok(false);
                }

                if self.is_solved() {
                    self.add_solution();
                    return Ok(true);
                }
            }

            if !success || self.is_solved() {
                // exhaust the siblings of the refuted (or winning) color
                for other_color in self.board().cell(&point).variants() {
                    if other_color == color {
                        continue;
                    }
                    let sibling = (point, other_color);
                    if !directions.contains(&sibling) {
                        directions.push(sibling);
                    }
                }
            }
        }

        Ok(true)
    }

    /// Commit the guess, look ahead by probing, recurse on the result.
    fn try_direction(&mut self, path: &[Direction<R::Cell>]) -> Result<bool, Contradiction> {
        let depth = path.len();
        let direction = *path.last().expect("The path of a guess is never empty");

        let mut probe_jobs = self.probe_solver.unsolved_cells();
        match self.set_guess(direction) {
            Ok(new_jobs) => {
                probe_jobs.extend(new_jobs);
            }
            Err(Contradiction) => {
                debug!("Guess {:?} contradicts immediately", direction);
                return Ok(false);
            }
        }

        if self.limits_reached(depth) {
            return Ok(true);
        }

        match self.probe_solver.run(Some(probe_jobs)) {
            Ok(impact) => {
                if self.limits_reached(depth) || self.is_solved() {
                    if self.is_solved() {
                        self.add_solution();
                    }
                    return Ok(true);
                }

                let directions = self.choose_directions(impact);
                if directions.is_empty() {
                    Ok(true)
                } else {
                    self.search(&directions, path)
                }
            }
            Err(Contradiction) => {
                debug!("Guess {:?} contradicts while probing", direction);
                Ok(false)
            }
        }
    }

    fn set_guess(
        &mut self,
        guess: Direction<R::Cell>,
    ) -> Result<Vec<(Point, crate::solver::probing::ProbePriority)>, Contradiction> {
        let (point, color) = guess;

        if !self.board().cell(&point).variants().contains(&color) {
            return Ok(vec![]);
        }

        self.board.write().set_color(&point, color);
        let new_probes = self.probe_solver.propagate_point(&point)?;

        if self.is_solved() {
            self.add_solution();
            return Ok(vec![]);
        }

        Ok(new_probes)
    }

    /// Solutions found, the deadline and the depth cap all stop descent.
    fn limits_reached(&mut self, depth: usize) -> bool {
        if let Some(max_solutions) = self.max_solutions {
            if self.solutions.len() >= max_solutions {
                return true;
            }
        }

        if time::expired(self.deadline) {
            return true;
        }

        if let Some(max_depth) = self.max_depth {
            if depth > max_depth {
                self.depth_limited = true;
                return true;
            }
        }

        false
    }
}
