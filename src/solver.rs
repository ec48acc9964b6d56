pub mod backtracking;
pub mod line;
pub mod probing;
pub mod propagation;

use std::mem;

use crate::grid::Grid;
use crate::puzzle::Run;
use crate::utils::rc::MutRc;
use crate::utils::time;

use self::line::{BguSolver, LineSolver};
use self::probing::FullProbe;

/// Knobs of the solving pipeline. Everything is optional; the defaults
/// look for a second solution to tell uniqueness apart.
#[derive(Debug, Clone, Copy)]
pub struct SolveOptions {
    pub max_solutions: Option<usize>,
    /// Wall-clock budget in seconds.
    pub timeout: Option<u32>,
    pub max_depth: Option<usize>,
    /// Contradiction rounds before the search starts.
    pub enable_probing: bool,
    pub probe_max_rounds: Option<usize>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_solutions: Some(2),
            timeout: None,
            max_depth: None,
            enable_probing: true,
            probe_max_rounds: None,
        }
    }
}

/// How the pipeline ended.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Verdict {
    SolvedUnique,
    SolvedMultiple,
    /// The puzzle has no solution at all.
    Contradictory,
    /// The deadline fired; the board keeps every deduction made so far.
    Timeout,
    /// A depth or solution limit cut the tree before any solution.
    Exhausted,
}

#[derive(Debug)]
pub struct SolveReport<R>
where
    R: Run,
{
    pub verdict: Verdict,
    /// Cell snapshots of every distinct solution found.
    pub solutions: Vec<Vec<R::Cell>>,
    pub colors_eliminated: u32,
    pub probe_rounds: u32,
    pub depth_reached: usize,
    pub nodes_explored: u32,
}

impl<R> SolveReport<R>
where
    R: Run,
{
    fn empty(verdict: Verdict) -> Self {
        Self {
            verdict,
            solutions: vec![],
            colors_eliminated: 0,
            probe_rounds: 0,
            depth_reached: 0,
            nodes_explored: 0,
        }
    }
}

/// Solve with the default line solver.
pub fn solve<R>(
    board: &MutRc<Grid<R>>,
    options: &SolveOptions,
) -> Result<SolveReport<R>, String>
where
    R: Run,
{
    run::<R, BguSolver<R>>(board, options)
}

/// The full pipeline: validation, propagation, probing rounds, search.
///
/// `Err` means malformed input only; an unsatisfiable puzzle comes back
/// as `Ok` with the `Contradictory` verdict.
pub fn run<R, L>(
    board: &MutRc<Grid<R>>,
    options: &SolveOptions,
) -> Result<SolveReport<R>, String>
where
    R: Run,
    L: LineSolver<Run = R>,
{
    board.read().validate()?;

    let deadline = time::deadline(options.timeout);

    warn!("Solving with simple line propagation");
    let mut propagation = propagation::Solver::<R, L>::new(MutRc::clone(board));
    propagation.set_deadline(deadline);

    if propagation.run(None).is_err() {
        return Ok(SolveReport::empty(Verdict::Contradictory));
    }

    if board.read().is_solved_full() {
        let mut report = SolveReport::empty(Verdict::SolvedUnique);
        report.solutions.push(board.read().make_snapshot());
        return Ok(report);
    }

    let mut probe_solver =
        FullProbe::<R, L>::with_options(MutRc::clone(board), deadline, options.probe_max_rounds);

    let mut root_impact = probing::Impact::<R>::new();
    if options.enable_probing {
        warn!("Probing for contradictions");
        match probe_solver.run_unsolved() {
            Ok(impact) => root_impact = impact,
            Err(_contradiction) => {
                let mut report = SolveReport::empty(Verdict::Contradictory);
                report.colors_eliminated = probe_solver.colors_eliminated;
                report.probe_rounds = probe_solver.rounds_run;
                return Ok(report);
            }
        }

        if board.read().is_solved_full() {
            let mut report = SolveReport::empty(Verdict::SolvedUnique);
            report.solutions.push(board.read().make_snapshot());
            report.colors_eliminated = probe_solver.colors_eliminated;
            report.probe_rounds = probe_solver.rounds_run;
            return Ok(report);
        }
    }

    warn!("Solving with backtracking");
    let mut search = backtracking::Solver::with_options(
        MutRc::clone(board),
        probe_solver,
        options.max_solutions,
        options.max_depth,
        deadline,
    );

    let success = search.run(root_impact).unwrap_or(false);

    let solutions = mem::replace(&mut search.solutions, vec![]);
    let verdict = match solutions.len() {
        0 => {
            if time::expired(deadline) {
                Verdict::Timeout
            } else if search.hit_depth_limit() {
                Verdict::Exhausted
            } else if success {
                // the tree was cut without reaching any conclusion
                Verdict::Exhausted
            } else {
                Verdict::Contradictory
            }
        }
        1 => Verdict::SolvedUnique,
        _many => Verdict::SolvedMultiple,
    };

    Ok(SolveReport {
        verdict,
        solutions,
        colors_eliminated: search.colors_eliminated(),
        probe_rounds: search.probe_rounds(),
        depth_reached: search.depth_reached,
        nodes_explored: search.nodes_explored,
    })
}
