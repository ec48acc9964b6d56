use crate::puzzle::{Cell, Clue, Contradiction, Run};

/// A complete single-line solver: the result admits a color at a position
/// iff some completion of the whole line takes that color there.
pub trait LineSolver: Default {
    type Run: Run;

    fn solve(
        &mut self,
        clue: &Clue<Self::Run>,
        line: &[<Self::Run as Run>::Cell],
    ) -> Result<Vec<<Self::Run as Run>::Cell>, Contradiction>;
}

/// One-shot convenience around a throwaway solver.
pub fn solve_line<L>(
    clue: &Clue<L::Run>,
    line: &[<L::Run as Run>::Cell],
) -> Result<Vec<<L::Run as Run>::Cell>, Contradiction>
where
    L: LineSolver,
{
    L::default().solve(clue, line)
}

/// The dynamic-programming line solver (the BGU scheme).
///
/// A forward pass fills the reachability table
/// `fits[pos][j]` = "the first `j` runs can be laid out inside the first
/// `pos` cells", a backward pass walks only the states on satisfying
/// paths and unions every color a cell takes across them.
///
/// `O(len * runs * max_run_len)` time, `O(len * runs)` memory. The value
/// keeps its tables between calls, so a propagator solving thousands of
/// lines reuses one allocation.
#[derive(Debug)]
pub struct BguSolver<R>
where
    R: Run,
{
    fits: Vec<bool>,
    live: Vec<bool>,
    envelope: Vec<R::Cell>,
    min_span: Vec<usize>,
}

impl<R> Default for BguSolver<R>
where
    R: Run,
{
    fn default() -> Self {
        Self {
            fits: vec![],
            live: vec![],
            envelope: vec![],
            min_span: vec![],
        }
    }
}

impl<R> LineSolver for BguSolver<R>
where
    R: Run,
{
    type Run = R;

    fn solve(&mut self, clue: &Clue<R>, line: &[R::Cell]) -> Result<Vec<R::Cell>, Contradiction> {
        let len = line.len();
        let runs = &clue.runs;

        self.min_span.clear();
        self.min_span.push(0);
        self.min_span.extend(R::min_span(runs));

        if self.min_span[runs.len()] > len {
            return Err(Contradiction);
        }

        self.prepare(len, runs.len());
        self.fill_fits(runs, line);

        if !self.fits[self.state(len, runs.len())] {
            return Err(Contradiction);
        }

        self.collect_envelope(runs, line);
        Ok(self.envelope.clone())
    }
}

impl<R> BguSolver<R>
where
    R: Run,
{
    fn stride(&self) -> usize {
        self.min_span.len()
    }

    fn state(&self, pos: usize, run: usize) -> usize {
        pos * self.stride() + run
    }

    fn prepare(&mut self, len: usize, runs: usize) {
        let states = (len + 1) * (runs + 1);

        self.fits.clear();
        self.fits.resize(states, false);
        self.live.clear();
        self.live.resize(states, false);
        self.envelope.clear();
        self.envelope.resize(len, R::Cell::from_color_ids(&[]));
    }

    /// The separator length in front of the `j`-th run (1-based).
    fn gap_before(runs: &[R], j: usize) -> usize {
        if j >= 2 && runs[j - 2].cell() == runs[j - 1].cell() {
            1
        } else {
            0
        }
    }

    fn run_placeable(runs: &[R], line: &[R::Cell], pos: usize, j: usize) -> Option<usize> {
        let run = runs[j - 1];
        let gap = Self::gap_before(runs, j);
        let need = run.len() + gap;
        if pos < need {
            return None;
        }

        let start = pos - need;
        if gap > 0 && !line[start].admits_space() {
            return None;
        }

        let color = run.cell();
        if line[pos - run.len()..pos].iter().all(|cell| cell.admits(color)) {
            Some(start)
        } else {
            None
        }
    }

    fn fill_fits(&mut self, runs: &[R], line: &[R::Cell]) {
        let zero = self.state(0, 0);
        self.fits[zero] = true;

        for pos in 1..=line.len() {
            for j in 0..=runs.len() {
                if pos < self.min_span[j] {
                    continue;
                }

                let mut reachable =
                    line[pos - 1].admits_space() && self.fits[self.state(pos - 1, j)];

                if !reachable && j > 0 {
                    if let Some(start) = Self::run_placeable(runs, line, pos, j) {
                        reachable = self.fits[self.state(start, j - 1)];
                    }
                }

                let state = self.state(pos, j);
                self.fits[state] = reachable;
            }
        }
    }

    /// Walk backwards from the goal state through satisfying paths only,
    /// accumulating the union of cell colors over every placement.
    fn collect_envelope(&mut self, runs: &[R], line: &[R::Cell]) {
        let goal = self.state(line.len(), runs.len());
        self.live[goal] = true;

        for pos in (1..=line.len()).rev() {
            for j in (0..=runs.len()).rev() {
                let state = self.state(pos, j);
                if !self.live[state] || !self.fits[state] {
                    continue;
                }

                if line[pos - 1].admits_space() && self.fits[self.state(pos - 1, j)] {
                    self.envelope[pos - 1] = self.envelope[pos - 1] | R::Cell::space();
                    let prev = self.state(pos - 1, j);
                    self.live[prev] = true;
                }

                if j > 0 {
                    if let Some(start) = Self::run_placeable(runs, line, pos, j) {
                        let prev = self.state(start, j - 1);
                        if self.fits[prev] {
                            let color = runs[j - 1].cell();
                            for i in pos - runs[j - 1].len()..pos {
                                self.envelope[i] = self.envelope[i] | color;
                            }
                            if start < pos - runs[j - 1].len() {
                                self.envelope[start] = self.envelope[start] | R::Cell::space();
                            }
                            self.live[prev] = true;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{solve_line, BguSolver, LineSolver};
    use crate::puzzle::mono::{MonoCell, MonoRun};
    use crate::puzzle::{Cell, Clue, Contradiction};

    fn clue(runs: &[usize]) -> Clue<MonoRun> {
        Clue::new(runs.iter().map(|&len| MonoRun(len)).collect())
    }

    fn cases() -> Vec<(Vec<usize>, Vec<MonoCell>, Vec<MonoCell>)> {
        let b = MonoCell::INK;
        let w = MonoCell::SPACE;
        let u = MonoCell::UNKNOWN;

        vec![
            (vec![], vec![u; 3], vec![w; 3]),
            (vec![1], vec![u], vec![b]),
            (vec![1], vec![u, u], vec![u, u]),
            (vec![5], vec![u; 5], vec![b; 5]),
            (vec![2, 2], vec![u; 5], vec![b, b, w, b, b]),
            (vec![3], vec![u; 5], vec![u, u, b, u, u]),
            (vec![2], vec![u, u, u], vec![u, b, u]),
            (vec![2], vec![w, u, u], vec![w, b, b]),
            (
                vec![4, 2],
                vec![u, b, u, u, u, w, u, u],
                vec![u, b, b, b, u, w, b, b],
            ),
            (
                vec![4, 2],
                vec![u, b, u, u, w, u, u, u],
                vec![b, b, b, b, w, u, b, u],
            ),
            // hard cases
            (
                vec![1, 1, 5],
                vec![
                    w, w, w, b, w, w, u, u, u, u, u, u, u, u, u, w, u, u, u, u, u, u, b, u,
                ],
                vec![
                    w, w, w, b, w, w, u, u, u, u, u, u, u, u, u, w, u, u, u, b, b, b, b, u,
                ],
            ),
            (
                vec![9, 1, 1, 1],
                vec![
                    u, u, u, w, w, b, b, b, b, b, b, b, b, b, w, w, w, w, w, w, w, u, u, u, b, w,
                    u, w, u,
                ],
                vec![
                    w, w, w, w, w, b, b, b, b, b, b, b, b, b, w, w, w, w, w, w, w, u, u, w, b, w,
                    u, w, u,
                ],
            ),
            (
                vec![5, 6, 3, 1, 1],
                vec![
                    u, u, u, u, u, u, u, u, u, u, u, u, u, u, u, b, w, u, w, w, w, w, w, u, u, u,
                    u, u, u, b, b, w, u, u, u, u, u, u, w, w, w, u, u, u, b, w,
                ],
                vec![
                    u, u, u, u, u, u, u, u, u, w, u, b, b, b, b, b, w, w, w, w, w, w, w, w, w, u,
                    u, u, b, b, b, w, u, u, u, u, u, u, w, w, w, u, u, w, b, w,
                ],
            ),
            (
                vec![1, 1, 2, 1, 1, 3, 1],
                vec![
                    b, w, w, u, u, w, u, b, u, w, w, b, u, u, u, u, u, b, u, u, u, u,
                ],
                vec![
                    b, w, w, u, u, w, u, b, u, w, w, b, w, u, u, u, u, b, u, u, u, u,
                ],
            ),
        ]
    }

    #[test]
    fn solve_cases() {
        let mut solver = BguSolver::<MonoRun>::default();

        for (runs, line, expected) in cases() {
            let solved = solver.solve(&clue(&runs), &line).unwrap();
            assert_eq!(solved, expected, "runs {:?} on {:?}", runs, line);

            // every output mask refines the input mask
            for (&input, &output) in line.iter().zip(&solved) {
                assert_eq!(output & input, output);
            }
        }
    }

    #[test]
    fn empty_line_with_empty_clue() {
        let solved = solve_line::<BguSolver<MonoRun>>(&clue(&[]), &[]).unwrap();
        assert!(solved.is_empty());
    }

    #[test]
    fn empty_line_with_runs() {
        assert_eq!(
            solve_line::<BguSolver<MonoRun>>(&clue(&[1]), &[]),
            Err(Contradiction)
        );
    }

    #[test]
    fn too_long_clue() {
        let line = vec![MonoCell::UNKNOWN; 5];
        assert_eq!(
            solve_line::<BguSolver<MonoRun>>(&clue(&[3, 3]), &line),
            Err(Contradiction)
        );
    }

    #[test]
    fn resolved_line_must_match_clue() {
        let (b, w) = (MonoCell::INK, MonoCell::SPACE);

        let good = [b, b, w, b];
        assert_eq!(
            solve_line::<BguSolver<MonoRun>>(&clue(&[2, 1]), &good).unwrap(),
            good.to_vec()
        );

        let bad = [b, w, b, b];
        assert_eq!(
            solve_line::<BguSolver<MonoRun>>(&clue(&[2, 1]), &bad),
            Err(Contradiction)
        );
    }

    #[test]
    fn space_required_where_no_run_reaches() {
        let u = MonoCell::UNKNOWN;
        // the run fits only into the first three cells
        let line = [u, u, u, MonoCell::SPACE, MonoCell::SPACE];
        assert_eq!(
            solve_line::<BguSolver<MonoRun>>(&clue(&[3]), &line).unwrap(),
            vec![
                MonoCell::INK,
                MonoCell::INK,
                MonoCell::INK,
                MonoCell::SPACE,
                MonoCell::SPACE
            ]
        );
    }
}
