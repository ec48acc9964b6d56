use crosshatch::grid::Grid;
use crosshatch::puzzle::base::palette::{ColorId, Palette};
use crosshatch::puzzle::mono::{MonoCell, MonoRun};
use crosshatch::puzzle::{clues_from_grid, Clue};
use crosshatch::solver::{self, SolveOptions, Verdict};
use crosshatch::utils::rc::MutRc;

fn clue(runs: &[usize]) -> Clue<MonoRun> {
    Clue::new(runs.iter().map(|&len| MonoRun(len)).collect())
}

fn mono_board(rows: &[&[usize]], columns: &[&[usize]]) -> MutRc<Grid<MonoRun>> {
    MutRc::new(Grid::with_clues(
        rows.iter().map(|runs| clue(runs)).collect(),
        columns.iter().map(|runs| clue(runs)).collect(),
    ))
}

fn to_ids(snapshot: &[MonoCell], width: usize) -> Vec<Vec<ColorId>> {
    snapshot
        .chunks(width)
        .map(|row| {
            row.iter()
                .map(|&cell| {
                    if cell == MonoCell::INK {
                        2
                    } else {
                        assert_eq!(cell, MonoCell::SPACE);
                        Palette::SPACE_ID
                    }
                })
                .collect()
        })
        .collect()
}

/// Every solution must reproduce the board's clues when read back.
fn assert_satisfies_clues(board: &MutRc<Grid<MonoRun>>, snapshot: &[MonoCell]) {
    let board = board.read();
    let ids = to_ids(snapshot, board.width());
    let (rows, columns) = clues_from_grid::<MonoRun>(&ids, Palette::SPACE_ID);

    for (index, derived) in rows.iter().enumerate() {
        assert_eq!(derived, &*board.clues(true)[index], "row {}", index);
    }
    for (index, derived) in columns.iter().enumerate() {
        assert_eq!(derived, &*board.clues(false)[index], "column {}", index);
    }
}

#[test]
fn ambiguous_two_by_two_has_both_solutions() {
    let board = mono_board(&[&[1], &[1]], &[&[1], &[1]]);

    let report = solver::solve(&board, &SolveOptions::default()).unwrap();

    assert_eq!(report.verdict, Verdict::SolvedMultiple);
    assert_eq!(report.solutions.len(), 2);

    let (b, w) = (MonoCell::INK, MonoCell::SPACE);
    let diagonal = vec![b, w, w, b];
    let anti_diagonal = vec![w, b, b, w];
    assert!(report.solutions.contains(&diagonal));
    assert!(report.solutions.contains(&anti_diagonal));

    for solution in &report.solutions {
        assert_satisfies_clues(&board, solution);
    }
}

#[test]
fn first_solution_is_enough_when_asked() {
    let board = mono_board(&[&[1], &[1]], &[&[1], &[1]]);

    let options = SolveOptions {
        max_solutions: Some(1),
        ..SolveOptions::default()
    };
    let report = solver::solve(&board, &options).unwrap();

    assert_eq!(report.verdict, Verdict::SolvedUnique);
    assert_eq!(report.solutions.len(), 1);
}

#[test]
fn unsatisfiable_board_is_contradictory() {
    // the middle column wants all three cells, the side columns only two
    let board = mono_board(&[&[3], &[3], &[3]], &[&[2], &[3], &[2]]);

    let report = solver::solve(&board, &SolveOptions::default()).unwrap();

    assert_eq!(report.verdict, Verdict::Contradictory);
    assert!(report.solutions.is_empty());
}

#[test]
fn probing_finishes_what_propagation_started() {
    let board = mono_board(
        &[&[2], &[2], &[2], &[1, 1]],
        &[&[1, 1], &[2], &[2], &[2]],
    );

    let report = solver::solve(&board, &SolveOptions::default()).unwrap();

    assert_eq!(report.verdict, Verdict::SolvedUnique);
    assert_eq!(report.solutions.len(), 1);
    assert!(report.probe_rounds >= 1);
    assert!(report.colors_eliminated >= 1);

    let (b, w) = (MonoCell::INK, MonoCell::SPACE);
    assert_eq!(
        report.solutions[0],
        vec![
            b, b, w, w, //
            w, b, b, w, //
            w, w, b, b, //
            b, w, w, b,
        ]
    );
    assert_satisfies_clues(&board, &report.solutions[0]);
}

#[test]
fn search_alone_cracks_the_windmill() {
    let board = mono_board(
        &[&[2], &[2], &[2], &[1, 1]],
        &[&[1, 1], &[2], &[2], &[2]],
    );

    let options = SolveOptions {
        enable_probing: false,
        ..SolveOptions::default()
    };
    let report = solver::solve(&board, &options).unwrap();

    assert_eq!(report.verdict, Verdict::SolvedUnique);
    assert_satisfies_clues(&board, &report.solutions[0]);
}

#[test]
fn malformed_clues_are_an_error_not_a_verdict() {
    let board = mono_board(&[&[2, 2], &[1]], &[&[1], &[1], &[1], &[1]]);

    // [2, 2] needs five cells on a four-cell row
    assert!(solver::solve(&board, &SolveOptions::default()).is_err());
}

#[cfg(feature = "std_time")]
#[test]
fn expired_deadline_reports_timeout() {
    let board = mono_board(
        &[&[2], &[2], &[2], &[1, 1]],
        &[&[1, 1], &[2], &[2], &[2]],
    );

    let options = SolveOptions {
        timeout: Some(0),
        ..SolveOptions::default()
    };
    let report = solver::solve(&board, &options).unwrap();

    assert_eq!(report.verdict, Verdict::Timeout);
    assert!(report.solutions.is_empty());
}

#[cfg(feature = "ini")]
mod from_files {
    use crosshatch::parser::{BoardParser, LocalReader, MyFormat, PuzzleScheme};
    use crosshatch::puzzle::colored::{ColorMask, ColoredRun};
    use crosshatch::puzzle::mono::{MonoCell, MonoRun};
    use crosshatch::solver::{self, propagation, SolveOptions, Verdict};
    use crosshatch::utils::rc::MutRc;

    #[test]
    fn cross_solves_by_propagation_alone() {
        let puzzle = MyFormat::read_local("puzzles/cross.toml").unwrap();
        assert_eq!(puzzle.infer_scheme(), PuzzleScheme::BlackAndWhite);

        let board = MutRc::new(puzzle.parse::<MonoRun>());
        let mut solver: propagation::Solver<_> = propagation::Solver::new(MutRc::clone(&board));
        let _ = solver.run(None).unwrap();

        let board = board.read();
        assert!(board.is_solved_full());
        assert!((board.solution_rate() - 1.0).abs() < std::f64::EPSILON);

        let (b, w) = (MonoCell::INK, MonoCell::SPACE);
        assert_eq!(board.get_row(2), vec![b; 5]);
        assert_eq!(board.get_column(0), vec![w, w, b, w, w]);
    }

    #[test]
    fn windmill_needs_more_than_propagation() {
        let puzzle = MyFormat::read_local("puzzles/windmill.toml").unwrap();
        let board = MutRc::new(puzzle.parse::<MonoRun>());

        {
            let mut solver: propagation::Solver<_> =
                propagation::Solver::new(MutRc::clone(&board));
            let refined = solver.run(None).unwrap();
            assert!(refined.is_empty());
            assert!(!board.read().is_solved_full());
        }

        let report = solver::solve(&board, &SolveOptions::default()).unwrap();
        assert_eq!(report.verdict, Verdict::SolvedUnique);
    }

    #[test]
    fn colored_petals_solve_by_propagation() {
        let puzzle = MyFormat::read_local("puzzles/petals.toml").unwrap();
        assert_eq!(puzzle.infer_scheme(), PuzzleScheme::MultiColor);

        let board = MutRc::new(puzzle.parse::<ColoredRun>());
        let mut solver: propagation::Solver<_> = propagation::Solver::new(MutRc::clone(&board));
        let _ = solver.run(None).unwrap();

        let board = board.read();
        assert!(board.is_solved_full());

        // g sorts before r, so green takes code 4 and red code 8
        let (w, g, r) = (ColorMask(1), ColorMask(4), ColorMask(8));
        assert_eq!(board.get_row(0), vec![r, r, g]);
        assert_eq!(board.get_row(1), vec![w, r, w]);
        assert_eq!(board.get_row(2), vec![g, r, r]);
    }

    #[test]
    fn full_pipeline_agrees_with_propagation_on_colored() {
        let puzzle = MyFormat::read_local("puzzles/petals.toml").unwrap();
        let board = MutRc::new(puzzle.parse::<ColoredRun>());

        let report = solver::solve(&board, &SolveOptions::default()).unwrap();
        assert_eq!(report.verdict, Verdict::SolvedUnique);
        assert_eq!(report.solutions.len(), 1);
    }
}
