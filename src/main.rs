#[macro_use]
extern crate log;

use std::fmt::Display;
use std::fs;
use std::io::{stdin, Read};
use std::str::FromStr;

use clap::{value_t, App, Arg, ArgMatches};

use crosshatch::grid::Grid;
use crosshatch::parser::{BoardParser, MyFormat, ParseError, PuzzleScheme};
use crosshatch::puzzle::{colored::ColoredRun, mono::MonoRun, Run};
use crosshatch::render::{Renderer, ShellRenderer};
use crosshatch::solver::{self, SolveOptions, Verdict};
use crosshatch::utils::rc::MutRc;

fn main() -> Result<(), ParseError> {
    #[cfg(feature = "logger")]
    env_logger::init();

    let matches = App::new("crosshatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Constraint-propagation nonogram solver")
        .arg(
            Arg::with_name("INPUT")
                .help("The puzzle file to solve. When no input is present, read from the stdin.")
                .index(1),
        )
        .args_from_usage(
            "-m, --max-solutions=[THRESHOLD] 'Stop searching after finding enough solutions'
             -t, --timeout=[SECONDS] 'Stop searching after the specified timeout in seconds'
             -d, --max-depth=[DEPTH] 'Stop searching after reaching the specified search depth'
             -r, --probe-rounds=[ROUNDS] 'Cap the number of contradiction-probing rounds'
             -P, --no-probing 'Skip the contradiction rounds and go straight to the search'",
        )
        .get_matches();

    let options = options_from_args(&matches);
    let content = content_from_args(&matches)?;

    let puzzle = MyFormat::with_content(content)?;
    match puzzle.infer_scheme() {
        PuzzleScheme::BlackAndWhite => run_scheme::<MonoRun, _>(&puzzle, &options),
        PuzzleScheme::MultiColor => run_scheme::<ColoredRun, _>(&puzzle, &options),
    }

    Ok(())
}

fn run_scheme<R, P>(puzzle: &P, options: &SolveOptions)
where
    R: Run + Display,
    R::Cell: Display,
    P: BoardParser,
{
    let board: Grid<R> = puzzle.parse();
    let board = MutRc::new(board);
    let renderer = ShellRenderer::with_board(MutRc::clone(&board));

    let report = match solver::solve(&board, options) {
        Ok(report) => report,
        Err(message) => {
            eprintln!("Invalid puzzle: {}", message);
            return;
        }
    };

    if let Some(first) = report.solutions.first() {
        board.write().restore(first.clone());
    }
    println!("{}", renderer.render());

    for solution in report.solutions.iter().skip(1) {
        println!();
        board.write().restore(solution.clone());
        println!("{}", renderer.render());
    }

    match report.verdict {
        Verdict::SolvedUnique => println!("Solved: the solution is unique"),
        Verdict::SolvedMultiple => {
            println!("Solved: found {} solutions", report.solutions.len())
        }
        Verdict::Contradictory => println!("The puzzle has no solution"),
        Verdict::Timeout => println!("Timed out; showing the partial board"),
        Verdict::Exhausted => println!("Gave up under the configured limits"),
    }

    info!(
        "probe rounds: {}, colors eliminated: {}, search depth: {}, nodes: {}",
        report.probe_rounds, report.colors_eliminated, report.depth_reached, report.nodes_explored
    );
}

fn content_from_args(matches: &ArgMatches) -> Result<String, ParseError> {
    if let Some(input_file) = matches.value_of("INPUT") {
        return Ok(fs::read_to_string(input_file)?);
    }

    warn!("Reading from stdin...");
    let mut buffer = String::new();
    let _ = stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn options_from_args(matches: &ArgMatches) -> SolveOptions {
    let defaults = SolveOptions::default();

    SolveOptions {
        max_solutions: parse_arg::<usize>(matches, "max-solutions").or(defaults.max_solutions),
        timeout: parse_arg::<u32>(matches, "timeout"),
        max_depth: parse_arg::<usize>(matches, "max-depth"),
        enable_probing: !matches.is_present("no-probing"),
        probe_max_rounds: parse_arg::<usize>(matches, "probe-rounds"),
    }
}

fn parse_arg<T>(matches: &ArgMatches, name: &str) -> Option<T>
where
    T: FromStr,
{
    if matches.is_present(name) {
        let value = value_t!(matches, name, T).unwrap_or_else(|e| e.exit());
        return Some(value);
    }

    None
}
