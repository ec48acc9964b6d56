#![cfg(feature = "ini")]

use crosshatch::parser::{BoardParser, LocalReader, MyFormat, Paletted, PuzzleScheme};

#[test]
fn infer_black_and_white() {
    let puzzle = MyFormat::read_local("puzzles/cross.toml").unwrap();
    assert_eq!(puzzle.infer_scheme(), PuzzleScheme::BlackAndWhite);
    assert!(puzzle.get_colors().is_empty());
}

#[test]
fn infer_multi_color() {
    let puzzle = MyFormat::read_local("puzzles/petals.toml").unwrap();
    assert_eq!(puzzle.infer_scheme(), PuzzleScheme::MultiColor);
}

#[test]
fn colors_are_sorted_by_name() {
    let puzzle = MyFormat::read_local("puzzles/petals.toml").unwrap();

    let colors = &[
        ("g".to_string(), '*', "00FF00".to_string()),
        ("r".to_string(), '%', "red".to_string()),
    ];
    assert_eq!(puzzle.get_colors(), colors);
}

#[test]
fn palette_assigns_doubling_codes() {
    let puzzle = MyFormat::read_local("puzzles/petals.toml").unwrap();

    let palette = puzzle.get_palette();
    assert_eq!(palette.get_default(), Some("B".to_string()));
    assert_eq!(palette.id_by_name("W"), Some(1));
    assert_eq!(palette.id_by_name("B"), Some(2));
    assert_eq!(palette.id_by_name("g"), Some(4));
    assert_eq!(palette.id_by_name("r"), Some(8));
    assert_eq!(palette.full_mask(), 15);
}
