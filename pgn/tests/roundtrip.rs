//! End-to-end round-trip properties: parse → export → parse again.

use cozy_chess::Board;
use proptest::prelude::*;

use pgn::{
    export_game, format_san, legal_moves, parse_game, GameResult, GameTree, NodeId, ParseOptions,
    ParsedGame, TextExporter,
};

fn parse(text: &str) -> ParsedGame {
    parse_game(text, &ParseOptions::default()).unwrap()
}

fn export(tree: &GameTree, columns: Option<usize>) -> String {
    let mut exporter = TextExporter::new(columns);
    export_game(tree, &mut exporter, true, true)
}

/// Collect (san, nags, comment) over the whole tree in traversal order.
fn flatten(tree: &GameTree, node: NodeId, out: &mut Vec<(String, Vec<u8>, Option<String>)>) {
    let n = tree.node(node);
    if let Some(san) = n.san() {
        let mut nags: Vec<u8> = n.nags.to_vec();
        nags.sort_unstable();
        out.push((san.to_string(), nags, n.comment.clone()));
    }
    for &child in n.children() {
        flatten(tree, child, out);
    }
}

fn tree_shape(tree: &GameTree) -> Vec<(String, Vec<u8>, Option<String>)> {
    let mut out = Vec::new();
    flatten(tree, tree.root(), &mut out);
    out
}

#[test]
fn round_trip_preserves_moves_variations_comments_and_nags() {
    let text = "[Event \"Round-trip\"]\n[White \"A\"]\n[Black \"B\"]\n\n\
                1. e4 {Best by test} e5 $1 2. Nf3 (2. Bc4 {Italian} Nc6 \
                (2... Nf6?! 3. d3) 3. Qh5) Nc6 3. Bb5 a6 1/2-1/2";
    let first = parse(text);
    assert!(first.diagnostics.is_empty());

    let exported = export(&first.tree, None);
    let second = parse(&exported);
    assert!(second.diagnostics.is_empty());

    assert_eq!(tree_shape(&first.tree), tree_shape(&second.tree));
    assert_eq!(first.tree.result, second.tree.result);
    assert_eq!(second.tree.result, GameResult::Draw);

    // A second export is byte-stable
    assert_eq!(exported, export(&second.tree, None));
}

#[test]
fn scenario_sideline_reproduces_input() {
    let parsed = parse("1. e4 e5 2. Nf3 (2. Bc4 Nc6) Nc6 *");
    let exported = export(&parsed.tree, None);
    let movetext = exported.split("\n\n").nth(1).unwrap();
    assert_eq!(movetext, "1. e4 e5 2. Nf3 ( 2. Bc4 Nc6 ) 2... Nc6 *");
}

#[test]
fn index_walks_mainline_from_first_to_last() {
    let parsed = parse("1. e4 e5 2. Nf3 Nc6 3. Bb5 *");
    let tree = &parsed.tree;
    let index = &parsed.index;

    assert_eq!(index.first(), tree.root());
    assert_eq!(index.lookup(&tree.node(index.first()).fen), Some(index.first()));

    let mainline: Vec<_> = tree.mainline().collect();
    assert_eq!(mainline.len(), 5);
    assert_eq!(*mainline.last().unwrap(), index.last());
}

#[test]
fn custom_fen_game_round_trips() {
    let text = "[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/8/R3K3 w - - 0 1\"]\n\n1. Ra8+ Ke7 2. Ke2 *";
    let first = parse(text);
    assert!(first.diagnostics.is_empty());
    let second = parse(&export(&first.tree, None));
    assert_eq!(tree_shape(&first.tree), tree_shape(&second.tree));
    assert_eq!(first.tree.starting_fen, second.tree.starting_fen);
}

/// Play out a pseudo-random legal game described by `picks` and return its
/// SAN sequence.
fn random_game(picks: &[u16]) -> Vec<String> {
    let mut board = Board::default();
    let mut sans = Vec::new();
    for &pick in picks {
        let legal = legal_moves(&board);
        if legal.is_empty() {
            break;
        }
        let mv = legal[pick as usize % legal.len()];
        sans.push(format_san(&board, mv));
        board.play_unchecked(mv);
    }
    sans
}

fn to_movetext(sans: &[String]) -> String {
    let mut text = String::new();
    for (i, san) in sans.iter().enumerate() {
        if i % 2 == 0 {
            text.push_str(&format!("{}. ", i / 2 + 1));
        }
        text.push_str(san);
        text.push(' ');
    }
    text.push('*');
    text
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_games_round_trip(picks in prop::collection::vec(any::<u16>(), 1..60)) {
        let sans = random_game(&picks);
        prop_assume!(!sans.is_empty());
        let text = to_movetext(&sans);

        let first = parse_game(&text, &ParseOptions::default()).unwrap();
        prop_assert!(first.diagnostics.is_empty(), "diagnostics for {text}");

        let exported = export(&first.tree, None);
        let second = parse_game(&exported, &ParseOptions::default()).unwrap();
        prop_assert!(second.diagnostics.is_empty());

        let replayed: Vec<String> = second
            .tree
            .mainline()
            .map(|id| second.tree.node(id).san().unwrap().to_string())
            .collect();
        prop_assert_eq!(replayed, sans);
    }

    #[test]
    fn wrapped_output_respects_column_budget(
        picks in prop::collection::vec(any::<u16>(), 1..60),
        columns in 12usize..60,
    ) {
        let sans = random_game(&picks);
        prop_assume!(!sans.is_empty());
        let parsed = parse_game(&to_movetext(&sans), &ParseOptions::default()).unwrap();
        let out = export(&parsed.tree, Some(columns));
        // Header lines are written whole; the budget governs the movetext
        let movetext = out.split("\n\n").nth(1).unwrap_or("");
        for line in movetext.lines() {
            prop_assert!(
                line.len() <= columns || !line.trim_end().contains(' '),
                "line {line:?} over budget {columns}"
            );
        }
    }
}
