use super::*;
use crate::perf_and_test_utils::{gen_run_sequence, gen_sequence};
use crate::RLWT;

use rand::Rng;
use std::io::Cursor;

fn naive_rank(text: &[u8], symbol: u8, i: usize) -> usize {
    text[..i].iter().filter(|&&c| c == symbol).count()
}

fn naive_select(text: &[u8], symbol: u8, k: usize) -> Option<usize> {
    text.iter()
        .enumerate()
        .filter(|(_, &c)| c == symbol)
        .nth(k)
        .map(|(i, _)| i)
}

fn count_runs(text: &[u8]) -> usize {
    text.iter()
        .enumerate()
        .filter(|&(i, &c)| i == 0 || c != text[i - 1])
        .count()
}

/// Checks every query of `wt` against a linear scan of `text`.
fn check_against_text(wt: &RLWT, text: &[u8]) {
    assert_eq!(wt.len(), text.len());
    assert_eq!(wt.is_empty(), text.is_empty());
    assert_eq!(wt.n_runs(), count_runs(text));

    for (i, &symbol) in text.iter().enumerate() {
        assert_eq!(wt.get(i), Some(symbol), "get({})", i);

        let rank = naive_rank(text, symbol, i);
        assert_eq!(wt.inverse_select(i), Some((rank, symbol)), "inverse_select({})", i);

        let s = wt.select(symbol, rank);
        assert_eq!(s, Some(i), "select({}, {})", symbol, rank);
    }
    assert_eq!(wt.get(text.len()), None);

    // the per-symbol counts must add up to the length of the text
    let total: usize = (0..=255_u8)
        .map(|c| wt.rank(c, text.len()).unwrap())
        .sum();
    assert_eq!(total, text.len());
}

#[test]
fn test_runs_of_equal_length() {
    let text = b"aaaabbbbcccc";
    let wt = RLWT::new(text);

    assert_eq!(wt.n_runs(), 3);
    assert_eq!(wt.rank(b'b', 7), Some(3));
    assert_eq!(wt.select(b'c', 1), Some(9));
    assert_eq!(wt.get(5), Some(b'b'));
    assert_eq!(wt.inverse_select(6), Some((2, b'b')));

    check_against_text(&wt, text);
}

#[test]
fn test_alternating() {
    let text = b"abababab";
    let wt = RLWT::new(text);

    assert_eq!(wt.n_runs(), 8);
    assert_eq!(wt.rank(b'a', 5), Some(3));
    assert_eq!(wt.select(b'b', 2), Some(5));
    assert_eq!(wt.get(7), Some(b'b'));

    check_against_text(&wt, text);
}

#[test]
fn test_mississippi() {
    let text = b"mississippi";
    let wt = RLWT::new(text);

    assert_eq!(wt.rank(b'i', 11), Some(4));
    assert_eq!(wt.rank(b's', 11), Some(4));
    assert_eq!(wt.select(b's', 1), Some(3));
    assert_eq!(wt.get(10), Some(b'i'));
    assert_eq!(wt.inverse_select(4), Some((1, b'i')));

    check_against_text(&wt, text);
}

#[test]
fn test_single_run() {
    let text = b"aaaa";
    let wt = RLWT::new(text);

    assert_eq!(wt.n_runs(), 1);
    assert_eq!(wt.rank(b'a', 4), Some(4));
    assert_eq!(wt.select(b'a', 0), Some(0));
    assert_eq!(wt.select(b'a', 3), Some(3));

    check_against_text(&wt, text);
}

#[test]
fn test_alphabet_extremes() {
    let text = [0x00, 0xFF, 0xFF, 0x00];
    let wt = RLWT::new(&text);

    assert_eq!(wt.n_runs(), 3);
    assert_eq!(wt.rank(0xFF, 3), Some(2));
    assert_eq!(wt.select(0x00, 1), Some(3));

    check_against_text(&wt, &text);
}

#[test]
fn test_empty() {
    let wt = RLWT::new(b"");

    assert!(wt.is_empty());
    assert_eq!(wt.len(), 0);
    assert_eq!(wt.n_runs(), 0);
    assert_eq!(wt.get(0), None);
    assert_eq!(wt.rank(b'a', 0), Some(0));
    assert_eq!(wt.rank(b'a', 1), None);
    assert_eq!(wt.select(b'a', 0), None);
    assert_eq!(wt.inverse_select(0), None);
    assert_eq!(wt.iter().count(), 0);
}

#[test]
fn test_single_byte() {
    let wt = RLWT::new(b"x");

    assert_eq!(wt.len(), 1);
    assert_eq!(wt.n_runs(), 1);
    assert_eq!(wt.get(0), Some(b'x'));
    assert_eq!(wt.rank(b'x', 1), Some(1));
    assert_eq!(wt.select(b'x', 0), Some(0));

    check_against_text(&wt, b"x");
}

#[test]
fn test_absent_symbol() {
    let text = b"mississippi";
    let wt = RLWT::new(text);

    for i in 0..=text.len() {
        assert_eq!(wt.rank(b'z', i), Some(0));
        assert_eq!(wt.rank(0x00, i), Some(0));
    }
    assert_eq!(wt.select(b'z', 0), None);
}

#[test]
fn test_uniform_large() {
    let text = vec![42_u8; 5000];
    let wt = RLWT::new(&text);

    assert_eq!(wt.n_runs(), 1);
    assert_eq!(wt.rank(42, 5000), Some(5000));
    assert_eq!(wt.select(42, 4999), Some(4999));
    for i in (0..5000).step_by(383) {
        assert_eq!(wt.get(i), Some(42));
        assert_eq!(wt.rank(42, i), Some(i));
    }
}

#[test]
fn test_maximally_alternating() {
    let text: Vec<u8> = (0..4096).map(|i| (i % 2) as u8).collect();
    let wt = RLWT::new(&text);

    assert_eq!(wt.n_runs(), 4096);
    check_against_text(&wt, &text);
}

#[test]
fn test_iter() {
    let text = b"compressing runs is the whole point of this structure";
    let wt = RLWT::new(text);

    let forward: Vec<u8> = wt.iter().collect();
    assert_eq!(forward, text);

    let backward: Vec<u8> = wt.iter().rev().collect();
    assert_eq!(backward, text.iter().rev().copied().collect::<Vec<u8>>());
}

#[test]
fn test_random_small_alphabets() {
    for sigma in [2, 3, 4, 8] {
        let text = gen_run_sequence(2000, sigma, 0.25);
        let wt = RLWT::new(&text);
        check_against_text(&wt, &text);
    }
}

#[test]
fn test_random_full_alphabet() {
    let text = gen_sequence(2000, 256);
    let wt = RLWT::new(&text);
    check_against_text(&wt, &text);
}

// Geometric run lengths over a small alphabet, checked against a
// linear-scan oracle on random queries
#[test]
fn test_random_queries_against_oracle() {
    let n = 10_000;
    let text = gen_run_sequence(n, 4, 0.2);
    let wt = RLWT::new(&text);
    let mut rng = rand::thread_rng();

    for _ in 0..1000 {
        let i = rng.gen_range(0..=n);
        let symbol = rng.gen_range(0..4) as u8;

        let expected = naive_rank(&text, symbol, i);
        assert_eq!(wt.rank(symbol, i), Some(expected));

        let k = rng.gen_range(0..n);
        assert_eq!(wt.select(symbol, k), naive_select(&text, symbol, k));
    }
}

#[test]
fn test_from_reader() {
    let text = gen_run_sequence(4096, 5, 0.1);

    let wt = RLWT::new(&text);
    let streamed = RLWT::from_reader(Cursor::new(&text), text.len()).unwrap();

    assert_eq!(streamed, wt);
    check_against_text(&streamed, &text);
}

#[test]
fn test_from_reader_empty() {
    let wt = RLWT::from_reader(Cursor::new(b""), 0).unwrap();
    assert!(wt.is_empty());
}

#[test]
fn test_from_reader_short_input() {
    let err = RLWT::from_reader(Cursor::new(b"abc"), 10).unwrap_err();
    match err {
        crate::Error::ShortInput { expected, got } => {
            assert_eq!(expected, 10);
            assert_eq!(got, 3);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_symbol_table() {
    let text = b"mississippi";
    let wt = RLWT::new(text);

    // cumulative counts: i < m < p < s
    assert_eq!(wt.table.start(b'i'), 0);
    assert_eq!(wt.table.start(b'm'), 4);
    assert_eq!(wt.table.start(b'p'), 5);
    assert_eq!(wt.table.start(b's'), 7);
    assert_eq!(wt.table.start(0x00), 0);
    assert_eq!(wt.table.start(0xFF), 11);

    // bf_rank must agree with rank1 over bf at every block start
    for c in 0..=255_u8 {
        assert_eq!(
            wt.table.bf_rank(c),
            wt.bf.rank1(wt.table.start(c)).unwrap()
        );
    }
}

#[test]
fn test_marker_invariants() {
    let text = gen_run_sequence(3000, 6, 0.15);
    let wt = RLWT::new(&text);
    let r = count_runs(&text);

    assert_eq!(wt.bl.len(), text.len());
    assert_eq!(wt.bl.n_ones(), r);
    assert_eq!(wt.bf.len(), text.len() + 1);
    assert_eq!(wt.bf.n_ones(), r + 1);
    assert_eq!(wt.bf.get(text.len()), Some(true));

    // every run head read through bl must match the text
    for k in 0..r {
        let start = wt.bl.select1(k).unwrap();
        assert_eq!(wt.heads.get(k), Some(text[start]));
    }
}

// serialize -> load -> serialize is bytewise idempotent and queries agree
#[test]
fn test_serialize_roundtrip() {
    let text = gen_run_sequence(2500, 4, 0.1);
    let wt = RLWT::new(&text);

    let bytes = bincode::serialize(&wt).unwrap();
    let des: RLWT = bincode::deserialize(&bytes).unwrap();
    let bytes_again = bincode::serialize(&des).unwrap();

    assert_eq!(bytes, bytes_again);
    assert_eq!(des, wt);
    check_against_text(&des, &text);
}

#[test]
fn test_serialize_empty() {
    let wt = RLWT::new(b"");
    let bytes = bincode::serialize(&wt).unwrap();
    let des: RLWT = bincode::deserialize(&bytes).unwrap();

    assert_eq!(des, wt);
    assert!(des.is_empty());
}
