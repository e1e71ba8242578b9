//! Utilities to generate random sequences and queries, and to time query
//! batches. Used by the tests and by the perf binaries.

use rand::Rng;
use rand_distr::{Distribution, Geometric};
use std::time::Instant;

/// Generates a random sequence of `n` bytes over the alphabet `[0, sigma)`.
pub fn gen_sequence(n: usize, sigma: usize) -> Vec<u8> {
    assert!(sigma > 0 && sigma <= 256);
    let mut rng = rand::thread_rng();
    (0..n).map(|_| rng.gen_range(0..sigma) as u8).collect()
}

/// Generates a random sequence of `n` bytes over the alphabet `[0, sigma)`
/// made of maximal runs with geometrically distributed lengths: `p` is the
/// success probability, so the expected run length is `1/p`.
pub fn gen_run_sequence(n: usize, sigma: usize, p: f64) -> Vec<u8> {
    assert!(sigma > 0 && sigma <= 256);
    let mut rng = rand::thread_rng();
    let geom = Geometric::new(p).unwrap();

    let mut seq = Vec::with_capacity(n);
    let mut prev = None;
    while seq.len() < n {
        let mut c = rng.gen_range(0..sigma) as u8;
        while sigma > 1 && Some(c) == prev {
            c = rng.gen_range(0..sigma) as u8;
        }
        let len = 1 + geom.sample(&mut rng) as usize;
        for _ in 0..len.min(n - seq.len()) {
            seq.push(c);
        }
        prev = Some(c);
    }

    seq
}

/// Generates a strictly increasing sequence of values smaller than `u`.
/// The result holds at most `n` values; duplicates of the random draw are
/// discarded.
pub fn gen_strictly_increasing_sequence(n: usize, u: usize) -> Vec<usize> {
    let mut rng = rand::thread_rng();
    let mut v: Vec<usize> = (0..n).map(|_| rng.gen_range(0..u)).collect();
    v.sort_unstable();
    v.dedup();
    v
}

/// Returns the complement of the sorted positions `v` within
/// `0..v.last()`.
pub fn negate_vector(v: &[usize]) -> Vec<usize> {
    let last = match v.last() {
        Some(&last) => last,
        None => return Vec::new(),
    };

    let mut res = Vec::with_capacity(last - v.len() + 1);
    let mut j = 0;
    for i in 0..last {
        if j < v.len() && v[j] == i {
            j += 1;
        } else {
            res.push(i);
        }
    }
    res
}

/// Generates `n_queries` random positions in `[0, n)`.
pub fn gen_queries(n_queries: usize, n: usize) -> Vec<usize> {
    let mut rng = rand::thread_rng();
    (0..n_queries).map(|_| rng.gen_range(0..n)).collect()
}

/// Generates `n_queries` pairs `(pos, symbol)` with `symbol` drawn from the
/// text, for rank benchmarks.
pub fn gen_rank_queries(n_queries: usize, text: &[u8]) -> Vec<(usize, u8)> {
    let mut rng = rand::thread_rng();
    (0..n_queries)
        .map(|_| {
            let pos = rng.gen_range(0..text.len());
            (pos, text[pos])
        })
        .collect()
}

/// Generates `n_queries` pairs `(i, symbol)` where `i` is a valid 1-based
/// occurrence index of `symbol` in the text, for select benchmarks.
pub fn gen_select_queries(n_queries: usize, text: &[u8]) -> Vec<(usize, u8)> {
    let mut rng = rand::thread_rng();

    let mut occs = vec![0_usize; 256];
    for &c in text.iter() {
        occs[c as usize] += 1;
    }

    (0..n_queries)
        .map(|_| {
            let symbol = text[rng.gen_range(0..text.len())];
            let i = rng.gen_range(1..=occs[symbol as usize]);
            (i, symbol)
        })
        .collect()
}

/// Measures the time per query over a number of runs.
pub struct TimingQueries {
    times: Vec<u128>,
    n_queries: usize,
    t_start: Option<Instant>,
}

impl TimingQueries {
    pub fn new(n_runs: usize, n_queries: usize) -> Self {
        Self {
            times: Vec::with_capacity(n_runs),
            n_queries,
            t_start: None,
        }
    }

    pub fn start(&mut self) {
        self.t_start = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        let elapsed = self.t_start.take().unwrap().elapsed().as_nanos();
        self.times.push(elapsed / (self.n_queries.max(1) as u128));
    }

    /// Returns `(min, max, avg)` time per query in nanoseconds over the
    /// measured runs.
    pub fn get(&self) -> (u128, u128, u128) {
        let min = *self.times.iter().min().unwrap();
        let max = *self.times.iter().max().unwrap();
        let avg = self.times.iter().sum::<u128>() / (self.times.len() as u128);
        (min, max, avg)
    }
}

/// Returns the name of the type of the argument.
pub fn type_of<T>(_: &T) -> String {
    std::any::type_name::<T>().to_string()
}
