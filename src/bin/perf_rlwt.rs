use rlwt::perf_and_test_utils::{
    gen_queries, gen_rank_queries, gen_select_queries, type_of, TimingQueries,
};
use rlwt::{AccessUnsigned, RankUnsigned, SelectUnsigned, SpaceUsage, HuffWaveletTree, RLWT};

use clap::Parser;

const N_RUNS: usize = 3;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Input filename
    #[clap(short, long, value_parser)]
    input_file: String,
    #[clap(short, long, value_parser)]
    #[arg(default_value_t = 1000000)]
    n_queries: usize,
    #[arg(short, long)]
    rank: bool,
    #[arg(short, long)]
    access: bool,
    #[arg(short, long)]
    select: bool,
}

fn test_rank_performance<T>(ds: &T, n: usize, queries: &[(usize, u8)])
where
    T: RankUnsigned<Item = u8> + SpaceUsage,
{
    let mut result = 0;
    let mut t = TimingQueries::new(N_RUNS, queries.len());

    for _ in 0..N_RUNS {
        t.start();
        for &(pos, symbol) in queries.iter() {
            // chain the previous result into the next position so the
            // processor cannot overlap the queries
            let i = (pos + result) % n;
            result = unsafe { ds.rank_unchecked(symbol, i) };
        }
        t.stop()
    }

    let (_, _, t_avg) = t.get();
    println!(
        "[ds_name: {}, exp: rank, avg_time (ns): {}, space (MiB): {:.2}]",
        type_of(&ds),
        t_avg,
        ds.space_usage_MiB(),
    );

    println!("fake {}", result);
}

fn test_access_performance<T>(ds: &T, n: usize, queries: &[usize])
where
    T: AccessUnsigned<Item = u8> + SpaceUsage,
{
    let mut result: u8 = 0;
    let mut t = TimingQueries::new(N_RUNS, queries.len());

    for _ in 0..N_RUNS {
        t.start();
        for &pos in queries.iter() {
            let i = (pos + result as usize) % n;
            result = unsafe { ds.get_unchecked(i) };
        }
        t.stop()
    }

    let (_, _, t_avg) = t.get();
    println!(
        "[ds_name: {}, exp: access, avg_time (ns): {}, space (MiB): {:.2}]",
        type_of(&ds),
        t_avg,
        ds.space_usage_MiB(),
    );

    println!("fake {}", result);
}

fn test_select_performance<T>(ds: &T, queries: &[(usize, u8)])
where
    T: SelectUnsigned<Item = u8> + SpaceUsage,
{
    let mut result = 0;
    let mut t = TimingQueries::new(N_RUNS, queries.len());

    for _ in 0..N_RUNS {
        t.start();
        for &(i, symbol) in queries.iter() {
            // chain the previous result into the next occurrence index,
            // staying within the valid range [1, i]
            let i = std::cmp::max(1, i - result % 2);
            result = unsafe { ds.select_unchecked(symbol, i - 1) };
        }
        t.stop()
    }

    let (_, _, t_avg) = t.get();
    println!(
        "[ds_name: {}, exp: select, avg_time (ns): {}, space (MiB): {:.2}]",
        type_of(&ds),
        t_avg,
        ds.space_usage_MiB(),
    );

    println!("fake {}", result);
}

fn main() {
    let args = Args::parse();
    let text = std::fs::read(&args.input_file).expect("Cannot read the input file.");
    let n = text.len();

    let n_runs = text
        .iter()
        .enumerate()
        .filter(|&(i, &c)| i == 0 || c != text[i - 1])
        .count();

    println!("Text length: {n}");
    println!("Number of runs: {n_runs}");
    println!("Number of queries: {}", args.n_queries);

    let rank_queries = gen_rank_queries(args.n_queries, &text);
    let access_queries = gen_queries(args.n_queries, n);
    let select_queries = gen_select_queries(args.n_queries, &text);

    // the run-length tree against the plain Huffman-shaped tree baseline
    let rlwt = RLWT::new(&text);
    let hwt: HuffWaveletTree = HuffWaveletTree::from(text.clone());

    if args.rank {
        test_rank_performance(&rlwt, n, &rank_queries);
        test_rank_performance(&hwt, n, &rank_queries);
    }

    if args.access {
        test_access_performance(&rlwt, n, &access_queries);
        test_access_performance(&hwt, n, &access_queries);
    }

    if args.select {
        test_select_performance(&rlwt, &select_queries);
        test_select_performance(&hwt, &select_queries);
    }
}
