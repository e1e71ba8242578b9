//! Two-pass construction of the run-length compressed wavelet tree.
//!
//! The first pass over the input marks the run starts in `bl`, counts the
//! byte histogram, and extracts the run heads; the histogram is then turned
//! into the cumulative symbol table. The second pass walks the input again
//! with a 256-entry LF cursor: whenever a run starts, the next free slot of
//! its symbol's block in the sorted ordering is marked in `bf`. The run
//! heads finally feed the inner wavelet tree and `rank1(bf, start(c))` is
//! cached per symbol.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::bitvector::{BitVector, BitVectorMut};
use crate::error::{Error, Result};
use crate::AccessBin;

use super::{RLWaveletTree, RunHeadSupport, RunMarkSupport, SymbolTable};

static SCRATCH_SEQ: AtomicU64 = AtomicU64::new(0);

/// A process-unique scratch file holding the run-head stream of one build.
/// The file is removed when the guard is dropped, so every exit path cleans
/// up.
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    fn create() -> Result<(Self, File)> {
        let path = std::env::temp_dir().join(format!(
            "rlwt_heads_{}_{}",
            process::id(),
            SCRATCH_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let file = File::create(&path)?;
        Ok((Self { path }, file))
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

impl<WT, BRS> RLWaveletTree<WT, BRS>
where
    WT: RunHeadSupport,
    BRS: RunMarkSupport,
{
    /// Builds the run-length compressed wavelet tree of `text`.
    ///
    /// The run heads are staged in memory; use
    /// [`RLWaveletTree::from_reader`] to index an input that should be
    /// streamed instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use rlwt::RLWT;
    ///
    /// let wt = RLWT::new(b"mississippi");
    /// assert_eq!(wt.len(), 11);
    /// assert_eq!(wt.n_runs(), 8);
    /// ```
    #[must_use]
    pub fn new(text: &[u8]) -> Self {
        let n = text.len();
        if n == 0 {
            return Self::default();
        }

        let mut bl = BitVectorMut::with_zeros(n);
        let mut hist = vec![0_usize; 256].into_boxed_slice();
        let mut heads = Vec::new();

        let mut last = 0_u8;
        for (i, &c) in text.iter().enumerate() {
            if i == 0 || c != last {
                bl.set(i, true);
                heads.push(c);
            }
            hist[c as usize] += 1;
            last = c;
        }

        let table = SymbolTable::from_histogram(hist);

        let mut bf = BitVectorMut::with_zeros(n + 1);
        bf.set(n, true);
        let mut lf: Vec<usize> = table.starts.to_vec();
        for (i, &c) in text.iter().enumerate() {
            // SAFETY: i < n by construction
            if unsafe { bl.get_unchecked(i) } {
                bf.set(lf[c as usize], true);
            }
            lf[c as usize] += 1;
        }

        Self::assemble(n, bl, bf, heads, table)
    }

    /// Builds the run-length compressed wavelet tree of the first `n` bytes
    /// of `source`, reading it twice.
    ///
    /// The run heads are spilled to a scratch file in the temporary
    /// directory, named after the process id so concurrent builds do not
    /// collide; the file is removed before returning, also on failure.
    ///
    /// # Errors
    ///
    /// [`Error::ShortInput`] if `source` ends before delivering `n` bytes in
    /// either pass, [`Error::Io`] if reading the input or writing the
    /// scratch file fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use rlwt::{RLWT, RankUnsigned};
    /// use std::io::Cursor;
    ///
    /// let wt = RLWT::from_reader(Cursor::new(b"aaaabbbbcccc"), 12).unwrap();
    /// assert_eq!(wt.rank(b'b', 7), Some(3));
    ///
    /// assert!(RLWT::from_reader(Cursor::new(b"short"), 100).is_err());
    /// ```
    pub fn from_reader<R: Read + Seek>(source: R, n: usize) -> Result<Self> {
        if n == 0 {
            return Ok(Self::default());
        }

        let mut reader = BufReader::new(source);
        let (scratch, heads_file) = ScratchFile::create()?;
        let mut heads_out = BufWriter::new(heads_file);

        let mut bl = BitVectorMut::with_zeros(n);
        let mut hist = vec![0_usize; 256].into_boxed_slice();

        let mut last = 0_u8;
        let mut i = 0;
        while i < n {
            let buf = reader.fill_buf()?;
            if buf.is_empty() {
                return Err(Error::ShortInput {
                    expected: n,
                    got: i,
                });
            }
            let take = buf.len().min(n - i);
            for &c in &buf[..take] {
                if i == 0 || c != last {
                    bl.set(i, true);
                    heads_out.write_all(&[c])?;
                }
                hist[c as usize] += 1;
                last = c;
                i += 1;
            }
            reader.consume(take);
        }
        heads_out.flush()?;
        drop(heads_out);

        let table = SymbolTable::from_histogram(hist);

        reader.seek(SeekFrom::Start(0))?;
        let mut bf = BitVectorMut::with_zeros(n + 1);
        bf.set(n, true);
        let mut lf: Vec<usize> = table.starts.to_vec();

        let mut i = 0;
        while i < n {
            let buf = reader.fill_buf()?;
            if buf.is_empty() {
                return Err(Error::ShortInput {
                    expected: n,
                    got: i,
                });
            }
            let take = buf.len().min(n - i);
            for &c in &buf[..take] {
                // SAFETY: i < n by construction
                if unsafe { bl.get_unchecked(i) } {
                    bf.set(lf[c as usize], true);
                }
                lf[c as usize] += 1;
                i += 1;
            }
            reader.consume(take);
        }

        let heads = fs::read(&scratch.path)?;
        drop(scratch);

        Ok(Self::assemble(n, bl, bf, heads, table))
    }

    fn assemble(
        n: usize,
        bl: BitVectorMut,
        bf: BitVectorMut,
        heads: Vec<u8>,
        mut table: SymbolTable,
    ) -> Self {
        let bl = BRS::from(BitVector::from(bl));
        let bf = BRS::from(BitVector::from(bf));
        let heads = WT::from(heads);
        table.fill_bf_ranks(&bf);

        Self {
            n,
            bl,
            bf,
            heads,
            table,
        }
    }
}

impl<WT, BRS> From<Vec<u8>> for RLWaveletTree<WT, BRS>
where
    WT: RunHeadSupport,
    BRS: RunMarkSupport,
{
    fn from(v: Vec<u8>) -> Self {
        RLWaveletTree::new(&v)
    }
}

impl<WT, BRS> From<&[u8]> for RLWaveletTree<WT, BRS>
where
    WT: RunHeadSupport,
    BRS: RunMarkSupport,
{
    fn from(v: &[u8]) -> Self {
        RLWaveletTree::new(v)
    }
}

impl<WT, BRS> FromIterator<u8> for RLWaveletTree<WT, BRS>
where
    WT: RunHeadSupport,
    BRS: RunMarkSupport,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        RLWaveletTree::new(&iter.into_iter().collect::<Vec<u8>>())
    }
}
