use std::cmp::Reverse;
use std::collections::HashMap;
use std::marker::PhantomData;

use minimum_redundancy::{BitsPerFragment, Coding};
use serde::{Deserialize, Serialize};

use crate::{
    utils::stable_partition_of_2_with_codes, AccessBin, AccessUnsigned, BitVector, BitVectorMut,
    InverseSelectUnsigned, RSBitVector, RankBin, RankUnsigned, SelectBin, SelectUnsigned,
    SpaceUsage, WTIterator,
};

/// Trait bounds a rank/select bit index must satisfy to back one level of a
/// wavelet tree.
pub trait BinRSforWT: From<BitVector> + AccessBin + RankBin + SelectBin + SpaceUsage + Default {}
impl<T> BinRSforWT for T where
    T: From<BitVector> + AccessBin + RankBin + SelectBin + SpaceUsage + Default
{
}

/// A canonical prefix code: the `len` low bits of `content`, read from the
/// most significant one.
#[derive(Default, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct PrefixCode {
    pub content: u32,
    pub len: u32,
}

/// A Huffman-shaped binary wavelet tree over a byte sequence.
///
/// Symbols are assigned optimal prefix codes, so frequent symbols are
/// resolved in fewer levels and the expected query time drops to the
/// zero-order entropy of the sequence.
#[derive(Default, Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct HuffWaveletTree<BRS = RSBitVector> {
    n: usize,        // length of the represented sequence
    n_levels: usize, // longest code length
    codes_encode: Vec<PrefixCode>,
    codes_decode: Vec<Vec<(u32, u8)>>, // codes grouped by length, sorted by content
    bvs: Vec<BRS>,                     // a bit vector for each level
    lens: Vec<usize>,                  // length of each bit vector
}

struct LenInfo(usize, u32); // symbol, code length

fn craft_codes(lengths: &HashMap<usize, u32>, sigma: usize) -> Vec<PrefixCode> {
    let alph_size = lengths.len();

    let mut f = lengths
        .iter()
        .map(|(&k, &v)| LenInfo(k, v))
        .collect::<Vec<_>>();

    // ties broken by symbol so that identical inputs always get identical
    // codes, whatever the iteration order of the map
    f.sort_by_key(|x| (x.1, x.0));

    // one slot of slack so the expansion stays in bounds for a one-symbol
    // alphabet
    let mut c = vec![0_u32; alph_size + 1];
    let mut assignments = vec![PrefixCode::default(); sigma + 1];
    let mut m = 1; // how many codes we have so far
    let mut l = 0;

    for j in 0..alph_size {
        while f[j].1 > l {
            for r in j..m {
                c[(m - j) + r] = c[r];
                c[r] |= 1 << l;
            }
            m = 2 * m - j;
            l += 1;
        }

        // the codes are stored in lexicographic order of their reverse
        // codes; the actual one is obtained by reversing
        let mut reversed_code = 0;
        for t in 0..l {
            reversed_code |= ((c[j] >> t) & 1) << (l - t - 1);
        }

        assignments[f[j].0] = PrefixCode {
            content: reversed_code,
            len: l,
        };
    }

    assignments
}

impl<BRS: BinRSforWT> HuffWaveletTree<BRS> {
    /// Builds the wavelet tree of the byte `sequence`. The input `sequence`
    /// will be **destroyed**.
    ///
    /// # Examples
    /// ```
    /// use rlwt::HuffWaveletTree;
    ///
    /// let mut data = vec![1_u8, 0, 1, 0, 2, 4, 5, 3];
    /// let wt = HuffWaveletTree::<rlwt::RSBitVector>::new(&mut data);
    ///
    /// assert_eq!(wt.len(), 8);
    /// ```
    pub fn new(sequence: &mut [u8]) -> Self {
        if sequence.is_empty() {
            return Self {
                n: 0,
                n_levels: 0,
                codes_encode: Vec::default(),
                codes_decode: Vec::default(),
                bvs: Vec::default(),
                lens: Vec::default(),
            };
        }

        let sigma = *sequence.iter().max().unwrap() as usize;

        let freqs = sequence.iter().fold(HashMap::new(), |mut map, &c| {
            *map.entry(c as usize).or_insert(0_u32) += 1;
            map
        });

        let mut lengths =
            Coding::from_frequencies(BitsPerFragment(1), freqs.clone()).code_lengths();

        // a lone symbol would get an empty code; one level keeps decoding
        // well defined
        if lengths.len() == 1 {
            for len in lengths.values_mut() {
                *len = 1;
            }
        }

        // keep the optimal length multiset but reassign it in a fixed order,
        // shorter codes to more frequent symbols with ties broken by value:
        // identical inputs must always produce identical codes
        let mut lens: Vec<u32> = lengths.values().copied().collect();
        lens.sort_unstable();
        let mut syms: Vec<usize> = lengths.keys().copied().collect();
        syms.sort_by_key(|&s| (Reverse(freqs[&s]), s));
        for (s, l) in syms.into_iter().zip(lens) {
            lengths.insert(s, l);
        }

        let codes = craft_codes(&lengths, sigma);

        let max_len = codes
            .iter()
            .map(|x| x.len)
            .max()
            .expect("error while finding max code length") as usize;
        let n_levels = max_len;

        let mut codes_decode = vec![Vec::default(); max_len + 1];
        for (i, c) in codes.iter().enumerate() {
            if c.len != 0 {
                codes_decode[c.len as usize].push((c.content, i as u8));
            }
        }

        // sort codes to make them searchable during decoding
        for v in codes_decode.iter_mut() {
            v.sort_by_key(|(x, _)| *x);
        }

        let mut bvs = Vec::with_capacity(n_levels);
        let mut lens = Vec::with_capacity(n_levels);

        let mut shift = 1_u32;

        for _level in 0..n_levels {
            let mut cur_bv = BitVectorMut::new();

            for &s in sequence.iter() {
                let code = &codes[s as usize];
                if code.len >= shift {
                    cur_bv.push((code.content >> (code.len - shift)) & 1 == 1);
                }
            }

            let bv = BitVector::from(cur_bv);
            lens.push(bv.len());
            bvs.push(BRS::from(bv));

            stable_partition_of_2_with_codes(sequence, shift as usize, &codes);
            shift += 1;
        }

        Self {
            n: sequence.len(),
            n_levels,
            codes_encode: codes,
            codes_decode,
            bvs,
            lens,
        }
    }

    /// Returns the length of the indexed sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    /// Checks if the indexed sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns the number of levels in the wavelet tree, i.e. the longest
    /// code length.
    #[must_use]
    pub fn n_levels(&self) -> usize {
        self.n_levels
    }

    /// Returns an iterator over the values in the wavelet tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use rlwt::HuffWaveletTree;
    ///
    /// let data: Vec<u8> = (0..10_u8).cycle().take(100).collect();
    /// let wt = HuffWaveletTree::<rlwt::RSBitVector>::from(data.clone());
    ///
    /// assert_eq!(wt.iter().collect::<Vec<_>>(), data);
    /// ```
    pub fn iter(&self) -> WTIterator<u8, HuffWaveletTree<BRS>, &HuffWaveletTree<BRS>> {
        WTIterator {
            i: 0,
            end: self.len(),
            wt: self,
            _phantom: PhantomData,
        }
    }

    #[inline(always)]
    fn code_of(&self, symbol: u8) -> Option<&PrefixCode> {
        let code = self.codes_encode.get(symbol as usize)?;
        if code.len == 0 {
            return None;
        }
        Some(code)
    }
}

impl<BRS: BinRSforWT> AccessUnsigned for HuffWaveletTree<BRS> {
    type Item = u8;

    /// Returns the symbol at position `i`, or [`None`] if `i` is out of
    /// bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use rlwt::{AccessUnsigned, HuffWaveletTree, RSBitVector};
    ///
    /// let mut data = vec![1_u8, 0, 1, 0, 2, 4, 5, 3];
    /// let wt = HuffWaveletTree::<RSBitVector>::new(&mut data);
    ///
    /// assert_eq!(wt.get(2), Some(1));
    /// assert_eq!(wt.get(8), None);
    /// ```
    #[must_use]
    #[inline(always)]
    fn get(&self, i: usize) -> Option<Self::Item> {
        if i >= self.n {
            return None;
        }

        Some(unsafe { self.get_unchecked(i) })
    }

    #[must_use]
    #[inline(always)]
    unsafe fn get_unchecked(&self, i: usize) -> Self::Item {
        let mut cur_i = i;
        let mut repr: u32 = 0;
        let mut len = 0;

        for level in 0..self.n_levels {
            if cur_i >= self.lens[level] {
                break;
            }

            let bit = self.bvs[level].get_unchecked(cur_i);
            repr = (repr << 1) | bit as u32;

            let ones = self.bvs[level].rank1_unchecked(cur_i);
            cur_i = if bit {
                ones + self.bvs[level].n_zeros()
            } else {
                cur_i - ones
            };
            len += 1;
        }

        let idx = self.codes_decode[len]
            .binary_search_by_key(&repr, |&(c, _)| c)
            .expect("could not decode symbol");

        self.codes_decode[len][idx].1
    }
}

impl<BRS: BinRSforWT> RankUnsigned for HuffWaveletTree<BRS> {
    /// Returns the number of occurrences of `symbol` up to position `i`
    /// excluded. [`None`] is returned if `i` is out of bounds or `symbol`
    /// does not occur in the sequence.
    ///
    /// # Examples
    ///
    /// ```
    /// use rlwt::{AccessUnsigned, HuffWaveletTree, RSBitVector, RankUnsigned};
    ///
    /// let mut data = vec![1_u8, 0, 1, 0, 2, 4, 5, 3];
    /// let wt = HuffWaveletTree::<RSBitVector>::new(&mut data);
    ///
    /// assert_eq!(wt.rank(1, 2), Some(1));
    /// assert_eq!(wt.rank(1, 0), Some(0));
    /// assert_eq!(wt.rank(7, 2), None); // symbol not in the sequence
    /// assert_eq!(wt.rank(1, 9), None); // too large position
    /// ```
    #[must_use]
    #[inline(always)]
    fn rank(&self, symbol: Self::Item, i: usize) -> Option<usize> {
        if i > self.n || self.code_of(symbol).is_none() {
            return None;
        }

        // SAFETY: the checks above guarantee we are not out of bounds
        Some(unsafe { self.rank_unchecked(symbol, i) })
    }

    #[must_use]
    #[inline(always)]
    unsafe fn rank_unchecked(&self, symbol: Self::Item, i: usize) -> usize {
        let code = &self.codes_encode[symbol as usize];
        let len = code.len as usize;
        let repr = code.content;

        let mut cur_i = i;
        let mut cur_p = 0;

        for level in 0..len {
            let bit = (repr >> (len - level - 1)) & 1 == 1;

            let zeros = self.bvs[level].n_zeros();
            let ones_p = self.bvs[level].rank1_unchecked(cur_p);
            let ones_i = self.bvs[level].rank1_unchecked(cur_i);

            cur_p = if bit { ones_p + zeros } else { cur_p - ones_p };
            cur_i = if bit { ones_i + zeros } else { cur_i - ones_i };
        }

        cur_i - cur_p
    }
}

impl<BRS: BinRSforWT> SelectUnsigned for HuffWaveletTree<BRS> {
    /// Returns the position of the `i+1`-th occurrence of `symbol`, or
    /// [`None`] if the sequence holds fewer occurrences.
    ///
    /// # Examples
    ///
    /// ```
    /// use rlwt::{AccessUnsigned, HuffWaveletTree, RSBitVector, SelectUnsigned};
    ///
    /// let mut data = vec![1_u8, 0, 1, 0, 2, 4, 5, 3];
    /// let wt = HuffWaveletTree::<RSBitVector>::new(&mut data);
    ///
    /// assert_eq!(wt.select(1, 0), Some(0));
    /// assert_eq!(wt.select(1, 1), Some(2));
    /// assert_eq!(wt.select(1, 2), None);
    /// assert_eq!(wt.select(5, 0), Some(6));
    /// ```
    #[must_use]
    #[inline(always)]
    fn select(&self, symbol: Self::Item, i: usize) -> Option<usize> {
        let code = self.code_of(symbol)?;
        let len = code.len as usize;
        let repr = code.content;

        let mut path_off = Vec::with_capacity(len);
        let mut rank_path_off = Vec::with_capacity(len);

        // walk down along the code, keeping both ends of the interval of
        // positions sharing the code prefix read so far
        let mut b = 0;
        let mut e = self.lens[0];

        for level in 0..len {
            path_off.push(b);

            let bit = (repr >> (len - level - 1)) & 1 == 1;
            let zeros = self.bvs[level].n_zeros();

            let (rank_b, rank_e) = if bit {
                (self.bvs[level].rank1(b)?, self.bvs[level].rank1(e)?)
            } else {
                (self.bvs[level].rank0(b)?, self.bvs[level].rank0(e)?)
            };

            let off = if bit { zeros } else { 0 };
            b = rank_b + off;
            e = rank_e + off;

            rank_path_off.push(rank_b);
        }

        // the interval [b, e) now spans exactly the occurrences of `symbol`
        if i >= e - b {
            return None;
        }

        let mut result = i;
        for level in (0..len).rev() {
            b = path_off[level];
            let rank_b = rank_path_off[level];
            let bit = (repr >> (len - level - 1)) & 1 == 1;

            result = if bit {
                self.bvs[level].select1(rank_b + result)
            } else {
                self.bvs[level].select0(rank_b + result)
            }? - b;
        }

        Some(result)
    }

    #[must_use]
    #[inline(always)]
    unsafe fn select_unchecked(&self, symbol: Self::Item, i: usize) -> usize {
        self.select(symbol, i).unwrap()
    }
}

impl<BRS: BinRSforWT> InverseSelectUnsigned for HuffWaveletTree<BRS> {
    /// Returns the pair `(rank, symbol)` for position `i` with a single
    /// root-to-leaf traversal.
    ///
    /// # Examples
    ///
    /// ```
    /// use rlwt::{AccessUnsigned, HuffWaveletTree, InverseSelectUnsigned, RSBitVector};
    ///
    /// let mut data = vec![1_u8, 0, 1, 0, 2, 4, 5, 3];
    /// let wt = HuffWaveletTree::<RSBitVector>::new(&mut data);
    ///
    /// assert_eq!(wt.inverse_select(2), Some((1, 1)));
    /// assert_eq!(wt.inverse_select(4), Some((0, 2)));
    /// assert_eq!(wt.inverse_select(8), None);
    /// ```
    #[must_use]
    #[inline(always)]
    fn inverse_select(&self, i: usize) -> Option<(usize, Self::Item)> {
        if i >= self.n {
            return None;
        }

        Some(unsafe { self.inverse_select_unchecked(i) })
    }

    #[must_use]
    #[inline(always)]
    unsafe fn inverse_select_unchecked(&self, i: usize) -> (usize, Self::Item) {
        let mut cur_i = i;
        let mut cur_p = 0;
        let mut repr: u32 = 0;
        let mut len = 0;

        for level in 0..self.n_levels {
            if cur_i >= self.lens[level] {
                break;
            }

            let bit = self.bvs[level].get_unchecked(cur_i);
            repr = (repr << 1) | bit as u32;

            let zeros = self.bvs[level].n_zeros();
            let ones_p = self.bvs[level].rank1_unchecked(cur_p);
            let ones_i = self.bvs[level].rank1_unchecked(cur_i);

            cur_p = if bit { ones_p + zeros } else { cur_p - ones_p };
            cur_i = if bit { ones_i + zeros } else { cur_i - ones_i };
            len += 1;
        }

        let idx = self.codes_decode[len]
            .binary_search_by_key(&repr, |&(c, _)| c)
            .expect("could not decode symbol");

        (cur_i - cur_p, self.codes_decode[len][idx].1)
    }
}

impl<BRS: BinRSforWT> From<Vec<u8>> for HuffWaveletTree<BRS> {
    fn from(mut v: Vec<u8>) -> Self {
        HuffWaveletTree::new(&mut v[..])
    }
}

impl<BRS: BinRSforWT> FromIterator<u8> for HuffWaveletTree<BRS> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        HuffWaveletTree::new(&mut iter.into_iter().collect::<Vec<u8>>())
    }
}

impl<BRS: BinRSforWT> AsRef<HuffWaveletTree<BRS>> for HuffWaveletTree<BRS> {
    fn as_ref(&self) -> &HuffWaveletTree<BRS> {
        self
    }
}

impl<BRS: BinRSforWT> IntoIterator for HuffWaveletTree<BRS> {
    type IntoIter = WTIterator<u8, HuffWaveletTree<BRS>, HuffWaveletTree<BRS>>;
    type Item = u8;

    fn into_iter(self) -> Self::IntoIter {
        WTIterator {
            i: 0,
            end: self.len(),
            wt: self,
            _phantom: PhantomData,
        }
    }
}

impl<'a, BRS: BinRSforWT> IntoIterator for &'a HuffWaveletTree<BRS> {
    type IntoIter = WTIterator<u8, HuffWaveletTree<BRS>, &'a HuffWaveletTree<BRS>>;
    type Item = u8;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<BRS: BinRSforWT> SpaceUsage for HuffWaveletTree<BRS> {
    /// Gives the space usage in bytes of the struct.
    fn space_usage_byte(&self) -> usize {
        8 + 8
            + self.codes_encode.len() * 8
            + self
                .codes_decode
                .iter()
                .fold(0, |a, v| a + v.len() * (4 + 1))
            + self.lens.len() * 8
            + self
                .bvs
                .iter()
                .fold(0, |acc, ds| acc + ds.space_usage_byte())
    }
}
