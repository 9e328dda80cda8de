//! Bit-packed GF(2) row arithmetic.
//!
//! The tableau and the layout validator both work on long binary vectors:
//! rows of the symplectic matrix, Pauli bit-planes, generator matrices for
//! rank checks. [`BitRow`] packs those vectors into `u64` words so that row
//! XOR and inner products run a word at a time, and [`rank`] does plain
//! Gaussian elimination over the packed rows.

/// Machine word used for bit packing.
pub type Word = u64;

/// Bits per packed word.
pub const WORD_BITS: usize = 64;

/// Number of words needed to hold `bits` bits.
pub fn words_for(bits: usize) -> usize {
    (bits + WORD_BITS - 1) / WORD_BITS
}

/// A fixed-length bit vector packed into `u64` words.
///
/// Bits past `len` are kept zero so word-level folds never see garbage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitRow {
    words: Vec<Word>,
    len: usize,
}

impl BitRow {
    /// All-zero row of `len` bits.
    pub fn zeros(len: usize) -> Self {
        BitRow {
            words: vec![0; words_for(len)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, bit: usize) -> bool {
        debug_assert!(bit < self.len);
        self.words[bit / WORD_BITS] >> (bit % WORD_BITS) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, bit: usize, value: bool) {
        debug_assert!(bit < self.len);
        let mask = 1 << (bit % WORD_BITS);
        if value {
            self.words[bit / WORD_BITS] |= mask;
        } else {
            self.words[bit / WORD_BITS] &= !mask;
        }
    }

    #[inline]
    pub fn flip(&mut self, bit: usize) {
        debug_assert!(bit < self.len);
        self.words[bit / WORD_BITS] ^= 1 << (bit % WORD_BITS);
    }

    /// Row operation `self ^= other`.
    pub fn xor_assign(&mut self, other: &BitRow) {
        debug_assert_eq!(self.len, other.len);
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w ^= o;
        }
    }

    /// Overwrite `self` with a copy of `other` without reallocating.
    pub fn copy_from(&mut self, other: &BitRow) {
        debug_assert_eq!(self.len, other.len);
        self.words.copy_from_slice(&other.words);
    }

    /// Reset every bit to zero.
    pub fn clear(&mut self) {
        for w in &mut self.words {
            *w = 0;
        }
    }

    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// GF(2) inner product: parity of the bitwise AND with `other`.
    pub fn and_parity(&self, other: &BitRow) -> bool {
        debug_assert_eq!(self.len, other.len);
        let mut acc: Word = 0;
        for (w, o) in self.words.iter().zip(&other.words) {
            acc ^= w & o;
        }
        acc.count_ones() % 2 == 1
    }

    /// Indices of set bits, ascending.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            let mut rest = w;
            std::iter::from_fn(move || {
                if rest == 0 {
                    None
                } else {
                    let bit = rest.trailing_zeros() as usize;
                    rest &= rest - 1;
                    Some(wi * WORD_BITS + bit)
                }
            })
        })
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }
}

/// Rank of a set of rows over GF(2).
///
/// The rows are cloned into a scratch matrix and forward-eliminated column
/// by column; the input is untouched.
pub fn rank(rows: &[BitRow]) -> usize {
    let mut mat: Vec<BitRow> = rows.to_vec();
    let ncols = match mat.first() {
        Some(r) => r.len(),
        None => return 0,
    };

    let mut pivot_row = 0;
    for col in 0..ncols {
        if pivot_row == mat.len() {
            break;
        }
        let Some(found) = (pivot_row..mat.len()).find(|&r| mat[r].get(col)) else {
            continue;
        };
        mat.swap(pivot_row, found);
        // Clear this column from every other row.
        let pivot = mat[pivot_row].clone();
        for (r, row) in mat.iter_mut().enumerate() {
            if r != pivot_row && row.get(col) {
                row.xor_assign(&pivot);
            }
        }
        pivot_row += 1;
    }
    pivot_row
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn row_from_bits(bits: &[bool]) -> BitRow {
        let mut row = BitRow::zeros(bits.len());
        for (i, &b) in bits.iter().enumerate() {
            row.set(i, b);
        }
        row
    }

    #[test]
    fn test_set_get_roundtrip_across_word_boundary() {
        let mut row = BitRow::zeros(130);
        row.set(0, true);
        row.set(63, true);
        row.set(64, true);
        row.set(129, true);
        assert!(row.get(0) && row.get(63) && row.get(64) && row.get(129));
        assert!(!row.get(1) && !row.get(65) && !row.get(128));
        assert_eq!(row.count_ones(), 4);
    }

    #[test]
    fn test_xor_assign_cancels() {
        let a = row_from_bits(&[true, false, true, true]);
        let mut b = a.clone();
        b.xor_assign(&a);
        assert!(b.is_zero());
    }

    #[test]
    fn test_and_parity_is_gf2_dot_product() {
        let a = row_from_bits(&[true, true, false, true]);
        let b = row_from_bits(&[true, false, false, true]);
        // Overlap on bits 0 and 3, an even count, so parity 0.
        assert!(!a.and_parity(&b));
        let c = row_from_bits(&[true, false, false, false]);
        assert!(a.and_parity(&c));
    }

    #[test]
    fn test_ones_iterates_set_bits_ascending() {
        let mut row = BitRow::zeros(200);
        for &i in &[3, 64, 65, 199] {
            row.set(i, true);
        }
        let got: Vec<usize> = row.ones().collect();
        assert_eq!(got, vec![3, 64, 65, 199]);
    }

    #[test]
    fn test_rank_identity() {
        let rows: Vec<BitRow> = (0..5)
            .map(|i| {
                let mut r = BitRow::zeros(5);
                r.set(i, true);
                r
            })
            .collect();
        assert_eq!(rank(&rows), 5);
    }

    #[test]
    fn test_rank_detects_dependent_rows() {
        let a = row_from_bits(&[true, true, false]);
        let b = row_from_bits(&[false, true, true]);
        let mut c = a.clone();
        c.xor_assign(&b); // c = a + b
        assert_eq!(rank(&[a, b, c]), 2);
    }

    #[test]
    fn test_rank_of_random_matrix_is_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let rows: Vec<BitRow> = (0..8)
                .map(|_| {
                    let mut r = BitRow::zeros(12);
                    for i in 0..12 {
                        r.set(i, rng.gen());
                    }
                    r
                })
                .collect();
            let k = rank(&rows);
            assert!(k <= 8, "rank {} exceeds row count", k);
            // Appending a copy of an existing row never raises the rank.
            let mut extended = rows.clone();
            extended.push(rows[0].clone());
            assert_eq!(rank(&extended), k);
        }
    }
}
