//! Feature-inclusion masks.
//!
//! A `Model` is a fixed-length bit vector over the candidate features: bit `i`
//! set means column `i` of the design matrix takes part in the fit. The length
//! is fixed at construction; every operation preserves it.
//!
//! Bits are packed into `u64` words. The unused high bits of the last word are
//! always zero so that `count_ones` and equality work word-wise.

use std::fmt;

const WORD_BITS: usize = 64;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Model {
    words: Box<[u64]>,
    len: usize,
}

impl Model {
    /// All-false mask of `len` features.
    pub fn empty(len: usize) -> Self {
        Self {
            words: vec![0u64; len.div_ceil(WORD_BITS)].into_boxed_slice(),
            len,
        }
    }

    pub fn from_bools(bits: &[bool]) -> Self {
        let mut model = Self::empty(bits.len());
        for (i, &on) in bits.iter().enumerate() {
            if on {
                model.set(i, true);
            }
        }
        model
    }

    /// Build a mask from a list of selected feature indices.
    ///
    /// Returns `None` if any index is out of range.
    pub fn from_selected(selected: &[usize], len: usize) -> Option<Self> {
        let mut model = Self::empty(len);
        for &i in selected {
            if i >= len {
                return None;
            }
            model.set(i, true);
        }
        Some(model)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// # Panics
    /// Panics if `index >= self.len()`.
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.len, "bit {index} out of range for model of {} features", self.len);
        self.words[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
    }

    /// # Panics
    /// Panics if `index >= self.len()`.
    pub fn set(&mut self, index: usize, on: bool) {
        assert!(index < self.len, "bit {index} out of range for model of {} features", self.len);
        let mask = 1u64 << (index % WORD_BITS);
        if on {
            self.words[index / WORD_BITS] |= mask;
        } else {
            self.words[index / WORD_BITS] &= !mask;
        }
    }

    pub fn flip(&mut self, index: usize) {
        let on = self.get(index);
        self.set(index, !on);
    }

    /// Number of selected features.
    pub fn num_features(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Greatest common completion: bits `[0, start)` kept, bits `[start, len)` set.
    pub fn gcs(&self, start: usize) -> Self {
        let mut out = self.clone();
        for i in start.min(self.len)..self.len {
            out.set(i, true);
        }
        out
    }

    /// Least common completion: bits `[0, start)` kept, bits `[start, len)` cleared.
    pub fn lcs(&self, start: usize) -> Self {
        let mut out = self.clone();
        for i in start.min(self.len)..self.len {
            out.set(i, false);
        }
        out
    }

    /// Indices of the selected features, ascending.
    pub fn selected(&self) -> Vec<usize> {
        (0..self.len).filter(|&i| self.get(i)).collect()
    }

    pub fn to_bools(&self) -> Vec<bool> {
        (0..self.len).map(|i| self.get(i)).collect()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Model(")?;
        for i in 0..self.len {
            f.write_str(if self.get(i) { "1" } else { "0" })?;
        }
        write!(f, ")")
    }
}
