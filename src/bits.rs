// Packed bit set over bucket indices.
//
// Words are LSB-first. The set has a fixed bit length chosen at creation;
// indices past it panic, like slice indexing.

/// Fixed-length packed bit set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitSet {
    words: Vec<usize>,
    len: usize,
}

const WORD_BITS: usize = usize::BITS as usize;

impl BitSet {
    /// A set able to hold bits `0..len`, all clear.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    #[inline]
    pub fn set(&mut self, index: usize) {
        assert!(index < self.len, "bit {index} out of range {}", self.len);
        self.words[index / WORD_BITS] |= 1 << (index % WORD_BITS);
    }

    #[inline]
    pub fn test(&self, index: usize) -> bool {
        index < self.len && self.words[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }
}

impl Extend<usize> for BitSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for i in iter {
            self.set(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_test_across_words() {
        let mut b = BitSet::new(130);
        assert!(!b.test(0));
        b.set(0);
        b.set(64);
        b.set(129);
        assert!(b.test(0) && b.test(64) && b.test(129));
        assert!(!b.test(1));
        assert!(!b.test(63));
    }

    #[test]
    fn out_of_range_test_is_false() {
        let b = BitSet::new(8);
        assert!(!b.test(8));
        assert!(!b.test(500));
    }

    #[test]
    fn extend_sets_every_index() {
        let mut b = BitSet::new(200);
        b.extend([199, 3, 63, 64, 128]);
        for i in 0..200 {
            assert_eq!(b.test(i), [3, 63, 64, 128, 199].contains(&i), "bit {i}");
        }
    }

    #[test]
    #[should_panic]
    fn out_of_range_set_panics() {
        BitSet::new(8).set(8);
    }
}
