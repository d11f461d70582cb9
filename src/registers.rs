//! Fixed-size packed register storage.
//!
//! Registers are packed `W = 6` bits wide into a `u32` word array allocated
//! once at construction. Six bits fit the largest possible rank `32 - 4 + 1`
//! at the lowest supported precision. The number of zero registers and the
//! harmonic sum of all registers are maintained incrementally on every
//! update, so estimation never has to scan the array.

/// Register width in bits.
const REGISTER_WIDTH: usize = 6;

#[derive(Clone, Debug)]
pub(crate) struct Registers {
    /// Packed register words plus one spare trailing word, allowing every
    /// register access to read a two-word window without a bounds branch.
    words: Box<[u32]>,
    /// Number of registers.
    count: usize,
    /// Number of registers still set to zero.
    zeros: u32,
    /// Harmonic sum of registers: `sum(2^-registers[i])`.
    sum: f64,
}

impl Registers {
    /// Create `count` zeroed registers.
    pub(crate) fn new(count: usize) -> Self {
        let words = (count * REGISTER_WIDTH).div_ceil(32) + 1;
        Self {
            words: vec![0u32; words].into_boxed_slice(),
            count,
            zeros: count as u32,
            sum: count as f64,
        }
    }

    /// Return number of registers.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.count
    }

    /// Return number of registers still set to zero.
    #[inline]
    pub(crate) fn zeros(&self) -> u32 {
        self.zeros
    }

    /// Return harmonic sum of registers.
    #[inline]
    pub(crate) fn harmonic_sum(&self) -> f64 {
        self.sum
    }

    /// Get register `idx` value.
    #[inline]
    pub(crate) fn get(&self, idx: usize) -> u32 {
        let bit_idx = idx * REGISTER_WIDTH;
        let word_idx = bit_idx / 32;
        let bit_pos = bit_idx % 32;
        let bits = &self.words[word_idx..word_idx + 2];
        let bits_1 = REGISTER_WIDTH.min(32 - bit_pos);
        let bits_2 = REGISTER_WIDTH - bits_1;
        let mask_1 = (1u32 << bits_1) - 1;
        let mask_2 = (1u32 << bits_2) - 1;

        ((bits[0] >> bit_pos) & mask_1) | ((bits[1] & mask_2) << bits_1)
    }

    /// Raise register `idx` to `rank` when larger than the current value,
    /// keeping the zero-register count and harmonic sum in sync.
    /// Registers never decrease.
    #[inline]
    pub(crate) fn update_max(&mut self, idx: usize, rank: u32) {
        let old_rank = self.get(idx);
        if rank <= old_rank {
            return;
        }
        self.set(idx, rank);
        self.zeros -= u32::from(old_rank == 0);
        self.sum -= 1.0 / ((1u64 << old_rank) as f64);
        self.sum += 1.0 / ((1u64 << rank) as f64);
    }

    /// Set register `idx` to `rank`, spread across a two-word window.
    #[inline]
    fn set(&mut self, idx: usize, rank: u32) {
        let bit_idx = idx * REGISTER_WIDTH;
        let word_idx = bit_idx / 32;
        let bit_pos = bit_idx % 32;
        let bits = &mut self.words[word_idx..word_idx + 2];
        let bits_1 = REGISTER_WIDTH.min(32 - bit_pos);
        let bits_2 = REGISTER_WIDTH - bits_1;
        let mask_1 = (1u32 << bits_1) - 1;
        let mask_2 = (1u32 << bits_2) - 1;

        // Unconditionally update both words based on `rank` bits and masks
        bits[0] &= !(mask_1 << bit_pos);
        bits[0] |= (rank & mask_1) << bit_pos;
        bits[1] &= !mask_2;
        bits[1] |= (rank >> bits_1) & mask_2;
    }
}

impl PartialEq for Registers {
    /// Register equality is defined by register contents only; the cached
    /// zero count and harmonic sum are derived from them.
    fn eq(&self, rhs: &Self) -> bool {
        self.count == rhs.count && self.words == rhs.words
    }
}
