/// One packed bitfield window inside a descriptor word array.
///
/// `offset..offset + width` must stay within one 32-bit word; callers are
/// responsible for in-range specs (all specs in this crate are `const` and
/// checked by the disjointness tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub word: usize,
    pub offset: u32,
    pub width: u32,
}

impl FieldSpec {
    pub const fn new(word: usize, offset: u32, width: u32) -> Self {
        Self {
            word,
            offset,
            width,
        }
    }

    const fn mask(self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    /// Writes `value & mask(width)` into the window, leaving every other bit
    /// of the word untouched.
    pub fn set(self, words: &mut [u32], value: u32) {
        let mask = self.mask();
        words[self.word] =
            (words[self.word] & !(mask << self.offset)) | ((value & mask) << self.offset);
    }

    /// Extracts and right-aligns the window.
    pub fn get(self, words: &[u32]) -> u32 {
        (words[self.word] >> self.offset) & self.mask()
    }

    /// Index-selected variant living in the high/low half of the same word
    /// (`offset += 16 * index`). Used by the per-TTBR context descriptor
    /// fields (TSZ/TG/EPD).
    pub const fn half_word_select(self, index: usize) -> Self {
        Self {
            word: self.word,
            offset: self.offset + 16 * index as u32,
            width: self.width,
        }
    }

    /// Index-selected variant living one word pair further on
    /// (`word += 2 * index`). Used by the per-TTBR word-pair fields
    /// (TTB/HAD).
    pub const fn word_pair_select(self, index: usize) -> Self {
        Self {
            word: self.word + 2 * index,
            offset: self.offset,
            width: self.width,
        }
    }

    /// Whether two windows share any bit of the same word.
    pub fn overlaps(self, other: FieldSpec) -> bool {
        self.word == other.word
            && self.offset < other.offset + other.width
            && other.offset < self.offset + self.width
    }
}

/// A 48-bit physical-address field split across two adjacent words.
///
/// The low word holds `addr[31:4]` in its bits `[31:4]` (bits `[3:0]` are
/// reserved and preserved on write; the address must be 16-byte aligned); the
/// next word holds `addr[47:32]` in its low `hi_width` bits. Decoding inverts
/// the split exactly for aligned addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WideField {
    pub lo_word: usize,
    pub hi_width: u32,
}

const LO_ADDR_MASK: u32 = 0xffff_fff0;

impl WideField {
    pub const fn new(lo_word: usize, hi_width: u32) -> Self {
        Self { lo_word, hi_width }
    }

    const fn hi_mask(self) -> u32 {
        (1u32 << self.hi_width) - 1
    }

    pub fn set(self, words: &mut [u32], addr: u64) {
        let hi_mask = self.hi_mask();
        words[self.lo_word] = (words[self.lo_word] & !LO_ADDR_MASK) | (addr as u32 & LO_ADDR_MASK);
        words[self.lo_word + 1] =
            (words[self.lo_word + 1] & !hi_mask) | ((addr >> 32) as u32 & hi_mask);
    }

    pub fn get(self, words: &[u32]) -> u64 {
        let hi = (words[self.lo_word + 1] & self.hi_mask()) as u64;
        let lo = (words[self.lo_word] & LO_ADDR_MASK) as u64;
        (hi << 32) | lo
    }

    /// Word-pair selected variant (`lo_word += 2 * index`), for CD TTB0/TTB1.
    pub const fn word_pair_select(self, index: usize) -> Self {
        Self {
            lo_word: self.lo_word + 2 * index,
            hi_width: self.hi_width,
        }
    }

    /// The two windows this field occupies, for disjointness checks.
    pub const fn windows(self) -> [FieldSpec; 2] {
        [
            FieldSpec::new(self.lo_word, 4, 28),
            FieldSpec::new(self.lo_word + 1, 0, self.hi_width),
        ]
    }
}
