use crate::field::{FieldSpec, WideField};
use crate::{bytes_to_words, words_to_bytes, DESC_BYTES, DESC_WORDS};

// Per-TTBR fields are selector-parameterized: TSZ/TG/EPD live in the low half
// of word 0 for TTBR0 and the high half for TTBR1 (`offset += 16 * i`);
// TTB/HAD live one word pair further on for TTBR1 (`word += 2 * i`).
const TSZ: FieldSpec = FieldSpec::new(0, 0, 6);
const TG: FieldSpec = FieldSpec::new(0, 6, 2);
const EPD: FieldSpec = FieldSpec::new(0, 14, 1);
const ENDI: FieldSpec = FieldSpec::new(0, 15, 1);
const VALID: FieldSpec = FieldSpec::new(0, 31, 1);
const IPS: FieldSpec = FieldSpec::new(1, 0, 3);
const AFFD: FieldSpec = FieldSpec::new(1, 3, 1);
const TBI: FieldSpec = FieldSpec::new(1, 6, 2);
const AARCH64: FieldSpec = FieldSpec::new(1, 9, 1);
const HD: FieldSpec = FieldSpec::new(1, 10, 1);
const HA: FieldSpec = FieldSpec::new(1, 11, 1);
const STALL: FieldSpec = FieldSpec::new(1, 12, 1);
const RECORD: FieldSpec = FieldSpec::new(1, 13, 1);
const AFLAG: FieldSpec = FieldSpec::new(1, 14, 1);
const ASID: FieldSpec = FieldSpec::new(1, 16, 16);
const TTB: WideField = WideField::new(2, 19);
const HAD: FieldSpec = FieldSpec::new(2, 1, 1);

/// Every narrow CD field window with both selector instantiations, for
/// disjointness checks and table-driven round-trip tests.
pub const CD_FIELDS: &[(&str, FieldSpec)] = &[
    ("TSZ0", TSZ),
    ("TSZ1", TSZ.half_word_select(1)),
    ("TG0", TG),
    ("TG1", TG.half_word_select(1)),
    ("EPD0", EPD),
    ("EPD1", EPD.half_word_select(1)),
    ("ENDI", ENDI),
    ("V", VALID),
    ("IPS", IPS),
    ("AFFD", AFFD),
    ("TBI", TBI),
    ("AA64", AARCH64),
    ("HD", HD),
    ("HA", HA),
    ("S", STALL),
    ("R", RECORD),
    ("A", AFLAG),
    ("ASID", ASID),
    ("TTB0[31:4]", TTB.windows()[0]),
    ("TTB0[47:32]", TTB.windows()[1]),
    ("HAD0", HAD),
    ("TTB1[31:4]", TTB.word_pair_select(1).windows()[0]),
    ("TTB1[47:32]", TTB.word_pair_select(1).windows()[1]),
    ("HAD1", HAD.word_pair_select(1)),
];

/// Context descriptor: one stage-1 translation context as sixteen
/// little-endian 32-bit words.
///
/// `ttbr` arguments select between the two translation-table-base entries
/// (0 or 1) and must be in range; the fixed selector arithmetic is part of
/// the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cd {
    words: [u32; DESC_WORDS],
}

impl Cd {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_words(words: [u32; DESC_WORDS]) -> Self {
        Self { words }
    }

    pub fn from_bytes(bytes: &[u8; DESC_BYTES]) -> Self {
        Self {
            words: bytes_to_words(bytes),
        }
    }

    pub fn words(&self) -> &[u32; DESC_WORDS] {
        &self.words
    }

    pub fn to_bytes(&self) -> [u8; DESC_BYTES] {
        words_to_bytes(&self.words)
    }

    pub fn set_valid(&mut self, valid: bool) {
        VALID.set(&mut self.words, valid as u32);
    }

    pub fn valid(&self) -> bool {
        VALID.get(&self.words) != 0
    }

    pub fn set_tsz(&mut self, ttbr: usize, tsz: u32) {
        TSZ.half_word_select(ttbr).set(&mut self.words, tsz);
    }

    pub fn tsz(&self, ttbr: usize) -> u32 {
        TSZ.half_word_select(ttbr).get(&self.words)
    }

    pub fn set_tg(&mut self, ttbr: usize, tg: u32) {
        TG.half_word_select(ttbr).set(&mut self.words, tg);
    }

    pub fn tg(&self, ttbr: usize) -> u32 {
        TG.half_word_select(ttbr).get(&self.words)
    }

    pub fn set_epd(&mut self, ttbr: usize, disabled: bool) {
        EPD.half_word_select(ttbr).set(&mut self.words, disabled as u32);
    }

    pub fn epd(&self, ttbr: usize) -> bool {
        EPD.half_word_select(ttbr).get(&self.words) != 0
    }

    pub fn set_endi(&mut self, big_endian: bool) {
        ENDI.set(&mut self.words, big_endian as u32);
    }

    pub fn set_ips(&mut self, ips: u32) {
        IPS.set(&mut self.words, ips);
    }

    pub fn ips(&self) -> u32 {
        IPS.get(&self.words)
    }

    pub fn set_affd(&mut self, affd: bool) {
        AFFD.set(&mut self.words, affd as u32);
    }

    pub fn set_tbi(&mut self, tbi: u32) {
        TBI.set(&mut self.words, tbi);
    }

    pub fn set_aarch64(&mut self, aa64: bool) {
        AARCH64.set(&mut self.words, aa64 as u32);
    }

    pub fn aarch64(&self) -> bool {
        AARCH64.get(&self.words) != 0
    }

    pub fn set_hd(&mut self, hd: bool) {
        HD.set(&mut self.words, hd as u32);
    }

    pub fn set_ha(&mut self, ha: bool) {
        HA.set(&mut self.words, ha as u32);
    }

    pub fn set_stall(&mut self, stall: bool) {
        STALL.set(&mut self.words, stall as u32);
    }

    pub fn set_record(&mut self, record: bool) {
        RECORD.set(&mut self.words, record as u32);
    }

    pub fn set_aflag(&mut self, aflag: bool) {
        AFLAG.set(&mut self.words, aflag as u32);
    }

    pub fn set_asid(&mut self, asid: u32) {
        ASID.set(&mut self.words, asid);
    }

    pub fn asid(&self) -> u32 {
        ASID.get(&self.words)
    }

    pub fn set_ttb(&mut self, ttbr: usize, addr: u64) {
        TTB.word_pair_select(ttbr).set(&mut self.words, addr);
    }

    pub fn ttb(&self, ttbr: usize) -> u64 {
        TTB.word_pair_select(ttbr).get(&self.words)
    }

    pub fn set_had(&mut self, ttbr: usize, had: bool) {
        HAD.word_pair_select(ttbr).set(&mut self.words, had as u32);
    }

    pub fn had(&self, ttbr: usize) -> bool {
        HAD.word_pair_select(ttbr).get(&self.words) != 0
    }

    pub fn set_mair0(&mut self, mair0: u32) {
        self.words[6] = mair0;
    }

    pub fn set_mair1(&mut self, mair1: u32) {
        self.words[7] = mair1;
    }
}
