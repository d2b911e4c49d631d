use crate::field::{FieldSpec, WideField};
use crate::{bytes_to_words, words_to_bytes, DESC_BYTES, DESC_WORDS};

const VALID: FieldSpec = FieldSpec::new(0, 0, 1);
const CONFIG: FieldSpec = FieldSpec::new(0, 1, 3);
const S1FMT: FieldSpec = FieldSpec::new(0, 4, 2);
// The stage-1 context pointer occupies word 0 bits [31:6] and is stored
// in place (the address masked to its 64-byte alignment), not right-shifted.
const S1CTXPTR_WINDOW: FieldSpec = FieldSpec::new(0, 6, 26);
const S1CTXPTR_MASK: u32 = 0xffff_ffc0;
const S1CDMAX: FieldSpec = FieldSpec::new(1, 27, 5);
const NSCFG: FieldSpec = FieldSpec::new(2, 14, 2);
const S1STALLD: FieldSpec = FieldSpec::new(2, 27, 1);
const EATS: FieldSpec = FieldSpec::new(2, 28, 2);
const STRW: FieldSpec = FieldSpec::new(2, 30, 2);
const S2VMID: FieldSpec = FieldSpec::new(4, 0, 16);
const S2T0SZ: FieldSpec = FieldSpec::new(5, 0, 6);
const S2SL0: FieldSpec = FieldSpec::new(5, 6, 2);
const S2TG: FieldSpec = FieldSpec::new(5, 14, 2);
const S2PS: FieldSpec = FieldSpec::new(5, 16, 3);
const S2AA64: FieldSpec = FieldSpec::new(5, 19, 1);
const S2ENDI: FieldSpec = FieldSpec::new(5, 20, 1);
const S2AFFD: FieldSpec = FieldSpec::new(5, 21, 1);
const S2HD: FieldSpec = FieldSpec::new(5, 23, 1);
const S2HA: FieldSpec = FieldSpec::new(5, 24, 1);
const S2S: FieldSpec = FieldSpec::new(5, 25, 1);
const S2R: FieldSpec = FieldSpec::new(5, 26, 1);
const S2TTB: WideField = WideField::new(6, 16);
// Secondary stage-2 block, used when stage-1 table walks are themselves
// remapped through stage 2.
const S_S2T0SZ: FieldSpec = FieldSpec::new(9, 0, 6);
const S_S2SL0: FieldSpec = FieldSpec::new(9, 6, 2);
const S_S2TG: FieldSpec = FieldSpec::new(9, 14, 2);
const S_S2PS: FieldSpec = FieldSpec::new(9, 16, 3);
const S_S2TTB: WideField = WideField::new(12, 16);

/// Every narrow STE field window, named, for disjointness checks and
/// table-driven round-trip tests. Wide TTB fields contribute their two
/// windows.
pub const STE_FIELDS: &[(&str, FieldSpec)] = &[
    ("V", VALID),
    ("CONFIG", CONFIG),
    ("S1FMT", S1FMT),
    ("S1CTXPTR", S1CTXPTR_WINDOW),
    ("S1CDMAX", S1CDMAX),
    ("NSCFG", NSCFG),
    ("S1STALLD", S1STALLD),
    ("EATS", EATS),
    ("STRW", STRW),
    ("S2VMID", S2VMID),
    ("S2T0SZ", S2T0SZ),
    ("S2SL0", S2SL0),
    ("S2TG", S2TG),
    ("S2PS", S2PS),
    ("S2AA64", S2AA64),
    ("S2ENDI", S2ENDI),
    ("S2AFFD", S2AFFD),
    ("S2HD", S2HD),
    ("S2HA", S2HA),
    ("S2S", S2S),
    ("S2R", S2R),
    ("S2TTB[31:4]", S2TTB.windows()[0]),
    ("S2TTB[47:32]", S2TTB.windows()[1]),
    ("S_S2T0SZ", S_S2T0SZ),
    ("S_S2SL0", S_S2SL0),
    ("S_S2TG", S_S2TG),
    ("S_S2PS", S_S2PS),
    ("S_S2TTB[31:4]", S_S2TTB.windows()[0]),
    ("S_S2TTB[47:32]", S_S2TTB.windows()[1]),
];

/// STE.Config: which translation stages apply to the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamConfig {
    Abort = 0b000,
    Bypass = 0b100,
    Stage1Only = 0b101,
    Stage2Only = 0b110,
    Nested = 0b111,
}

impl StreamConfig {
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0b000 => Some(Self::Abort),
            0b100 => Some(Self::Bypass),
            0b101 => Some(Self::Stage1Only),
            0b110 => Some(Self::Stage2Only),
            0b111 => Some(Self::Nested),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        self as u32
    }

    pub fn stage1_enabled(self) -> bool {
        matches!(self, Self::Stage1Only | Self::Nested)
    }

    pub fn stage2_enabled(self) -> bool {
        matches!(self, Self::Stage2Only | Self::Nested)
    }
}

/// Stream table entry: per-stream translation configuration as sixteen
/// little-endian 32-bit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ste {
    words: [u32; DESC_WORDS],
}

impl Ste {
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

    pub fn set_config(&mut self, config: StreamConfig) {
        CONFIG.set(&mut self.words, config.bits());
    }

    pub fn config(&self) -> Option<StreamConfig> {
        StreamConfig::from_bits(CONFIG.get(&self.words))
    }

    pub fn set_s1fmt(&mut self, fmt: u32) {
        S1FMT.set(&mut self.words, fmt);
    }

    pub fn s1fmt(&self) -> u32 {
        S1FMT.get(&self.words)
    }

    /// Sets the context descriptor base address (64-byte aligned; low 6 bits
    /// are dropped).
    pub fn set_s1_ctx_ptr(&mut self, addr: u64) {
        self.words[0] = (self.words[0] & !S1CTXPTR_MASK) | (addr as u32 & S1CTXPTR_MASK);
    }

    pub fn s1_ctx_ptr(&self) -> u64 {
        (self.words[0] & S1CTXPTR_MASK) as u64
    }

    pub fn set_s1cdmax(&mut self, cdmax: u32) {
        S1CDMAX.set(&mut self.words, cdmax);
    }

    pub fn set_nscfg(&mut self, nscfg: u32) {
        NSCFG.set(&mut self.words, nscfg);
    }

    pub fn set_s1stalld(&mut self, stalld: bool) {
        S1STALLD.set(&mut self.words, stalld as u32);
    }

    pub fn set_eats(&mut self, eats: u32) {
        EATS.set(&mut self.words, eats);
    }

    pub fn set_strw(&mut self, strw: u32) {
        STRW.set(&mut self.words, strw);
    }

    pub fn set_s2vmid(&mut self, vmid: u32) {
        S2VMID.set(&mut self.words, vmid);
    }

    pub fn s2vmid(&self) -> u32 {
        S2VMID.get(&self.words)
    }

    pub fn set_s2t0sz(&mut self, t0sz: u32) {
        S2T0SZ.set(&mut self.words, t0sz);
    }

    pub fn s2t0sz(&self) -> u32 {
        S2T0SZ.get(&self.words)
    }

    pub fn set_s2sl0(&mut self, sl0: u32) {
        S2SL0.set(&mut self.words, sl0);
    }

    pub fn s2sl0(&self) -> u32 {
        S2SL0.get(&self.words)
    }

    pub fn set_s2tg(&mut self, tg: u32) {
        S2TG.set(&mut self.words, tg);
    }

    pub fn s2tg(&self) -> u32 {
        S2TG.get(&self.words)
    }

    pub fn set_s2ps(&mut self, ps: u32) {
        S2PS.set(&mut self.words, ps);
    }

    pub fn s2ps(&self) -> u32 {
        S2PS.get(&self.words)
    }

    pub fn set_s2aa64(&mut self, aa64: bool) {
        S2AA64.set(&mut self.words, aa64 as u32);
    }

    pub fn s2aa64(&self) -> bool {
        S2AA64.get(&self.words) != 0
    }

    pub fn set_s2endi(&mut self, big_endian: bool) {
        S2ENDI.set(&mut self.words, big_endian as u32);
    }

    pub fn set_s2affd(&mut self, affd: bool) {
        S2AFFD.set(&mut self.words, affd as u32);
    }

    pub fn set_s2hd(&mut self, hd: bool) {
        S2HD.set(&mut self.words, hd as u32);
    }

    pub fn set_s2ha(&mut self, ha: bool) {
        S2HA.set(&mut self.words, ha as u32);
    }

    pub fn set_s2s(&mut self, stall: bool) {
        S2S.set(&mut self.words, stall as u32);
    }

    pub fn set_s2r(&mut self, record: bool) {
        S2R.set(&mut self.words, record as u32);
    }

    pub fn set_s2ttb(&mut self, addr: u64) {
        S2TTB.set(&mut self.words, addr);
    }

    pub fn s2ttb(&self) -> u64 {
        S2TTB.get(&self.words)
    }

    pub fn set_s_s2t0sz(&mut self, t0sz: u32) {
        S_S2T0SZ.set(&mut self.words, t0sz);
    }

    pub fn s_s2t0sz(&self) -> u32 {
        S_S2T0SZ.get(&self.words)
    }

    pub fn set_s_s2sl0(&mut self, sl0: u32) {
        S_S2SL0.set(&mut self.words, sl0);
    }

    pub fn s_s2sl0(&self) -> u32 {
        S_S2SL0.get(&self.words)
    }

    pub fn set_s_s2tg(&mut self, tg: u32) {
        S_S2TG.set(&mut self.words, tg);
    }

    pub fn s_s2tg(&self) -> u32 {
        S_S2TG.get(&self.words)
    }

    pub fn set_s_s2ps(&mut self, ps: u32) {
        S_S2PS.set(&mut self.words, ps);
    }

    pub fn s_s2ps(&self) -> u32 {
        S_S2PS.get(&self.words)
    }

    pub fn set_s_s2ttb(&mut self, addr: u64) {
        S_S2TTB.set(&mut self.words, addr);
    }

    pub fn s_s2ttb(&self) -> u64 {
        S_S2TTB.get(&self.words)
    }
}
