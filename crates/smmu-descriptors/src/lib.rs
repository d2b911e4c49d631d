#![forbid(unsafe_code)]

//! In-memory SMMU configuration descriptors (64-byte stream table entries and
//! context descriptors) as packed little-endian `u32` word arrays.
//!
//! Field layouts are table-driven: every field is a [`FieldSpec`] (word index,
//! bit offset, bit width) or a [`WideField`] (48-bit physical address split
//! across two words), and the typed accessors on [`Ste`] and [`Cd`] are thin
//! specializations of the generic get/set pair. Values wider than a field are
//! silently truncated to the field width; this is a best-effort encoding
//! layer, not a validating API.

mod cd;
mod field;
mod ste;

pub use cd::{Cd, CD_FIELDS};
pub use field::{FieldSpec, WideField};
pub use ste::{Ste, StreamConfig, STE_FIELDS};

/// Number of 32-bit words in a stream table entry or context descriptor.
pub const DESC_WORDS: usize = 16;
/// Byte size of a serialized descriptor.
pub const DESC_BYTES: usize = DESC_WORDS * 4;

fn words_to_bytes(words: &[u32; DESC_WORDS]) -> [u8; DESC_BYTES] {
    let mut out = [0u8; DESC_BYTES];
    for (i, word) in words.iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }
    out
}

fn bytes_to_words(bytes: &[u8; DESC_BYTES]) -> [u32; DESC_WORDS] {
    let mut out = [0u32; DESC_WORDS];
    for (i, word) in out.iter_mut().enumerate() {
        let off = i * 4;
        *word = u32::from_le_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]]);
    }
    out
}
