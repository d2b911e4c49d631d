#![forbid(unsafe_code)]

//! Address arithmetic for 4-level, 4 KiB-granule translation table walks.
//!
//! Everything here is pure: given an input address, a starting level and a
//! translation-table base, these helpers compute per-level indices and the
//! physical byte address of each table entry. No memory is touched — the
//! scenario builders call [`plan_walk`] with the entry values they intend to
//! write, and a live walker (the translation unit itself) would perform the
//! same arithmetic at evaluation time.
//!
//! Both translation stages use the same arithmetic; in a nested
//! configuration the caller simply runs one walk per stage, feeding stage-1
//! intermediate addresses through a second stage-2 walk. Table reuse/aliasing
//! between walks is deliberately unrestricted.

use bitflags::bitflags;

/// Page/granule size covered by a level-3 entry.
pub const GRANULE: u64 = 4096;
/// Bits of the input address consumed per level.
pub const BITS_PER_LEVEL: u32 = 9;
/// Deepest (leaf) table level.
pub const LEAF_LEVEL: u8 = 3;

/// Offset-within-page mask.
pub const PAGE_OFFSET_MASK: u64 = GRANULE - 1;

/// Output-address field of a table or page entry: bits [47:12].
const PTE_ADDR_MASK: u64 = 0x0000_ffff_ffff_f000;

bitflags! {
    /// Attribute bits of a 64-bit translation table entry.
    ///
    /// Only the bits the test scenarios exercise are named. Bits [7:6] are
    /// S2AP in a stage-2 entry and AP[2:1] in a stage-1 entry; the scenarios
    /// share tables between stages, so the same values serve both readings.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PteFlags: u64 {
        const VALID = 1 << 0;
        /// Set on next-level table pointers and level-3 page entries alike.
        const TABLE_OR_PAGE = 1 << 1;
        const NS = 1 << 5;
        const S2AP_READ = 1 << 6;
        const S2AP_WRITE = 1 << 7;
        const SH_INNER = 0b11 << 8;
        const AF = 1 << 10;
        /// Software-reserved tag bit the scenarios stamp on every leaf so a
        /// walked entry is distinguishable from stale memory contents.
        const SW_TAG = 1 << 58;
    }
}

impl PteFlags {
    /// Leaf attributes of the `0x..743` entries: valid page, S2AP =
    /// read-only (read as AP[2:1] = 0b01 by stage 1), inner shareable, AF
    /// set, tagged.
    pub fn leaf_read_only() -> Self {
        Self::VALID | Self::TABLE_OR_PAGE | Self::S2AP_READ | Self::SH_INNER | Self::AF | Self::SW_TAG
    }

    /// Leaf attributes of the `0x..7c3` entries: as above but read-write.
    pub fn leaf_read_write() -> Self {
        Self::leaf_read_only() | Self::S2AP_WRITE
    }
}

/// Builds a next-level table descriptor (low bits `0b11`).
pub fn table_pte(next_table_base: u64) -> u64 {
    (next_table_base & PTE_ADDR_MASK) | (PteFlags::VALID | PteFlags::TABLE_OR_PAGE).bits()
}

/// Builds a level-3 page descriptor mapping `page_base` with `flags`.
pub fn page_pte(page_base: u64, flags: PteFlags) -> u64 {
    (page_base & PTE_ADDR_MASK) | flags.bits()
}

/// Shift of the index field for `level` within the input address.
pub const fn level_shift(level: u8) -> u32 {
    12 + BITS_PER_LEVEL * (LEAF_LEVEL - level) as u32
}

/// 9-bit table index for `level` extracted from the input address.
pub const fn level_index(addr: u64, level: u8) -> u64 {
    (addr >> level_shift(level)) & ((1 << BITS_PER_LEVEL) - 1)
}

/// Byte address of the entry consulted at `level` when walking from a table
/// at `table_base`.
pub const fn entry_addr(table_base: u64, addr: u64, level: u8) -> u64 {
    (table_base & !PAGE_OFFSET_MASK) + level_index(addr, level) * 8
}

/// Table base designated by a next-level table entry.
pub const fn next_table_base(pte: u64) -> u64 {
    pte & PTE_ADDR_MASK
}

/// Output address of a level-3 page entry for the given input address: the
/// entry's page base plus the input's low 12 bits.
pub const fn page_output(pte: u64, addr: u64) -> u64 {
    (pte & PTE_ADDR_MASK) | (addr & PAGE_OFFSET_MASK)
}

/// One step of a planned walk: the level, the index consumed from the input
/// address, and the physical byte address of the entry at that level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkStep {
    pub level: u8,
    pub index: u64,
    pub entry_addr: u64,
}

/// Plans the entry addresses of a walk whose entry *values* are chosen by the
/// caller.
///
/// `entries[n]` is the value that will sit at step `n`'s entry address; the
/// table base of step `n + 1` is derived from it. The walk covers
/// `start_level..=3`, so `entries` must hold `4 - start_level` values.
pub fn plan_walk(ttb: u64, addr: u64, start_level: u8, entries: &[u64]) -> Vec<WalkStep> {
    assert!(start_level <= LEAF_LEVEL);
    assert_eq!(entries.len(), (LEAF_LEVEL - start_level + 1) as usize);

    let mut steps = Vec::with_capacity(entries.len());
    let mut table_base = ttb;
    for (n, entry) in entries.iter().enumerate() {
        let level = start_level + n as u8;
        steps.push(WalkStep {
            level,
            index: level_index(addr, level),
            entry_addr: entry_addr(table_base, addr, level),
        });
        table_base = next_table_base(*entry);
    }
    steps
}

/// T0SZ encoding for an input-address size in bits.
pub const fn t0sz(input_bits: u32) -> u32 {
    64 - input_bits
}

/// SL0 encoding of the stage-2 starting level for the 4 KiB granule
/// (`0b10` = level 0, `0b01` = level 1, `0b00` = level 2).
pub const fn sl0(start_level: u8) -> u32 {
    2 - start_level as u32
}

/// Starting level designated by an SL0 encoding, if valid for 4 KiB.
pub const fn start_level_from_sl0(sl0: u32) -> Option<u8> {
    match sl0 {
        0b10 => Some(0),
        0b01 => Some(1),
        0b00 => Some(2),
        _ => None,
    }
}

/// TG/TG0 encoding of the 4 KiB granule.
pub const TG_4K: u32 = 0b00;
/// PS/IPS encoding of a 44-bit output size.
pub const PS_44_BITS: u32 = 0b100;
/// PS/IPS encoding of a 48-bit output size.
pub const PS_48_BITS: u32 = 0b101;

#[cfg(test)]
mod tests {
    use super::*;

    const IOVA: u64 = 0x80_8060_4567;

    #[test]
    fn level_indices_match_shift_and_mask() {
        assert_eq!(level_index(IOVA, 0), (IOVA >> 39) & 0x1ff);
        assert_eq!(level_index(IOVA, 1), (IOVA >> 30) & 0x1ff);
        assert_eq!(level_index(IOVA, 2), (IOVA >> 21) & 0x1ff);
        assert_eq!(level_index(IOVA, 3), (IOVA >> 12) & 0x1ff);

        assert_eq!(level_index(IOVA, 0), 0x1);
        assert_eq!(level_index(IOVA, 1), 0x2);
        assert_eq!(level_index(IOVA, 2), 0x3);
        assert_eq!(level_index(IOVA, 3), 0x4);
    }

    #[test]
    fn planned_walk_chains_table_bases_through_entries() {
        let entries = [
            0x0000_0000_0e4d_1003,
            0x0000_0000_0e4d_2003,
            0x0000_0000_0e4d_3003,
            0x0400_0000_0ecb_a743,
        ];
        let steps = plan_walk(0x0e4d_0000, IOVA, 0, &entries);

        let addrs: Vec<u64> = steps.iter().map(|s| s.entry_addr).collect();
        assert_eq!(addrs, [0x0e4d_0008, 0x0e4d_1010, 0x0e4d_2018, 0x0e4d_3020]);

        assert_eq!(page_output(entries[3], IOVA), 0x0ecb_a567);
    }

    #[test]
    fn entry_addr_ignores_table_base_low_bits() {
        // Table pointers carry their type bits in [1:0]; the walk must mask
        // the full page offset before indexing.
        assert_eq!(
            entry_addr(0x0e4d_1003, IOVA, 1),
            entry_addr(0x0e4d_1000, IOVA, 1)
        );
    }

    #[test]
    fn pte_builders_reproduce_the_literal_encodings() {
        assert_eq!(table_pte(0x0e4d_1000), 0x0e4d_1003);
        assert_eq!(
            page_pte(0x0ecb_a000, PteFlags::leaf_read_only()),
            0x0400_0000_0ecb_a743
        );
        assert_eq!(
            page_pte(0x0ecb_a000, PteFlags::leaf_read_write()),
            0x0400_0000_0ecb_a7c3
        );
    }

    #[test]
    fn sl0_encodings_round_trip() {
        for level in 0..=2u8 {
            assert_eq!(start_level_from_sl0(sl0(level)), Some(level));
        }
        assert_eq!(start_level_from_sl0(0b11), None);
    }

    #[test]
    fn t0sz_matches_the_44_bit_input_used_by_the_scenarios() {
        assert_eq!(t0sz(44), 0x14);
    }
}
