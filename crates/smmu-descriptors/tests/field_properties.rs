//! Table-driven properties over the descriptor field layouts: every named
//! window round-trips its masked value, never disturbs another window, and no
//! two windows of the same word overlap.

use proptest::prelude::*;
use smmu_descriptors::{FieldSpec, CD_FIELDS, DESC_WORDS, STE_FIELDS};

fn field_mask(width: u32) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

fn assert_pairwise_disjoint(fields: &[(&str, FieldSpec)]) {
    for (i, (name_a, a)) in fields.iter().enumerate() {
        for (name_b, b) in &fields[i + 1..] {
            assert!(
                !a.overlaps(*b),
                "field windows {name_a} ({a:?}) and {name_b} ({b:?}) overlap"
            );
        }
    }
}

#[test]
fn ste_field_windows_are_pairwise_disjoint() {
    assert_pairwise_disjoint(STE_FIELDS);
}

#[test]
fn cd_field_windows_are_pairwise_disjoint() {
    assert_pairwise_disjoint(CD_FIELDS);
}

fn check_round_trip(
    fields: &[(&str, FieldSpec)],
    idx: usize,
    value: u32,
    mut words: [u32; DESC_WORDS],
) {
    let (name, field) = fields[idx];
    let before = words;

    field.set(&mut words, value);
    assert_eq!(
        field.get(&words),
        value & field_mask(field.width),
        "{name} did not round-trip"
    );

    for (other_name, other) in fields {
        if other == &field {
            continue;
        }
        assert_eq!(
            other.get(&words),
            other.get(&before),
            "writing {name} changed {other_name}"
        );
    }

    // Bits of the written word outside every known window are preserved too.
    let untouched = !(field_mask(field.width) << field.offset);
    assert_eq!(
        words[field.word] & untouched,
        before[field.word] & untouched,
        "writing {name} leaked outside its window"
    );
}

proptest! {
    #[test]
    fn ste_fields_round_trip_without_leaking(
        idx in 0..STE_FIELDS.len(),
        value in any::<u32>(),
        words in prop::array::uniform16(any::<u32>()),
    ) {
        check_round_trip(STE_FIELDS, idx, value, words);
    }

    #[test]
    fn cd_fields_round_trip_without_leaking(
        idx in 0..CD_FIELDS.len(),
        value in any::<u32>(),
        words in prop::array::uniform16(any::<u32>()),
    ) {
        check_round_trip(CD_FIELDS, idx, value, words);
    }

    #[test]
    fn ste_ttb_encoding_round_trips_aligned_48_bit_addresses(
        addr in (0u64..(1 << 44)).prop_map(|a| a << 4),
    ) {
        let mut ste = smmu_descriptors::Ste::new();
        ste.set_s2ttb(addr);
        ste.set_s_s2ttb(addr);
        prop_assert_eq!(ste.s2ttb(), addr);
        prop_assert_eq!(ste.s_s2ttb(), addr);
    }

    #[test]
    fn cd_ttb_encoding_round_trips_aligned_addresses(
        addr in (0u64..(1 << 44)).prop_map(|a| a << 4),
        ttbr in 0usize..2,
    ) {
        let mut cd = smmu_descriptors::Cd::new();
        cd.set_ttb(ttbr, addr);
        // CD TTBs carry 19 high-extension bits (address bits up to 50).
        prop_assert_eq!(cd.ttb(ttbr), addr & 0x0007_ffff_ffff_fff0);
    }
}
