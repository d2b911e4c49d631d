//! Translation scenarios: the descriptors and page tables for one stream,
//! plus the runner that persists them and exercises the mapping.
//!
//! All table-entry addresses are derived with [`smmu_ptw::plan_walk`] from
//! the fixed bases below; nothing here hard-codes a walked slot. The three
//! kinds share one input address and one output page so their results are
//! directly comparable.

use smmu_descriptors::{Cd, Ste, StreamConfig};
use smmu_mem::{AddressSpace, MemTxAttrs, MemTxResult};
use smmu_ptw::{self as ptw, page_pte, plan_walk, table_pte, PteFlags};
use tracing::{debug, info};

use crate::fixture::{PhysFixture, TraceEvent};

/// Guest physical address the stream table entry is persisted at.
pub const STE_GPA: u64 = 0x0e16_6040;
/// Guest physical address the context descriptor is persisted at.
pub const CD_GPA: u64 = 0x0e16_6080;
/// Base of the shared translation tables; level `n` occupies
/// `TTB + n * 0x1000`.
pub const TTB: u64 = 0x0e4d_0000;
/// Input (virtual/IPA) address every scenario translates.
pub const TEST_IOVA: u64 = 0x80_8060_4567;
/// Physical address the input must resolve to.
pub const TEST_OUTPUT_PA: u64 = 0x0ecb_a567;
/// Pattern written through the translated path and read back as the oracle.
pub const TEST_PATTERN: u32 = 0x8888_8888;

const ASID: u32 = 0x1e20;
const VMID: u32 = 0;
/// Input address space is 44 bits for every walk (T0SZ = 0x14).
const INPUT_BITS: u32 = 44;
const START_LEVEL: u8 = 0;

const fn level_table(level: u8) -> u64 {
    TTB + level as u64 * 0x1000
}

const fn page_base(addr: u64) -> u64 {
    addr & !ptw::PAGE_OFFSET_MASK
}

/// Which translation stages a scenario enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    Stage1Only,
    Stage2Only,
    Nested,
}

impl ScenarioKind {
    pub fn stream_config(self) -> StreamConfig {
        match self {
            Self::Stage1Only => StreamConfig::Stage1Only,
            Self::Stage2Only => StreamConfig::Stage2Only,
            Self::Nested => StreamConfig::Nested,
        }
    }
}

/// One table-entry write: 8 bytes at a walked slot address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableWrite {
    pub addr: u64,
    pub value: u64,
}

/// Ordered, address-deduplicated set of table-entry writes.
///
/// Walks that share a table prefix plan the same upper-level slots; the
/// first write wins and later duplicates are dropped. Conflicting values at
/// one address would mean the layout aliases two different tables onto the
/// same page, which the fixed bases never do.
#[derive(Debug, Default)]
struct TableSet {
    writes: Vec<TableWrite>,
}

impl TableSet {
    fn push(&mut self, addr: u64, value: u64) {
        if let Some(prev) = self.writes.iter().find(|w| w.addr == addr) {
            debug_assert_eq!(
                prev.value, value,
                "conflicting table entries at {addr:#x}"
            );
            return;
        }
        self.writes.push(TableWrite { addr, value });
    }

    /// Plans a full level-0..3 walk of `addr` through the shared tables and
    /// records one write per step, ending in `leaf`.
    fn push_walk(&mut self, addr: u64, leaf: u64) {
        let entries = [
            table_pte(level_table(1)),
            table_pte(level_table(2)),
            table_pte(level_table(3)),
            leaf,
        ];
        for (step, value) in plan_walk(TTB, addr, START_LEVEL, &entries)
            .iter()
            .zip(entries)
        {
            self.push(step.entry_addr, value);
        }
    }
}

/// Everything one run persists: the stream table entry, an optional context
/// descriptor and the page-table entries of both stages.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub ste: Ste,
    pub cd: Option<Cd>,
    /// Entries of the walk that translates the test input address. Written
    /// first, before the descriptors.
    pub stage_tables: Vec<TableWrite>,
    /// Stage-2 entries mapping the stage-1 structures themselves (context
    /// descriptor, table storage, output page). Nested only; written after
    /// the context descriptor and before the stream table entry.
    pub nested_tables: Vec<TableWrite>,
    pub iova: u64,
    pub expected_output: u64,
    pub pattern: u32,
}

impl Scenario {
    pub fn build(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::Stage1Only => Self::stage1_only(),
            ScenarioKind::Stage2Only => Self::stage2_only(),
            ScenarioKind::Nested => Self::nested(),
        }
    }

    /// STE carrying both stage-2 parameter blocks. The primary block's TTB
    /// is left clear: stage-2-only translation of the test input goes
    /// through the secondary block, same as the translation of stage-1
    /// fetches in a nested run.
    fn base_ste(config: StreamConfig) -> Ste {
        let mut ste = Ste::new();
        ste.set_valid(true);
        ste.set_config(config);
        ste.set_s2vmid(VMID);

        ste.set_s2t0sz(ptw::t0sz(INPUT_BITS));
        ste.set_s2sl0(ptw::sl0(START_LEVEL));
        ste.set_s2tg(ptw::TG_4K);
        ste.set_s2ps(ptw::PS_48_BITS);
        ste.set_s2aa64(true);
        ste.set_s2endi(false);
        ste.set_s2affd(false);

        ste.set_s_s2t0sz(ptw::t0sz(INPUT_BITS));
        ste.set_s_s2sl0(ptw::sl0(START_LEVEL));
        ste.set_s_s2tg(ptw::TG_4K);
        ste.set_s_s2ps(ptw::PS_48_BITS);
        ste.set_s_s2ttb(TTB);
        ste
    }

    fn context_descriptor() -> Cd {
        let mut cd = Cd::new();
        cd.set_valid(true);
        cd.set_aarch64(true);
        cd.set_asid(ASID);
        cd.set_aflag(true);
        cd.set_record(true);
        cd.set_stall(false);
        cd.set_hd(false);
        cd.set_ha(false);
        cd.set_ips(ptw::PS_44_BITS);

        cd.set_tsz(0, ptw::t0sz(INPUT_BITS));
        cd.set_tg(0, ptw::TG_4K);
        cd.set_epd(0, false);
        // TTBR1 region never walked.
        cd.set_epd(1, true);
        cd.set_ttb(0, TTB);

        cd.set_mair0(0xf404_ff44);
        cd.set_mair1(0xffff_ffff);
        cd
    }

    fn stage1_only() -> Self {
        let mut ste = Self::base_ste(StreamConfig::Stage1Only);
        ste.set_s1_ctx_ptr(CD_GPA);

        let mut tables = TableSet::default();
        tables.push_walk(
            TEST_IOVA,
            page_pte(page_base(TEST_OUTPUT_PA), PteFlags::leaf_read_only()),
        );

        Self {
            kind: ScenarioKind::Stage1Only,
            ste,
            cd: Some(Self::context_descriptor()),
            stage_tables: tables.writes,
            nested_tables: Vec::new(),
            iova: TEST_IOVA,
            expected_output: TEST_OUTPUT_PA,
            pattern: TEST_PATTERN,
        }
    }

    fn stage2_only() -> Self {
        let mut tables = TableSet::default();
        tables.push_walk(
            TEST_IOVA,
            page_pte(page_base(TEST_OUTPUT_PA), PteFlags::leaf_read_write()),
        );

        Self {
            kind: ScenarioKind::Stage2Only,
            ste: Self::base_ste(StreamConfig::Stage2Only),
            cd: None,
            stage_tables: tables.writes,
            nested_tables: Vec::new(),
            iova: TEST_IOVA,
            expected_output: TEST_OUTPUT_PA,
            pattern: TEST_PATTERN,
        }
    }

    fn nested() -> Self {
        let mut ste = Self::base_ste(StreamConfig::Nested);
        ste.set_s1_ctx_ptr(CD_GPA);

        // Stage-1 walk of the test input, through the shared tables.
        let mut stage = TableSet::default();
        stage.push_walk(
            TEST_IOVA,
            page_pte(page_base(TEST_OUTPUT_PA), PteFlags::leaf_read_only()),
        );

        // Stage-2 identity mappings for every intermediate address stage 1
        // touches: the context descriptor, each table level's storage, and
        // the stage-1 output page. The output page is the only one mapped
        // writable; everything else stage 1 only reads.
        let mut nested = TableSet::default();
        nested.push_walk(
            CD_GPA,
            page_pte(page_base(CD_GPA), PteFlags::leaf_read_only()),
        );
        nested.push_walk(TTB, page_pte(TTB, PteFlags::leaf_read_only()));
        for level in 1..=ptw::LEAF_LEVEL {
            let table = level_table(level);
            nested.push_walk(table, page_pte(table, PteFlags::leaf_read_only()));
        }
        nested.push_walk(
            TEST_OUTPUT_PA,
            page_pte(page_base(TEST_OUTPUT_PA), PteFlags::leaf_read_write()),
        );

        Self {
            kind: ScenarioKind::Nested,
            ste,
            cd: Some(Self::context_descriptor()),
            stage_tables: stage.writes,
            nested_tables: nested.writes,
            iova: TEST_IOVA,
            expected_output: TEST_OUTPUT_PA,
            pattern: TEST_PATTERN,
        }
    }

    /// Persists the scenario into `sysmem` and exercises the mapping through
    /// `dma` (the translated address space).
    ///
    /// Ordering matters: tables before the descriptors that point at them,
    /// stream table entry last so the stream only becomes valid once its
    /// whole configuration is in place. Preparatory failures are recorded
    /// and skipped over; the final read-back is the only pass/fail signal.
    pub fn run(
        &self,
        sysmem: &mut dyn AddressSpace,
        dma: &mut dyn AddressSpace,
    ) -> ScenarioReport {
        let mut fixture = PhysFixture::new(sysmem);

        for w in &self.stage_tables {
            let _ = fixture.fill_u64(w.addr, w.value);
        }
        if let Some(cd) = &self.cd {
            let _ = fixture.write_block(CD_GPA, &cd.to_bytes());
        }
        for w in &self.nested_tables {
            let _ = fixture.fill_u64(w.addr, w.value);
        }
        let _ = fixture.write_block(STE_GPA, &self.ste.to_bytes());

        let exercise_write = dma.write_u32(self.iova, self.pattern, MemTxAttrs::SECURE);
        let (read_back, exercise_read) = dma.read_u32(self.iova, MemTxAttrs::SECURE);
        debug!(
            kind = ?self.kind,
            iova = self.iova,
            read_back,
            ?exercise_write,
            ?exercise_read,
            "scenario exercised"
        );

        let report = ScenarioReport {
            kind: self.kind,
            events: fixture.into_events(),
            exercise_write,
            exercise_read,
            read_back,
            pattern: self.pattern,
        };
        info!(kind = ?self.kind, passed = report.passed(), "scenario finished");
        report
    }
}

/// Outcome of one scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub kind: ScenarioKind,
    /// Every preparatory write and its echoing read-back.
    pub events: Vec<TraceEvent>,
    pub exercise_write: MemTxResult,
    pub exercise_read: MemTxResult,
    pub read_back: u32,
    pub pattern: u32,
}

impl ScenarioReport {
    /// The oracle: both translated accesses completed and the read returned
    /// the pattern just written.
    pub fn passed(&self) -> bool {
        self.exercise_write.is_ok() && self.exercise_read.is_ok() && self.read_back == self.pattern
    }
}
