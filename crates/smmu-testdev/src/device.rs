//! MMIO trigger device.
//!
//! A 4 KiB region with a single 32-bit control register at offset 0. Writing
//! the register stores the value and kicks off one run of the configured
//! [`ScenarioKind`] against the injected address spaces; reading it returns
//! the stored value. Everything else in the region is reserved and reads as
//! zero.

use smmu_io_snapshot::codec::{Decoder, Encoder};
use smmu_io_snapshot::{IoSnapshot, SnapshotReader, SnapshotResult, SnapshotVersion, SnapshotWriter};
use smmu_mem::AddressSpace;
use tracing::warn;

use crate::scenario::{Scenario, ScenarioKind, ScenarioReport};

/// Byte size of the device's MMIO region.
pub const REGION_SIZE: u64 = 0x1000;
/// Offset of the control register.
pub const REG_CON: u64 = 0x0;

/// Register-level MMIO contract, as a bus would dispatch it.
pub trait MmioHandler {
    fn read(&mut self, offset: u64, size: u32) -> u64;
    fn write(&mut self, offset: u64, size: u32, value: u64);
}

/// The trigger device. `S` is the system (physical) address space the
/// descriptors and tables are persisted into; `D` is the translated DMA
/// address space the exercising accesses go through.
pub struct SmmuTestDevice<S, D> {
    kind: ScenarioKind,
    sysmem: S,
    dma: D,
    con: u32,
    last_report: Option<ScenarioReport>,
}

impl<S: AddressSpace, D: AddressSpace> SmmuTestDevice<S, D> {
    pub fn new(kind: ScenarioKind, sysmem: S, dma: D) -> Self {
        Self {
            kind,
            sysmem,
            dma,
            con: 0,
            last_report: None,
        }
    }

    pub fn kind(&self) -> ScenarioKind {
        self.kind
    }

    pub fn con(&self) -> u32 {
        self.con
    }

    /// Report of the most recent triggered run, if any. Snapshot restore
    /// clears it; the run it came from happened on the saving side.
    pub fn last_report(&self) -> Option<&ScenarioReport> {
        self.last_report.as_ref()
    }

    fn trigger(&mut self) {
        let scenario = Scenario::build(self.kind);
        let report = scenario.run(&mut self.sysmem, &mut self.dma);
        self.last_report = Some(report);
    }
}

impl<S: AddressSpace, D: AddressSpace> MmioHandler for SmmuTestDevice<S, D> {
    fn read(&mut self, offset: u64, size: u32) -> u64 {
        if offset != REG_CON || size != 4 {
            warn!(offset, size, "read of reserved register");
            return 0;
        }
        self.con as u64
    }

    fn write(&mut self, offset: u64, size: u32, value: u64) {
        if offset != REG_CON || size != 4 {
            warn!(offset, size, value, "write to reserved register");
            return;
        }
        self.con = value as u32;
        self.trigger();
    }
}

const TAG_CON: u16 = 1;

impl<S: AddressSpace, D: AddressSpace> IoSnapshot for SmmuTestDevice<S, D> {
    const DEVICE_ID: [u8; 4] = *b"SMTD";
    const DEVICE_VERSION: SnapshotVersion = SnapshotVersion::new(1, 0);

    fn save_state(&self) -> Vec<u8> {
        let mut w = SnapshotWriter::new(Self::DEVICE_ID, Self::DEVICE_VERSION);
        w.field_bytes(TAG_CON, Encoder::new().u32(self.con).finish());
        w.finish()
    }

    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        let r = SnapshotReader::parse(bytes, Self::DEVICE_ID)?;
        r.ensure_device_major(Self::DEVICE_VERSION.major)?;

        self.con = 0;
        if let Some(field) = r.bytes(TAG_CON) {
            let mut d = Decoder::new(field);
            self.con = d.u32()?;
            d.finish()?;
        }
        self.last_report = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smmu_mem::{MemTxAttrs, MemTxResult, SecureRam};

    /// DMA space that rejects everything; register-path tests never reach it.
    struct NoDma;

    impl AddressSpace for NoDma {
        fn read(&mut self, _addr: u64, buf: &mut [u8], _attrs: MemTxAttrs) -> MemTxResult {
            buf.fill(0);
            MemTxResult::Error
        }

        fn write(&mut self, _addr: u64, _buf: &[u8], _attrs: MemTxAttrs) -> MemTxResult {
            MemTxResult::Error
        }
    }

    fn device() -> SmmuTestDevice<SecureRam, NoDma> {
        SmmuTestDevice::new(ScenarioKind::Stage2Only, SecureRam::secure_window(), NoDma)
    }

    #[test]
    fn control_register_stores_and_reads_back() {
        let mut dev = device();
        dev.write(REG_CON, 4, 0xabcd_1234);
        assert_eq!(dev.read(REG_CON, 4), 0xabcd_1234);
        assert!(dev.last_report().is_some());
    }

    #[test]
    fn reserved_offsets_read_zero_and_ignore_writes() {
        let mut dev = device();
        dev.write(0x8, 4, 0x5555_5555);
        dev.write(REG_CON, 8, 0x5555_5555);

        assert_eq!(dev.read(0x8, 4), 0);
        assert_eq!(dev.read(REG_CON, 2), 0);
        assert_eq!(dev.con(), 0);
        assert!(dev.last_report().is_none());
    }

    #[test]
    fn snapshot_round_trips_the_control_register() {
        let mut dev = device();
        dev.write(REG_CON, 4, 7);
        let bytes = dev.save_state();

        let mut restored = device();
        restored.load_state(&bytes).unwrap();
        assert_eq!(restored.con(), 7);
        assert!(restored.last_report().is_none());
    }

    #[test]
    fn snapshot_tolerates_unknown_fields() {
        let mut w = SnapshotWriter::new(
            <SmmuTestDevice<SecureRam, NoDma> as IoSnapshot>::DEVICE_ID,
            SnapshotVersion::new(1, 9),
        );
        w.field_bytes(TAG_CON, Encoder::new().u32(3).finish());
        w.field_bytes(0x4242, vec![0xff; 12]);

        let mut dev = device();
        dev.load_state(&w.finish()).unwrap();
        assert_eq!(dev.con(), 3);
    }
}
