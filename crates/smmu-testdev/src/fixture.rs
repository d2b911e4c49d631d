//! Secure-tagged adapter over the physical address space, used to
//! materialize descriptors and page tables.
//!
//! Every write is immediately followed by a read-back; both are recorded as
//! structured [`TraceEvent`]s so a harness can inspect exactly what was
//! persisted (and what failed) without scraping logs. A failed write is
//! recorded and construction continues — it surfaces later as a wrong final
//! translation result, which is the intended detection mechanism.

use smmu_mem::{AddressSpace, MemTxAttrs, MemTxResult};
use tracing::{debug, warn};

/// What a [`TraceEvent`] observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOp {
    Write,
    /// The observability read issued right after a write; `value` is what
    /// came back.
    ReadBack,
}

/// One observed memory operation during scenario construction.
///
/// For block writes (descriptors), `value` holds the first eight bytes,
/// little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEvent {
    pub op: TraceOp,
    pub addr: u64,
    pub value: u64,
    pub result: MemTxResult,
}

pub struct PhysFixture<'a> {
    space: &'a mut dyn AddressSpace,
    events: Vec<TraceEvent>,
}

impl<'a> PhysFixture<'a> {
    pub fn new(space: &'a mut dyn AddressSpace) -> Self {
        Self {
            space,
            events: Vec::new(),
        }
    }

    fn record(&mut self, op: TraceOp, addr: u64, value: u64, result: MemTxResult) {
        if result.is_ok() {
            debug!(addr, value, ?op, "fixture access");
        } else {
            warn!(addr, value, ?op, ?result, "fixture access failed");
        }
        self.events.push(TraceEvent {
            op,
            addr,
            value,
            result,
        });
    }

    /// Writes one table entry and echoes it back.
    pub fn fill_u64(&mut self, addr: u64, value: u64) -> MemTxResult {
        let res = self.space.write_u64(addr, value, MemTxAttrs::SECURE);
        self.record(TraceOp::Write, addr, value, res);

        let (echo, echo_res) = self.space.read_u64(addr, MemTxAttrs::SECURE);
        self.record(TraceOp::ReadBack, addr, echo, echo_res);
        res
    }

    /// Writes a descriptor block and echoes its first doubleword back.
    pub fn write_block(&mut self, addr: u64, bytes: &[u8]) -> MemTxResult {
        let mut lead = [0u8; 8];
        let n = bytes.len().min(8);
        lead[..n].copy_from_slice(&bytes[..n]);
        let lead = u64::from_le_bytes(lead);
        let res = self.space.write(addr, bytes, MemTxAttrs::SECURE);
        self.record(TraceOp::Write, addr, lead, res);

        let (echo, echo_res) = self.space.read_u64(addr, MemTxAttrs::SECURE);
        self.record(TraceOp::ReadBack, addr, echo, echo_res);
        res
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smmu_mem::{SecureRam, SECURE_RAM_BASE};

    #[test]
    fn fill_records_write_and_echo() {
        let mut ram = SecureRam::secure_window();
        let mut fixture = PhysFixture::new(&mut ram);

        let addr = SECURE_RAM_BASE + 0x4d_0008;
        assert!(fixture.fill_u64(addr, 0x0e4d_1003).is_ok());

        let events = fixture.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].op, TraceOp::Write);
        assert_eq!(events[1].op, TraceOp::ReadBack);
        assert_eq!(events[1].value, 0x0e4d_1003);
        assert!(events[1].result.is_ok());
    }

    #[test]
    fn failed_write_is_recorded_not_fatal() {
        let mut ram = SecureRam::secure_window();
        let mut fixture = PhysFixture::new(&mut ram);

        // Outside the secure window: decode error, but the fixture carries on.
        let res = fixture.fill_u64(0x1000, 0xdead);
        assert_eq!(res, MemTxResult::DecodeError);

        let addr = SECURE_RAM_BASE;
        assert!(fixture.fill_u64(addr, 1).is_ok());
        assert_eq!(fixture.events().len(), 4);
    }
}
