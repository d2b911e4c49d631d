use thiserror::Error;

use crate::space::{AddressSpace, MemTxAttrs, MemTxResult};

/// Base of the secure RAM window that holds descriptors and page tables.
pub const SECURE_RAM_BASE: u64 = 0x0e00_0000;
/// Size of the secure RAM window (`0xe000000..=0xeffffff`).
pub const SECURE_RAM_SIZE: u64 = 0x0100_0000;

/// Errors from direct (non-bus) [`SecureRam`] accessors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecureRamError {
    #[error("access out of range: addr=0x{addr:x} len={len} window=0x{base:x}+0x{size:x}")]
    OutOfRange {
        addr: u64,
        len: usize,
        base: u64,
        size: u64,
    },
}

/// Dense RAM mapped at a fixed window of the physical address space.
///
/// Transfers outside the window return [`MemTxResult::DecodeError`];
/// non-secure transfers are refused with [`MemTxResult::Error`]. Failed reads
/// zero-fill the destination.
pub struct SecureRam {
    base: u64,
    data: Vec<u8>,
}

impl SecureRam {
    pub fn new(base: u64, size: u64) -> Self {
        Self {
            base,
            data: vec![0u8; size as usize],
        }
    }

    /// RAM covering the default secure window.
    pub fn secure_window() -> Self {
        Self::new(SECURE_RAM_BASE, SECURE_RAM_SIZE)
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn offset(&self, addr: u64, len: usize) -> Result<usize, SecureRamError> {
        let err = SecureRamError::OutOfRange {
            addr,
            len,
            base: self.base,
            size: self.size(),
        };
        let off = addr.checked_sub(self.base).ok_or_else(|| err.clone())?;
        let end = off.checked_add(len as u64).ok_or_else(|| err.clone())?;
        if end > self.size() {
            return Err(err);
        }
        Ok(off as usize)
    }

    /// Reads bytes at a physical address, bypassing transaction attributes.
    pub fn read_bytes(&self, addr: u64, dst: &mut [u8]) -> Result<(), SecureRamError> {
        let off = self.offset(addr, dst.len())?;
        dst.copy_from_slice(&self.data[off..off + dst.len()]);
        Ok(())
    }

    /// Writes bytes at a physical address, bypassing transaction attributes.
    pub fn write_bytes(&mut self, addr: u64, src: &[u8]) -> Result<(), SecureRamError> {
        let off = self.offset(addr, src.len())?;
        self.data[off..off + src.len()].copy_from_slice(src);
        Ok(())
    }
}

impl AddressSpace for SecureRam {
    fn read(&mut self, addr: u64, buf: &mut [u8], attrs: MemTxAttrs) -> MemTxResult {
        buf.fill(0);
        if !attrs.secure {
            return MemTxResult::Error;
        }
        match self.read_bytes(addr, buf) {
            Ok(()) => MemTxResult::Ok,
            Err(_) => MemTxResult::DecodeError,
        }
    }

    fn write(&mut self, addr: u64, buf: &[u8], attrs: MemTxAttrs) -> MemTxResult {
        if !attrs.secure {
            return MemTxResult::Error;
        }
        match self.write_bytes(addr, buf) {
            Ok(()) => MemTxResult::Ok,
            Err(_) => MemTxResult::DecodeError,
        }
    }
}
