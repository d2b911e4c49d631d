#![forbid(unsafe_code)]

//! Simulated physical memory for the SMMU translation test bench.
//!
//! Descriptors and page tables are materialized as plain bytes in a secure RAM
//! window; devices and translation models access them through the
//! [`AddressSpace`] trait, which mirrors a bus-level transaction interface:
//! every transfer carries [`MemTxAttrs`] and reports a [`MemTxResult`] outcome
//! instead of panicking or short-circuiting.

mod ram;
mod space;

pub use ram::{SecureRam, SecureRamError, SECURE_RAM_BASE, SECURE_RAM_SIZE};
pub use space::{AddressSpace, MemTxAttrs, MemTxResult, SharedAddressSpace};
