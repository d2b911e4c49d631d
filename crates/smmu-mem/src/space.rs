use std::sync::{Arc, Mutex};

/// Per-transaction attributes.
///
/// Only the secure/non-secure distinction matters here: the test bench stores
/// all of its descriptors and tables in secure RAM, and the RAM backend
/// rejects non-secure transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemTxAttrs {
    pub secure: bool,
}

impl MemTxAttrs {
    pub const SECURE: MemTxAttrs = MemTxAttrs { secure: true };
    pub const NONSECURE: MemTxAttrs = MemTxAttrs { secure: false };
}

/// Outcome of a memory transaction.
///
/// Failures are ordinary values, not errors: scenario construction keeps
/// going on a failed write and lets the final translated access expose the
/// problem.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemTxResult {
    /// Transfer completed.
    Ok,
    /// The address decoded to no backing storage.
    DecodeError,
    /// The target refused the transfer (e.g. attribute mismatch).
    Error,
}

impl MemTxResult {
    #[inline]
    pub fn is_ok(self) -> bool {
        self == MemTxResult::Ok
    }
}

/// Bus-level access to a physical address space.
///
/// Reads are `&mut self` so implementations may have side effects (an address
/// space backed by a translation unit walks page tables on every access).
pub trait AddressSpace {
    fn read(&mut self, addr: u64, buf: &mut [u8], attrs: MemTxAttrs) -> MemTxResult;
    fn write(&mut self, addr: u64, buf: &[u8], attrs: MemTxAttrs) -> MemTxResult;

    /// Little-endian 4-byte read. On failure the returned value is whatever
    /// the backend left in the buffer (zero for the RAM backend).
    fn read_u32(&mut self, addr: u64, attrs: MemTxAttrs) -> (u32, MemTxResult) {
        let mut buf = [0u8; 4];
        let res = self.read(addr, &mut buf, attrs);
        (u32::from_le_bytes(buf), res)
    }

    /// Little-endian 8-byte read.
    fn read_u64(&mut self, addr: u64, attrs: MemTxAttrs) -> (u64, MemTxResult) {
        let mut buf = [0u8; 8];
        let res = self.read(addr, &mut buf, attrs);
        (u64::from_le_bytes(buf), res)
    }

    fn write_u32(&mut self, addr: u64, value: u32, attrs: MemTxAttrs) -> MemTxResult {
        self.write(addr, &value.to_le_bytes(), attrs)
    }

    fn write_u64(&mut self, addr: u64, value: u64, attrs: MemTxAttrs) -> MemTxResult {
        self.write(addr, &value.to_le_bytes(), attrs)
    }
}

impl<T: AddressSpace + ?Sized> AddressSpace for &mut T {
    #[inline]
    fn read(&mut self, addr: u64, buf: &mut [u8], attrs: MemTxAttrs) -> MemTxResult {
        <T as AddressSpace>::read(&mut **self, addr, buf, attrs)
    }

    #[inline]
    fn write(&mut self, addr: u64, buf: &[u8], attrs: MemTxAttrs) -> MemTxResult {
        <T as AddressSpace>::write(&mut **self, addr, buf, attrs)
    }
}

/// Cloneable handle to a shared [`AddressSpace`].
///
/// The trigger device and the translation model under test both need to reach
/// the same backing RAM: the device populates descriptors and page tables,
/// the model walks them. Cloning the handle aliases the underlying space.
pub struct SharedAddressSpace<A> {
    inner: Arc<Mutex<A>>,
}

impl<A> SharedAddressSpace<A> {
    pub fn new(space: A) -> Self {
        Self {
            inner: Arc::new(Mutex::new(space)),
        }
    }

    /// Runs `f` with direct access to the wrapped space.
    pub fn with<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        f(&mut self.inner.lock().unwrap())
    }
}

impl<A> Clone for SharedAddressSpace<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: AddressSpace> AddressSpace for SharedAddressSpace<A> {
    fn read(&mut self, addr: u64, buf: &mut [u8], attrs: MemTxAttrs) -> MemTxResult {
        self.inner.lock().unwrap().read(addr, buf, attrs)
    }

    fn write(&mut self, addr: u64, buf: &[u8], attrs: MemTxAttrs) -> MemTxResult {
        self.inner.lock().unwrap().write(addr, buf, attrs)
    }
}
