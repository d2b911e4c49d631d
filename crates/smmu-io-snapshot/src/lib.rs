#![forbid(unsafe_code)]

//! Deterministic save/restore encoding for device state.
//!
//! The format is a small tag-length-value (TLV) container with an explicit
//! device ID and major/minor version header:
//! - deterministic byte output (fields in the order they were written)
//! - forward compatibility (unknown tags are skipped on load)
//! - a major-version mismatch is an error, a minor bump is not
//!
//! Devices implement [`IoSnapshot`]; `DEVICE_ID` must stay stable forever and
//! additions within a major version are made by adding new TLV fields.

pub mod codec;

use std::collections::BTreeMap;

use thiserror::Error;

/// Device snapshot format version (major/minor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotVersion {
    pub major: u16,
    pub minor: u16,
}

impl SnapshotVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot is for device {found:?}, expected {expected:?}")]
    WrongDevice { expected: [u8; 4], found: [u8; 4] },
    #[error("unsupported snapshot major version {found} (supported: {supported})")]
    UnsupportedVersion { supported: u16, found: u16 },
    #[error("snapshot truncated")]
    Truncated,
    #[error("invalid field encoding: {0}")]
    InvalidFieldEncoding(&'static str),
    #[error("trailing bytes after decoded field")]
    TrailingBytes,
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Snapshotting contract for emulated devices.
pub trait IoSnapshot {
    const DEVICE_ID: [u8; 4];
    const DEVICE_VERSION: SnapshotVersion;

    fn save_state(&self) -> Vec<u8>;
    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()>;
}

/// Serializes a device snapshot: header followed by TLV fields.
pub struct SnapshotWriter {
    buf: Vec<u8>,
}

impl SnapshotWriter {
    pub fn new(device_id: [u8; 4], version: SnapshotVersion) -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(&device_id);
        buf.extend_from_slice(&version.major.to_le_bytes());
        buf.extend_from_slice(&version.minor.to_le_bytes());
        Self { buf }
    }

    pub fn field_bytes(&mut self, tag: u16, bytes: Vec<u8>) {
        self.buf.extend_from_slice(&tag.to_le_bytes());
        self.buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(&bytes);
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Parses a device snapshot, indexing fields by tag. Unknown tags are kept
/// but simply never asked for.
pub struct SnapshotReader {
    version: SnapshotVersion,
    fields: BTreeMap<u16, Vec<u8>>,
}

impl SnapshotReader {
    pub fn parse(bytes: &[u8], device_id: [u8; 4]) -> SnapshotResult<Self> {
        if bytes.len() < 8 {
            return Err(SnapshotError::Truncated);
        }
        let found: [u8; 4] = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if found != device_id {
            return Err(SnapshotError::WrongDevice {
                expected: device_id,
                found,
            });
        }
        let major = u16::from_le_bytes([bytes[4], bytes[5]]);
        let minor = u16::from_le_bytes([bytes[6], bytes[7]]);

        let mut fields = BTreeMap::new();
        let mut rest = &bytes[8..];
        while !rest.is_empty() {
            if rest.len() < 6 {
                return Err(SnapshotError::Truncated);
            }
            let tag = u16::from_le_bytes([rest[0], rest[1]]);
            let len = u32::from_le_bytes([rest[2], rest[3], rest[4], rest[5]]) as usize;
            rest = &rest[6..];
            if rest.len() < len {
                return Err(SnapshotError::Truncated);
            }
            fields.insert(tag, rest[..len].to_vec());
            rest = &rest[len..];
        }

        Ok(Self {
            version: SnapshotVersion::new(major, minor),
            fields,
        })
    }

    pub fn version(&self) -> SnapshotVersion {
        self.version
    }

    pub fn ensure_device_major(&self, supported: u16) -> SnapshotResult<()> {
        if self.version.major != supported {
            return Err(SnapshotError::UnsupportedVersion {
                supported,
                found: self.version.major,
            });
        }
        Ok(())
    }

    pub fn bytes(&self, tag: u16) -> Option<&[u8]> {
        self.fields.get(&tag).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::codec::{Decoder, Encoder};
    use super::*;

    const ID: [u8; 4] = *b"TEST";
    const V1: SnapshotVersion = SnapshotVersion::new(1, 0);

    #[test]
    fn fields_round_trip_through_writer_and_reader() {
        let mut w = SnapshotWriter::new(ID, V1);
        w.field_bytes(1, Encoder::new().u64(0xdead_beef_cafe_f00d).finish());
        w.field_bytes(7, Encoder::new().u32(42).bool(true).finish());
        let bytes = w.finish();

        let r = SnapshotReader::parse(&bytes, ID).unwrap();
        r.ensure_device_major(1).unwrap();

        let mut d = Decoder::new(r.bytes(1).unwrap());
        assert_eq!(d.u64().unwrap(), 0xdead_beef_cafe_f00d);
        d.finish().unwrap();

        let mut d = Decoder::new(r.bytes(7).unwrap());
        assert_eq!(d.u32().unwrap(), 42);
        assert!(d.bool().unwrap());
        d.finish().unwrap();

        assert!(r.bytes(2).is_none());
    }

    #[test]
    fn unknown_tags_are_tolerated() {
        let mut w = SnapshotWriter::new(ID, SnapshotVersion::new(1, 3));
        w.field_bytes(1, Encoder::new().u32(7).finish());
        w.field_bytes(0x7fff, vec![0xaa; 16]);
        let bytes = w.finish();

        let r = SnapshotReader::parse(&bytes, ID).unwrap();
        r.ensure_device_major(1).unwrap();
        let mut d = Decoder::new(r.bytes(1).unwrap());
        assert_eq!(d.u32().unwrap(), 7);
    }

    #[test]
    fn wrong_device_and_major_are_rejected() {
        let bytes = SnapshotWriter::new(ID, SnapshotVersion::new(2, 0)).finish();

        assert!(matches!(
            SnapshotReader::parse(&bytes, *b"OTHR"),
            Err(SnapshotError::WrongDevice { .. })
        ));

        let r = SnapshotReader::parse(&bytes, ID).unwrap();
        assert!(matches!(
            r.ensure_device_major(1),
            Err(SnapshotError::UnsupportedVersion {
                supported: 1,
                found: 2
            })
        ));
    }

    #[test]
    fn truncated_tlv_is_an_error() {
        let mut w = SnapshotWriter::new(ID, V1);
        w.field_bytes(1, vec![1, 2, 3, 4]);
        let mut bytes = w.finish();
        bytes.truncate(bytes.len() - 1);

        assert!(matches!(
            SnapshotReader::parse(&bytes, ID),
            Err(SnapshotError::Truncated)
        ));
    }
}
