//! Frame serialization for status records.
//!
//! ```text
//! S<alt_sp>:<alt>:<yaw_sp>:<yaw>:<main>:<tail>:<phase>*<checksum>\n
//! ```

use crate::crc::Crc8Digest;
use crate::fmt::{write_hex_u8, write_i16, write_u8};
use crate::types::StatusFrame;

/// Output cursor that accumulates the CRC-8 of everything written through
/// [`FrameWriter::payload`].
struct FrameWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
    crc: Crc8Digest,
}

impl<'a> FrameWriter<'a> {
    #[inline]
    fn new(buf: &'a mut [u8], prefix: u8) -> Self {
        buf[0] = prefix;
        Self {
            buf,
            pos: 1,
            crc: Crc8Digest::new(),
        }
    }

    #[inline]
    fn payload(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.crc.update(bytes);
        self.pos += bytes.len();
    }

    #[inline]
    fn field_i16(&mut self, value: i16) {
        let mut tmp = [0u8; 6];
        let len = write_i16(&mut tmp, value);
        self.payload(&tmp[..len]);
    }

    #[inline]
    fn field_u8(&mut self, value: u8) {
        let mut tmp = [0u8; 3];
        let len = write_u8(&mut tmp, value);
        self.payload(&tmp[..len]);
    }

    /// Append `*<checksum>\n` and return the total frame length.
    #[inline]
    fn finish(self) -> usize {
        let checksum = self.crc.finalize();
        let mut pos = self.pos;
        self.buf[pos] = b'*';
        pos += 1;
        pos += write_hex_u8(&mut self.buf[pos..], checksum);
        self.buf[pos] = b'\n';
        pos + 1
    }
}

/// Maximum size of a serialized status frame.
///
/// S(1) + 4 x i16(24) + 2 x u8(6) + phase(1) + 6 colons(6) + *(1) + checksum(2) + \n(1) = 42
pub const MAX_STATUS_SIZE: usize = 48;

/// Error type for serialization operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerializeError {
    /// The output buffer is too small to hold the frame.
    BufferTooSmall,
    /// A write operation failed (for writer adapters).
    WriteError,
}

impl core::fmt::Display for SerializeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::WriteError => write!(f, "write error"),
        }
    }
}

/// Serialize a record into its wire frame.
pub trait Serialize {
    /// Serialize to the provided buffer, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if the buffer cannot hold a
    /// worst-case frame.
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError>;

    /// Serialize to a `heapless::Vec`.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if `N` is not large enough.
    #[cfg(feature = "heapless")]
    fn serialize_to_vec<const N: usize>(&self) -> Result<heapless::Vec<u8, N>, SerializeError> {
        let mut vec = heapless::Vec::new();
        vec.resize(N, 0)
            .map_err(|_| SerializeError::BufferTooSmall)?;
        let len = self.serialize(&mut vec)?;
        vec.truncate(len);
        Ok(vec)
    }

    /// Serialize to a `core::fmt::Write` implementation such as `heapless::String`.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::WriteError`] if the writer fails.
    fn serialize_fmt<W: core::fmt::Write>(&self, writer: &mut W) -> Result<(), SerializeError>;
}

impl Serialize for StatusFrame {
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError> {
        if buf.len() < MAX_STATUS_SIZE {
            return Err(SerializeError::BufferTooSmall);
        }

        let mut w = FrameWriter::new(buf, b'S');
        w.field_i16(self.altitude_setpoint);
        w.payload(b":");
        w.field_i16(self.altitude);
        w.payload(b":");
        w.field_i16(self.yaw_setpoint);
        w.payload(b":");
        w.field_i16(self.yaw);
        w.payload(b":");
        w.field_u8(self.main_duty);
        w.payload(b":");
        w.field_u8(self.tail_duty);
        w.payload(b":");
        w.payload(&[b'0' + self.phase.code()]);

        Ok(w.finish())
    }

    fn serialize_fmt<W: core::fmt::Write>(&self, writer: &mut W) -> Result<(), SerializeError> {
        let mut buf = [0u8; MAX_STATUS_SIZE];
        let len = self.serialize(&mut buf)?;
        let s = core::str::from_utf8(&buf[..len]).map_err(|_| SerializeError::WriteError)?;
        writer.write_str(s).map_err(|_| SerializeError::WriteError)
    }
}
