//! Binary framing helpers for the OpenToken envelope
//!
//! All multi-byte integers are big-endian. Readers return
//! `io::ErrorKind::UnexpectedEof` on truncation so callers can tell a short
//! envelope apart from a semantically invalid one.

use std::io::{self, Read, Write};

pub mod traits;

pub use traits::BinaryWrite;

/// Read a u8 from a reader
pub fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a u16 (big-endian) from a reader
pub fn read_u16_be<R: Read>(reader: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// Read exactly n bytes from a reader
pub fn read_bytes<R: Read>(reader: &mut R, n: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read a u16 length prefix followed by that many bytes
pub fn read_prefixed<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let len = read_u16_be(reader)?;
    read_bytes(reader, len as usize)
}

/// Write a u8 to a writer
pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> io::Result<()> {
    writer.write_all(&[value])
}

/// Write a u16 (big-endian) to a writer
pub fn write_u16_be<W: Write>(writer: &mut W, value: u16) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

/// Write bytes to a writer
pub fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    writer.write_all(bytes)
}

/// Write a u16 length prefix followed by the bytes
///
/// Fails with `InvalidInput` when the slice does not fit a u16 length.
pub fn write_prefixed<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    let len = u16::try_from(bytes.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Field of {} bytes too large for u16 length", bytes.len()),
        )
    })?;
    write_u16_be(writer, len)?;
    writer.write_all(bytes)
}
