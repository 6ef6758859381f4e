//! Payload compression
//!
//! Payloads are compressed as zlib (RFC 1950) streams before encryption.
//! Whether a payload is compressed is recorded in the envelope, so a decoder
//! never guesses. Inflation is capped at [`MAX_INFLATED_SIZE`] to bound the
//! work done on a hostile stream.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Largest payload a decoder will inflate
pub const MAX_INFLATED_SIZE: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("Compression failed: {0}")]
    CompressFailed(#[source] io::Error),

    #[error("Decompression failed: {0}")]
    DecompressFailed(#[source] io::Error),

    #[error("Inflated payload exceeds {max} bytes")]
    TooLarge { max: usize },
}

/// Deflate `data` into a zlib stream
pub fn compress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder
        .write_all(data)
        .map_err(CompressionError::CompressFailed)?;
    encoder.finish().map_err(CompressionError::CompressFailed)
}

/// Inflate a zlib stream
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut output = Vec::new();
    ZlibDecoder::new(data)
        .take(MAX_INFLATED_SIZE as u64 + 1)
        .read_to_end(&mut output)
        .map_err(CompressionError::DecompressFailed)?;

    if output.len() > MAX_INFLATED_SIZE {
        return Err(CompressionError::TooLarge {
            max: MAX_INFLATED_SIZE,
        });
    }
    Ok(output)
}
