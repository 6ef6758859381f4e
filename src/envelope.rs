//! OpenToken binary envelope
//!
//! ```text
//! ┌──────────────┬────────────┬────────┬──────┬──────────┬────────────┬───────────┐
//! │ "OTK" + 0x02 │ cipher (1) │ ivlen  │ iv   │ ctlen(2) │ ciphertext │ HMAC (20) │
//! └──────────────┴────────────┴────────┴──────┴──────────┴────────────┴───────────┘
//! ```
//!
//! The cipher byte carries the suite id in its low seven bits and the
//! compression flag in bit 7. The HMAC covers every preceding byte.
//!
//! Decoding is split in two steps so that nothing is decrypted before the
//! signature checks out: [`Envelope::verify`] consumes the parsed envelope and
//! returns a [`VerifiedEnvelope`], which is the only type that can decrypt.

use crate::binary::{
    read_bytes, read_u16_be, read_u8, write_bytes, write_u16_be, write_u8, BinaryWrite,
};
use crate::cipher::{CipherError, CipherSuite, MAC_LENGTH};
use crate::compression::{self, CompressionError};
use crate::keys::DerivedKeys;
use crate::signature::{self, SignatureError};
use rand::{rngs::OsRng, RngCore};
use std::io::{self, Cursor, Write};
use thiserror::Error;
use tracing::debug;

/// Format identifier at the start of every envelope
pub const MAGIC: [u8; 3] = *b"OTK";

/// Envelope layout version
///
/// Version 1 is the legacy OTK layout with a leading HMAC and a key-info
/// field; it is rejected as unsupported.
pub const VERSION: u8 = 0x02;

/// Bit in the cipher byte marking a compressed payload
pub const COMPRESSED_FLAG: u8 = 0x80;

/// Largest ciphertext the 2-byte length field can describe
pub const MAX_CIPHERTEXT_LENGTH: usize = u16::MAX as usize;

/// Smallest possible envelope: header, zero-length IV and ciphertext, signature
pub const MIN_ENVELOPE_LENGTH: usize = MAGIC.len() + 1 + 1 + 1 + 2 + MAC_LENGTH;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Envelope truncated")]
    Truncated,

    #[error("Invalid magic number: {0:02X?} (expected 4F544B)")]
    BadMagic([u8; 3]),

    #[error("Unsupported envelope version: {0}")]
    UnsupportedVersion(u8),

    #[error("Cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("IV length {got} does not match cipher suite ({expected})")]
    IvLength { expected: usize, got: usize },

    #[error("{0} unexpected trailing bytes after signature")]
    TrailingBytes(usize),

    #[error("Ciphertext of {size} bytes exceeds {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("Compression error: {0}")]
    Compression(#[from] CompressionError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Cipher byte: compression flag plus suite id
///
/// ```text
/// ┌──────────────┬────────────────────┐
/// │COMPRESSED(1b)│ Cipher Suite Id(7b)│
/// └──────────────┴────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherFlags {
    pub compressed: bool,
    pub cipher: CipherSuite,
}

impl CipherFlags {
    /// Parse from byte
    pub fn from_byte(byte: u8) -> Result<Self, CipherError> {
        Ok(Self {
            compressed: byte & COMPRESSED_FLAG != 0,
            cipher: CipherSuite::from_id(byte & !COMPRESSED_FLAG)?,
        })
    }

    /// Convert to byte
    pub fn to_byte(self) -> u8 {
        let flag = if self.compressed { COMPRESSED_FLAG } else { 0x00 };
        flag | self.cipher.id()
    }
}

/// Parsed or freshly sealed envelope whose signature has not been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub flags: CipherFlags,
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub signature: [u8; MAC_LENGTH],
}

/// Envelope whose signature matched the keys it was verified with
#[derive(Debug)]
pub struct VerifiedEnvelope(Envelope);

impl Envelope {
    /// Encrypt and sign a serialized attribute payload
    ///
    /// When `compress` is set the payload is deflated first, but the
    /// compressed form is only kept if it is actually smaller.
    pub fn seal(
        payload: &[u8],
        cipher: CipherSuite,
        keys: &DerivedKeys,
        compress: bool,
    ) -> Result<Self, EnvelopeError> {
        let mut body = None;
        if compress {
            let deflated = compression::compress(payload)?;
            if deflated.len() < payload.len() {
                body = Some(deflated);
            }
        }
        let compressed = body.is_some();
        let body = body.as_deref().unwrap_or(payload);

        let mut iv = vec![0u8; cipher.iv_length()];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = cipher.encrypt(keys.cipher_key(), &iv, body)?;
        if ciphertext.len() > MAX_CIPHERTEXT_LENGTH {
            return Err(EnvelopeError::PayloadTooLarge {
                size: ciphertext.len(),
                max: MAX_CIPHERTEXT_LENGTH,
            });
        }

        let mut envelope = Envelope {
            flags: CipherFlags { compressed, cipher },
            iv,
            ciphertext,
            signature: [0u8; MAC_LENGTH],
        };
        envelope.signature =
            signature::calculate_signature(keys.signing_key(), &envelope.signed_bytes()?)?;

        debug!(
            cipher = %cipher,
            compressed,
            payload_len = payload.len(),
            ciphertext_len = envelope.ciphertext.len(),
            "Sealed envelope"
        );
        Ok(envelope)
    }

    /// Parse an envelope, rejecting anything that is not exactly one
    /// well-formed envelope
    pub fn parse(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let mut reader = Cursor::new(bytes);

        let mut magic = [0u8; 3];
        magic.copy_from_slice(&read_bytes(&mut reader, MAGIC.len()).map_err(truncation)?);
        if magic != MAGIC {
            return Err(EnvelopeError::BadMagic(magic));
        }
        let version = read_u8(&mut reader).map_err(truncation)?;
        if version != VERSION {
            return Err(EnvelopeError::UnsupportedVersion(version));
        }

        let flags = CipherFlags::from_byte(read_u8(&mut reader).map_err(truncation)?)?;

        let iv_len = read_u8(&mut reader).map_err(truncation)? as usize;
        if iv_len != flags.cipher.iv_length() {
            return Err(EnvelopeError::IvLength {
                expected: flags.cipher.iv_length(),
                got: iv_len,
            });
        }
        let iv = read_bytes(&mut reader, iv_len).map_err(truncation)?;

        let ct_len = read_u16_be(&mut reader).map_err(truncation)? as usize;
        let ciphertext = read_bytes(&mut reader, ct_len).map_err(truncation)?;

        let mut signature = [0u8; MAC_LENGTH];
        signature.copy_from_slice(&read_bytes(&mut reader, MAC_LENGTH).map_err(truncation)?);

        let consumed = reader.position() as usize;
        if consumed != bytes.len() {
            return Err(EnvelopeError::TrailingBytes(bytes.len() - consumed));
        }

        Ok(Envelope {
            flags,
            iv,
            ciphertext,
            signature,
        })
    }

    /// Cipher suite named by the envelope
    pub fn cipher(&self) -> CipherSuite {
        self.flags.cipher
    }

    /// Check the signature with keys derived for [`Envelope::cipher`]
    ///
    /// Parsing only accepts the canonical layout, so re-serializing the
    /// prefix reproduces exactly the bytes that were received.
    pub fn verify(self, keys: &DerivedKeys) -> Result<VerifiedEnvelope, EnvelopeError> {
        signature::verify_signature(keys.signing_key(), &self.signed_bytes()?, &self.signature)?;
        Ok(VerifiedEnvelope(self))
    }

    /// Every byte covered by the signature
    fn signed_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.serialized_size());
        self.write_prefix(&mut out)?;
        Ok(out)
    }

    fn write_prefix<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let ct_len = u16::try_from(self.ciphertext.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "Ciphertext too large for u16")
        })?;
        let iv_len = u8::try_from(self.iv.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "IV too large for u8"))?;

        write_bytes(writer, &MAGIC)?;
        write_u8(writer, VERSION)?;
        write_u8(writer, self.flags.to_byte())?;
        write_u8(writer, iv_len)?;
        write_bytes(writer, &self.iv)?;
        write_u16_be(writer, ct_len)?;
        write_bytes(writer, &self.ciphertext)
    }

    /// Serialize the whole envelope
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.serialized_size());
        self.write_to(&mut out)?;
        Ok(out)
    }
}

impl BinaryWrite for Envelope {
    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.write_prefix(writer)?;
        write_bytes(writer, &self.signature)
    }

    fn serialized_size(&self) -> usize {
        MIN_ENVELOPE_LENGTH + self.iv.len() + self.ciphertext.len()
    }
}

impl VerifiedEnvelope {
    /// Decrypt and, if flagged, inflate the payload
    pub fn decrypt(&self, keys: &DerivedKeys) -> Result<Vec<u8>, EnvelopeError> {
        let envelope = &self.0;
        let body = envelope
            .cipher()
            .decrypt(keys.cipher_key(), &envelope.iv, &envelope.ciphertext)?;

        if envelope.flags.compressed {
            Ok(compression::decompress(&body)?)
        } else {
            Ok(body)
        }
    }

    /// Access the verified envelope
    pub fn envelope(&self) -> &Envelope {
        &self.0
    }
}

fn truncation(err: io::Error) -> EnvelopeError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        EnvelopeError::Truncated
    } else {
        EnvelopeError::Io(err)
    }
}
