//! Cipher suite registry
//!
//! OpenToken identifies the payload cipher with a single byte. The table is
//! closed: an id that is not listed here is a hard failure on decode.
//!
//! | id | suite          | key | IV / block |
//! |----|----------------|-----|------------|
//! | 0  | none           | 0   | 0          |
//! | 1  | AES-256-CBC    | 32  | 16         |
//! | 2  | AES-128-CBC    | 16  | 16         |
//! | 3  | 3DES-168-CBC   | 24  | 8          |
//!
//! All block ciphers run in CBC mode with PKCS#7 padding. Integrity is
//! provided separately by HMAC-SHA1 over the envelope, independent of the
//! cipher id.

use aes::{Aes128, Aes256};
use cbc::cipher::{
    block_padding::Pkcs7, BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit,
};
use des::TdesEde3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("Unsupported cipher suite id: {0}")]
    UnsupportedCipher(u8),

    #[error("Unknown cipher suite name: {0}")]
    UnknownName(String),

    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Invalid IV length: expected {expected}, got {got}")]
    InvalidIvLength { expected: usize, got: usize },

    #[error("Ciphertext length {len} is not a multiple of the {block}-byte block size")]
    InvalidCiphertextLength { len: usize, block: usize },

    #[error("Invalid padding after decryption")]
    Padding,
}

/// Keyed hash used to sign every envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacAlgorithm {
    HmacSha1,
}

impl MacAlgorithm {
    /// Length of the MAC output in bytes
    pub const fn output_length(self) -> usize {
        match self {
            MacAlgorithm::HmacSha1 => 20,
        }
    }

    /// Length of the derived signing key in bytes
    pub const fn key_length(self) -> usize {
        match self {
            MacAlgorithm::HmacSha1 => 20,
        }
    }
}

/// Length of the signature trailing every envelope
pub const MAC_LENGTH: usize = MacAlgorithm::HmacSha1.output_length();

/// Supported payload ciphers, by wire id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CipherSuite {
    /// No encryption; the payload is only signed
    None = 0x00,
    Aes256Cbc = 0x01,
    Aes128Cbc = 0x02,
    /// Three-key triple DES (EDE3)
    Des3Cbc = 0x03,
}

impl CipherSuite {
    /// Every suite in the registry, in id order
    pub const ALL: [CipherSuite; 4] = [
        CipherSuite::None,
        CipherSuite::Aes256Cbc,
        CipherSuite::Aes128Cbc,
        CipherSuite::Des3Cbc,
    ];

    /// Look up a suite by its wire id
    pub fn from_id(id: u8) -> Result<Self, CipherError> {
        match id {
            0x00 => Ok(CipherSuite::None),
            0x01 => Ok(CipherSuite::Aes256Cbc),
            0x02 => Ok(CipherSuite::Aes128Cbc),
            0x03 => Ok(CipherSuite::Des3Cbc),
            other => Err(CipherError::UnsupportedCipher(other)),
        }
    }

    /// Wire id of this suite
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Canonical configuration name
    pub fn name(self) -> &'static str {
        match self {
            CipherSuite::None => "none",
            CipherSuite::Aes256Cbc => "aes-256-cbc",
            CipherSuite::Aes128Cbc => "aes-128-cbc",
            CipherSuite::Des3Cbc => "3des-168-cbc",
        }
    }

    /// Cipher key length in bytes
    pub fn key_length(self) -> usize {
        match self {
            CipherSuite::None => 0,
            CipherSuite::Aes256Cbc => 32,
            CipherSuite::Aes128Cbc => 16,
            CipherSuite::Des3Cbc => 24,
        }
    }

    /// IV length in bytes, equal to the block size
    pub fn iv_length(self) -> usize {
        match self {
            CipherSuite::None => 0,
            CipherSuite::Aes256Cbc | CipherSuite::Aes128Cbc => 16,
            CipherSuite::Des3Cbc => 8,
        }
    }

    /// MAC used to sign envelopes under this suite
    pub fn mac(self) -> MacAlgorithm {
        MacAlgorithm::HmacSha1
    }

    /// Encrypt `plaintext` with PKCS#7 padding
    ///
    /// For [`CipherSuite::None`] the plaintext is returned unchanged.
    pub fn encrypt(self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        self.check_lengths(key, iv)?;
        match self {
            CipherSuite::None => Ok(plaintext.to_vec()),
            CipherSuite::Aes256Cbc => cbc_encrypt::<Aes256>(key, iv, plaintext),
            CipherSuite::Aes128Cbc => cbc_encrypt::<Aes128>(key, iv, plaintext),
            CipherSuite::Des3Cbc => cbc_encrypt::<TdesEde3>(key, iv, plaintext),
        }
    }

    /// Decrypt `ciphertext` and strip PKCS#7 padding
    pub fn decrypt(
        self,
        key: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        self.check_lengths(key, iv)?;
        let block = self.iv_length();
        if block > 0 && (ciphertext.is_empty() || ciphertext.len() % block != 0) {
            return Err(CipherError::InvalidCiphertextLength {
                len: ciphertext.len(),
                block,
            });
        }
        match self {
            CipherSuite::None => Ok(ciphertext.to_vec()),
            CipherSuite::Aes256Cbc => cbc_decrypt::<Aes256>(key, iv, ciphertext),
            CipherSuite::Aes128Cbc => cbc_decrypt::<Aes128>(key, iv, ciphertext),
            CipherSuite::Des3Cbc => cbc_decrypt::<TdesEde3>(key, iv, ciphertext),
        }
    }

    fn check_lengths(self, key: &[u8], iv: &[u8]) -> Result<(), CipherError> {
        if key.len() != self.key_length() {
            return Err(CipherError::InvalidKeyLength {
                expected: self.key_length(),
                got: key.len(),
            });
        }
        if iv.len() != self.iv_length() {
            return Err(CipherError::InvalidIvLength {
                expected: self.iv_length(),
                got: iv.len(),
            });
        }
        Ok(())
    }
}

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CipherError>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv).map_err(|_| {
        CipherError::InvalidKeyLength {
            expected: C::key_size(),
            got: key.len(),
        }
    })?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CipherError>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv).map_err(|_| {
        CipherError::InvalidKeyLength {
            expected: C::key_size(),
            got: key.len(),
        }
    })?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CipherError::Padding)
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CipherSuite {
    type Err = CipherError;

    /// Accepts the canonical names plus the underscore spellings used by
    /// other OpenToken libraries (`aes_128_cbc`, `des3_168_cbc`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "none" | "null" => Ok(CipherSuite::None),
            "aes-256-cbc" | "aes256" => Ok(CipherSuite::Aes256Cbc),
            "aes-128-cbc" | "aes128" => Ok(CipherSuite::Aes128Cbc),
            "3des-168-cbc" | "des3-168-cbc" | "des-168-cbc" | "3des" => Ok(CipherSuite::Des3Cbc),
            _ => Err(CipherError::UnknownName(s.to_string())),
        }
    }
}

impl TryFrom<u8> for CipherSuite {
    type Error = CipherError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        CipherSuite::from_id(id)
    }
}
