//! HMAC-SHA1 envelope signatures with constant-time verification
//!
//! The signature covers every envelope byte that precedes it. Verification
//! uses `subtle::ConstantTimeEq` so a forged signature cannot be recovered
//! byte by byte through timing.

use crate::cipher::MAC_LENGTH;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("HMAC initialization failed")]
    InitFailed,

    #[error("Signature verification failed")]
    VerificationFailed,
}

/// Calculate HMAC-SHA1 over data
pub fn calculate_signature(key: &[u8], data: &[u8]) -> Result<[u8; MAC_LENGTH], SignatureError> {
    let mut mac = HmacSha1::new_from_slice(key).map_err(|_| SignatureError::InitFailed)?;
    mac.update(data);
    let mut out = [0u8; MAC_LENGTH];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// Verify a received signature against `data`
///
/// A signature of the wrong length fails the same way as a wrong value.
pub fn verify_signature(key: &[u8], data: &[u8], received: &[u8]) -> Result<(), SignatureError> {
    let calculated = calculate_signature(key, data)?;

    if calculated[..].ct_eq(received).into() {
        Ok(())
    } else {
        Err(SignatureError::VerificationFailed)
    }
}
