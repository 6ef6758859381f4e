//! Password-based key derivation
//!
//! Both parties derive the same keys from a shared password and the cipher id
//! carried in the envelope. The construction is pinned and versioned:
//!
//! ```text
//! okm = PBKDF2-HMAC-SHA1(password, "OpenToken-KDF-v1" || suite_id, 1000, key_len + 20)
//! cipher_key  = okm[..key_len]
//! signing_key = okm[key_len..]
//! ```
//!
//! Changing any constant here breaks interoperability with every deployed
//! issuer, so a new construction must come with a new [`KDF_VERSION`].

use crate::cipher::CipherSuite;
use sha1::Sha1;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Version of the derivation construction below
pub const KDF_VERSION: u8 = 1;

/// Salt prefix; the suite id byte is appended
pub const KDF_SALT_PREFIX: &[u8] = b"OpenToken-KDF-v1";

/// PBKDF2 iteration count
pub const KDF_ITERATIONS: u32 = 1000;

/// Cipher and signing keys for one encode or decode call
///
/// Both buffers are cleared on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeys {
    cipher_key: Vec<u8>,
    signing_key: Vec<u8>,
}

impl DerivedKeys {
    /// Get a reference to the cipher key bytes
    pub fn cipher_key(&self) -> &[u8] {
        &self.cipher_key
    }

    /// Get a reference to the signing key bytes
    pub fn signing_key(&self) -> &[u8] {
        &self.signing_key
    }
}

impl std::fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKeys")
            .field("cipher_key", &"<redacted>")
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

/// Derive the cipher and signing keys for `suite` from `password`
pub fn derive_keys(password: &str, suite: CipherSuite) -> DerivedKeys {
    let cipher_len = suite.key_length();
    let signing_len = suite.mac().key_length();

    let mut salt = Vec::with_capacity(KDF_SALT_PREFIX.len() + 1);
    salt.extend_from_slice(KDF_SALT_PREFIX);
    salt.push(suite.id());

    let mut okm = zeroize::Zeroizing::new(vec![0u8; cipher_len + signing_len]);
    pbkdf2::pbkdf2_hmac::<Sha1>(password.as_bytes(), &salt, KDF_ITERATIONS, &mut okm);

    DerivedKeys {
        cipher_key: okm[..cipher_len].to_vec(),
        signing_key: okm[cipher_len..].to_vec(),
    }
}
