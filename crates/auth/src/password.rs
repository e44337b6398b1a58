//! Password verification collaborator.
//!
//! The credential service never hashes on its own; it asks a
//! [`PasswordVerifier`]. [`Sha256PasswordVerifier`] is the built-in
//! implementation for dev and tests.
//!
//! A single salted SHA-256 round is fast to brute-force and is NOT suitable
//! for production password storage. Deployments plug in a verifier backed by a
//! slow, memory-hard KDF (argon2, scrypt or bcrypt).

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// One-way password hash/compare primitive.
pub trait PasswordVerifier: Send + Sync {
    fn hash(&self, secret: &str) -> String;

    /// Compare a presented secret against a stored hash in constant time.
    ///
    /// Malformed hashes verify as `false`.
    fn verify(&self, secret: &str, hash: &str) -> bool;
}

const SCHEME: &str = "sha256";

/// Salted SHA-256: `sha256$<salt-hex>$<digest-hex>`. Dev/test only.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256PasswordVerifier;

impl Sha256PasswordVerifier {
    pub fn new() -> Self {
        Self
    }

    fn digest(salt: &[u8], secret: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(secret.as_bytes());
        hasher.finalize().into()
    }
}

impl PasswordVerifier for Sha256PasswordVerifier {
    fn hash(&self, secret: &str) -> String {
        let salt = Uuid::new_v4();
        let digest = Self::digest(salt.as_bytes(), secret);
        format!("{SCHEME}${}${}", hex::encode(salt.as_bytes()), hex::encode(digest))
    }

    fn verify(&self, secret: &str, hash: &str) -> bool {
        let mut parts = hash.splitn(3, '$');
        let (Some(scheme), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next()) else {
            return false;
        };
        if scheme != SCHEME {
            return false;
        }
        let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
            return false;
        };

        let actual = Self::digest(&salt, secret);
        if actual.len() != expected.len() {
            return false;
        }
        actual.as_slice().ct_eq(expected.as_slice()).into()
    }
}
