//! Password hashing for local accounts: salted SHA-256.
//!
//! This workspace's only crypto primitives are `sha2`/`base64`/`rand` — no
//! dedicated password-hashing crate (argon2, bcrypt) is part of the
//! dependency stack, so a per-password random salt is the defense this
//! module can actually provide against rainbow-table attacks.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

/// Hash a plaintext password into a self-contained `salt$digest` string,
/// each half base64-encoded.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    let digest = digest_with_salt(&salt, password);
    format!("{}${}", BASE64.encode(salt), BASE64.encode(digest))
}

/// Check a plaintext password against a previously hashed value. Returns
/// `false` (rather than erroring) for a hash string in an unexpected shape.
#[must_use]
pub fn verify_password(password: &str, hashed: &str) -> bool {
    let Some((salt_b64, digest_b64)) = hashed.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (BASE64.decode(salt_b64), BASE64.decode(digest_b64)) else {
        return false;
    };
    digest_with_salt(&salt, password) == expected
}

fn digest_with_salt(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}
