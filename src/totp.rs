// totp.rs
// TOTP utilities: build a TOTP instance for login checks and enrollment, and
// generate Base32 secrets for new users.

use anyhow::Result;
use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use totp_rs::{Algorithm, Secret, TOTP};

pub const MIN_SECRET_BYTES: usize = 16; // 128 bits (mandatory minimum)
pub const DEFAULT_SECRET_BYTES: usize = 20; // 160 bits (recommended)

/// Build a TOTP instance with the organization as issuer and the user's email
/// as account name. Validates minimum secret length after Base32 decoding.
pub fn build_totp(issuer: &str, email: &str, base32_secret: &str) -> Result<TOTP> {
    let secret = Secret::Encoded(base32_secret.to_string()).to_bytes()?;
    if secret.len() < MIN_SECRET_BYTES {
        anyhow::bail!(
            "Shared secret too short: {} bytes, need >= {} ({} bits)",
            secret.len(),
            MIN_SECRET_BYTES,
            MIN_SECRET_BYTES * 8
        );
    }
    let totp = TOTP::new(
        Algorithm::SHA1,          // compatible with Google Authenticator
        6,                        // digits
        1,                        // skew (±1 timestep to absorb clock drift)
        30,                       // period in seconds
        secret,
        Some(issuer.to_string()),
        email.to_string(),
    )?;
    Ok(totp)
}

/// Generate a random Base32 (NOPAD) secret of `bytes` length.
pub fn generate_base32_secret(bytes: usize) -> String {
    let n = bytes.max(MIN_SECRET_BYTES);
    let mut buf = vec![0u8; n];
    let mut rng = rand::rng();
    rng.fill_bytes(&mut buf);
    BASE32_NOPAD.encode(&buf)
}
