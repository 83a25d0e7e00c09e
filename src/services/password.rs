// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing with PBKDF2-HMAC-SHA256.
//!
//! Stored format: `{iterations}${salt_hex}${hash_hex}`. The iteration count
//! is embedded so it can be raised later without invalidating old hashes.

use std::num::NonZeroU32;

use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};

use crate::error::{AppError, Result};

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = digest::SHA256_OUTPUT_LEN;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG unavailable")))?;

    let iterations = NonZeroU32::new(PBKDF2_ITERATIONS)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid PBKDF2 iteration count")))?;

    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    Ok(format!(
        "{PBKDF2_ITERATIONS}${}${}",
        hex::encode(salt),
        hex::encode(hash)
    ))
}

/// Verify a password against a stored hash. Returns `false` for malformed
/// stored values rather than erroring; callers treat both as a failed login.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(iter_part), Some(salt_part), Some(hash_part)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let Some(iterations) = iter_part.parse::<u32>().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_part) else {
        return false;
    };
    let Ok(expected) = hex::decode(hash_part) else {
        return false;
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &expected,
    )
    .is_ok()
}
