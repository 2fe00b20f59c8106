// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Random token helpers on top of ring's system CSPRNG.

use base64ct::{Base64UrlUnpadded, Encoding};
use ring::rand::{SecureRandom, SystemRandom};

#[derive(Debug, thiserror::Error)]
#[error("system random number generator unavailable")]
pub struct RandomUnavailable;

/// Fill `N` bytes from the system CSPRNG.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], RandomUnavailable> {
    let mut bytes = [0u8; N];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| RandomUnavailable)?;
    Ok(bytes)
}

/// 256-bit random token, base64url without padding (43 chars).
pub fn random_token() -> Result<String, RandomUnavailable> {
    Ok(Base64UrlUnpadded::encode_string(&random_bytes::<32>()?))
}

/// `0x` followed by 64 lowercase hex digits.
pub fn random_hex32() -> Result<String, RandomUnavailable> {
    let bytes = random_bytes::<32>()?;
    let mut out = String::with_capacity(66);
    out.push_str("0x");
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    Ok(out)
}
