//! The remember-token codec.
//!
//! A remember token is the identity key joined to a keyed digest:
//! `"<identity>|<hex(hmac-sha512(identity, secret))>"`. Decoding is total —
//! a malformed or tampered cookie decodes to `None`, never an error — and
//! the digest comparison is constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Computes the hex digest of `payload` under `key`.
fn cookie_digest(payload: &str, key: &[u8]) -> String {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Encodes `payload` into a signed remember-token value.
///
/// # Examples
///
/// ```
/// use login_rs::token::{decode_cookie, encode_cookie};
///
/// let token = encode_cookie("alice", b"secret");
/// assert_eq!(decode_cookie(&token, b"secret"), Some("alice".to_string()));
/// ```
pub fn encode_cookie(payload: &str, key: &[u8]) -> String {
    format!("{payload}|{}", cookie_digest(payload, key))
}

/// Verifies a remember-token value and returns its payload.
///
/// The value is split on the *last* `|`, so identity keys containing `|`
/// survive the round trip. Returns `None` when the separator is absent or
/// the digest does not match.
pub fn decode_cookie(cookie: &str, key: &[u8]) -> Option<String> {
    let (payload, digest) = cookie.rsplit_once('|')?;
    if constant_time_eq(cookie_digest(payload, key).as_bytes(), digest.as_bytes()) {
        Some(payload.to_string())
    } else {
        None
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
