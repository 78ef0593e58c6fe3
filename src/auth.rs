//! The handshake and `mysql_native_password` auth scheme.

use sha1::{Digest, Sha1};

use crate::error::{Error, Result};

const MYSQL_NATIVE_PASSWORD: &str = "mysql_native_password";
const MYSQL_CLEAR_PASSWORD: &str = "mysql_clear_password";

/// Compute the auth-response body for the handshake response packet.
///
/// Returns an error for any plugin other than `mysql_native_password`
/// (always supported) and `mysql_clear_password` (also supported, sent
/// verbatim).
pub fn compute_auth_response(plugin: &str, password: &str, scramble: &[u8]) -> Result<Vec<u8>> {
    match plugin {
        MYSQL_NATIVE_PASSWORD => Ok(native_password_response(password, scramble)),
        MYSQL_CLEAR_PASSWORD => Ok(password.as_bytes().to_vec()),
        other => Err(Error::Auth(format!(
            "unsupported authentication plugin: {other}"
        ))),
    }
}

/// `SHA1(password) XOR SHA1(scramble[0..20] || SHA1(SHA1(password)))`.
/// An empty password always produces an empty response, unconditionally
///.
fn native_password_response(password: &str, scramble: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }

    let stage1 = Sha1::digest(password.as_bytes());
    let stage2 = Sha1::digest(&stage1);

    let scramble20 = &scramble[..scramble.len().min(20)];

    let mut hasher = Sha1::new();
    hasher.update(scramble20);
    hasher.update(stage2);
    let message_hash = hasher.finalize();

    stage1
        .iter()
        .zip(message_hash.iter())
        .map(|(a, b)| a ^ b)
        .collect()
}
