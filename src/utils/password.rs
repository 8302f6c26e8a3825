use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

const VERSION_PREFIX: &str = "v1:";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const PBKDF2_ITERATIONS: u32 = 120_000;

/// Hashes a credential for at-rest storage: `v1:` + base64(salt ‖ derived).
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let derived = derive_key(password.as_bytes(), &salt);

    let mut payload = Vec::with_capacity(SALT_LEN + KEY_LEN);
    payload.extend_from_slice(&salt);
    payload.extend_from_slice(&derived);

    format!("{VERSION_PREFIX}{}", Base64.encode(payload))
}

/// Verifies a credential against a stored hash. Unknown or corrupt encodings
/// verify as false rather than erroring, so stored garbage cannot grant
/// access.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some(encoded) = stored.strip_prefix(VERSION_PREFIX) else {
        return false;
    };
    let Ok(decoded) = Base64.decode(encoded.as_bytes()) else {
        return false;
    };
    if decoded.len() != SALT_LEN + KEY_LEN {
        return false;
    }

    let (salt, expected) = decoded.split_at(SALT_LEN);
    let derived = derive_key(password.as_bytes(), salt);

    // Fixed-length comparison over the full derived key.
    let mut diff = 0u8;
    for (a, b) in derived.iter().zip(expected.iter()) {
        diff |= a ^ b;
    }
    diff == 0
}

fn derive_key(password: &[u8], salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ITERATIONS, &mut key);
    key
}
