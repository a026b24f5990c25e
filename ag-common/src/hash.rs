/// Pseudonymous identity derivation: salted SHA-224 of an authenticated
/// email, used throughout the system as `user_hash` (spec.md §3, Session).
pub fn salted_sha224(email: &str, salt: &str) -> String {
    use sha2::{Digest, Sha224};

    let mut hasher = Sha224::new();
    hasher.update(salt.as_bytes());
    hasher.update(email.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}
