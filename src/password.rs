//! Password hashing
//!
//! Argon2 with a fresh salt per hash; only hashes are ever stored

use argon2::Argon2;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;

/// Generate a random password, used for the bootstrap account
pub fn generate() -> String {
    SaltString::generate(&mut OsRng).to_string()
}

/// Hash a password for storage
pub fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("Valid hashed password")
        .to_string()
}

/// Check a password against a stored hash
///
/// A hash that does not parse fails verification rather than panicking
pub fn verify(hashed_password: &str, password: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hashed_password) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
