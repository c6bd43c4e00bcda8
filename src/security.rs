//! Kiosk PIN hashing and verification.
//!
//! PINs are stored as argon2 PHC strings and never compared in plain text.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{AttendanceError, AttendanceResult};

/// Hashes a PIN into a PHC string with a fresh random salt.
///
/// # Examples
///
/// ```
/// use attendance_engine::security::{hash_pin, verify_pin};
///
/// let hash = hash_pin("4821").unwrap();
/// assert!(hash.starts_with("$argon2"));
/// assert!(verify_pin("4821", &hash).is_ok());
/// ```
pub fn hash_pin(pin: &str) -> AttendanceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AttendanceError::persistence(format!("failed to hash PIN: {}", e)))
}

/// Verifies a PIN against a stored PHC string.
///
/// A malformed stored hash is treated as a mismatch.
///
/// # Errors
///
/// Returns [`AttendanceError::InvalidPin`] if the PIN does not match.
pub fn verify_pin(pin: &str, stored_hash: &str) -> AttendanceResult<()> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        tracing::warn!(error = %e, "stored PIN hash is not a valid PHC string");
        AttendanceError::InvalidPin
    })?;

    Argon2::default()
        .verify_password(pin.as_bytes(), &parsed)
        .map_err(|_| AttendanceError::InvalidPin)
}
