//! Staff password hashing (Argon2id, PHC strings)

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::RegistryError;

/// Minimum accepted password length at signup
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password; the returned PHC string carries salt and parameters
pub fn hash_password(password: &str) -> Result<String, RegistryError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| RegistryError::Internal(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, RegistryError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| RegistryError::Internal(format!("Stored password hash is malformed: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("kapitan-2024").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("kapitan-2024", &hash).unwrap());
        assert!(!verify_password("kagawad-2024", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash() {
        assert!(verify_password("password", "plaintext").is_err());
    }
}
