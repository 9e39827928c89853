use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use tracing::instrument;

use shared_models::error::AppError;

pub struct PasswordService;

impl PasswordService {
    #[instrument(skip(password))]
    pub fn hash_password(password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
        Ok(password_hash.to_string())
    }

    /// Returns `false` for a wrong password and also for an unparseable hash.
    #[instrument(skip(password, hash))]
    pub fn verify_password(password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_matching_password() {
        let hash = PasswordService::hash_password("admin123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(PasswordService::verify_password("admin123", &hash));
        assert!(!PasswordService::verify_password("admin124", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!PasswordService::verify_password("anything", "not-a-hash"));
    }
}
