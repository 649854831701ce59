//! Password hashing service using Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordVerifier, SaltString},
    Argon2, PasswordHasher,
};
use tracing::debug;

/// Salted one-way password hashing. Hashes are PHC strings carrying their own salt.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    /// False for a wrong password and for a stored hash that cannot be parsed
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "stored password hash is not a valid PHC string");
                return false;
            }
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let service = PasswordService::new();
        let hash = service.hash_password("pw1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("pw1"));
        assert!(service.verify_password("pw1", &hash));
        assert!(!service.verify_password("wrong", &hash));
    }

    #[test]
    fn test_salted() {
        let service = PasswordService::new();
        assert_ne!(service.hash_password("same").unwrap(), service.hash_password("same").unwrap());
    }

    #[test]
    fn test_garbage_hash_does_not_verify() {
        let service = PasswordService::new();
        assert!(!service.verify_password("pw1", "pw1"));
        assert!(!service.verify_password("pw1", ""));
    }
}
