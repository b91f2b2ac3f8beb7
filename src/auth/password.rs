use bcrypt::{hash, verify, DEFAULT_COST};
use std::borrow::Cow;
use validator::ValidationError;

use super::service::AuthError;

/// bcrypt ignores everything past this many bytes, so longer input is refused
/// instead of being silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

pub const PASSWORD_TOO_LONG_MESSAGE: &str = "password must be at most 72 bytes";

/// `validator` hook enforcing [`MAX_PASSWORD_BYTES`] on request bodies.
/// `length(max = ..)` counts characters, which is not what bcrypt sees.
pub fn validate_password_bytes(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_BYTES {
        let mut err = ValidationError::new("password_too_long");
        err.message = Some(Cow::Borrowed(PASSWORD_TOO_LONG_MESSAGE));
        return Err(err);
    }
    Ok(())
}

/// Salted one-way password hashing with bcrypt.
///
/// The cost is fixed at construction; digests produced with any other cost
/// still verify because bcrypt encodes the cost in the digest.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::Validation(PASSWORD_TOO_LONG_MESSAGE.into()));
        }
        hash(password, self.cost)
            .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Checks `password` against a stored digest. A digest that bcrypt cannot
    /// parse is an internal error, not a mismatch. Input over
    /// [`MAX_PASSWORD_BYTES`] never matches, since no digest was made from it.
    pub fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        verify(password, password_hash)
            .map_err(|e| AuthError::Internal(format!("Failed to verify password: {}", e)))
    }

    /// Runs [`hash`](Self::hash) on the blocking thread pool.
    pub async fn hash_blocking(self, password: String) -> Result<String, AuthError> {
        tokio::task::spawn_blocking(move || self.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {}", e)))?
    }

    /// Runs [`verify`](Self::verify) on the blocking thread pool.
    pub async fn verify_blocking(
        self,
        password: String,
        password_hash: String,
    ) -> Result<bool, AuthError> {
        tokio::task::spawn_blocking(move || self.verify(&password, &password_hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Verification task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn test_password_hashing_and_verification() {
        let hasher = hasher();
        let hashed = hasher.hash("test_password123").unwrap();

        assert_ne!(hashed, "test_password123");
        assert!(hasher.verify("test_password123", &hashed).unwrap());
        assert!(!hasher.verify("wrong_password", &hashed).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = hasher();
        let first = hasher.hash("same").unwrap();
        let second = hasher.hash("same").unwrap();

        assert_ne!(first, second);
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn test_digest_from_other_cost_still_verifies() {
        let digest = PasswordHasher::new(5).hash("pw").unwrap();
        assert!(hasher().verify("pw", &digest).unwrap());
    }

    #[test]
    fn test_verify_with_invalid_hash() {
        match hasher().verify("test_password123", "invalidhashformat") {
            Err(AuthError::Internal(msg)) => assert!(msg.contains("Failed to verify password")),
            other => panic!("expected an internal error, got {:?}", other),
        }
    }

    #[test]
    fn test_multibyte_password_over_72_bytes_is_rejected() {
        let hasher = hasher();
        let long = "é".repeat(40);
        assert_eq!(long.chars().count(), 40);

        match hasher.hash(&long) {
            Err(AuthError::Validation(msg)) => assert_eq!(msg, PASSWORD_TOO_LONG_MESSAGE),
            other => panic!("expected a validation error, got {:?}", other),
        }
        assert!(validate_password_bytes(&long).is_err());
    }

    #[test]
    fn test_longer_password_sharing_a_72_byte_prefix_does_not_verify() {
        let hasher = hasher();
        let exact = "é".repeat(36);
        assert_eq!(exact.len(), MAX_PASSWORD_BYTES);
        assert!(validate_password_bytes(&exact).is_ok());

        let digest = hasher.hash(&exact).unwrap();
        assert!(hasher.verify(&exact, &digest).unwrap());
        assert!(!hasher.verify(&format!("{}zz", exact), &digest).unwrap());
    }

    #[actix_rt::test]
    async fn test_blocking_variants() {
        let hasher = hasher();
        let digest = hasher.hash_blocking("pw".into()).await.unwrap();
        assert!(hasher
            .verify_blocking("pw".into(), digest)
            .await
            .unwrap());
    }
}
