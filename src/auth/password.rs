// Password hashing behind a trait so the scheme can be swapped without
// touching the services that consume it.
use thiserror::Error;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(String);

pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password for storage.
    fn hash(&self, plain: &str) -> Result<String, HashError>;

    /// Check a plaintext password against a stored hash.
    fn verify(&self, plain: &str, hashed: &str) -> Result<bool, HashError>;
}

/// bcrypt-backed hasher used everywhere outside of tests.
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> Result<String, HashError> {
        bcrypt::hash(plain, self.cost).map_err(|e| HashError(e.to_string()))
    }

    fn verify(&self, plain: &str, hashed: &str) -> Result<bool, HashError> {
        bcrypt::verify(plain, hashed).map_err(|e| HashError(e.to_string()))
    }
}
