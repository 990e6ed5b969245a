//! Salted, cost-parameterized password digests (Argon2id, PHC strings).

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

/// Argon2 work factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingCost {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl HashingCost {
    pub const fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }
}

impl Default for HashingCost {
    fn default() -> Self {
        Self::new(
            Params::DEFAULT_M_COST,
            Params::DEFAULT_T_COST,
            Params::DEFAULT_P_COST,
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("invalid hashing cost: {0}")]
    InvalidCost(String),

    #[error("hashing failed: {0}")]
    Hash(String),
}

/// Computes and checks password digests.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    pub fn new(cost: HashingCost) -> Result<Self, PasswordError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordError::InvalidCost(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `password` with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;

        let phc = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?
            .to_string();
        Ok(phc)
    }

    /// Check `password` against a stored PHC digest.
    ///
    /// The digest's own parameters are used, so credentials hashed under an
    /// older cost keep verifying. A malformed digest never matches.
    pub fn verify(&self, digest: &str, password: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self
                .argon2()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(HashingCost::new(8, 1, 1)).unwrap()
    }

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hasher = hasher();
        let digest = hasher.hash("pw").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(hasher.verify(&digest, "pw"));
        assert!(!hasher.verify(&digest, "pw2"));
        assert!(!hasher.verify(&digest, ""));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let hasher = hasher();
        assert_ne!(hasher.hash("pw").unwrap(), hasher.hash("pw").unwrap());
    }

    #[test]
    fn malformed_digest_never_matches() {
        assert!(!hasher().verify("not-a-phc-string", "pw"));
        assert!(!hasher().verify("", ""));
    }

    #[test]
    fn digest_from_a_different_cost_still_verifies() {
        let cheap = hasher();
        let digest = cheap.hash("pw").unwrap();
        let other = PasswordHasher::new(HashingCost::new(16, 2, 1)).unwrap();
        assert!(other.verify(&digest, "pw"));
    }

    #[test]
    fn rejects_impossible_cost() {
        assert!(matches!(
            PasswordHasher::new(HashingCost::new(1, 1, 1)),
            Err(PasswordError::InvalidCost(_))
        ));
    }
}
