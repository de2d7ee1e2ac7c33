//! Password hashing for the provisioned test user

use crate::backend::PasswordHasher;
use crate::error::{Error, Result};
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher as _, SaltString};
use async_trait::async_trait;

/// Hashes passwords with Argon2id and a fresh random salt per call.
///
/// Output is a PHC-format string, so the hash carries its own salt
/// and parameters and can be verified without extra bookkeeping.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    async fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Hash(e.to_string()))
    }
}
