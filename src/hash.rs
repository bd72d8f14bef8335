use argon2rs::{Argon2, Variant};
use lazy_static::lazy_static;
use ring::{
    constant_time,
    rand::{SecureRandom, SystemRandom},
};

use crate::config::{ConfigError, HashCost};
use crate::error::AppError;

const SALT_LEN: usize = 32;
const DIGEST_LEN: usize = 32;

/// Length of a stored hash: the salt followed by the digest.
pub const STORED_LEN: usize = SALT_LEN + DIGEST_LEN;

lazy_static! {
    static ref RNG: SystemRandom = SystemRandom::new();
}

/// Generate a random 32-byte salt value.
fn random_salt() -> Result<[u8; SALT_LEN], AppError> {
    let mut salt = [0; SALT_LEN];
    RNG.fill(&mut salt)
        .map_err(|_| AppError::Internal("system RNG failed".to_string()))?;
    Ok(salt)
}

/// Salts, peppers and hashes passwords with Argon2i.
pub struct CredentialHasher {
    argon: Argon2,
    pepper: Vec<u8>,
    min_len: usize,
}

impl CredentialHasher {
    pub fn new(cost: HashCost, pepper: Vec<u8>, min_len: usize) -> Result<Self, ConfigError> {
        if pepper.len() > 32 {
            return Err(ConfigError::PepperTooLong(pepper.len()));
        }
        let HashCost { passes, kib, lanes } = cost;
        let argon = Argon2::new(passes, lanes, kib, Variant::Argon2i)
            .map_err(|_| ConfigError::HashCost { passes, kib, lanes })?;

        Ok(CredentialHasher {
            argon,
            pepper,
            min_len,
        })
    }

    pub fn check_strength(&self, password: &str) -> Result<(), AppError> {
        if password.chars().count() < self.min_len {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                self.min_len
            )));
        }
        Ok(())
    }

    fn digest(&self, salt: &[u8], password: &str) -> [u8; DIGEST_LEN] {
        let mut out = [0; DIGEST_LEN];
        self.argon
            .hash(&mut out, password.as_bytes(), salt, &self.pepper, b"");
        out
    }

    /// Generate a random salt, then salt and pepper the password.
    pub fn hash(&self, password: &str) -> Result<Vec<u8>, AppError> {
        self.check_strength(password)?;
        let salt = random_salt()?;
        let digest = self.digest(&salt, password);

        let mut stored = Vec::with_capacity(STORED_LEN);
        stored.extend_from_slice(&salt);
        stored.extend_from_slice(&digest);
        Ok(stored)
    }

    pub fn verify(&self, password: &str, stored: &[u8]) -> bool {
        if stored.len() != STORED_LEN {
            return false;
        }
        let (salt, expected) = stored.split_at(SALT_LEN);
        let actual = self.digest(salt, password);
        constant_time::verify_slices_are_equal(&actual, expected).is_ok()
    }

    /// A well-formed stored hash that no password matches. Verifying against it
    /// costs the same as verifying a real user's hash.
    pub fn decoy(&self) -> &'static [u8] {
        static DECOY: [u8; STORED_LEN] = [0; STORED_LEN];
        &DECOY
    }
}
