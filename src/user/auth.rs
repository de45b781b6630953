//! Authentication primitives: session tokens and password hashing.

use anyhow::{bail, Result};
use rand::Rng;
use rand_distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct AuthTokenValue(pub String);

impl AuthTokenValue {
    pub fn generate() -> AuthTokenValue {
        let rng = rand::rng();
        let random_string: String = rng
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();
        AuthTokenValue(random_string)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct AuthToken {
    pub user_id: usize,
    pub created_at: i64,
    pub last_used_at: Option<i64>,
    pub value: AuthTokenValue,
}

mod parlor_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn generate_b64_salt() -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash<T: AsRef<str>>(plain: &[u8], b64_salt: T) -> Result<String> {
        let argon2 = Argon2::default();
        let salt = SaltString::from_b64(b64_salt.as_ref()).map_err(|err| anyhow!("{}", err))?;
        let hash_string = argon2
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash_string)
    }

    pub fn verify<T: AsRef<str>>(plain_pw: &[u8], target_hash: T) -> Result<bool> {
        let argon2 = Argon2::default();
        let password_hash =
            PasswordHash::new(target_hash.as_ref()).map_err(|err| anyhow!("{}", err))?;
        Ok(argon2.verify_password(plain_pw, &password_hash).is_ok())
    }
}

#[cfg(feature = "test-fast-hasher")]
mod fast_sha2 {
    use sha2::{Digest, Sha256};

    pub fn hash(plain: &[u8], salt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(plain);
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

/// Password hashing scheme, stored per user so existing hashes keep verifying
/// if the default ever changes.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum ParlorHasher {
    Argon2,
    /// Plain salted SHA-256, orders of magnitude faster than argon2.
    /// Test builds only (DO NOT use in production!)
    #[cfg(feature = "test-fast-hasher")]
    FastSha2,
}

impl ParlorHasher {
    pub fn default_hasher() -> Self {
        #[cfg(feature = "test-fast-hasher")]
        return ParlorHasher::FastSha2;

        #[cfg(not(feature = "test-fast-hasher"))]
        ParlorHasher::Argon2
    }

    pub fn generate_b64_salt(&self) -> String {
        parlor_argon2::generate_b64_salt()
    }

    pub fn hash(&self, plain: &[u8], b64_salt: &str) -> Result<String> {
        match self {
            ParlorHasher::Argon2 => parlor_argon2::hash(plain, b64_salt),
            #[cfg(feature = "test-fast-hasher")]
            ParlorHasher::FastSha2 => Ok(fast_sha2::hash(plain, b64_salt)),
        }
    }

    pub fn verify(&self, plain_pw: &str, target_hash: &str, salt: &str) -> Result<bool> {
        match self {
            ParlorHasher::Argon2 => parlor_argon2::verify(plain_pw.as_bytes(), target_hash),
            #[cfg(feature = "test-fast-hasher")]
            ParlorHasher::FastSha2 => Ok(fast_sha2::hash(plain_pw.as_bytes(), salt) == target_hash),
        }
    }
}

impl FromStr for ParlorHasher {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(ParlorHasher::Argon2),
            #[cfg(feature = "test-fast-hasher")]
            "sha2-fast" => Ok(ParlorHasher::FastSha2),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl std::fmt::Display for ParlorHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParlorHasher::Argon2 => "argon2",
            #[cfg(feature = "test-fast-hasher")]
            ParlorHasher::FastSha2 => "sha2-fast",
        };
        write!(f, "{}", name)
    }
}

/// Freshly hashed password material, ready to be stored for a new user.
#[derive(Clone, Debug)]
pub struct PasswordCredentials {
    pub salt: String,
    pub hash: String,
    pub hasher: ParlorHasher,
}

/// Stored credentials of an existing user.
#[derive(Clone, Debug)]
pub struct UserCredentials {
    pub user_id: usize,
    pub salt: String,
    pub hash: String,
    pub hasher: ParlorHasher,
}

impl UserCredentials {
    pub fn verify(&self, plain: &str) -> Result<bool> {
        self.hasher.verify(plain, &self.hash, &self.salt)
    }
}

/// Hash a plaintext password with the build's default hasher.
pub fn hash_password(plain: &str) -> Result<PasswordCredentials> {
    let hasher = ParlorHasher::default_hasher();
    let salt = hasher.generate_b64_salt();
    let hash = hasher.hash(plain.as_bytes(), &salt)?;
    Ok(PasswordCredentials { salt, hash, hasher })
}
