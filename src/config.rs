use std::{env, path::PathBuf, str::FromStr};
use thiserror::Error;

static DATABASE_URL: &str = "DATABASE_URL";
static BIND_ADDR: &str = "BIND_ADDR";
static POOL_SIZE: &str = "POOL_SIZE";
static IMAGE_DIR: &str = "IMAGE_DIR";
static MAX_IMAGE_BYTES: &str = "MAX_IMAGE_BYTES";
static MIN_PASSWORD_LENGTH: &str = "MIN_PASSWORD_LENGTH";
static HASH_PASSES: &str = "HASH_PASSES";
static HASH_KIB: &str = "HASH_KIB";
static HASH_LANES: &str = "HASH_LANES";
static SECRETS_DIR: &str = "SECRETS_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}: cannot parse {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("invalid argon2 parameters (passes={passes}, kib={kib}, lanes={lanes})")]
    HashCost { passes: u32, kib: u32, lanes: u32 },
    #[error("pepper is {0} bytes, at most 32 are allowed")]
    PepperTooLong(usize),
    #[error("failed to read secret {}: {source}", .path.display())]
    Secret {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Argon2 work factors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashCost {
    pub passes: u32,
    pub kib: u32,
    pub lanes: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        HashCost {
            passes: 3,
            kib: 4096,
            lanes: 1,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub pool_size: u32,
    pub image_dir: PathBuf,
    pub max_image_bytes: usize,
    pub min_password_len: usize,
    pub hash_cost: HashCost,
    pub secrets_dir: PathBuf,
}

impl Config {
    /// Read the configuration from the process environment, loading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = HashCost::default();

        Ok(Config {
            database_url: lookup(DATABASE_URL).unwrap_or_else(|| "users.db".to_string()),
            bind_addr: lookup(BIND_ADDR).unwrap_or_else(|| "localhost:8080".to_string()),
            pool_size: parse(&lookup, POOL_SIZE, 8)?,
            image_dir: lookup(IMAGE_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("images")),
            max_image_bytes: parse(&lookup, MAX_IMAGE_BYTES, 2 * 1024 * 1024)?,
            min_password_len: parse(&lookup, MIN_PASSWORD_LENGTH, 6)?,
            hash_cost: HashCost {
                passes: parse(&lookup, HASH_PASSES, defaults.passes)?,
                kib: parse(&lookup, HASH_KIB, defaults.kib)?,
                lanes: parse(&lookup, HASH_LANES, defaults.lanes)?,
            },
            secrets_dir: lookup(SECRETS_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/run/secrets")),
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_in(&[])).unwrap();
        assert_eq!(config.database_url, "users.db");
        assert_eq!(config.bind_addr, "localhost:8080");
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.min_password_len, 6);
        assert_eq!(config.hash_cost, HashCost::default());
        assert_eq!(config.secrets_dir, PathBuf::from("/run/secrets"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_in(&[
            ("DATABASE_URL", "/tmp/test.db"),
            ("MIN_PASSWORD_LENGTH", " 10 "),
            ("HASH_KIB", "64"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "/tmp/test.db");
        assert_eq!(config.min_password_len, 10);
        assert_eq!(config.hash_cost.kib, 64);
    }

    #[test]
    fn test_invalid_number() {
        let err = Config::from_lookup(lookup_in(&[("POOL_SIZE", "lots")])).unwrap_err();
        match err {
            ConfigError::Invalid { key, value } => {
                assert_eq!(key, "POOL_SIZE");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
