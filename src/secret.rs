use crate::config::ConfigError;
use log::warn;
use std::{fs, io::ErrorKind, path::Path};

static PEPPER: &str = "pandas_users_pepper";

/// Load the password pepper from the secrets directory.
///
/// A missing secret is not fatal: hashing then runs without a pepper. Create it
/// with `docker secret create pandas_users_pepper <file>` in production.
pub fn pepper<P>(secrets_dir: P) -> Result<Vec<u8>, ConfigError>
where
    P: AsRef<Path>,
{
    let path = secrets_dir.as_ref().join(PEPPER);

    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("{} not found, hashing passwords without a pepper", path.display());
            return Ok(Vec::new());
        }
        Err(source) => return Err(ConfigError::Secret { path, source }),
    };

    if data.len() > 32 {
        return Err(ConfigError::PepperTooLong(data.len()));
    }

    Ok(data)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_pepper() {
        let dir = tempfile::tempdir().unwrap();
        assert!(pepper(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_read_pepper() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PEPPER), b"NAqdplo5YPcZ84UbCCvWH9OOTJOXAEzr").unwrap();
        assert_eq!(pepper(dir.path()).unwrap().len(), 32);
    }

    #[test]
    fn test_pepper_too_long() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PEPPER), [7u8; 33]).unwrap();
        assert!(matches!(
            pepper(dir.path()),
            Err(ConfigError::PepperTooLong(33))
        ));
    }
}
