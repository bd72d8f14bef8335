use log::debug;
use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use crate::error::AppError;

/// Stored image path of users who never uploaded one.
pub const PLACEHOLDER_IMAGE: &str = "placeholder.png";

/// Served when neither the user's file nor a placeholder exists on disk.
pub static PLACEHOLDER_PNG: &[u8] = include_bytes!("../assets/placeholder.png");

/// Accepted upload content types and the extension each is stored under.
pub const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// The canonical spelling of `content_type` if it is on the allow-list.
pub fn allowed_type(content_type: &str) -> Option<&'static str> {
    ALLOWED_TYPES
        .iter()
        .find(|(ty, _)| ty.eq_ignore_ascii_case(content_type))
        .map(|(ty, _)| *ty)
}

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_TYPES
        .iter()
        .find(|(ty, _)| ty.eq_ignore_ascii_case(content_type))
        .map(|(_, ext)| *ext)
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    ALLOWED_TYPES
        .iter()
        .find(|(_, e)| e.eq_ignore_ascii_case(ext))
        .map(|(ty, _)| *ty)
        .unwrap_or("application/octet-stream")
}

pub struct Image {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Profile images on the local filesystem, one file per user.
pub struct ImageStore {
    root: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new<P>(root: P, max_bytes: usize) -> io::Result<Self>
    where
        P: Into<PathBuf>,
    {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(ImageStore { root, max_bytes })
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    // only the final component of a stored path is trusted
    fn resolve(&self, stored: &str) -> Option<PathBuf> {
        Path::new(stored).file_name().map(|name| self.root.join(name))
    }

    /// Write `<root>/<username>.<ext>` and return the path to record for the user.
    pub fn save(&self, username: &str, content_type: &str, bytes: &[u8]) -> Result<String, AppError> {
        let ext = extension_for(content_type).ok_or_else(|| {
            AppError::Validation(format!("unsupported image type {}", content_type))
        })?;
        if bytes.len() > self.max_bytes {
            return Err(AppError::Validation(format!(
                "image exceeds {} bytes",
                self.max_bytes
            )));
        }

        let name = format!("{}.{}", username, ext);
        fs::write(self.root.join(&name), bytes)?;
        Ok(name)
    }

    pub fn load(&self, stored: &str) -> io::Result<Image> {
        if let Some(path) = self.resolve(stored) {
            match fs::read(&path) {
                Ok(bytes) => {
                    return Ok(Image {
                        content_type: content_type_for(&path),
                        bytes,
                    })
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("{} missing, serving placeholder", path.display());
                }
                Err(e) => return Err(e),
            }
        }
        self.placeholder()
    }

    fn placeholder(&self) -> io::Result<Image> {
        let bytes = match fs::read(self.root.join(PLACEHOLDER_IMAGE)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => PLACEHOLDER_PNG.to_vec(),
            Err(e) => return Err(e),
        };
        Ok(Image {
            content_type: "image/png",
            bytes,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn store() -> (tempfile::TempDir, ImageStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("images"), 1024).unwrap();
        (dir, store)
    }

    #[test]
    fn test_allow_list() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("IMAGE/JPEG"), Some("jpg"));
        assert_eq!(extension_for("image/svg+xml"), None);
        assert_eq!(extension_for("text/html"), None);
        assert_eq!(allowed_type("Image/PNG"), Some("image/png"));
        assert_eq!(allowed_type("application/pdf"), None);
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, store) = store();
        let path = store.save("alice", "image/jpeg", b"jpeg bytes").unwrap();
        assert_eq!(path, "alice.jpg");

        let image = store.load(&path).unwrap();
        assert_eq!(image.content_type, "image/jpeg");
        assert_eq!(image.bytes, b"jpeg bytes");
    }

    #[test]
    fn test_last_writer_wins() {
        let (_dir, store) = store();
        store.save("alice", "image/png", b"first").unwrap();
        let path = store.save("alice", "image/png", b"second").unwrap();
        assert_eq!(store.load(&path).unwrap().bytes, b"second");
    }

    #[test]
    fn test_rejects_bad_uploads() {
        let (_dir, store) = store();
        assert!(matches!(
            store.save("alice", "text/plain", b"hi"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            store.save("alice", "image/png", &[0; 1025]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_file_serves_placeholder() {
        let (_dir, store) = store();
        let image = store.load(PLACEHOLDER_IMAGE).unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.bytes, PLACEHOLDER_PNG);

        let image = store.load("ghost.png").unwrap();
        assert_eq!(image.bytes, PLACEHOLDER_PNG);
    }

    #[test]
    fn test_custom_placeholder_on_disk() {
        let (dir, store) = store();
        fs::write(dir.path().join("images").join(PLACEHOLDER_IMAGE), b"custom").unwrap();
        assert_eq!(store.load("ghost.gif").unwrap().bytes, b"custom");
    }

    #[test]
    fn test_stored_path_cannot_escape_root() {
        let (dir, store) = store();
        fs::write(dir.path().join("secret.png"), b"outside").unwrap();
        let image = store.load("../secret.png").unwrap();
        assert_eq!(image.bytes, PLACEHOLDER_PNG);
    }
}
