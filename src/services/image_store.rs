use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::errors::{AppError, Result};

/// Declared MIME type → stored file extension. Anything else is rejected.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let mime: mime::Mime = content_type.parse().ok()?;
    if mime.type_() != mime::IMAGE {
        return None;
    }
    match mime.subtype().as_str() {
        "png" => Some("png"),
        "jpeg" | "jpg" => Some("jpg"),
        _ => None,
    }
}

pub fn content_type_for(file_name: &str) -> mime::Mime {
    match Path::new(file_name).extension().and_then(|ext| ext.to_str()) {
        Some("png") => mime::IMAGE_PNG,
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

const MAX_NAME_ATTEMPTS: usize = 5;

/// `My Photo.PNG` uploaded at `millis` as png becomes `my-photo.png-<millis>.png`,
/// or `my-photo.png-<millis>-<discriminator>.png` when that name is taken.
pub fn image_file_name(
    original_name: &str,
    extension: &str,
    millis: i64,
    discriminator: Option<&str>,
) -> String {
    let name = original_name.to_lowercase().split(' ').collect::<Vec<_>>().join("-");
    let name = sanitize_filename::sanitize(name);
    let name = if name.is_empty() { "image".to_string() } else { name };
    match discriminator {
        Some(d) => format!("{}-{}-{}.{}", name, millis, d, extension),
        None => format!("{}-{}.{}", name, millis, extension),
    }
}

/// An image part pulled out of a multipart body, already checked against the
/// MIME allow-list.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub original_name: String,
    pub extension: &'static str,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ImageStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Writes the upload and returns the generated file name. Existing files
    /// are never overwritten.
    pub async fn save(&self, upload: &ImageUpload) -> Result<String> {
        let millis = chrono::Utc::now().timestamp_millis();

        self.ensure_dir()
            .await
            .map_err(AppError::io("Saving the image failed"))?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let discriminator = (attempt > 0).then(|| Uuid::new_v4().simple().to_string());
            let file_name = image_file_name(
                &upload.original_name,
                upload.extension,
                millis,
                discriminator.as_deref(),
            );
            let path = self.dir.join(&file_name);

            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(AppError::io("Saving the image failed")(e)),
            };

            let written = async {
                file.write_all(&upload.data).await?;
                file.flush().await
            }
            .await;
            if let Err(e) = written {
                drop(file);
                self.remove(&file_name).await;
                return Err(AppError::io("Saving the image failed")(e));
            }

            tracing::info!("Stored image {} ({} bytes)", file_name, upload.data.len());
            return Ok(file_name);
        }

        Err(AppError::io("Saving the image failed")(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "no free image file name",
        )))
    }

    /// Best-effort removal; a failure is logged, not returned.
    pub async fn remove(&self, file_name: &str) {
        let Some(path) = self.path_for(file_name) else {
            return;
        };
        match fs::remove_file(&path).await {
            Ok(()) => tracing::info!("Removed image {}", file_name),
            Err(e) => tracing::warn!("Failed to delete image file {}: {}", path.display(), e),
        }
    }

    /// Resolves a public file name to its path, rejecting traversal attempts.
    pub fn path_for(&self, file_name: &str) -> Option<PathBuf> {
        if file_name.is_empty()
            || file_name.contains("..")
            || file_name.contains('/')
            || file_name.contains('\\')
        {
            return None;
        }
        Some(self.dir.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_covers_png_and_jpeg() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/jpg"), Some("jpg"));
        assert_eq!(extension_for("image/gif"), None);
        assert_eq!(extension_for("text/plain"), None);
        assert_eq!(extension_for("not a mime"), None);
    }

    #[test]
    fn file_names_are_lowercased_and_hyphenated() {
        assert_eq!(
            image_file_name("My Holiday Photo.PNG", "png", 1700000000000, None),
            "my-holiday-photo.png-1700000000000.png"
        );
        assert_eq!(
            image_file_name("cat.png", "png", 1, Some("abc")),
            "cat.png-1-abc.png"
        );
    }

    #[test]
    fn file_names_drop_path_separators() {
        let name = image_file_name("../../etc/passwd", "jpg", 1, None);
        assert!(!name.contains('/'));
        assert!(name.ends_with("-1.jpg"));
    }

    #[test]
    fn path_for_rejects_traversal() {
        let store = ImageStore::new("images");
        assert!(store.path_for("../secret").is_none());
        assert!(store.path_for("a/b.png").is_none());
        assert!(store.path_for("").is_none());
        assert_eq!(
            store.path_for("a.png"),
            Some(PathBuf::from("images").join("a.png"))
        );
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("x.png"), mime::IMAGE_PNG);
        assert_eq!(content_type_for("x.jpg"), mime::IMAGE_JPEG);
        assert_eq!(content_type_for("x.bin"), mime::APPLICATION_OCTET_STREAM);
    }

    #[tokio::test]
    async fn save_and_remove_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("images"));
        let upload = ImageUpload {
            original_name: "cat.png".to_string(),
            extension: "png",
            data: Bytes::from_static(b"\x89PNG"),
        };

        let name = store.save(&upload).await.unwrap();
        let path = store.path_for(&name).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG");

        store.remove(&name).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn same_name_uploads_never_share_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let upload = |data: &'static [u8]| ImageUpload {
            original_name: "cat.png".to_string(),
            extension: "png",
            data: Bytes::from_static(data),
        };

        for _ in 0..20 {
            let (first, second) = (upload(b"first"), upload(b"second"));
            let (a, b) = tokio::join!(store.save(&first), store.save(&second));
            let (a, b) = (a.unwrap(), b.unwrap());

            assert_ne!(a, b);
            assert_eq!(std::fs::read(dir.path().join(&a)).unwrap(), b"first");
            assert_eq!(std::fs::read(dir.path().join(&b)).unwrap(), b"second");
        }
    }
}
