use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::connection::JsonConnection;
use crate::storage::UploadStorage;

const MAX_SANITIZED_NAME_LEN: usize = 64;

/// Flat-directory store for uploaded student images
#[derive(Debug, Clone)]
pub struct UploadRepository {
    connection: JsonConnection,
}

impl UploadRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }

    /// Generate a filesystem-safe version of an uploaded file name.
    /// Converts "My Photo (1).JPG" -> "my_photo__1_.jpg"
    pub fn sanitize_file_name(original_name: &str) -> String {
        // Browsers on some platforms send the full client path
        let base = original_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(original_name);

        let sanitized: String = base
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();

        let trimmed = sanitized.trim_start_matches(['.', '_']);
        let capped: String = trimmed.chars().take(MAX_SANITIZED_NAME_LEN).collect();

        if capped.is_empty() {
            "upload".to_string()
        } else {
            capped
        }
    }

    fn reference_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.connection.upload_prefix(), file_name)
    }

    /// The file name inside the upload directory that `image_ref` denotes,
    /// or `None` when the reference is not ours to manage
    fn managed_file_name<'a>(&self, image_ref: &'a str) -> Option<&'a str> {
        let file_name = image_ref
            .strip_prefix(self.connection.upload_prefix())?
            .strip_prefix('/')?;

        let is_plain_name = !file_name.is_empty()
            && file_name != "."
            && file_name != ".."
            && !file_name.contains(['/', '\\']);

        is_plain_name.then_some(file_name)
    }

    fn managed_path(&self, image_ref: &str) -> Option<PathBuf> {
        self.managed_file_name(image_ref)
            .map(|name| self.connection.upload_directory().join(name))
    }
}

#[async_trait]
impl UploadStorage for UploadRepository {
    async fn store_upload(&self, original_name: &str, content: &[u8]) -> Result<String> {
        let file_name = format!("{}-{}", Uuid::new_v4().simple(), Self::sanitize_file_name(original_name));
        let path = self.connection.upload_directory().join(&file_name);

        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write upload {}", path.display()))?;

        info!("Stored upload {} ({} bytes)", file_name, content.len());
        Ok(self.reference_for(&file_name))
    }

    async fn delete_upload(&self, image_ref: &str) -> Result<bool> {
        let Some(path) = self.managed_path(image_ref) else {
            debug!("Not deleting unmanaged image reference: {}", image_ref);
            return Ok(false);
        };

        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted upload {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Upload already gone: {}", path.display());
                Ok(false)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to delete upload {}", path.display())),
        }
    }

    fn is_managed(&self, image_ref: &str) -> bool {
        self.managed_file_name(image_ref).is_some()
    }

    async fn reclaim_orphans(&self, live_refs: &HashSet<String>, min_age: Duration) -> Result<Vec<String>> {
        let upload_dir = self.connection.upload_directory();

        let mut entries = match fs::read_dir(upload_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Upload directory {} missing, nothing to reclaim", upload_dir.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to scan {}", upload_dir.display()));
            }
        };

        let now = SystemTime::now();
        let mut scanned = 0usize;
        let mut reclaimed = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                warn!("Skipping upload with non UTF-8 name: {:?}", path);
                continue;
            };
            scanned += 1;

            if live_refs.contains(&self.reference_for(&file_name)) {
                continue;
            }

            // A modification time in the future counts as brand new
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or(Duration::ZERO);
            if age <= min_age {
                debug!("Keeping recent unreferenced upload {} (age {:?})", file_name, age);
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    info!("Reclaimed orphaned upload {} (age {:?})", file_name, age);
                    reclaimed.push(file_name);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to reclaim {}: {}", path.display(), e),
            }
        }

        debug!("Orphan scan finished: {} files scanned, {} reclaimed", scanned, reclaimed.len());
        Ok(reclaimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::json::test_utils::TestEnvironment;
    use std::fs::File;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn age_file(path: &std::path::Path, age: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(UploadRepository::sanitize_file_name("photo.jpg"), "photo.jpg");
        assert_eq!(UploadRepository::sanitize_file_name("My Photo (1).JPG"), "my_photo__1_.jpg");
        assert_eq!(UploadRepository::sanitize_file_name("C:\\Users\\me\\face.png"), "face.png");
        assert_eq!(UploadRepository::sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(UploadRepository::sanitize_file_name(".hidden"), "hidden");
        assert_eq!(UploadRepository::sanitize_file_name(""), "upload");
        assert_eq!(UploadRepository::sanitize_file_name("José.png"), "jos_.png");

        let long_name = format!("{}.png", "a".repeat(200));
        assert_eq!(UploadRepository::sanitize_file_name(&long_name).len(), MAX_SANITIZED_NAME_LEN);
    }

    #[tokio::test]
    async fn test_store_upload_writes_content_under_fresh_names() {
        let env = TestEnvironment::new().unwrap();
        let uploads = env.upload_repository();

        let first = uploads.store_upload("face.png", b"one").await.unwrap();
        let second = uploads.store_upload("face.png", b"two").await.unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("uploads/"));
        assert!(first.ends_with("-face.png"));
        assert!(uploads.is_managed(&first));
        assert_eq!(std::fs::read(env.upload_path(&first)).unwrap(), b"one");
        assert_eq!(std::fs::read(env.upload_path(&second)).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_delete_upload_is_idempotent() {
        let env = TestEnvironment::new().unwrap();
        let uploads = env.upload_repository();

        let image_ref = uploads.store_upload("face.png", b"data").await.unwrap();
        assert!(uploads.delete_upload(&image_ref).await.unwrap());
        assert!(!env.upload_path(&image_ref).exists());

        assert!(!uploads.delete_upload(&image_ref).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_ignores_unmanaged_references() {
        let env = TestEnvironment::new().unwrap();
        let uploads = env.upload_repository();

        // A file outside the upload directory must survive
        let outside = env.base_directory().join("public").join("img1.jpg");
        std::fs::write(&outside, b"static").unwrap();

        for image_ref in [
            "img1.jpg",
            "https://example.com/avatar.png",
            "uploads/../img1.jpg",
            "uploads/",
            "uploads/..",
            "uploadsx/img1.jpg",
            "/uploads/img1.jpg",
        ] {
            assert!(!uploads.is_managed(image_ref), "{image_ref} should be unmanaged");
            assert!(!uploads.delete_upload(image_ref).await.unwrap());
        }

        assert!(outside.exists());
    }

    #[tokio::test]
    async fn test_reclaim_respects_age_guard() {
        let env = TestEnvironment::new().unwrap();
        let uploads = env.upload_repository();
        let orphan = env.write_raw_upload("orphan.png", b"orphan");

        let reclaimed = uploads.reclaim_orphans(&HashSet::new(), DAY).await.unwrap();
        assert!(reclaimed.is_empty());
        assert!(orphan.exists());

        age_file(&orphan, DAY + Duration::from_secs(60));

        let reclaimed = uploads.reclaim_orphans(&HashSet::new(), DAY).await.unwrap();
        assert_eq!(reclaimed, vec!["orphan.png".to_string()]);
        assert!(!orphan.exists());
    }

    #[tokio::test]
    async fn test_reclaim_keeps_live_references() {
        let env = TestEnvironment::new().unwrap();
        let uploads = env.upload_repository();

        let live_ref = uploads.store_upload("live.png", b"live").await.unwrap();
        let live_path = env.upload_path(&live_ref);
        let orphan = env.write_raw_upload("old.png", b"old");
        age_file(&live_path, 2 * DAY);
        age_file(&orphan, 2 * DAY);

        let nested = env.connection.upload_directory().join("nested");
        std::fs::create_dir(&nested).unwrap();

        let live_refs: HashSet<String> = [live_ref, "https://example.com/x.png".to_string()].into();
        let reclaimed = uploads.reclaim_orphans(&live_refs, DAY).await.unwrap();

        assert_eq!(reclaimed, vec!["old.png".to_string()]);
        assert!(live_path.exists());
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_reclaim_with_missing_directory() {
        let env = TestEnvironment::new().unwrap();
        let uploads = env.upload_repository();
        std::fs::remove_dir_all(env.connection.upload_directory()).unwrap();

        let reclaimed = uploads.reclaim_orphans(&HashSet::new(), DAY).await.unwrap();
        assert!(reclaimed.is_empty());
    }
}
