use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default name of the student record document
pub const DEFAULT_DATA_FILE: &str = "students.json";

/// Default reference prefix for uploaded files
pub const DEFAULT_UPLOAD_PREFIX: &str = "uploads";

/// JsonConnection resolves where the student document and the upload
/// directory live, and makes sure the directories exist
#[derive(Debug, Clone)]
pub struct JsonConnection {
    data_file: PathBuf,
    upload_directory: PathBuf,
    upload_prefix: String,
}

impl JsonConnection {
    /// Create a new connection, creating the upload directory and the
    /// document's parent directory if they don't exist
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        data_file: P,
        upload_directory: Q,
        upload_prefix: &str,
    ) -> Result<Self> {
        let data_file = data_file.as_ref().to_path_buf();
        let upload_directory = upload_directory.as_ref().to_path_buf();

        if let Some(parent) = data_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
                info!("Created data directory: {}", parent.display());
            }
        }

        if !upload_directory.exists() {
            fs::create_dir_all(&upload_directory).with_context(|| {
                format!("Failed to create upload directory {}", upload_directory.display())
            })?;
            info!("Created upload directory: {}", upload_directory.display());
        }

        let upload_prefix = upload_prefix.trim_matches('/').to_string();
        anyhow::ensure!(!upload_prefix.is_empty(), "Upload prefix cannot be empty");

        Ok(Self {
            data_file,
            upload_directory,
            upload_prefix,
        })
    }

    /// Create a connection with the default layout under `base_directory`:
    /// `students.json` next to `public/uploads`
    pub fn for_base_directory<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base = base_directory.as_ref();
        Self::new(
            base.join(DEFAULT_DATA_FILE),
            base.join("public").join(DEFAULT_UPLOAD_PREFIX),
            DEFAULT_UPLOAD_PREFIX,
        )
    }

    /// Path of the student record document
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Directory holding uploaded files
    pub fn upload_directory(&self) -> &Path {
        &self.upload_directory
    }

    /// Prefix of every reference handed out for an uploaded file
    pub fn upload_prefix(&self) -> &str {
        &self.upload_prefix
    }
}
