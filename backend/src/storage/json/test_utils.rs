/// Test utilities for repositories rooted in a temporary directory.
///
/// The temporary directory is removed when the environment is dropped, even
/// if the test panics.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use super::connection::JsonConnection;
use super::student_repository::StudentRepository;
use super::upload_repository::UploadRepository;

pub struct TestEnvironment {
    _temp_dir: TempDir,
    pub connection: JsonConnection,
    pub base_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::with_prefix("student_records_")?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = JsonConnection::for_base_directory(&base_path)?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            connection,
            base_path,
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_path
    }

    pub fn student_repository(&self) -> Arc<StudentRepository> {
        Arc::new(StudentRepository::new(self.connection.clone()))
    }

    pub fn upload_repository(&self) -> Arc<UploadRepository> {
        Arc::new(UploadRepository::new(self.connection.clone()))
    }

    /// Absolute path of the file behind an upload reference
    pub fn upload_path(&self, image_ref: &str) -> PathBuf {
        let file_name = image_ref.rsplit('/').next().unwrap_or(image_ref);
        self.connection.upload_directory().join(file_name)
    }

    /// Write a file straight into the upload directory, bypassing the repository
    pub fn write_raw_upload(&self, file_name: &str, content: &[u8]) -> PathBuf {
        let path = self.connection.upload_directory().join(file_name);
        std::fs::write(&path, content).expect("Failed to write raw upload");
        path
    }
}
