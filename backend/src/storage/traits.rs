//! # Storage Traits
//!
//! Storage abstractions used by the domain layer so the student list and
//! the upload directory can be backed by different implementations.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::Student;

/// Trait defining the interface for the student record document
#[async_trait]
pub trait StudentStorage: Send + Sync {
    /// Load every student in document order.
    ///
    /// Never fails: a missing or unreadable document yields the seed
    /// students, which are written back so later loads are stable.
    async fn load_students(&self) -> Vec<Student>;

    /// Replace the whole document with `students`
    async fn save_students(&self, students: &[Student]) -> Result<()>;
}

/// Trait defining the interface for uploaded image files
#[async_trait]
pub trait UploadStorage: Send + Sync {
    /// Write `content` into the upload directory under a fresh name and
    /// return the reference to embed in a student record
    async fn store_upload(&self, original_name: &str, content: &[u8]) -> Result<String>;

    /// Delete the file behind `image_ref`.
    ///
    /// Returns `false` without touching the filesystem when the reference is
    /// not managed by this store, and `false` when the file is already gone.
    async fn delete_upload(&self, image_ref: &str) -> Result<bool>;

    /// Whether `image_ref` points at a file inside the upload directory
    fn is_managed(&self, image_ref: &str) -> bool;

    /// Delete files in the upload directory that are not in `live_refs` and
    /// were last modified more than `min_age` ago.
    /// Returns the names of the deleted files.
    async fn reclaim_orphans(&self, live_refs: &HashSet<String>, min_age: Duration) -> Result<Vec<String>>;
}
