//! # Storage Module
//!
//! Handles all data persistence for the student records application.
//!
//! The student list lives in a single JSON document that is rewritten in
//! full after every mutation. Uploaded images live as flat files in a
//! managed upload directory and are referenced from records by relative path.
//!
//! ## Design Principles
//!
//! - **Repository Pattern**: Clean separation between domain and data access
//! - **Dependency Inversion**: Domain depends on the traits, not the JSON backend
//! - **Testability**: Every repository can be rooted in a temporary directory

pub mod json;
pub mod traits;

pub use json::{JsonConnection, StudentRepository, UploadRepository};
pub use traits::{StudentStorage, UploadStorage};
