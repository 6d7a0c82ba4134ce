//! # Domain Module
//!
//! Business logic for the student records application, independent of the
//! HTTP layer and of how records and images are stored.
//!
//! ## Module Organization
//!
//! - **models**: Student record, validated form fields, uploaded image content
//! - **student_service**: CRUD over the in-memory student list, persisting
//!   after each mutation and keeping uploaded images in step with records
//! - **orphan_reclaimer**: Periodic cleanup of uploads no student refers to
//!
//! ## Business Rules
//!
//! - Name, date of birth and contact are required
//! - Ids are assigned as one past the highest id and never reused while the
//!   process runs
//! - A replaced or deleted image is removed only after the record no longer
//!   points at it
//! - Deleting an unknown student is a no-op

pub mod models;
pub mod orphan_reclaimer;
pub mod student_service;

pub use orphan_reclaimer::{OrphanReclaimer, ReclaimerHandle};
pub use student_service::{StudentService, StudentServiceError};
