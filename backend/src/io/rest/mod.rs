//! # HTTP Interface Layer
//!
//! Server-rendered student pages and form handlers.
//!
//! ## Key Responsibilities
//!
//! - **Routes**: The list/search, view, add, edit and delete pages
//! - **Form Extraction**: Url-encoded and multipart submissions with an optional image
//! - **Error Translation**: Validation failures become 400, unknown ids 404
//! - **Views**: HTML rendering with escaped user text
//! - **Mapping**: Converting between domain models and shared DTOs

pub mod forms;
pub mod mappers;
pub mod student_apis;
pub mod views;

pub use student_apis::*;
