//! # Student Records Backend
//!
//! A small record-management web application: list, search, view, create,
//! edit and delete student records, each with an optional uploaded image,
//! persisted to a JSON document on disk.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! ```text
//! IO Layer (axum routes, forms, HTML views)
//!     ↓
//! Domain Layer (StudentService, OrphanReclaimer)
//!     ↓
//! Storage Layer (JSON document, upload directory)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod logging;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tracing::info;

use crate::config::Config;
use crate::domain::StudentService;
use crate::storage::{JsonConnection, StudentRepository, UploadRepository};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub student_service: StudentService,
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Setting up storage");
    let connection = JsonConnection::new(&config.data_file, &config.upload_dir, &config.upload_url_prefix)?;
    let student_repository = Arc::new(StudentRepository::new(connection.clone()));
    let upload_repository = Arc::new(UploadRepository::new(connection));

    info!("Setting up domain model");
    let student_service = StudentService::new(student_repository, upload_repository).await;

    Ok(AppState { student_service })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/", get(io::list_students))
        .route("/student/:id", get(io::get_student))
        .route("/addStudent", get(io::add_student_form).post(io::add_student))
        .route("/editStudent/:id", get(io::edit_student_form).post(io::edit_student))
        .route("/deleteStudent/:id", post(io::delete_student))
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(app_state)
}
