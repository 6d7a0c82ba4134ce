//! # Student Pages
//!
//! Endpoints for listing, viewing, adding, editing, and deleting students.
//! Successful form posts redirect back to the list with `302 Found`.

use axum::{
    extract::{Path, Query, State},
    http::{header::LOCATION, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tracing::{error, info, warn};

use super::forms::{StudentForm, REQUIRED_FIELDS_MESSAGE};
use super::mappers::student_mapper::StudentMapper;
use super::views;
use crate::domain::models::StudentId;
use crate::domain::StudentServiceError;
use crate::AppState;
use shared::StudentSearchQuery;

const NOT_FOUND_MESSAGE: &str = "Student not found";

/// Parse a path id; anything that isn't a positive integer can't match a student
fn parse_student_id(raw: &str) -> Option<StudentId> {
    raw.trim().parse::<StudentId>().ok().filter(|id| *id > 0)
}

fn redirect_to_list() -> Response {
    (StatusCode::FOUND, [(LOCATION, "/")]).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE).into_response()
}

fn service_error_response(err: StudentServiceError) -> Response {
    match err {
        StudentServiceError::Validation(e) => {
            warn!("Rejected student form: {}", e);
            (StatusCode::BAD_REQUEST, REQUIRED_FIELDS_MESSAGE).into_response()
        }
        StudentServiceError::NotFound(_) => not_found(),
        StudentServiceError::Upload(e) => {
            error!("Failed to save uploaded image: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save uploaded image").into_response()
        }
        StudentServiceError::IdsExhausted => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Cannot add more students").into_response()
        }
    }
}

/// List students, optionally filtered by `?search=`
pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<StudentSearchQuery>,
) -> Html<String> {
    info!("GET / - search: {:?}", query.search);

    let students = state.student_service.list_students(query.search.as_deref()).await;
    let students = StudentMapper::to_dto_list(&students);

    Html(views::student_list_page(&students, query.search.as_deref()))
}

/// Show a single student
pub async fn get_student(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    info!("GET /student/{}", raw_id);

    let Some(id) = parse_student_id(&raw_id) else {
        return not_found();
    };

    match state.student_service.get_student(id).await {
        Some(student) => Html(views::student_detail_page(&StudentMapper::to_dto(student))).into_response(),
        None => not_found(),
    }
}

/// Show the add student form
pub async fn add_student_form() -> Html<String> {
    info!("GET /addStudent");
    Html(views::add_student_page())
}

/// Handle the add student form
pub async fn add_student(State(state): State<AppState>, form: StudentForm) -> Response {
    info!("POST /addStudent - fields: {:?}, file: {}", form.fields, form.file.is_some());

    match state.student_service.create_student(&form.fields, form.new_image()).await {
        Ok(_) => redirect_to_list(),
        Err(e) => service_error_response(e),
    }
}

/// Show the edit form for a student
pub async fn edit_student_form(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    info!("GET /editStudent/{}", raw_id);

    let Some(id) = parse_student_id(&raw_id) else {
        return not_found();
    };

    match state.student_service.get_student(id).await {
        Some(student) => Html(views::edit_student_page(&StudentMapper::to_dto(student))).into_response(),
        None => not_found(),
    }
}

/// Handle the edit form. Without a new file the current image is kept.
pub async fn edit_student(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    form: StudentForm,
) -> Response {
    info!("POST /editStudent/{} - fields: {:?}, file: {}", raw_id, form.fields, form.file.is_some());

    let Some(id) = parse_student_id(&raw_id) else {
        return not_found();
    };

    match state.student_service.update_student(id, &form.fields, form.file).await {
        Ok(_) => redirect_to_list(),
        Err(e) => service_error_response(e),
    }
}

/// Delete a student. Unknown ids redirect the same way.
pub async fn delete_student(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    info!("POST /deleteStudent/{}", raw_id);

    match parse_student_id(&raw_id) {
        Some(id) => {
            state.student_service.delete_student(id).await;
        }
        None => warn!("Ignoring delete for invalid student id: {}", raw_id),
    }

    redirect_to_list()
}
