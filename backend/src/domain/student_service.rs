use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::domain::models::{NewImage, Student, StudentDetails, StudentId, StudentValidationError, UploadedFile};
use crate::storage::{StudentStorage, UploadStorage};
use shared::StudentFields;

#[derive(Debug, thiserror::Error)]
pub enum StudentServiceError {
    #[error(transparent)]
    Validation(#[from] StudentValidationError),
    #[error("Student not found: {0}")]
    NotFound(StudentId),
    #[error("Failed to store uploaded image: {0:#}")]
    Upload(#[source] anyhow::Error),
    #[error("No student ids left to assign")]
    IdsExhausted,
}

/// In-memory student list plus the highest id handed out so far
#[derive(Debug)]
struct StudentList {
    students: Vec<Student>,
    highest_id: StudentId,
}

impl StudentList {
    fn new(students: Vec<Student>) -> Self {
        let highest_id = students.iter().map(|s| s.id).max().unwrap_or(0);
        Self { students, highest_id }
    }

    /// One past the largest id ever seen, so ids freed by a delete are not
    /// handed out again while the process runs. `None` once the id space
    /// is used up.
    fn next_id(&self) -> Option<StudentId> {
        let current_max = self.students.iter().map(|s| s.id).max().unwrap_or(0);
        self.highest_id.max(current_max).checked_add(1)
    }

    fn push(&mut self, student: Student) {
        self.highest_id = self.highest_id.max(student.id);
        self.students.push(student);
    }
}

/// Service owning the in-memory student list.
///
/// Every mutation runs under one lock: validate, mutate, persist, then
/// clean up replaced files. The persisted document is rewritten in full
/// after each mutation.
#[derive(Clone)]
pub struct StudentService {
    students: Arc<Mutex<StudentList>>,
    storage: Arc<dyn StudentStorage>,
    uploads: Arc<dyn UploadStorage>,
}

impl StudentService {
    /// Create a new StudentService, loading the current document
    pub async fn new(storage: Arc<dyn StudentStorage>, uploads: Arc<dyn UploadStorage>) -> Self {
        let students = storage.load_students().await;
        info!("Student service ready with {} students", students.len());

        Self {
            students: Arc::new(Mutex::new(StudentList::new(students))),
            storage,
            uploads,
        }
    }

    /// List students, optionally keeping only those whose name contains
    /// `search` (case-insensitive). A blank search returns everyone.
    pub async fn list_students(&self, search: Option<&str>) -> Vec<Student> {
        let list = self.students.lock().await;
        let students = &list.students;

        match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let needle = term.to_lowercase();
                let matches: Vec<Student> = students
                    .iter()
                    .filter(|s| s.name.to_lowercase().contains(&needle))
                    .cloned()
                    .collect();
                info!("Search '{}' matched {} of {} students", term, matches.len(), students.len());
                matches
            }
            None => students.clone(),
        }
    }

    pub async fn get_student(&self, id: StudentId) -> Option<Student> {
        let student = self.students.lock().await.students.iter().find(|s| s.id == id).cloned();
        if student.is_none() {
            warn!("Student not found: {}", id);
        }
        student
    }

    /// Create a student with the next free id
    pub async fn create_student(
        &self,
        fields: &StudentFields,
        image: Option<NewImage>,
    ) -> Result<Student, StudentServiceError> {
        let details = StudentDetails::validate(fields)?;
        info!("Creating student: name={}, dob={}", details.name, details.date_of_birth);

        let mut list = self.students.lock().await;
        let id = list.next_id().ok_or_else(|| {
            error!("Cannot create student, id space exhausted");
            StudentServiceError::IdsExhausted
        })?;

        let image_ref = match image {
            Some(NewImage::Upload(file)) => Some(self.store_image(&file).await?),
            Some(NewImage::External(url)) => Some(url),
            None => None,
        };

        let student = Student {
            id,
            name: details.name,
            date_of_birth: details.date_of_birth,
            contact: details.contact,
            image_ref,
        };
        list.push(student.clone());
        self.persist(&list.students).await;

        info!("Created student: {} with ID: {}", student.name, student.id);
        Ok(student)
    }

    /// Overwrite a student's fields. A new image replaces the old one, which
    /// is deleted only after the record points at the new file; without a
    /// new image the existing reference is kept as is.
    pub async fn update_student(
        &self,
        id: StudentId,
        fields: &StudentFields,
        image: Option<UploadedFile>,
    ) -> Result<Student, StudentServiceError> {
        let details = StudentDetails::validate(fields)?;
        info!("Updating student: {}", id);

        let mut list = self.students.lock().await;
        let students = &mut list.students;
        let index = students
            .iter()
            .position(|s| s.id == id)
            .ok_or(StudentServiceError::NotFound(id))?;

        let replaced_ref = match image {
            Some(file) => {
                let new_ref = self.store_image(&file).await?;
                students[index].image_ref.replace(new_ref)
            }
            None => None,
        };

        students[index].apply(details);
        let student = students[index].clone();
        self.persist(students).await;

        if let Some(old_ref) = replaced_ref {
            self.discard_image(&old_ref).await;
        }

        info!("Updated student: {} with ID: {}", student.name, student.id);
        Ok(student)
    }

    /// Delete a student and its uploaded image.
    /// Returns whether a student with `id` existed.
    pub async fn delete_student(&self, id: StudentId) -> bool {
        let mut list = self.students.lock().await;
        let students = &mut list.students;

        let Some(index) = students.iter().position(|s| s.id == id) else {
            info!("Delete of unknown student {} ignored", id);
            return false;
        };

        let removed = students.remove(index);
        self.persist(students).await;

        if let Some(image_ref) = &removed.image_ref {
            self.discard_image(image_ref).await;
        }

        info!("Deleted student: {} with ID: {}", removed.name, removed.id);
        true
    }

    /// Point-in-time snapshot of every image reference held by a student
    pub async fn live_image_refs(&self) -> HashSet<String> {
        self.students
            .lock()
            .await
            .students
            .iter()
            .filter_map(|s| s.image_ref.clone())
            .collect()
    }

    pub fn uploads(&self) -> Arc<dyn UploadStorage> {
        Arc::clone(&self.uploads)
    }

    async fn store_image(&self, file: &UploadedFile) -> Result<String, StudentServiceError> {
        self.uploads
            .store_upload(&file.original_name, &file.content)
            .await
            .map_err(|e| {
                error!("Failed to store upload '{}': {:#}", file.original_name, e);
                StudentServiceError::Upload(e)
            })
    }

    async fn discard_image(&self, image_ref: &str) {
        if let Err(e) = self.uploads.delete_upload(image_ref).await {
            warn!("Failed to delete image {}: {:#}", image_ref, e);
        }
    }

    /// Write the list to disk. A failed write is logged and the in-memory
    /// list stays authoritative until the next successful save.
    async fn persist(&self, students: &[Student]) {
        if let Err(e) = self.storage.save_students(students).await {
            error!("Failed to save students, changes kept in memory only: {:#}", e);
        }
    }
}
