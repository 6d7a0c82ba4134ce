use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::io::ErrorKind;
use tokio::fs;
use tracing::{debug, error, info, warn};

use super::connection::JsonConnection;
use crate::domain::models::Student as DomainStudent;
use crate::io::rest::mappers::student_mapper::StudentMapper;
use crate::storage::StudentStorage;
use shared::Student as SharedStudent;

/// JSON-document student repository
#[derive(Debug, Clone)]
pub struct StudentRepository {
    connection: JsonConnection,
}

impl StudentRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }

    /// The students written on first run or when the document is unreadable
    pub fn seed_students() -> Vec<DomainStudent> {
        vec![
            DomainStudent {
                id: 1,
                name: "Peter Tan".to_string(),
                date_of_birth: "2000-05-10".to_string(),
                contact: "91234567".to_string(),
                image_ref: Some("img1.jpg".to_string()),
            },
            DomainStudent {
                id: 2,
                name: "Mary Lee".to_string(),
                date_of_birth: "2001-07-12".to_string(),
                contact: "98765432".to_string(),
                image_ref: Some("img2.jpg".to_string()),
            },
        ]
    }

    /// Read and parse the document. `Ok(None)` means it doesn't exist yet.
    async fn read_document(&self) -> Result<Option<Vec<SharedStudent>>> {
        let path = self.connection.data_file();

        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let students: Vec<SharedStudent> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Some(students))
    }

    /// Write the document atomically through a temp file
    async fn write_document(&self, students: &[SharedStudent]) -> Result<()> {
        let path = self.connection.data_file();
        let content = serde_json::to_string_pretty(students)?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .await
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!("Wrote {} students to {}", students.len(), path.display());
        Ok(())
    }

    /// Replace the document with the seed students and return them
    async fn reseed(&self) -> Vec<DomainStudent> {
        let seed = Self::seed_students();
        if let Err(e) = self.write_document(&StudentMapper::to_dto_list(&seed)).await {
            error!("Failed to write seed students: {:#}", e);
        }
        seed
    }
}

/// Keep the first record for each positive id; ids must stay unique
fn drop_invalid_ids(students: Vec<DomainStudent>) -> Vec<DomainStudent> {
    let mut seen = HashSet::new();
    students
        .into_iter()
        .filter(|s| {
            if s.id == 0 {
                warn!("Ignoring student with id 0 ({})", s.name);
                false
            } else if seen.insert(s.id) {
                true
            } else {
                warn!("Ignoring duplicate student id {} ({})", s.id, s.name);
                false
            }
        })
        .collect()
}

#[async_trait]
impl StudentStorage for StudentRepository {
    async fn load_students(&self) -> Vec<DomainStudent> {
        match self.read_document().await {
            Ok(Some(dtos)) => {
                let students = drop_invalid_ids(dtos.into_iter().map(StudentMapper::to_domain).collect());
                info!(
                    "Loaded {} students from {}",
                    students.len(),
                    self.connection.data_file().display()
                );
                students
            }
            Ok(None) => {
                info!(
                    "No student document at {}, writing seed data",
                    self.connection.data_file().display()
                );
                self.reseed().await
            }
            Err(e) => {
                warn!("Student document unreadable, falling back to seed data: {:#}", e);
                self.reseed().await
            }
        }
    }

    async fn save_students(&self, students: &[DomainStudent]) -> Result<()> {
        self.write_document(&StudentMapper::to_dto_list(students)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::json::test_utils::TestEnvironment;

    #[tokio::test]
    async fn test_missing_document_is_seeded_and_written() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.student_repository();

        let students = repo.load_students().await;
        assert_eq!(students, StudentRepository::seed_students());
        assert!(env.connection.data_file().exists());

        // A second load reads the written seed back
        let reloaded = repo.load_students().await;
        assert_eq!(reloaded, students);
    }

    #[tokio::test]
    async fn test_corrupt_document_falls_back_to_seed() {
        let env = TestEnvironment::new().unwrap();
        std::fs::write(env.connection.data_file(), "{ not json").unwrap();

        let repo = env.student_repository();
        let students = repo.load_students().await;
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].name, "Peter Tan");

        let on_disk = std::fs::read_to_string(env.connection.data_file()).unwrap();
        let parsed: Vec<SharedStudent> = serde_json::from_str(&on_disk).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[tokio::test]
    async fn test_wrong_shape_falls_back_to_seed() {
        let env = TestEnvironment::new().unwrap();
        std::fs::write(env.connection.data_file(), r#"{"students": []}"#).unwrap();

        let students = env.student_repository().load_students().await;
        assert_eq!(students, StudentRepository::seed_students());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips_field_values() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.student_repository();

        let students = vec![
            DomainStudent {
                id: 3,
                name: "John Doe".to_string(),
                date_of_birth: "2002-01-01".to_string(),
                contact: "90001111".to_string(),
                image_ref: None,
            },
            DomainStudent {
                id: 9,
                name: "Ann Ng".to_string(),
                date_of_birth: "1999-12-31".to_string(),
                contact: "80002222".to_string(),
                image_ref: Some("uploads/abc-ann.png".to_string()),
            },
        ];

        repo.save_students(&students).await.expect("Failed to save students");

        let fresh = env.student_repository();
        assert_eq!(fresh.load_students().await, students);
    }

    #[tokio::test]
    async fn test_empty_document_is_not_reseeded() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.student_repository();

        repo.save_students(&[]).await.unwrap();
        assert!(repo.load_students().await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_keep_first_record() {
        let env = TestEnvironment::new().unwrap();
        std::fs::write(
            env.connection.data_file(),
            r#"[
                {"studentId": 1, "name": "First", "dob": "2000-01-01", "contact": "1", "avatar": null},
                {"studentId": 1, "name": "Second", "dob": "2000-01-01", "contact": "2", "avatar": null}
            ]"#,
        )
        .unwrap();

        let students = env.student_repository().load_students().await;
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].name, "First");
    }

    #[tokio::test]
    async fn test_zero_id_is_dropped_on_load() {
        let env = TestEnvironment::new().unwrap();
        std::fs::write(
            env.connection.data_file(),
            r#"[
                {"studentId": 0, "name": "Nobody", "dob": "2000-01-01", "contact": "0", "avatar": null},
                {"studentId": 3, "name": "Somebody", "dob": "2000-01-01", "contact": "3", "avatar": null}
            ]"#,
        )
        .unwrap();

        let students = env.student_repository().load_students().await;
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].id, 3);
    }

    #[tokio::test]
    async fn test_save_fails_when_target_is_a_directory() {
        let env = TestEnvironment::new().unwrap();
        std::fs::create_dir_all(env.connection.data_file()).unwrap();

        let result = env
            .student_repository()
            .save_students(&StudentRepository::seed_students())
            .await;
        assert!(result.is_err());
    }
}
