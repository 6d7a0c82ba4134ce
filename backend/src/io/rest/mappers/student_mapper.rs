//! backend/src/io/rest/mappers/student_mapper.rs

use crate::domain::models::Student as DomainStudent;
use shared::Student as SharedStudent;

/// Mapper to convert between shared Student DTOs and domain Student models.
pub struct StudentMapper;

impl StudentMapper {
    /// Converts a shared Student DTO to a domain Student model.
    pub fn to_domain(dto: SharedStudent) -> DomainStudent {
        DomainStudent {
            id: dto.student_id,
            name: dto.name,
            date_of_birth: dto.dob,
            contact: dto.contact,
            image_ref: dto.avatar.filter(|r| !r.trim().is_empty()),
        }
    }

    /// Converts a domain Student model to a shared Student DTO.
    pub fn to_dto(domain: DomainStudent) -> SharedStudent {
        SharedStudent {
            student_id: domain.id,
            name: domain.name,
            dob: domain.date_of_birth,
            contact: domain.contact,
            avatar: domain.image_ref,
        }
    }

    pub fn to_dto_list(domain_students: &[DomainStudent]) -> Vec<SharedStudent> {
        domain_students.iter().cloned().map(Self::to_dto).collect()
    }
}
