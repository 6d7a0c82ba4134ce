pub mod student_mapper;
