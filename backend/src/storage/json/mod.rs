pub mod connection;
pub mod student_repository;
pub mod upload_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::JsonConnection;
pub use student_repository::StudentRepository;
pub use upload_repository::UploadRepository;
