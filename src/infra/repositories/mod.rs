pub mod document;
pub mod sqlite_document_repo;
pub mod postgres_document_repo;

pub mod local_file_repo;
pub mod demo_repo;
