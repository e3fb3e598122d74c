pub mod admin;
pub mod writable;
