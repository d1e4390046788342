//! External service clients

pub mod semantic_scholar;
