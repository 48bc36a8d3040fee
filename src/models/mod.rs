//! Data models for the Cloud Library

pub mod book;
pub mod user;

// Re-export commonly used types
pub use book::{Book, UpdateBook};
pub use user::{Role, User, UserClaims};

/// Treat an empty string the same as a missing field
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
