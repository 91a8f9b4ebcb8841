//! Result alias for database operations.

use super::DatabaseError;

pub type Result<T> = std::result::Result<T, DatabaseError>;
