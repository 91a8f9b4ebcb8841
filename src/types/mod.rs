//! Core types shared across the crate.
//!
//! - `CellValue`: owned engine value with CSV and display renderings
//! - `DatabaseError`: error type for all operations
//! - `Result`: convenient result type alias

pub mod error;
pub mod result;
pub mod value;

pub use error::DatabaseError;
pub use result::Result;
pub use value::CellValue;
