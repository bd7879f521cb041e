//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - `Deserialize` DTOs for the write operations that touch the table
//! - `Serialize` response shapes where the row itself is not safe to expose

pub mod dashboard;
pub mod notification;
pub mod session;
pub mod submission;
pub mod user;
