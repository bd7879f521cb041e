//! Domain core for the partner onboarding portal.
//!
//! This crate holds the submission lifecycle and review-workflow engine:
//! the section review state machine, the conversation/mention engine, the
//! progress calculator, and the role/permission model. It performs no I/O --
//! every operation is a pure function over the [`submission::Submission`]
//! aggregate that produces a patch for the persistence layer to apply
//! atomically.

pub mod conversation;
pub mod error;
pub mod permissions;
pub mod progress;
pub mod review;
pub mod roles;
pub mod section;
pub mod submission;
pub mod types;

pub use error::CoreError;
