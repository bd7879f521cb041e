//! HTTP handler functions, grouped by resource.

pub mod admin;
pub mod auth;
pub mod chat;
pub mod files;
pub mod notification;
pub mod review;
pub mod submission;
