//! Authentication building blocks: JWT access tokens, refresh token
//! hashing, and password hashing.

pub mod jwt;
pub mod password;
