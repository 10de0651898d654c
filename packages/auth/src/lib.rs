//! # Taskhive Auth
//!
//! The credential collaborator: argon2 password hashing and JWT bearer
//! tokens. Opaque to the rest of the system, which only sees
//! hash/verify/issue/resolve.

pub mod password;
pub mod token;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService};
