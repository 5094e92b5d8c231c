//! `payvault-auth` — token and credential handling.
//!
//! This crate is intentionally decoupled from HTTP and storage: it mints and
//! verifies bearer tokens and hashes passwords, nothing else.

pub mod claims;
pub mod password;
pub mod token;

pub use claims::{Claims, TokenValidationError, validate_claims};
pub use password::{hash_password, verify_password};
pub use token::{Hs256TokenCodec, JwtValidator, TokenError};
