//! Authentication and authorization for staff accounts
//!
//! Provides:
//! - Argon2 password hashing
//! - HS256 session tokens
//! - Role ranks and capability checks

pub mod jwt;
pub mod password;
pub mod permissions;

pub use jwt::{extract_bearer, Claims, TokenIssuer};
pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
pub use permissions::{role_allows, role_rank, Capability};
