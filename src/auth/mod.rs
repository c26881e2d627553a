//! Password hashing and bearer-token sessions for user accounts.

pub mod claims;
pub mod jwt;
pub mod password;

pub use jwt::{AuthUser, JwtKeys};
