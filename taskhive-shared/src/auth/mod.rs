/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength validation
/// - [`jwt`]: JWT token generation and validation (HS256)
/// - [`middleware`]: Axum middleware that turns a Bearer token into an
///   [`middleware::AuthContext`] request extension
///
/// Authorization (who may do what within a project) lives in
/// [`crate::access`]; this module only establishes identity.
pub mod jwt;
pub mod middleware;
pub mod password;
