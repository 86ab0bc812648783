/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength validation
/// - [`jwt`]: HS256 access/refresh token generation and validation
/// - [`middleware`]: Bearer-token extraction and the per-request `AuthContext`
/// - [`authorization`]: The role/approval authorization matrix
///
/// The acting user is always resolved from a server-verified token, never
/// from a client-supplied field, and the role/approval checks re-read the
/// user row so role changes and approvals take effect immediately.

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
