/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh)
/// - `users`: User management endpoints
/// - `tasks`: Task management endpoints

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;
