/// Database models for TaskBoard
///
/// # Models
///
/// - `user`: User accounts, the role hierarchy, and the admin approval flag
/// - `task`: Assignable tasks with human-readable TASK-NNNNN identifiers
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{CreateUser, Role, User};
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         email: "worker@example.com".to_string(),
///         name: "Worker".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///         image: None,
///         role: Role::User,
///         is_approved: None,
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod task;
pub mod user;
