/// User model and database operations
///
/// Users carry one of three roles (`user` < `admin` < `super-admin`). The
/// `is_approved` flag is only meaningful for admins: a freshly created admin
/// starts unapproved and cannot edit tasks until a super-admin approves it.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('user', 'admin', 'super-admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     image VARCHAR(512),
///     role user_role NOT NULL DEFAULT 'user',
///     is_approved BOOLEAN,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User role in the permission hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Regular user; can view tasks and update task status
    User,

    /// Admin; can manage users and tasks, task edits gated on approval
    Admin,

    /// Super-admin; full access, approves new admins
    SuperAdmin,
}

impl Role {
    /// Converts role to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "super-admin",
        }
    }

    /// Whether this role has admin rank (admin or super-admin)
    ///
    /// Admin rank is the gate for every user-management and task-management
    /// mutation.
    pub fn is_admin_rank(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

/// User model representing an account row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address; unique across all users
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2id password hash, never a plaintext password
    pub password_hash: String,

    /// Optional avatar/profile image URL
    pub image: Option<String>,

    /// Role in the permission hierarchy
    pub role: Role,

    /// Admin approval flag
    ///
    /// Only meaningful when `role` is `Admin`; `None` or `Some(false)` means
    /// the admin is awaiting super-admin approval.
    pub is_approved: Option<bool>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this user is an admin still awaiting approval
    pub fn is_unapproved_admin(&self) -> bool {
        self.role == Role::Admin && self.is_approved != Some(true)
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2id password hash (NOT a plaintext password)
    pub password_hash: String,

    /// Optional avatar URL
    pub image: Option<String>,

    /// Role for the new account
    pub role: Role,

    /// Initial approval state (admins only)
    pub is_approved: Option<bool>,
}

/// Outcome of a guarded user deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteUserOutcome {
    /// User row removed
    Deleted,

    /// At least one task still references the user as assignee
    HasAssignedTasks,

    /// No such user
    NotFound,
}

const USER_COLUMNS: &str = "id, email, name, password_hash, image, role, is_approved, \
                            created_at, updated_at";

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint
    /// violation, surfaced by the caller as `AlreadyExists`) or the database
    /// operation fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, password_hash, image, role, is_approved)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.email)
        .bind(data.name)
        .bind(data.password_hash)
        .bind(data.image)
        .bind(data.role)
        .bind(data.is_approved)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Lists users with keyset pagination and an optional role filter
    ///
    /// Rows are ordered by id ascending; `cursor` is the last-seen id from
    /// the previous page. `role: None` means no filter.
    pub async fn list(
        pool: &PgPool,
        limit: i64,
        cursor: Option<Uuid>,
        role: Option<Role>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1::uuid IS NULL OR id > $1)
              AND ($2::user_role IS NULL OR role = $2)
            ORDER BY id ASC
            LIMIT $3
            "#,
        ))
        .bind(cursor)
        .bind(role)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Updates profile fields (name, email, image)
    ///
    /// Full replace of the editable profile fields, matching the
    /// UpdateUser operation. Returns `None` if the user does not exist.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        name: &str,
        email: &str,
        image: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2, email = $3, image = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(image)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Applies a role change, optionally touching the approval flag
    ///
    /// `is_approved: None` leaves the stored flag untouched (the
    /// admin-sets-user case of the role matrix).
    pub async fn update_role(
        pool: &PgPool,
        id: Uuid,
        role: Role,
        is_approved: Option<bool>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET role = $2,
                is_approved = COALESCE($3, is_approved),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(role)
        .bind(is_approved)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Marks an admin as approved
    pub async fn set_approved(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET is_approved = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Replaces the stored password hash
    pub async fn set_password_hash(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user unless tasks still reference them as assignee
    ///
    /// The assigned-task check and the delete run as one conditional
    /// statement, so the safety check cannot race a concurrent task
    /// creation targeting the same user. Only `assigned_to` blocks the
    /// delete; tasks the user merely created (`assigned_by`) do not.
    pub async fn delete_if_unassigned(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<DeleteUserOutcome, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
              AND NOT EXISTS (SELECT 1 FROM tasks WHERE assigned_to = $1)
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(DeleteUserOutcome::Deleted);
        }

        // Nothing deleted: distinguish a guarded user from a missing one.
        let has_tasks: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tasks WHERE assigned_to = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;

        if has_tasks {
            Ok(DeleteUserOutcome::HasAssignedTasks)
        } else {
            Ok(DeleteUserOutcome::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::SuperAdmin.as_str(), "super-admin");
    }

    #[test]
    fn test_role_serde_wire_format() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"super-admin\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");

        let role: Role = serde_json::from_str("\"super-admin\"").unwrap();
        assert_eq!(role, Role::SuperAdmin);
    }

    #[test]
    fn test_role_admin_rank() {
        assert!(!Role::User.is_admin_rank());
        assert!(Role::Admin.is_admin_rank());
        assert!(Role::SuperAdmin.is_admin_rank());
    }

    #[test]
    fn test_unapproved_admin() {
        let mut user = sample_user(Role::Admin, None);
        assert!(user.is_unapproved_admin());

        user.is_approved = Some(false);
        assert!(user.is_unapproved_admin());

        user.is_approved = Some(true);
        assert!(!user.is_unapproved_admin());

        // Approval flag is ignored for non-admin roles
        let super_admin = sample_user(Role::SuperAdmin, None);
        assert!(!super_admin.is_unapproved_admin());

        let regular = sample_user(Role::User, Some(false));
        assert!(!regular.is_unapproved_admin());
    }

    fn sample_user(role: Role, is_approved: Option<bool>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: "Test".to_string(),
            password_hash: "$argon2id$...".to_string(),
            image: None,
            role,
            is_approved,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // Integration tests for database operations require a running database
}
