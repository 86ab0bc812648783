/// Authorization matrix for user and task mutations
///
/// The permission model has three layers:
///
/// 1. **Role hierarchy**: `user` < `admin` < `super-admin`. Admin rank
///    (admin or super-admin) gates every user-management mutation, task
///    creation, and task deletion.
/// 2. **Admin approval**: an admin created by another admin starts
///    unapproved and cannot perform full task edits until a super-admin
///    approves it. Task *creation* carries no approval gate; only the full
///    edit does.
/// 3. **Role-change rules**: only a super-admin may grant `super-admin`;
///    super-admin role grants always approve the target, an admin granting
///    `admin` always leaves the target unapproved.
///
/// The acting user is re-read from the database on every check
/// ([`load_actor`]) so demotions and approvals take effect immediately.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::{load_actor, require_admin_rank};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let actor = load_actor(&pool, user_id).await?;
/// require_admin_rank(&actor)?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{Role, User};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The authenticated user's row no longer exists
    #[error("Acting user no longer exists")]
    ActorNotFound,

    /// The actor's role does not permit the operation
    #[error("{0}")]
    Forbidden(String),

    /// The actor is an admin still awaiting super-admin approval
    #[error("Admin approval pending")]
    ApprovalPending,

    /// The target of the operation is not eligible for it
    #[error("{0}")]
    InvalidTarget(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Planned effect of a role change on the target row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleChange {
    /// New role for the target
    pub role: Role,

    /// Approval flag to write alongside the role
    ///
    /// `None` leaves the stored flag untouched.
    pub is_approved: Option<bool>,
}

/// Loads the acting user's current row
///
/// # Errors
///
/// Returns [`AuthzError::ActorNotFound`] if the row is gone (the account
/// was deleted after the token was issued).
pub async fn load_actor(pool: &PgPool, user_id: Uuid) -> Result<User, AuthzError> {
    User::find_by_id(pool, user_id)
        .await?
        .ok_or(AuthzError::ActorNotFound)
}

/// Requires the actor to hold admin rank (admin or super-admin)
pub fn require_admin_rank(actor: &User) -> Result<(), AuthzError> {
    if actor.role.is_admin_rank() {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(
            "Only admins can perform this operation".to_string(),
        ))
    }
}

/// Requires the actor to be allowed to perform a full task edit
///
/// Admin rank is required, and an admin must additionally be approved.
/// Task creation deliberately does not use this check (no approval gate on
/// create).
pub fn require_approved_for_task_edit(actor: &User) -> Result<(), AuthzError> {
    require_admin_rank(actor)?;

    if actor.is_unapproved_admin() {
        return Err(AuthzError::ApprovalPending);
    }

    Ok(())
}

/// Plans a role change according to the authorization matrix
///
/// - Only a super-admin may set `super-admin`.
/// - A super-admin setting any role approves the target.
/// - An admin setting `admin` leaves the target unapproved.
/// - An admin setting any other permitted role leaves the approval flag
///   untouched.
/// - A regular user may not change roles at all.
///
/// # Errors
///
/// Returns [`AuthzError::Forbidden`] for every disallowed combination.
pub fn plan_role_change(actor_role: Role, new_role: Role) -> Result<RoleChange, AuthzError> {
    if new_role == Role::SuperAdmin && actor_role != Role::SuperAdmin {
        return Err(AuthzError::Forbidden(
            "Only super-admin can grant super-admin".to_string(),
        ));
    }

    match actor_role {
        Role::SuperAdmin => Ok(RoleChange {
            role: new_role,
            is_approved: Some(true),
        }),
        Role::Admin if new_role == Role::Admin => Ok(RoleChange {
            role: new_role,
            is_approved: Some(false),
        }),
        Role::Admin => Ok(RoleChange {
            role: new_role,
            is_approved: None,
        }),
        Role::User => Err(AuthzError::Forbidden(
            "Insufficient permissions".to_string(),
        )),
    }
}

/// Plans the approval flag for an account created by an admin-rank actor
///
/// The requested approval state is honored only when the actor is a
/// super-admin; an admin-created admin is always unapproved, and roles other
/// than admin carry no approval flag. Creating a super-admin requires a
/// super-admin actor.
///
/// # Errors
///
/// Returns [`AuthzError::Forbidden`] when the actor lacks admin rank or an
/// admin attempts to create a super-admin.
pub fn plan_account_creation(
    actor: &User,
    requested_role: Role,
    requested_approval: Option<bool>,
) -> Result<Option<bool>, AuthzError> {
    require_admin_rank(actor)?;

    if requested_role == Role::SuperAdmin && actor.role != Role::SuperAdmin {
        return Err(AuthzError::Forbidden(
            "Only super-admin can create super-admin".to_string(),
        ));
    }

    let approval = match (actor.role, requested_role) {
        (Role::SuperAdmin, _) => requested_approval,
        (_, Role::Admin) => Some(false),
        _ => None,
    };

    Ok(approval)
}

/// Validates an admin approval action
///
/// Only a super-admin may approve, and the target must currently hold the
/// admin role. Approving an already-approved admin is a no-op rather than
/// an error.
pub fn validate_admin_approval(actor: &User, target: &User) -> Result<(), AuthzError> {
    if actor.role != Role::SuperAdmin {
        return Err(AuthzError::Forbidden(
            "Only super-admin can approve admins".to_string(),
        ));
    }

    if target.role != Role::Admin {
        return Err(AuthzError::InvalidTarget(
            "Target user is not an admin".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_role(role: Role, is_approved: Option<bool>) -> User {
        User {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", role.as_str()),
            name: role.as_str().to_string(),
            password_hash: "$argon2id$...".to_string(),
            image: None,
            role,
            is_approved,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_admin_rank() {
        assert!(require_admin_rank(&user_with_role(Role::Admin, None)).is_ok());
        assert!(require_admin_rank(&user_with_role(Role::SuperAdmin, None)).is_ok());

        let result = require_admin_rank(&user_with_role(Role::User, None));
        assert!(matches!(result.unwrap_err(), AuthzError::Forbidden(_)));
    }

    #[test]
    fn test_task_edit_gate_requires_approval() {
        // Approved admin and super-admin pass
        assert!(require_approved_for_task_edit(&user_with_role(Role::Admin, Some(true))).is_ok());
        assert!(require_approved_for_task_edit(&user_with_role(Role::SuperAdmin, None)).is_ok());

        // Unapproved admin is blocked
        let result = require_approved_for_task_edit(&user_with_role(Role::Admin, None));
        assert!(matches!(result.unwrap_err(), AuthzError::ApprovalPending));

        let result = require_approved_for_task_edit(&user_with_role(Role::Admin, Some(false)));
        assert!(matches!(result.unwrap_err(), AuthzError::ApprovalPending));

        // Regular user fails the rank check, not the approval check
        let result = require_approved_for_task_edit(&user_with_role(Role::User, None));
        assert!(matches!(result.unwrap_err(), AuthzError::Forbidden(_)));
    }

    #[test]
    fn test_role_change_super_admin_grant_restricted() {
        // Only super-admin may grant super-admin, regardless of target
        for actor in [Role::User, Role::Admin] {
            let result = plan_role_change(actor, Role::SuperAdmin);
            assert!(matches!(result.unwrap_err(), AuthzError::Forbidden(_)));
        }

        let change = plan_role_change(Role::SuperAdmin, Role::SuperAdmin).unwrap();
        assert_eq!(change.role, Role::SuperAdmin);
        assert_eq!(change.is_approved, Some(true));
    }

    #[test]
    fn test_role_change_approval_cascade() {
        // Super-admin setting any role approves the target
        for new_role in [Role::User, Role::Admin, Role::SuperAdmin] {
            let change = plan_role_change(Role::SuperAdmin, new_role).unwrap();
            assert_eq!(change.is_approved, Some(true));
        }

        // Admin granting admin always leaves the target unapproved
        let change = plan_role_change(Role::Admin, Role::Admin).unwrap();
        assert_eq!(change.is_approved, Some(false));

        // Admin demoting to user touches nothing
        let change = plan_role_change(Role::Admin, Role::User).unwrap();
        assert_eq!(change.is_approved, None);
    }

    #[test]
    fn test_role_change_regular_user_forbidden() {
        for new_role in [Role::User, Role::Admin] {
            let result = plan_role_change(Role::User, new_role);
            assert!(matches!(result.unwrap_err(), AuthzError::Forbidden(_)));
        }
    }

    #[test]
    fn test_account_creation_approval() {
        let super_admin = user_with_role(Role::SuperAdmin, None);
        let admin = user_with_role(Role::Admin, Some(true));
        let user = user_with_role(Role::User, None);

        // Super-admin's requested approval is honored
        assert_eq!(
            plan_account_creation(&super_admin, Role::Admin, Some(true)).unwrap(),
            Some(true)
        );
        assert_eq!(
            plan_account_creation(&super_admin, Role::Admin, None).unwrap(),
            None
        );

        // Admin-created admin is always unapproved, whatever was requested
        assert_eq!(
            plan_account_creation(&admin, Role::Admin, Some(true)).unwrap(),
            Some(false)
        );

        // Non-admin roles carry no approval flag
        assert_eq!(plan_account_creation(&admin, Role::User, Some(true)).unwrap(), None);

        // Admin cannot create a super-admin
        let result = plan_account_creation(&admin, Role::SuperAdmin, None);
        assert!(matches!(result.unwrap_err(), AuthzError::Forbidden(_)));

        // Regular user cannot create accounts at all
        let result = plan_account_creation(&user, Role::User, None);
        assert!(matches!(result.unwrap_err(), AuthzError::Forbidden(_)));
    }

    #[test]
    fn test_admin_approval_validation() {
        let super_admin = user_with_role(Role::SuperAdmin, None);
        let admin = user_with_role(Role::Admin, Some(true));
        let unapproved = user_with_role(Role::Admin, None);
        let regular = user_with_role(Role::User, None);

        assert!(validate_admin_approval(&super_admin, &unapproved).is_ok());

        // Idempotent on an already-approved admin
        assert!(validate_admin_approval(&super_admin, &admin).is_ok());

        // Only super-admin may approve
        let result = validate_admin_approval(&admin, &unapproved);
        assert!(matches!(result.unwrap_err(), AuthzError::Forbidden(_)));

        // Target must be an admin
        let result = validate_admin_approval(&super_admin, &regular);
        assert!(matches!(result.unwrap_err(), AuthzError::InvalidTarget(_)));
    }
}
