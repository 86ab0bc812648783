/// User management endpoints
///
/// This module provides the user management surface:
/// - Current-user lookup
/// - Paginated listing with an optional role filter
/// - Account creation by admin-rank users
/// - Profile, role, approval, and password updates
/// - Guarded deletion (blocked while tasks reference the user)
///
/// Every endpoint requires a verified bearer token; the acting user's role
/// and approval state are re-read from the database per request.
///
/// # Endpoints
///
/// - `GET /v1/users/me` - Current authenticated user
/// - `GET /v1/users` - List users (admin rank)
/// - `POST /v1/users` - Create account (admin rank)
/// - `PUT /v1/users/:id` - Update profile (admin rank)
/// - `PUT /v1/users/:id/role` - Change role (per role matrix)
/// - `POST /v1/users/:id/approve` - Approve admin (super-admin)
/// - `PUT /v1/users/:id/password` - Change password
/// - `DELETE /v1/users/:id` - Delete user (admin rank)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        authorization::{
            load_actor, plan_account_creation, plan_role_change, require_admin_rank,
            validate_admin_approval,
        },
        middleware::AuthContext,
        password,
    },
    models::user::{CreateUser, DeleteUserOutcome, Role, User},
};
use uuid::Uuid;
use validator::Validate;

/// Default page size for user listings
const DEFAULT_USER_PAGE_SIZE: i64 = 20;

/// Maximum page size for user listings
const MAX_USER_PAGE_SIZE: i64 = 100;

/// Sanitized user representation returned by the API
///
/// Never includes the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID
    pub id: Uuid,

    /// Email address
    pub email: String,

    /// Display name
    pub name: String,

    /// Optional avatar URL
    pub image: Option<String>,

    /// Role in the permission hierarchy
    pub role: Role,

    /// Admin approval flag (admins only)
    pub is_approved: Option<bool>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            image: user.image,
            role: user.role,
            is_approved: user.is_approved,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Role filter for user listings
///
/// `all` (the default when the parameter is omitted) disables the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleFilter {
    All,
    User,
    Admin,
    SuperAdmin,
}

impl RoleFilter {
    /// The role this filter selects, or `None` for no filtering
    pub fn as_role(self) -> Option<Role> {
        match self {
            RoleFilter::All => None,
            RoleFilter::User => Some(Role::User),
            RoleFilter::Admin => Some(Role::Admin),
            RoleFilter::SuperAdmin => Some(Role::SuperAdmin),
        }
    }
}

/// Query parameters for user listing
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Page size (default 20, max 100)
    pub limit: Option<i64>,

    /// Last-seen user id from the previous page
    pub cursor: Option<Uuid>,

    /// Filter to a single role; `all` or absent means no filter
    pub role: Option<RoleFilter>,
}

/// Paginated user listing response
#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    /// Users in this page
    pub users: Vec<UserResponse>,

    /// Cursor for the next page; absent when this page is the last
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Uuid>,
}

/// Account creation request (admin rank)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Password (will be validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Role for the new account
    pub role: Role,

    /// Optional avatar URL
    #[validate(length(max = 512, message = "Image URL must be at most 512 characters"))]
    pub image: Option<String>,

    /// Requested approval state; honored only for a super-admin actor
    pub is_approved: Option<bool>,
}

/// Profile update request (full replace of the editable fields)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Optional avatar URL
    #[validate(length(max = 512, message = "Image URL must be at most 512 characters"))]
    pub image: Option<String>,
}

/// Role change request
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    /// New role for the target user
    pub role: Role,
}

/// Password change request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    /// The acting user's current password
    pub current_password: String,

    /// New password (will be validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Returns the authenticated user's own record
pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let actor = load_actor(&state.db, auth.user_id).await?;

    Ok(Json(actor.into()))
}

/// Lists users with keyset pagination and an optional role filter
///
/// Requires admin rank; the listing is a management surface.
///
/// # Endpoint
///
/// ```text
/// GET /v1/users?limit=20&cursor=<uuid>&role=admin
/// ```
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<ListUsersResponse>> {
    let actor = load_actor(&state.db, auth.user_id).await?;
    require_admin_rank(&actor)?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_USER_PAGE_SIZE)
        .clamp(1, MAX_USER_PAGE_SIZE);

    let role = query.role.and_then(RoleFilter::as_role);
    let users = User::list(&state.db, limit, query.cursor, role).await?;

    // A full page means there may be more; the last id becomes the cursor
    let next_cursor = if users.len() as i64 == limit {
        users.last().map(|u| u.id)
    } else {
        None
    };

    Ok(Json(ListUsersResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
        next_cursor,
    }))
}

/// Creates an account on behalf of an admin-rank actor
///
/// The approval flag on the new account follows the creation matrix: a
/// super-admin's requested approval is honored, an admin-created admin is
/// always unapproved, and non-admin roles carry no approval flag.
///
/// # Errors
///
/// - `403 Forbidden`: Actor lacks admin rank, or an admin attempted to
///   create a super-admin
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<Json<UserResponse>> {
    req.validate()?;

    let actor = load_actor(&state.db, auth.user_id).await?;
    let is_approved = plan_account_creation(&actor, req.role, req.is_approved)?;

    password::validate_password_strength(&req.password).map_err(|msg| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: msg,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            name: req.name,
            password_hash,
            image: req.image,
            role: req.role,
            is_approved,
        },
    )
    .await?;

    tracing::info!(
        actor_id = %actor.id,
        user_id = %user.id,
        role = user.role.as_str(),
        "Account created"
    );

    Ok(Json(user.into()))
}

/// Updates a user's profile fields (name, email, image)
///
/// Full replace of the editable profile fields. Admin rank is required but
/// the acting admin's approval state is not checked.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    req.validate()?;

    let actor = load_actor(&state.db, auth.user_id).await?;
    require_admin_rank(&actor)?;

    let user = User::update_profile(&state.db, id, &req.name, &req.email, req.image.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Changes a user's role according to the authorization matrix
///
/// A super-admin setting any role approves the target; an admin granting
/// `admin` leaves the target unapproved; only a super-admin may grant
/// `super-admin`.
pub async fn update_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<UserResponse>> {
    let actor = load_actor(&state.db, auth.user_id).await?;
    let change = plan_role_change(actor.role, req.role)?;

    let user = User::update_role(&state.db, id, change.role, change.is_approved)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(
        actor_id = %actor.id,
        user_id = %user.id,
        role = user.role.as_str(),
        "Role changed"
    );

    Ok(Json(user.into()))
}

/// Approves an admin account (super-admin only)
///
/// Idempotent: approving an already-approved admin succeeds without change.
pub async fn approve_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let actor = load_actor(&state.db, auth.user_id).await?;

    let target = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    validate_admin_approval(&actor, &target)?;

    let user = User::set_approved(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(actor_id = %actor.id, user_id = %user.id, "Admin approved");

    Ok(Json(user.into()))
}

/// Changes a user's password
///
/// The acting user's current password is always re-verified against their
/// stored hash. Changing another user's password additionally requires
/// admin rank.
///
/// # Errors
///
/// - `401 Unauthorized`: Current password does not match
/// - `403 Forbidden`: Non-admin changing another user's password
/// - `404 Not Found`: Target user does not exist
pub async fn update_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePasswordRequest>,
) -> ApiResult<StatusCode> {
    req.validate()?;

    let actor = load_actor(&state.db, auth.user_id).await?;

    let valid = password::verify_password(&req.current_password, &actor.password_hash)?;
    if !valid {
        return Err(ApiError::InvalidCredential(
            "Current password does not match".to_string(),
        ));
    }

    if id != actor.id {
        require_admin_rank(&actor)?;
    }

    password::validate_password_strength(&req.new_password).map_err(|msg| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "new_password".to_string(),
            message: msg,
        }])
    })?;

    let password_hash = password::hash_password(&req.new_password)?;

    let updated = User::set_password_hash(&state.db, id, &password_hash).await?;
    if !updated {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(actor_id = %actor.id, user_id = %id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a user unless tasks still reference them as assignee
///
/// The assigned-task guard and the delete run as one conditional statement,
/// so a concurrent task creation cannot slip past the check.
///
/// # Errors
///
/// - `403 Forbidden`: Actor lacks admin rank
/// - `404 Not Found`: No such user
/// - `409 Conflict`: Tasks still reference the user
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let actor = load_actor(&state.db, auth.user_id).await?;
    require_admin_rank(&actor)?;

    match User::delete_if_unassigned(&state.db, id).await? {
        DeleteUserOutcome::Deleted => {
            tracing::info!(actor_id = %actor.id, user_id = %id, "User deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        DeleteUserOutcome::HasAssignedTasks => Err(ApiError::HasAssignedTasks(
            "User still has assigned tasks".to_string(),
        )),
        DeleteUserOutcome::NotFound => Err(ApiError::NotFound("User not found".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_filter_wire_format() {
        let filter: RoleFilter = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(filter, RoleFilter::All);

        let filter: RoleFilter = serde_json::from_str("\"super-admin\"").unwrap();
        assert_eq!(filter, RoleFilter::SuperAdmin);

        assert!(serde_json::from_str::<RoleFilter>("\"owner\"").is_err());
    }

    #[test]
    fn test_role_filter_all_disables_filtering() {
        assert_eq!(RoleFilter::All.as_role(), None);
        assert_eq!(RoleFilter::User.as_role(), Some(Role::User));
        assert_eq!(RoleFilter::Admin.as_role(), Some(Role::Admin));
        assert_eq!(RoleFilter::SuperAdmin.as_role(), Some(Role::SuperAdmin));
    }
}
