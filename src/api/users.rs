//! User API management

use axum::Extension;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::password::verify;
use crate::storage::Storage;
use crate::users::Role;
use crate::users::User;
use crate::users::create_user_with_role;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::JwtKeys;
use super::Success;
use super::current_user::Token;
use super::current_user::generate_token;

/// The user response information
///
/// A subset of all the information, ready to be serialized for the outside world
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// The user ID
    pub id: Uuid,

    /// The username
    pub username: String,

    /// The role of the user
    pub role: Role,
}

impl UserResponse {
    /// Create a user response from a [`User`](User)
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// Login form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    /// Username of the user
    username: String,
    /// Password of the user
    password: String,
}

/// Get a token for a user "session"
///
/// The token can then be used to access the rest of the API routes by using
/// it in the `Authorization` header, or as the `token` query parameter of
/// the live notification channel
pub async fn token<S: Storage>(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(storage): Extension<S>,
    Form(form): Form<LoginForm>,
) -> Result<Success<Token>, Error> {
    let user = storage
        .find_single_user_by_username(&form.username)
        .await
        .map_err(Error::internal_server_error)?;

    if let Some(user) = user {
        if verify(&user.hashed_password, &form.password) {
            let token = generate_token(&jwt_keys, &user)?;

            Ok(Success::ok(token))
        } else {
            Err(Error::bad_request("Invalid user"))
        }
    } else {
        Err(Error::bad_request("Invalid user"))
    }
}

/// Registration form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    /// Username of the new author
    username: String,
    /// Password of the new author
    password: String,
}

/// Open registration, every new account is an author
pub async fn register<S: Storage>(
    Extension(storage): Extension<S>,
    Form(form): Form<RegisterForm>,
) -> Result<Success<UserResponse>, Error> {
    if form.username.trim().is_empty() || form.password.is_empty() {
        return Err(Error::bad_request("Username and password are required"));
    }

    let existing = storage
        .find_single_user_by_username(&form.username)
        .await
        .map_err(Error::internal_server_error)?;

    if existing.is_some() {
        return Err(Error::bad_request("User already exists"));
    }

    let user = create_user_with_role(&storage, &form.username, &form.password, Role::Author)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::created(UserResponse::from_user(&user)))
}

/// Create user form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserForm {
    /// Role of the new user
    role: Role,
    /// Username of the new user
    username: String,
    /// Password of the new user
    password: String,
}

/// Create a user with any role, admins only
///
/// This is how reviewer accounts come into existence
pub async fn create<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    Form(form): Form<CreateUserForm>,
) -> Result<Success<UserResponse>, Error> {
    current_user.role.is_allowed(Role::Admin)?;

    let existing = storage
        .find_single_user_by_username(&form.username)
        .await
        .map_err(Error::internal_server_error)?;

    if existing.is_some() {
        return Err(Error::bad_request("User already exists"));
    }

    let user = create_user_with_role(&storage, &form.username, &form.password, form.role)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::created(UserResponse::from_user(&user)))
}

/// Get the current user
pub async fn me<S: Storage>(current_user: CurrentUser<S>) -> Success<UserResponse> {
    Success::ok(UserResponse::from_user(&current_user))
}
