use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        jwt::TokenService,
        password::{hash_password_blocking, verify_dummy, verify_password_blocking},
        repo::UserStore,
        repo_types::User,
    },
    error::ApiError,
    store::StoreError,
};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const EMAIL_TAKEN: &str = "Email already registered";
pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(())
}

pub async fn register(users: &dyn UserStore, req: RegisterRequest) -> Result<User, ApiError> {
    require("email", &req.email)?;
    require("password", &req.password)?;

    if !is_valid_email(&req.email) {
        return Err(ApiError::validation("Invalid email"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let digest = hash_password_blocking(req.password)
        .await
        .map_err(ApiError::internal)?;

    match users.create(&req.email, &digest).await {
        Ok(user) => {
            info!(user_id = %user.id, "user registered");
            Ok(user)
        }
        Err(StoreError::UniqueViolation) => {
            warn!("registration for an existing email");
            Err(ApiError::Conflict(EMAIL_TAKEN))
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            Err(e.into())
        }
    }
}

/// Both an unknown email and a wrong password end in the same 401.
pub async fn login(
    users: &dyn UserStore,
    tokens: &TokenService,
    req: LoginRequest,
) -> Result<String, ApiError> {
    require("email", &req.email)?;
    require("password", &req.password)?;

    let Some(user) = users.find_by_email(&req.email).await? else {
        verify_dummy(req.password).await;
        warn!("login for unknown email");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    };

    let matches = verify_password_blocking(req.password, user.password_hash)
        .await
        .map_err(ApiError::internal)?;
    if !matches {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }

    let token = tokens.issue(user.id, &user.email).map_err(ApiError::internal)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}
