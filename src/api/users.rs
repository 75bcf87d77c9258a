//! User API endpoints: registration, token issuance and profile management.

use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::auth::{self, CurrentUser, MIN_PASSWORD_LEN};
use crate::errors::AppError;
use crate::models::{
    RegisterUserRequest, TokenRequest, TokenResponse, UpdateUserRequest, UserProfile,
};
use crate::AppState;

/// POST /api/user/create - Register a new user.
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let email = normalize_email(request.email.trim());
    validate_email(&email)?;
    validate_password(&request.password)?;

    let password_hash = auth::hash_password(&request.password)?;
    let user = state
        .repo
        .create_user(&email, &request.name, &password_hash)
        .await?;

    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

/// POST /api/user/token - Obtain an auth token for valid credentials.
pub async fn obtain_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Must include \"email\" and \"password\"".to_string(),
        ));
    }

    let user = state
        .repo
        .get_user_by_email(&normalize_email(request.email.trim()))
        .await?
        .filter(|u| u.is_active && auth::verify_password(&request.password, &u.password_hash))
        .ok_or_else(|| {
            AppError::Validation("Unable to authenticate with provided credentials".to_string())
        })?;

    let token = state.repo.get_or_create_token(user.id).await?;
    Ok(Json(TokenResponse { token }))
}

/// GET /api/user/me - Retrieve the authenticated user's profile.
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}

/// PUT/PATCH /api/user/me - Update the authenticated user's profile.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(mut request): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>, AppError> {
    if let Some(email) = request.email.take() {
        let email = normalize_email(email.trim());
        validate_email(&email)?;
        request.email = Some(email);
    }

    let password_hash = match &request.password {
        Some(password) => {
            validate_password(password)?;
            Some(auth::hash_password(password)?)
        }
        None => None,
    };

    let updated = state
        .repo
        .update_user(user.id, &request, password_hash)
        .await?;

    Ok(Json(UserProfile::from(&updated)))
}

/// Lowercase the domain part of an email. Emails differing only in domain
/// case are the same account.
fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn validate_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation(
            "A valid email address is required".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases_domain() {
        assert_eq!(
            normalize_email("Frodo@LONDONAPPDEV.COM"),
            "Frodo@londonappdev.com"
        );
    }

    #[test]
    fn test_normalize_email_keeps_local_part() {
        assert_eq!(normalize_email("MiXeD@example.com"), "MiXeD@example.com");
        // No domain to normalize; validation rejects these separately
        assert_eq!(normalize_email("not-an-email"), "not-an-email");
    }
}
