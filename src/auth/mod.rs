//! Token-based authentication.
//!
//! Clients obtain an opaque token via `POST /api/user/token` and present it as
//! `Authorization: Token <key>` (the `Bearer` scheme is accepted as well).
//! Passwords are stored as Argon2 PHC strings.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use rand::Rng;

use crate::errors::{codes, AppError, ErrorDetails, ErrorResponse};
use crate::models::User;
use crate::AppState;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 5;

/// Token keys are 20 random bytes, hex encoded.
const TOKEN_KEY_BYTES: usize = 20;

/// The authenticated user, injected into request extensions by the auth layer.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Hash a password into an Argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored Argon2 PHC string.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Generate a new token key (40 hex characters).
pub fn generate_token_key() -> String {
    let bytes: [u8; TOKEN_KEY_BYTES] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Token authentication layer. Resolves the presented key to a user and
/// injects it into request extensions; rejects with 401 otherwise.
pub async fn token_auth_layer(state: AppState, mut request: Request, next: Next) -> Response {
    let Some(key) = extract_token_key(&request) else {
        return unauthorized_response("Authentication credentials were not provided");
    };

    match state.repo.get_user_by_token(&key).await {
        Ok(Some(user)) if user.is_active => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Ok(_) => unauthorized_response("Invalid token"),
        Err(err) => {
            tracing::error!("Token lookup failed: {}", err);
            err.into_response()
        }
    }
}

/// Pull the token key out of the Authorization header.
fn extract_token_key(request: &Request) -> Option<String> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;

    value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(|key| key.trim().to_string())
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse {
        error: ErrorDetails {
            code: codes::UNAUTHORIZED.to_string(),
            message: message.to_string(),
        },
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("testpass123").unwrap();
        assert_ne!(hash, "testpass123");
        assert!(verify_password("testpass123", &hash));
        assert!(!verify_password("wrongpass", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("testpass123").unwrap();
        let second = hash_password("testpass123").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("testpass123", "not-a-phc-string"));
    }

    #[test]
    fn test_token_key_format() {
        let key = generate_token_key();
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_token_key());
    }
}
