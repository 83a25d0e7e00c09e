//! User model for storage and API.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// User account stored in Firestore (document ID is the username).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique username, `[A-Za-z0-9_]{3,30}`
    pub username: String,
    /// Email address
    pub email: String,
    /// Salted PBKDF2 hash, `{iterations}${salt_hex}${hash_hex}`
    pub password_hash: String,
    /// When the account was created
    pub created_at: String,
    /// Last successful login timestamp
    pub last_active: String,
}

/// Registration payload.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 3, max = 30, message = "must be 3 to 30 characters"),
        custom(function = validate_username_chars)
    )]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "must be 8 to 128 characters"))]
    pub password: String,
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Usernames are document IDs and appear in composite keys, so the
/// character set is restricted.
fn validate_username_chars(username: &str) -> Result<(), validator::ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(validator::ValidationError::new("username_chars")
            .with_message("may only contain letters, digits, and underscores".into()))
    }
}
