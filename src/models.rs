use crate::error::AppError;
use crate::schema::users;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

pub const MAX_USERNAME_LEN: usize = 20;

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    #[diesel(column_name = password)]
    pub hashed_password: &'a [u8],
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub username: String,
    #[diesel(column_name = password)]
    pub hashed_password: Vec<u8>,
    #[diesel(column_name = profile_image)]
    pub profile_image_url: String,
}

impl AsRef<str> for User {
    fn as_ref(&self) -> &str {
        &self.username
    }
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub username: String,
    pub profile_image_url: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            username: user.username,
            profile_image_url: user.profile_image_url,
        }
    }
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Usernames name files on disk, so only a conservative character set is allowed.
pub fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if len == 0 || len > MAX_USERNAME_LEN {
        return Err(AppError::Validation(format!(
            "username must be 1 to {} characters",
            MAX_USERNAME_LEN
        )));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');
    if username.starts_with('.') || !username.chars().all(allowed) {
        return Err(AppError::Validation(
            "username may only contain letters, digits, '_', '-' and '.'".to_string(),
        ));
    }
    Ok(())
}
