use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::users::repo::User;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("name must not be empty"));
        }
        if !is_valid_email(&self.email) {
            return Err(ApiError::validation("email must be a valid address"));
        }
        if self.password.is_empty() {
            return Err(ApiError::validation("password must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("name must not be empty"));
        }
        if !is_valid_email(&self.email) {
            return Err(ApiError::validation("email must be a valid address"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePhotoRequest {
    pub photo: String,
}

/// List entry: no password hash, no photo.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserSummary {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            photo: u.photo,
            created_at: u.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$fake".into(),
            photo: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("ax.com"));
        assert!(!is_valid_email("a @x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn create_request_validation() {
        let ok = CreateUserRequest {
            name: "A".into(),
            email: "a@x.com".into(),
            password: "p".into(),
        };
        assert!(ok.validate().is_ok());

        let blank_name = CreateUserRequest {
            name: "   ".into(),
            email: "a@x.com".into(),
            password: "p".into(),
        };
        assert!(blank_name.validate().is_err());

        let bad_email = CreateUserRequest {
            name: "A".into(),
            email: "nope".into(),
            password: "p".into(),
        };
        assert!(bad_email.validate().is_err());

        let no_password = CreateUserRequest {
            name: "A".into(),
            email: "a@x.com".into(),
            password: String::new(),
        };
        assert!(no_password.validate().is_err());
    }

    #[test]
    fn responses_never_carry_the_password_hash() {
        let summary = serde_json::to_value(UserSummary::from(sample_user())).unwrap();
        assert!(summary.get("password").is_none());
        assert!(summary.get("passwordHash").is_none());

        let full = serde_json::to_value(UserResponse::from(sample_user())).unwrap();
        assert!(full.get("password").is_none());
        assert!(full.get("passwordHash").is_none());
        assert!(full.get("createdAt").is_some());
    }
}
