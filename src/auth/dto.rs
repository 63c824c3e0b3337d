use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::users::dto::is_valid_email;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !is_valid_email(&self.email) {
            return Err(ApiError::validation("email must be a valid address"));
        }
        if self.password.is_empty() {
            return Err(ApiError::validation("password must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_rejects_bad_email() {
        let req = LoginRequest {
            email: "not-an-email".into(),
            password: "p".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn login_rejects_empty_password() {
        let req = LoginRequest {
            email: "a@x.com".into(),
            password: String::new(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn me_response_has_no_password_field() {
        let json = serde_json::to_value(MeResponse {
            id: Uuid::new_v4(),
            name: "A".into(),
            email: "a@x.com".into(),
            photo: None,
        })
        .unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["name"], "A");
    }
}
