use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A stored user, including the password hash. Never serialised to clients.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A user ready to be persisted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn into_user(self, id: String) -> User {
        User {
            id,
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            is_active: true,
            created_at: self.created_at,
        }
    }
}

/// The public view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
            is_active: user.is_active,
        }
    }
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    /// Display name, between 3 and 50 characters.
    #[validate(length(min = 3, max = 50))]
    pub name: String,
    #[validate(length(min = 4))]
    pub password: String,
}

/// Represents the payload for a user login request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Returned by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub name: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String, name: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_register_request_validation() {
        let input = RegisterRequest {
            email: "test@example.com".to_string(),
            name: "Tester".to_string(),
            password: "pass".to_string(),
        };
        assert!(input.validate().is_ok());

        let input = RegisterRequest {
            email: "invalid-email".to_string(),
            ..input
        };
        assert!(input.validate().is_err());

        let input = RegisterRequest {
            email: "test@example.com".to_string(),
            name: "Al".to_string(),
            password: "password".to_string(),
        };
        assert!(input.validate().is_err());

        let input = RegisterRequest {
            email: "test@example.com".to_string(),
            name: "Tester".to_string(),
            password: "abc".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_public_view_omits_password_hash() {
        let user = NewUser {
            email: "test@example.com".to_string(),
            name: "Tester".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            created_at: Utc::now(),
        }
        .into_user("65f1c0a1b2c3d4e5f6a7b8c9".to_string());

        let json = serde_json::to_string(&UserResponse::from(&user)).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("password"));
        assert!(user.is_active);
    }
}
