use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use validator::Validate;

use super::password::PasswordHasher;
use super::token::TokenService;
use crate::error::AppError;
use crate::models::{LoginRequest, NewUser, RegisterRequest, TokenResponse, User, UserResponse};
use crate::store::UserStore;

const INVALID_LOGIN: &str = "Incorrect email or password";
const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// Registration, login and identity resolution.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenService,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenService, hasher: PasswordHasher) -> Self {
        Self {
            users,
            tokens,
            hasher,
        }
    }

    /// Creates an account. Fails with `Conflict` when the email is already taken.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AppError> {
        request.validate()?;

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let user = self
            .users
            .insert(NewUser {
                email: request.email,
                name: request.name,
                password_hash: self.hasher.hash(&request.password)?,
                created_at: Utc::now(),
            })
            .await?;

        info!("registered user {}", user.email);
        Ok(UserResponse::from(&user))
    }

    /// Checks credentials and issues an access token.
    ///
    /// Unknown emails and wrong passwords produce the same error.
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse, AppError> {
        request.validate()?;

        let user = match self.users.find_by_email(&request.email).await? {
            Some(user) if self.hasher.verify(&request.password, &user.password_hash) => user,
            _ => {
                warn!("failed login for {}", request.email);
                return Err(AppError::Unauthorized(INVALID_LOGIN.into()));
            }
        };

        let access_token = self.tokens.issue(&user.email)?;
        info!("user {} logged in", user.email);
        Ok(TokenResponse::bearer(access_token, user.name))
    }

    /// Resolves a bearer token to the user it was issued for.
    pub async fn resolve(&self, token: &str) -> Result<User, AppError> {
        let claims = self.tokens.verify(token).map_err(|e| {
            info!("rejected token: {}", e);
            AppError::Unauthorized(INVALID_CREDENTIALS.into())
        })?;

        self.users
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use chrono::Duration;
    use jsonwebtoken::Algorithm;

    const TEST_COST: u32 = 4;

    fn service_with_ttl(store: Arc<MemoryStore>, ttl: Duration) -> AuthService {
        AuthService::new(
            store,
            TokenService::new("auth-service-secret", Algorithm::HS256, ttl),
            PasswordHasher::new(TEST_COST),
        )
    }

    fn service() -> AuthService {
        service_with_ttl(Arc::new(MemoryStore::new()), Duration::minutes(30))
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            name: "Ada Lovelace".to_string(),
            password: "engine".to_string(),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_register_twice_conflicts() {
        let auth = service();
        let user = auth.register(register_request("ada@example.com")).await.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name, "Ada Lovelace");
        assert!(user.is_active);

        let second = auth.register(register_request("ada@example.com")).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[actix_rt::test]
    async fn test_register_rejects_invalid_input() {
        let auth = service();
        let result = auth.register(register_request("not-an-email")).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[actix_rt::test]
    async fn test_login_failures_are_indistinguishable() {
        let auth = service();
        auth.register(register_request("ada@example.com")).await.unwrap();

        let wrong_password = auth
            .login(login_request("ada@example.com", "wrong"))
            .await
            .unwrap_err();
        let unknown_email = auth
            .login(login_request("nobody@example.com", "engine"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::Unauthorized(_)));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[actix_rt::test]
    async fn test_login_then_resolve() {
        let auth = service();
        auth.register(register_request("ada@example.com")).await.unwrap();

        let token = auth
            .login(login_request("ada@example.com", "engine"))
            .await
            .unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.name, "Ada Lovelace");

        let user = auth.resolve(&token.access_token).await.unwrap();
        assert_eq!(user.email, "ada@example.com");
    }

    #[actix_rt::test]
    async fn test_resolve_rejects_expired_token() {
        let auth = service_with_ttl(Arc::new(MemoryStore::new()), Duration::zero());
        auth.register(register_request("ada@example.com")).await.unwrap();
        let token = auth
            .login(login_request("ada@example.com", "engine"))
            .await
            .unwrap();

        let result = auth.resolve(&token.access_token).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[actix_rt::test]
    async fn test_resolve_rejects_unknown_subject() {
        let auth = service();
        let token = TokenService::new("auth-service-secret", Algorithm::HS256, Duration::minutes(5))
            .issue("ghost@example.com")
            .unwrap();

        let result = auth.resolve(&token).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
