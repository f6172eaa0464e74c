use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the user's email.
    pub sub: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Why a token was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, malformed token, or missing subject.
    InvalidToken(String),
    /// The token is at or past its expiry.
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::InvalidToken(reason) => write!(f, "Invalid token: {}", reason),
            TokenError::Expired => write!(f, "Token has expired"),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        AppError::Unauthorized(error.to_string())
    }
}

/// Issues and verifies HMAC-signed access tokens.
///
/// The secret, algorithm and TTL are fixed when the service is built; nothing is
/// read from the environment per call.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, algorithm: Algorithm, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            ttl,
        }
    }

    /// Generates a token for `subject` expiring after the configured TTL.
    pub fn issue(&self, subject: &str) -> Result<String, AppError> {
        let expires_at = Utc::now().checked_add_signed(self.ttl).ok_or_else(|| {
            AppError::InternalServerError("Token lifetime is out of range".into())
        })?;
        let claims = Claims {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
        };
        Ok(encode(
            &Header::new(self.algorithm),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Checks signature and expiry and returns the decoded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidToken(e.to_string()),
            })?;

        // jsonwebtoken accepts exp == now; a token is only live strictly before its expiry.
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        if claims.sub.trim().is_empty() {
            return Err(TokenError::InvalidToken("missing subject".into()));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, Algorithm::HS256, Duration::minutes(30))
    }

    #[test]
    fn test_token_generation_and_verification() {
        let tokens = service("test_secret_for_gen_verify");
        let token = tokens.issue("user@example.com").unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "user@example.com");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        let tokens = TokenService::new("secret", Algorithm::HS256, Duration::zero());
        let token = tokens.issue("user@example.com").unwrap();
        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_expiration() {
        let expired = Claims {
            sub: "user@example.com".to_string(),
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &expired,
            &EncodingKey::from_secret("test_secret_for_expiration".as_bytes()),
        )
        .unwrap();

        let result = service("test_secret_for_expiration").verify(&token);
        assert_eq!(result, Err(TokenError::Expired));
    }

    #[test]
    fn test_invalid_token_signature() {
        let token = service("one_secret").issue("user@example.com").unwrap();
        match service("a_completely_different_secret").verify(&token) {
            Err(TokenError::InvalidToken(msg)) => assert!(msg.contains("InvalidSignature")),
            other => panic!("Token should have been invalid due to signature mismatch: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_token() {
        assert!(matches!(
            service("secret").verify("not-a-jwt"),
            Err(TokenError::InvalidToken(_))
        ));
        assert!(matches!(
            service("secret").verify(""),
            Err(TokenError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_missing_subject_is_rejected() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let key = EncodingKey::from_secret(b"secret");

        let no_sub = encode(&Header::default(), &json!({ "exp": exp }), &key).unwrap();
        assert!(matches!(
            service("secret").verify(&no_sub),
            Err(TokenError::InvalidToken(_))
        ));

        let empty_sub = encode(&Header::default(), &json!({ "sub": "", "exp": exp }), &key).unwrap();
        assert!(matches!(
            service("secret").verify(&empty_sub),
            Err(TokenError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_algorithm_mismatch_is_rejected() {
        let token = TokenService::new("secret", Algorithm::HS512, Duration::minutes(5))
            .issue("user@example.com")
            .unwrap();
        assert!(matches!(
            service("secret").verify(&token),
            Err(TokenError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_token_error_maps_to_unauthorized() {
        let err: AppError = TokenError::Expired.into();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
