use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// The caller of a protected route, resolved from the `Authorization: Bearer` header.
///
/// Resolution goes through `AuthService::resolve`, so the token must be valid and its
/// subject must still exist in the store. Any failure is answered with 401 before
/// the handler runs.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Returns the token part of an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively, so the `bearer` token type handed out
/// by login can be used verbatim.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim().to_string()).filter(|token| !token.is_empty())
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                AppError::InternalServerError("Application state is not configured".into())
            })?;
            let token = token.ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;
            let user = state.auth.resolve(&token).await?;
            Ok(CurrentUser(user))
        })
    }
}
