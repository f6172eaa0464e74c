use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{LoginRequest, RegisterRequest, UserResponse},
    state::AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};

/// Register a new user
///
/// Creates a new account and returns its public view. The password hash is never echoed.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let user = state.auth.register(register_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

/// Login user
///
/// Authenticates a user and returns a bearer access token with the display name.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let token = state.auth.login(login_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(token))
}

/// Returns the caller's public view if the bearer token is valid.
#[get("/validate")]
pub async fn validate(user: CurrentUser) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(UserResponse::from(&user.0)))
}
