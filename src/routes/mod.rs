pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::{error, web};

use crate::error::AppError;

/// Registers every route. Application state must be provided by the caller.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::ValidationError(err.to_string()))
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::ValidationError(err.to_string()))
    }))
    .service(health::root)
    .service(health::health)
    .service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::validate),
    )
    .service(
        // Static paths must be registered before `/{id}`.
        web::scope("/tasks")
            .service(tasks::list_tasks)
            .service(tasks::create_task)
            .service(tasks::search_tasks)
            .service(tasks::participants)
            .service(tasks::generate_description)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
