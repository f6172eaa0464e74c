pub mod extractors;
pub mod password;
pub mod service;
pub mod token;

// Re-export necessary items
pub use extractors::{bearer_token, CurrentUser};
pub use password::PasswordHasher;
pub use service::AuthService;
pub use token::{Claims, TokenError, TokenService};
