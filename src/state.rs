use std::sync::Arc;

use crate::auth::{AuthService, PasswordHasher, TokenService};
use crate::config::Config;
use crate::drafting::{CompletionProvider, DraftingService};
use crate::store::{TaskStore, UserStore};
use crate::tasks::TaskService;

/// Services shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub tasks: TaskService,
    pub drafting: DraftingService,
}

impl AppState {
    pub fn new(auth: AuthService, tasks: TaskService, drafting: DraftingService) -> Self {
        Self {
            auth,
            tasks,
            drafting,
        }
    }

    /// Wires the services from configuration and the injected backends.
    pub fn from_config(
        config: &Config,
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        let tokens = TokenService::new(
            &config.secret_key,
            config.algorithm,
            config.access_token_ttl,
        );
        Self::new(
            AuthService::new(users, tokens, PasswordHasher::new(config.bcrypt_cost)),
            TaskService::new(tasks),
            DraftingService::new(provider),
        )
    }
}
