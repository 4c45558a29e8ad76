//! Shared application state handed to every handler

use std::sync::Arc;

use crate::config::Config;
use crate::repository::UserStore;
use crate::users::{Clock, UserService};

/// Configuration plus the user engine over store `S`
pub struct AppState<S> {
    config: Arc<Config>,
    users: Arc<UserService<S>>,
}

// manual impl: `S` itself need not be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            users: Arc::clone(&self.users),
        }
    }
}

impl<S: UserStore> AppState<S> {
    pub fn new(config: Config, store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: Arc::new(config),
            users: Arc::new(UserService::new(store, clock)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn users(&self) -> &UserService<S> {
        &self.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryUserStore;
    use crate::users::SystemClock;

    #[test]
    fn test_clones_share_the_service() {
        let store = Arc::new(InMemoryUserStore::default());
        let state = AppState::new(Config::default(), Arc::clone(&store), Arc::new(SystemClock));
        let clone = state.clone();
        assert!(Arc::ptr_eq(&state.users, &clone.users));
        assert!(Arc::ptr_eq(clone.users().store(), &store));
        assert_eq!(clone.config().service.port, 8080);
    }
}
