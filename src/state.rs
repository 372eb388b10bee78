use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    auth::{AuthConfig, TokenService},
    store::{CatalogStore, CredentialStore, InMemoryCatalog, InMemoryCredentials},
};

/// Shared service state handed to every route.
#[derive(Clone)]
pub struct Bookstore {
    pub(crate) tokens: Arc<TokenService>,
    pub(crate) credentials: Arc<Mutex<dyn CredentialStore>>,
    pub(crate) catalog: Arc<Mutex<dyn CatalogStore>>,
}

impl Bookstore {
    pub fn new(
        config: AuthConfig,
        credentials: Arc<Mutex<dyn CredentialStore>>,
        catalog: Arc<Mutex<dyn CatalogStore>>,
    ) -> Self {
        Self {
            tokens: Arc::new(TokenService::new(&config)),
            credentials,
            catalog,
        }
    }

    /// A bookstore with no registered users, serving the given catalog from memory.
    pub fn in_memory(config: AuthConfig, catalog: InMemoryCatalog) -> Self {
        Self::new(
            config,
            Arc::new(Mutex::new(InMemoryCredentials::new())),
            Arc::new(Mutex::new(catalog)),
        )
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}
