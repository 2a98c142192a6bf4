//! Food storefront core
//!
//! Menu browsing, cart and checkout for a food-ordering shop, plus the
//! back-office that manages categories, items and user roles. Rows live in a
//! Supabase project; this crate is the client side of it.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod store;

use reqwest::Client;
use storefront_auth::{AuthClient, AuthOptions};

use crate::admin::AdminService;
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::session::StorefrontSession;
use crate::store::{SupabaseIdentity, SupabaseStore};

/// Entry point wiring the HTTP client, auth and stores for one project
pub struct Storefront {
    config: StorefrontConfig,
    http_client: Client,
    auth: AuthClient,
}

impl Storefront {
    /// Build a storefront for the project described by `config`
    ///
    /// # Example
    ///
    /// ```
    /// use food_storefront::{config::StorefrontConfig, Storefront};
    ///
    /// let config = StorefrontConfig::new("https://your-project.supabase.co", "your-anon-key").unwrap();
    /// let storefront = Storefront::new(config).unwrap();
    /// let session = storefront.session();
    /// assert!(session.cart().is_empty());
    /// ```
    pub fn new(config: StorefrontConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let auth = AuthClient::new(
            config.base_url(),
            &config.anon_key,
            http_client.clone(),
            AuthOptions {
                persist_session: config.options.persist_session,
            },
        );

        Ok(Self {
            config,
            http_client,
            auth,
        })
    }

    /// Same as [`Storefront::new`] with [`StorefrontConfig::from_env`]
    pub fn from_env() -> Result<Self> {
        Self::new(StorefrontConfig::from_env()?)
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// Catalog and admin tables, queried as the signed-in user when there is one
    pub fn store(&self) -> SupabaseStore {
        SupabaseStore::new(
            self.config.base_url(),
            &self.config.anon_key,
            self.http_client.clone(),
        )
        .with_schema(&self.config.options.db_schema)
        .with_auth(self.auth.clone())
    }

    pub fn identity(&self) -> SupabaseIdentity {
        SupabaseIdentity::new(self.auth.clone(), self.store())
    }

    pub fn admin(&self) -> AdminService<SupabaseStore> {
        AdminService::new(self.store())
    }

    /// A fresh shopper session with an empty cart
    pub fn session(&self) -> StorefrontSession {
        StorefrontSession::new()
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::admin::{AdminService, CategoryDraft, ItemDraft, RoutePolicy};
    pub use crate::cart::{Cart, Notice};
    pub use crate::catalog::{CatalogFilter, ItemQuery};
    pub use crate::config::{ClientOptions, StorefrontConfig};
    pub use crate::error::{Error, Result};
    pub use crate::model::{Category, CategoryId, Item, ItemId, Role, Status};
    pub use crate::session::{FetchOutcome, StorefrontSession};
    pub use crate::store::{AdminStore, CatalogStore, IdentityProvider, MemoryStore};
    pub use crate::Storefront;
}
