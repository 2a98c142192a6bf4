//! Configuration for the storefront client

use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Tunables for the HTTP layer and the auth session
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whether sign-in keeps its session for later requests
    pub persist_session: bool,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// The database schema holding the storefront tables
    pub db_schema: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            persist_session: true,
            request_timeout: Some(Duration::from_secs(30)),
            db_schema: "public".to_string(),
        }
    }
}

impl ClientOptions {
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    pub fn with_db_schema(mut self, value: &str) -> Self {
        self.db_schema = value.to_string();
        self
    }
}

/// Project URL and anonymous key of the hosted backend.
/// Load these from the environment rather than hard-coding them.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub url: Url,
    pub anon_key: String,
    pub options: ClientOptions,
}

impl StorefrontConfig {
    /// Creates a new configuration, validating the URL.
    pub fn new(url_str: &str, anon_key: impl Into<String>) -> Result<Self> {
        let url = Url::parse(url_str)?;
        let anon_key = anon_key.into();
        if anon_key.trim().is_empty() {
            return Err(Error::config("anon_key cannot be empty"));
        }
        Ok(Self {
            url,
            anon_key,
            options: ClientOptions::default(),
        })
    }

    /// Reads `SUPABASE_URL` and `SUPABASE_ANON_KEY`, loading a `.env` file
    /// first when one exists.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let url_str = std::env::var("SUPABASE_URL")
            .map_err(|_| Error::config("SUPABASE_URL environment variable not found"))?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| Error::config("SUPABASE_ANON_KEY environment variable not found"))?;
        Self::new(&url_str, anon_key)
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Base URL without the trailing slash `Url` adds
    pub fn base_url(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }
}
