//! Candidatura intake backend
//!
//! Accepts job-application submissions over HTTP, stores optional photos in
//! Supabase Storage and rows in Supabase's PostgREST API. A client-side
//! [`manager::ApplicationManager`] and [`session::SessionManager`] cover the
//! richer flows (models, bookings, messages, reviews) against the same project.

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod form_client;
pub mod manager;
pub mod models;
pub mod postgrest;
pub mod server;
pub mod services;
pub mod session;
pub mod storage;

use reqwest::Client;

use crate::auth::Auth;
use crate::config::ClientOptions;
use crate::postgrest::PostgrestClient;
use crate::storage::StorageClient;

/// Handle on one Supabase project
#[derive(Clone)]
pub struct Supabase {
    /// The base URL for the Supabase project
    pub url: String,
    /// The anonymous API key for the Supabase project
    pub key: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Auth client for user management and authentication
    pub auth: Auth,
    /// Client options
    pub options: ClientOptions,
}

impl Supabase {
    /// Create a new Supabase client
    ///
    /// # Example
    ///
    /// ```
    /// use candidatura::Supabase;
    ///
    /// let supabase = Supabase::new("https://your-project-url.supabase.co", "your-anon-key");
    /// ```
    pub fn new(supabase_url: &str, supabase_key: &str) -> Self {
        Self::new_with_options(supabase_url, supabase_key, ClientOptions::default())
    }

    /// Create a new Supabase client with custom options
    pub fn new_with_options(supabase_url: &str, supabase_key: &str, options: ClientOptions) -> Self {
        let supabase_url = supabase_url.trim_end_matches('/');
        let http_client = Client::new();

        let auth = Auth::new(supabase_url, supabase_key, http_client.clone(), options.clone());

        Self {
            url: supabase_url.to_string(),
            key: supabase_key.to_string(),
            http_client,
            auth,
            options,
        }
    }

    /// Get a reference to the auth client
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Query builder for a table. Requests carry the signed-in user's token when there is one.
    ///
    /// ```
    /// use candidatura::Supabase;
    ///
    /// let supabase = Supabase::new("https://your-project-url.supabase.co", "your-anon-key");
    /// let query = supabase.from("candidaturas").select("*");
    /// ```
    pub fn from(&self, table: &str) -> PostgrestClient {
        let token = self.auth.get_session().map(|s| s.access_token);
        PostgrestClient::new(
            &self.url,
            &self.key,
            table,
            self.http_client.clone(),
            self.options.clone(),
        )
        .with_auth(token.as_deref())
    }

    /// Storage client for file operations, carrying the session token like [`Supabase::from`]
    pub fn storage(&self) -> StorageClient {
        let token = self.auth.get_session().map(|s| s.access_token);
        StorageClient::new(&self.url, &self.key, self.http_client.clone(), self.options.clone())
            .with_auth(token.as_deref())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::{AppConfig, ClientOptions};
    pub use crate::error::Error;
    pub use crate::manager::{ApplicationManager, Outcome};
    pub use crate::services::{AuthApi, DataApi, FileStore, SupabaseService};
    pub use crate::session::SessionManager;
    pub use crate::Supabase;
}
