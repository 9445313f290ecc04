//! Database operations through the PostgREST API

mod filter;
mod query;
mod types;

use reqwest::Client;
use serde::Serialize;

use crate::config::ClientOptions;

pub use filter::*;
pub use query::*;
pub use types::*;

/// Client for database operations on one table
#[derive(Clone)]
pub struct PostgrestClient {
    /// Everything a request needs besides its own filters
    target: RequestTarget,
}

/// Resolved table URL plus credentials, shared by every builder
#[derive(Clone)]
pub struct RequestTarget {
    pub(crate) url: String,
    pub(crate) key: String,
    pub(crate) access_token: Option<String>,
    pub(crate) client: Client,
    pub(crate) options: ClientOptions,
}

impl PostgrestClient {
    /// Create a new PostgrestClient
    pub(crate) fn new(
        url: &str,
        key: &str,
        table: &str,
        client: Client,
        options: ClientOptions,
    ) -> Self {
        Self {
            target: RequestTarget {
                url: format!("{}/rest/v1/{}", url, table),
                key: key.to_string(),
                access_token: None,
                client,
                options,
            },
        }
    }

    /// Run requests as the signed-in user instead of the anonymous key
    pub fn with_auth(mut self, access_token: Option<&str>) -> Self {
        self.target.access_token = access_token.map(str::to_string);
        self
    }

    /// Select specific columns (and embedded relations) from the table
    pub fn select(&self, columns: &str) -> SelectBuilder {
        SelectBuilder::new(self.target.clone(), columns)
    }

    /// Insert rows into the table
    pub fn insert<T: Serialize>(&self, values: T) -> InsertBuilder<T> {
        InsertBuilder::new(self.target.clone(), values)
    }

    /// Update rows in the table
    pub fn update<T: Serialize>(&self, values: T) -> UpdateBuilder<T> {
        UpdateBuilder::new(self.target.clone(), values)
    }
}
