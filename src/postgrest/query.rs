//! Query builders for PostgrestClient

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Error;
use crate::fetch::{Fetch, FetchBuilder};
use crate::postgrest::filter::Filter;
use crate::postgrest::types::Order;
use crate::postgrest::RequestTarget;

/// Writes always answer with the affected rows
const RETURN_REPRESENTATION: &str = "return=representation";

/// Ordered query parameters
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    params: Vec<(String, String)>,
}

impl QueryBuilder {
    /// Create a new QueryBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter to the query, replacing an earlier one with the same key
    pub fn set_param(&mut self, key: &str, value: &str) {
        self.params.retain(|(k, _)| k != key);
        self.params.push((key.to_string(), value.to_string()));
    }

    /// Add a parameter, allowing repeated keys (several filters on one column)
    pub fn push_param(&mut self, key: &str, value: &str) {
        self.params.push((key.to_string(), value.to_string()));
    }

    /// Get the query parameters
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

fn base_request<'a>(target: &'a RequestTarget, fetch: FetchBuilder<'a>) -> FetchBuilder<'a> {
    fetch
        .api_key(&target.key, target.access_token.as_deref())
        .header("X-Client-Info", &target.options.client_info)
        .timeout(target.options.request_timeout)
        .on_error(Error::Database)
}

/// Builder for SELECT queries
pub struct SelectBuilder {
    target: RequestTarget,
    query: QueryBuilder,
    single: bool,
}

impl SelectBuilder {
    /// Create a new SelectBuilder
    pub fn new(target: RequestTarget, columns: &str) -> Self {
        let mut query = QueryBuilder::new();
        // embedded-resource selects are written multi-line for readability
        let columns: String = columns.split_whitespace().collect();
        query.set_param("select", &columns);

        Self {
            target,
            query,
            single: false,
        }
    }

    /// Add an arbitrary filter
    pub fn filter(mut self, filter: Filter) -> Self {
        self.query.push_param(&filter.column, &filter.param_value());
        self
    }

    /// Filter rows where column equals a value
    pub fn eq<T: ToString>(self, column: &str, value: T) -> Self {
        self.filter(Filter::eq(column, value))
    }

    /// Match any of the rendered conditions, see [`super::any_of`]
    pub fn or(mut self, expression: &str) -> Self {
        self.query.set_param("or", expression);
        self
    }

    /// Order the results by a column
    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.query
            .set_param("order", &format!("{}.{}", column, order.as_str()));
        self
    }

    /// Expect exactly one row; PostgREST answers 406 otherwise
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// The query string parameters this builder will send
    pub fn params(&self) -> &[(String, String)] {
        self.query.params()
    }

    fn request(&self) -> FetchBuilder<'_> {
        let fetch = base_request(&self.target, Fetch::get(&self.target.client, &self.target.url))
            .header("Accept-Profile", &self.target.options.db_schema)
            .query(self.query.params().iter().cloned());

        if self.single {
            fetch.header("Accept", "application/vnd.pgrst.object+json")
        } else {
            fetch
        }
    }

    /// Execute the query and return the rows
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        self.request().execute::<Vec<T>>().await
    }

    /// Execute a [`single`](Self::single) query and return the row
    pub async fn execute_single<T: DeserializeOwned>(&self) -> Result<T, Error> {
        self.request().execute::<T>().await
    }
}

/// Builder for INSERT queries
pub struct InsertBuilder<T: Serialize> {
    target: RequestTarget,
    values: T,
}

impl<T: Serialize> InsertBuilder<T> {
    /// Create a new InsertBuilder
    pub fn new(target: RequestTarget, values: T) -> Self {
        Self {
            target,
            values,
        }
    }

    /// Execute the insert and return the inserted rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>, Error> {
        let fetch = base_request(&self.target, Fetch::post(&self.target.client, &self.target.url))
            .header("Content-Profile", &self.target.options.db_schema)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&self.values)?;

        fetch.execute::<Vec<R>>().await
    }
}

/// Builder for UPDATE queries
pub struct UpdateBuilder<T: Serialize> {
    target: RequestTarget,
    values: T,
    query: QueryBuilder,
}

impl<T: Serialize> UpdateBuilder<T> {
    /// Create a new UpdateBuilder
    pub fn new(target: RequestTarget, values: T) -> Self {
        Self {
            target,
            values,
            query: QueryBuilder::new(),
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        let filter = Filter::eq(column, value);
        self.query.push_param(&filter.column, &filter.param_value());
        self
    }

    /// Execute the update and return the updated rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>, Error> {
        let fetch = base_request(&self.target, Fetch::patch(&self.target.client, &self.target.url))
            .header("Content-Profile", &self.target.options.db_schema)
            .header("Prefer", RETURN_REPRESENTATION)
            .query(self.query.params().iter().cloned())
            .json(&self.values)?;

        fetch.execute::<Vec<R>>().await
    }
}
