//! Storage operations for file uploads

mod types;

use reqwest::{multipart, Client};
use url::Url;

use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::{error_message, Fetch};

pub use types::*;

/// Client for Supabase Storage
#[derive(Clone)]
pub struct StorageClient {
    /// The base URL for the Supabase project
    url: String,

    /// The anonymous API key for the Supabase project
    key: String,

    /// Signed-in user's token; the key stands in for it when absent
    access_token: Option<String>,

    /// HTTP client used for requests
    client: Client,

    options: ClientOptions,
}

/// Client for a specific storage bucket
pub struct BucketClient<'a> {
    /// Reference to the storage client
    storage: &'a StorageClient,

    /// The bucket ID
    bucket_id: String,
}

impl StorageClient {
    /// Create a new StorageClient
    pub(crate) fn new(url: &str, key: &str, client: Client, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            access_token: None,
            client,
            options,
        }
    }

    /// Run requests as the signed-in user instead of the anonymous key
    pub fn with_auth(mut self, access_token: Option<&str>) -> Self {
        self.access_token = access_token.map(str::to_string);
        self
    }

    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.key)
    }

    /// `<base>/storage/v1/<segments...>` with every segment percent-encoded
    fn object_url<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Result<Url, Error> {
        let mut url = Url::parse(&self.url)?;
        url.path_segments_mut()
            .map_err(|_| Error::storage(format!("{} cannot be a base URL", self.url)))?
            .pop_if_empty()
            .extend(["storage", "v1"])
            .extend(segments);
        Ok(url)
    }

    /// Get a client for a specific bucket
    pub fn from(&self, bucket_id: &str) -> BucketClient<'_> {
        BucketClient {
            storage: self,
            bucket_id: bucket_id.to_string(),
        }
    }
}

impl<'a> BucketClient<'a> {
    /// Upload bytes to `path` inside the bucket
    pub async fn upload(
        &self,
        path: &str,
        file_data: Vec<u8>,
        options: FileOptions,
    ) -> Result<UploadResponse, Error> {
        let url = self
            .storage
            .object_url(["object", self.bucket_id.as_str()].into_iter().chain(path.split('/')))?;

        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let mut part = multipart::Part::bytes(file_data).file_name(file_name);
        if let Some(content_type) = &options.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = multipart::Form::new().part("file", part);

        let mut request = self
            .storage
            .client
            .post(url)
            .header("apikey", &self.storage.key)
            .header("Authorization", format!("Bearer {}", self.storage.bearer()))
            .header("X-Client-Info", &self.storage.options.client_info)
            .header("Cache-Control", "max-age=3600")
            // object names carry a timestamp, an existing one is never overwritten
            .header("x-upsert", "false")
            .multipart(form);
        if let Some(timeout) = self.storage.options.request_timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(Error::storage(error_message(status.as_u16(), &text)));
        }

        let uploaded = response.json::<UploadResponse>().await?;
        Ok(uploaded)
    }

    /// Delete objects by path
    pub async fn remove(&self, paths: &[&str]) -> Result<(), Error> {
        let url = self.storage.object_url(["object", self.bucket_id.as_str()])?;

        let body = serde_json::json!({
            "prefixes": paths
        });

        Fetch::delete(&self.storage.client, url.as_str())
            .api_key(&self.storage.key, self.storage.access_token.as_deref())
            .header("X-Client-Info", &self.storage.options.client_info)
            .timeout(self.storage.options.request_timeout)
            .on_error(Error::Storage)
            .json(&body)?
            .execute_empty()
            .await
    }

    /// Get the public URL for a file; no request is made
    pub fn get_public_url(&self, path: &str) -> Result<String, Error> {
        let url = self.storage.object_url(
            ["object", "public", self.bucket_id.as_str()]
                .into_iter()
                .chain(path.split('/')),
        )?;
        Ok(url.to_string())
    }
}
