//! Configuration for the backend client and the intake server

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Options for the Supabase client handles
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// The database schema sent as `Accept-Profile` / `Content-Profile`
    pub db_schema: String,

    /// Value of the `X-Client-Info` header
    pub client_info: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            db_schema: "public".to_string(),
            client_info: format!("candidatura/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }
}

/// What gets persisted for an uploaded photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhotoReference {
    /// The bucket's public URL for the object, stored in `foto_url`
    #[default]
    PublicUrl,
    /// Only the object path inside the bucket, stored in `foto_path`
    StoragePath,
}

impl FromStr for PhotoReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public_url" | "url" => Ok(Self::PublicUrl),
            "path" | "storage_path" => Ok(Self::StoragePath),
            other => Err(Error::config(format!(
                "PHOTO_REFERENCE must be `public_url` or `path`, got `{other}`"
            ))),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// | Env Var                | Default              |
/// |------------------------|----------------------|
/// | `SUPABASE_URL`         | required             |
/// | `SUPABASE_KEY`         | required             |
/// | `HOST`                 | `0.0.0.0`            |
/// | `PORT`                 | `3000`               |
/// | `PUBLIC_DIR`           | `public`             |
/// | `UPLOAD_DIR`           | `uploads`            |
/// | `PHOTO_BUCKET`         | `candidaturas-fotos` |
/// | `PHOTO_PREFIX`         | `fotos`              |
/// | `PHOTO_REFERENCE`      | `public_url`         |
/// | `LEGACY_TABLE`         | `usuarios`           |
/// | `REQUEST_TIMEOUT_SECS` | `30`                 |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_key: String,
    pub host: String,
    pub port: u16,
    /// Directory served as static assets; `index.html` inside it answers `GET /`.
    pub public_dir: PathBuf,
    /// Where multipart photo parts are buffered before upload.
    pub upload_dir: PathBuf,
    pub photo_bucket: String,
    pub photo_prefix: String,
    pub photo_reference: PhotoReference,
    /// Target table of the legacy `POST /api/dados` endpoint.
    pub legacy_table: String,
    pub client: ClientOptions,
}

impl AppConfig {
    /// Build a configuration with defaults for everything except the backend credentials.
    pub fn new(supabase_url: &str, supabase_key: &str) -> Self {
        Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_key: supabase_key.to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            public_dir: PathBuf::from("public"),
            upload_dir: PathBuf::from("uploads"),
            photo_bucket: "candidaturas-fotos".to_string(),
            photo_prefix: "fotos".to_string(),
            photo_reference: PhotoReference::default(),
            legacy_table: "usuarios".to_string(),
            client: ClientOptions::default(),
        }
    }

    /// Load configuration from the process environment (after `.env`, if any).
    pub fn from_env() -> Result<Self> {
        let url = required("SUPABASE_URL")?;
        let key = required("SUPABASE_KEY")?;
        url::Url::parse(&url)?;

        let mut config = Self::new(&url, &key);

        if let Some(host) = optional("HOST") {
            config.host = host;
        }
        if let Some(port) = optional("PORT") {
            config.port = port
                .parse()
                .map_err(|_| Error::config(format!("PORT must be a valid u16, got `{port}`")))?;
        }
        if let Some(dir) = optional("PUBLIC_DIR") {
            config.public_dir = PathBuf::from(dir);
        }
        if let Some(dir) = optional("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(bucket) = optional("PHOTO_BUCKET") {
            config.photo_bucket = bucket;
        }
        if let Some(prefix) = optional("PHOTO_PREFIX") {
            config.photo_prefix = prefix.trim_matches('/').to_string();
        }
        if let Some(reference) = optional("PHOTO_REFERENCE") {
            config.photo_reference = reference.parse()?;
        }
        if let Some(table) = optional("LEGACY_TABLE") {
            config.legacy_table = table;
        }
        if let Some(secs) = optional("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                Error::config(format!("REQUEST_TIMEOUT_SECS must be a valid u64, got `{secs}`"))
            })?;
            config.client = config
                .client
                .with_request_timeout(Some(Duration::from_secs(secs)));
        }

        Ok(config)
    }

    /// `host:port` string for binding the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| Error::config(format!("{name} environment variable not found")))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_reference_parses_both_modes() {
        assert_eq!("public_url".parse::<PhotoReference>().unwrap(), PhotoReference::PublicUrl);
        assert_eq!("PATH".parse::<PhotoReference>().unwrap(), PhotoReference::StoragePath);
        assert!(matches!("bogus".parse::<PhotoReference>(), Err(Error::Config(_))));
    }

    #[test]
    fn new_strips_trailing_slash_and_applies_defaults() {
        let config = AppConfig::new("http://localhost:54321/", "anon");
        assert_eq!(config.supabase_url, "http://localhost:54321");
        assert_eq!(config.port, 3000);
        assert_eq!(config.photo_bucket, "candidaturas-fotos");
        assert_eq!(config.photo_prefix, "fotos");
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }
}
