use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{DataApi, FileStore, SupabaseService};
use crate::Supabase;

/// Shared state available to every handler via `State<AppState>`.
///
/// Cheap to clone; the service handles sit behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub data: Arc<dyn DataApi>,
    pub files: Arc<dyn FileStore>,
}

impl AppState {
    pub fn new(config: AppConfig, data: Arc<dyn DataApi>, files: Arc<dyn FileStore>) -> Self {
        Self {
            config: Arc::new(config),
            data,
            files,
        }
    }

    /// State backed by the Supabase project named in `config`
    pub fn from_config(config: AppConfig) -> Self {
        let supabase =
            Supabase::new_with_options(&config.supabase_url, &config.supabase_key, config.client.clone());
        let service = Arc::new(SupabaseService::new(supabase));
        Self::new(config, service.clone(), service)
    }
}
