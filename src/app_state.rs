use reqwest::Client;

use crate::config::{BackendMode, Config};
use crate::errors::AppError;
use crate::services::auth::AuthApiService;
use crate::services::postgrest::DataApiService;
use crate::services::storage::StorageApiService;

/// The three API surfaces of the hosted backend, sharing one HTTP client.
#[derive(Clone)]
pub struct BackendServices {
    pub data: DataApiService,
    pub auth: AuthApiService,
    pub storage: StorageApiService,
    /// Bearer used for unauthenticated (demo) reads.
    pub anon_key: String,
}

impl BackendServices {
    pub fn from_mode(mode: &BackendMode) -> Option<Self> {
        match mode {
            BackendMode::Ready {
                rest_url,
                auth_url,
                storage_url,
                anon_key,
            } => {
                let client = Client::new();
                Some(Self {
                    data: DataApiService::new(client.clone(), rest_url.clone(), anon_key.clone()),
                    auth: AuthApiService::new(client.clone(), auth_url.clone(), anon_key.clone()),
                    storage: StorageApiService::new(client, storage_url.clone(), anon_key.clone()),
                    anon_key: anon_key.clone(),
                })
            }
            BackendMode::Degraded => None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub mode: BackendMode,
    backend: Option<BackendServices>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let mode = config.backend_mode();
        let backend = BackendServices::from_mode(&mode);
        Self {
            config,
            mode,
            backend,
        }
    }

    /// Degraded mode surfaces as a visible not-configured error, never a
    /// panic or a silent empty answer at this layer.
    pub fn backend(&self) -> Result<&BackendServices, AppError> {
        self.backend.as_ref().ok_or(AppError::NotConfigured)
    }

    pub fn is_ready(&self) -> bool {
        self.backend.is_some()
    }
}
