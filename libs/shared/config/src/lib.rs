use std::env;
use tracing::warn;

/// Which persistence backend the API composes at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-memory stores seeded with the demo clinic dataset.
    Memory,
    /// PostgREST-style HTTP backend reached through `shared-database`.
    Rest,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_port: u16,
    pub store_backend: StoreBackend,
    pub rest_base_url: String,
    pub rest_api_key: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let listen_port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Ok("rest") => StoreBackend::Rest,
            Ok("memory") | Err(_) => StoreBackend::Memory,
            Ok(other) => {
                warn!("Unknown STORE_BACKEND '{}', falling back to memory", other);
                StoreBackend::Memory
            }
        };

        let config = Self {
            listen_port,
            store_backend,
            rest_base_url: env::var("REST_BASE_URL").unwrap_or_else(|_| {
                if store_backend == StoreBackend::Rest {
                    warn!("REST_BASE_URL not set, using empty value");
                }
                String::new()
            }),
            rest_api_key: env::var("REST_API_KEY").unwrap_or_else(|_| {
                if store_backend == StoreBackend::Rest {
                    warn!("REST_API_KEY not set, using empty value");
                }
                String::new()
            }),
        };

        if config.store_backend == StoreBackend::Rest && !config.is_rest_configured() {
            warn!("REST backend selected but not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_rest_configured(&self) -> bool {
        !self.rest_base_url.is_empty() && !self.rest_api_key.is_empty()
    }
}
