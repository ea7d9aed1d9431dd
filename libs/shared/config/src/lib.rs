use std::env;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Memory,
    Supabase,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "supabase" => Ok(StorageBackend::Supabase),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Supabase => write!(f, "supabase"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub storage_backend: StorageBackend,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: String,
    pub seed_on_startup: bool,
    pub seed: u64,
    pub max_page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            storage_backend: StorageBackend::Memory,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_key: String::new(),
            seed_on_startup: false,
            seed: 42,
            max_page_size: 500,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            bind_address: env::var("CLINIC_BIND_ADDR")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_BIND_ADDR not set, using {}", defaults.bind_address);
                    defaults.bind_address.clone()
                }),
            storage_backend: parsed_var("CLINIC_STORAGE", defaults.storage_backend),
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| String::new()),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| String::new()),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| String::new()),
            seed_on_startup: parsed_var("CLINIC_SEED_ON_STARTUP", defaults.seed_on_startup),
            seed: parsed_var("CLINIC_SEED", defaults.seed),
            max_page_size: parsed_var("CLINIC_MAX_PAGE_SIZE", defaults.max_page_size),
        };

        if !config.is_configured() {
            warn!(
                "Application not fully configured - {} backend is missing environment variables",
                config.storage_backend
            );
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        match self.storage_backend {
            StorageBackend::Memory => true,
            StorageBackend::Supabase => {
                !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
            }
        }
    }

    /// Token sent as the bearer credential to PostgREST. Falls back to the anon key.
    pub fn supabase_token(&self) -> &str {
        if self.supabase_service_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_key
        }
    }
}

fn parsed_var<T>(name: &str, default: T) -> T
where
    T: FromStr + fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using {}", name, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using {}", name, default);
            default
        }
    }
}
