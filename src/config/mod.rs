pub mod env;
pub mod toml_config;

use crate::domain::model::{SUPPORTED_CURRENCIES, SUPPORTED_LANGUAGES};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EdgeError, Result};
use crate::utils::validation::*;

pub use env::EdgeConfig;
pub use toml_config::TomlConfig;

pub mod defaults {
    pub const BACKEND_URL: &str = "http://localhost:8000";
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 3000;
    pub const REQUEST_TIMEOUT_SECS: u64 = 15;
    pub const IMAGE_CACHE_CAPACITY: usize = 1024;
    pub const IMAGE_DEFAULT_TTL_SECS: u64 = 300;
    pub const IMAGE_PRESIGN_PATH: &str = crate::core::backend::DEFAULT_PRESIGN_PATH;
    pub const CURRENCY: &str = "UAH";
    pub const LANGUAGE: &str = "uk";

    pub fn api_prefixes() -> Vec<String> {
        crate::core::backend::DEFAULT_API_PREFIXES
            .iter()
            .map(|p| p.to_string())
            .collect()
    }
}

/// Checks shared by every configuration source.
pub fn validate_provider(config: &impl ConfigProvider) -> Result<()> {
    validate_url("backend.url", config.backend_url())?;

    let prefixes = config.api_prefixes();
    if prefixes.is_empty() {
        return Err(EdgeError::MissingConfigError {
            field: "backend.prefixes".to_string(),
        });
    }
    for prefix in &prefixes {
        validate_api_prefix("backend.prefixes", prefix)?;
    }

    validate_range("backend.timeout_seconds", config.request_timeout_secs(), 1, 300)?;
    validate_positive_number("images.cache_capacity", config.image_cache_capacity(), 1)?;
    validate_range("images.default_ttl_seconds", config.image_default_ttl_secs(), 1, 86_400)?;
    validate_api_prefix("images.presign_path", config.image_presign_path())?;
    validate_one_of(
        "preferences.default_currency",
        config.default_currency(),
        SUPPORTED_CURRENCIES,
    )?;
    validate_one_of(
        "preferences.default_language",
        config.default_language(),
        SUPPORTED_LANGUAGES,
    )?;

    tracing::debug!("Configuration validation passed");
    Ok(())
}

#[cfg(feature = "cli")]
pub use cli::CliConfig;

#[cfg(feature = "cli")]
mod cli {
    use super::{EdgeConfig, TomlConfig};
    use crate::utils::error::Result;
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "wearsearch-edge")]
    #[command(about = "Wearsearch edge service: API proxy routes and presigned image cache")]
    pub struct CliConfig {
        /// Path to a TOML configuration file (environment variables are used otherwise)
        #[arg(short, long)]
        pub config: Option<String>,

        #[arg(long)]
        pub backend_url: Option<String>,

        #[arg(long)]
        pub host: Option<String>,

        #[arg(short, long)]
        pub port: Option<u16>,

        /// Override CSRF double-submit protection
        #[arg(long)]
        pub csrf: Option<bool>,

        /// Emit logs as JSON lines
        #[arg(long)]
        pub json_logs: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl CliConfig {
        /// 載入設定檔或環境變數，再套用命令列覆蓋
        pub fn load(&self) -> Result<EdgeConfig> {
            let mut config = match &self.config {
                Some(path) => {
                    tracing::info!("Loading configuration from {}", path);
                    EdgeConfig::from_provider(&TomlConfig::from_file(path)?)
                }
                None => EdgeConfig::from_env()?,
            };
            self.apply_overrides(&mut config);
            Ok(config)
        }

        pub fn apply_overrides(&self, config: &mut EdgeConfig) {
            if let Some(url) = &self.backend_url {
                config.backend_url = url.clone();
            }
            if let Some(host) = &self.host {
                config.host = host.clone();
            }
            if let Some(port) = self.port {
                config.port = port;
            }
            if let Some(csrf) = self.csrf {
                tracing::info!("CSRF protection overridden to: {}", csrf);
                config.csrf_enabled = csrf;
            }
        }
    }

}
