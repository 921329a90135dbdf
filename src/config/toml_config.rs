use crate::config::defaults;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EdgeError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server: Option<ServerConfig>,
    pub backend: BackendConfig,
    pub images: Option<ImagesConfig>,
    pub preferences: Option<PreferencesConfig>,
    pub security: Option<SecurityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub prefixes: Option<Vec<String>>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    pub cache_capacity: Option<usize>,
    pub default_ttl_seconds: Option<u64>,
    pub presign_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesConfig {
    pub default_currency: Option<String>,
    pub default_language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub csrf_protection: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EdgeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EdgeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BACKEND_URL})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| EdgeError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn images(&self) -> Option<&ImagesConfig> {
        self.images.as_ref()
    }

    fn preferences(&self) -> Option<&PreferencesConfig> {
        self.preferences.as_ref()
    }
}

impl ConfigProvider for TomlConfig {
    fn backend_url(&self) -> &str {
        &self.backend.url
    }

    fn api_prefixes(&self) -> Vec<String> {
        self.backend
            .prefixes
            .clone()
            .unwrap_or_else(defaults::api_prefixes)
    }

    fn listen_addr(&self) -> String {
        let host = self
            .server
            .as_ref()
            .and_then(|s| s.host.as_deref())
            .unwrap_or(defaults::HOST);
        let port = self
            .server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(defaults::PORT);
        format!("{}:{}", host, port)
    }

    fn request_timeout_secs(&self) -> u64 {
        self.backend
            .timeout_seconds
            .unwrap_or(defaults::REQUEST_TIMEOUT_SECS)
    }

    fn image_cache_capacity(&self) -> usize {
        self.images()
            .and_then(|i| i.cache_capacity)
            .unwrap_or(defaults::IMAGE_CACHE_CAPACITY)
    }

    fn image_default_ttl_secs(&self) -> u64 {
        self.images()
            .and_then(|i| i.default_ttl_seconds)
            .unwrap_or(defaults::IMAGE_DEFAULT_TTL_SECS)
    }

    fn image_presign_path(&self) -> &str {
        self.images()
            .and_then(|i| i.presign_path.as_deref())
            .unwrap_or(defaults::IMAGE_PRESIGN_PATH)
    }

    fn default_currency(&self) -> &str {
        self.preferences()
            .and_then(|p| p.default_currency.as_deref())
            .unwrap_or(defaults::CURRENCY)
    }

    fn default_language(&self) -> &str {
        self.preferences()
            .and_then(|p| p.default_language.as_deref())
            .unwrap_or(defaults::LANGUAGE)
    }

    fn csrf_enabled(&self) -> bool {
        self.security
            .as_ref()
            .and_then(|s| s.csrf_protection)
            .unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        crate::config::validate_provider(self)
    }
}
