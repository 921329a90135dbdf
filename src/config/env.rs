use crate::config::defaults;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EdgeError, Result};
use crate::utils::validation::Validate;
use std::fmt::Display;
use std::str::FromStr;

/// Flat runtime configuration. Built from the environment, or snapshotted
/// from any other [`ConfigProvider`] so CLI overrides have one place to land.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeConfig {
    pub backend_url: String,
    pub host: String,
    pub port: u16,
    pub api_prefixes: Vec<String>,
    pub request_timeout_secs: u64,
    pub image_cache_capacity: usize,
    pub image_default_ttl_secs: u64,
    pub image_presign_path: String,
    pub default_currency: String,
    pub default_language: String,
    pub csrf_enabled: bool,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            backend_url: defaults::BACKEND_URL.to_string(),
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            api_prefixes: defaults::api_prefixes(),
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            image_cache_capacity: defaults::IMAGE_CACHE_CAPACITY,
            image_default_ttl_secs: defaults::IMAGE_DEFAULT_TTL_SECS,
            image_presign_path: defaults::IMAGE_PRESIGN_PATH.to_string(),
            default_currency: defaults::CURRENCY.to_string(),
            default_language: defaults::LANGUAGE.to_string(),
            csrf_enabled: false,
        }
    }
}

impl EdgeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base = Self::default();

        // BACKEND_URL 優先，其次是前端共用的 NEXT_PUBLIC_API_URL
        let backend_url = lookup("BACKEND_URL")
            .or_else(|| lookup("NEXT_PUBLIC_API_URL"))
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(base.backend_url);

        let api_prefixes = match lookup("API_PREFIXES") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            None => base.api_prefixes,
        };

        Ok(Self {
            backend_url,
            host: lookup("HOST").unwrap_or(base.host),
            port: parse_var(&lookup, "PORT", base.port)?,
            api_prefixes,
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS", base.request_timeout_secs)?,
            image_cache_capacity: parse_var(&lookup, "IMAGE_CACHE_CAPACITY", base.image_cache_capacity)?,
            image_default_ttl_secs: parse_var(&lookup, "IMAGE_DEFAULT_TTL_SECS", base.image_default_ttl_secs)?,
            image_presign_path: lookup("IMAGE_PRESIGN_PATH").unwrap_or(base.image_presign_path),
            default_currency: lookup("DEFAULT_CURRENCY")
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or(base.default_currency),
            default_language: lookup("DEFAULT_LANGUAGE")
                .map(|l| l.to_ascii_lowercase())
                .unwrap_or(base.default_language),
            csrf_enabled: match lookup("CSRF_PROTECTION") {
                Some(raw) => parse_bool("CSRF_PROTECTION", &raw)?,
                None => base.csrf_enabled,
            },
        })
    }

    pub fn from_provider(config: &impl ConfigProvider) -> Self {
        let (host, port) = split_listen_addr(&config.listen_addr());
        Self {
            backend_url: config.backend_url().to_string(),
            host,
            port,
            api_prefixes: config.api_prefixes(),
            request_timeout_secs: config.request_timeout_secs(),
            image_cache_capacity: config.image_cache_capacity(),
            image_default_ttl_secs: config.image_default_ttl_secs(),
            image_presign_path: config.image_presign_path().to_string(),
            default_currency: config.default_currency().to_string(),
            default_language: config.default_language().to_string(),
            csrf_enabled: config.csrf_enabled(),
        }
    }
}

fn split_listen_addr(addr: &str) -> (String, u16) {
    match addr.rsplit_once(':') {
        Some((host, port)) => (
            host.to_string(),
            port.parse().unwrap_or(defaults::PORT),
        ),
        None => (addr.to_string(), defaults::PORT),
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| EdgeError::InvalidConfigValueError {
            field: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(EdgeError::InvalidConfigValueError {
            field: key.to_string(),
            value: raw.to_string(),
            reason: "Expected a boolean (true/false)".to_string(),
        }),
    }
}

impl ConfigProvider for EdgeConfig {
    fn backend_url(&self) -> &str {
        &self.backend_url
    }

    fn api_prefixes(&self) -> Vec<String> {
        self.api_prefixes.clone()
    }

    fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
    }

    fn image_cache_capacity(&self) -> usize {
        self.image_cache_capacity
    }

    fn image_default_ttl_secs(&self) -> u64 {
        self.image_default_ttl_secs
    }

    fn image_presign_path(&self) -> &str {
        &self.image_presign_path
    }

    fn default_currency(&self) -> &str {
        &self.default_currency
    }

    fn default_language(&self) -> &str {
        &self.default_language
    }

    fn csrf_enabled(&self) -> bool {
        self.csrf_enabled
    }
}

impl Validate for EdgeConfig {
    fn validate(&self) -> Result<()> {
        crate::config::validate_provider(self)
    }
}
