use crate::domain::model::SignedUrlPayload;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Opaque JSON blobs keyed by name, like browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn write(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn remove(&self, key: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn backend_url(&self) -> &str;
    fn api_prefixes(&self) -> Vec<String>;
    fn listen_addr(&self) -> String;
    fn request_timeout_secs(&self) -> u64;
    fn image_cache_capacity(&self) -> usize;
    fn image_default_ttl_secs(&self) -> u64;
    fn image_presign_path(&self) -> &str;
    fn default_currency(&self) -> &str;
    fn default_language(&self) -> &str;
    fn csrf_enabled(&self) -> bool;
}

#[async_trait]
pub trait Presigner: Send + Sync {
    async fn presign(&self, key: &str) -> Result<SignedUrlPayload>;
}

#[async_trait]
impl<P: Presigner + ?Sized> Presigner for Arc<P> {
    async fn presign(&self, key: &str) -> Result<SignedUrlPayload> {
        (**self).presign(key).await
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Whatever actually freezes scrolling (body style, a terminal viewport, ...).
pub trait ScrollSurface: Send + Sync {
    fn set_locked(&self, locked: bool);
}
