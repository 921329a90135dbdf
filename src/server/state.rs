use std::sync::Arc;

use crate::config::EdgeConfig;
use crate::core::backend::{BackendClient, HttpPresigner};
use crate::core::image_cache::{CacheSettings, PresignedImageCache};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;

pub struct AppState {
    pub config: EdgeConfig,
    pub backend: BackendClient,
    pub images: Arc<PresignedImageCache<HttpPresigner>>,
}

impl AppState {
    pub fn from_config(config: &impl ConfigProvider) -> Result<Arc<Self>> {
        let backend = BackendClient::from_config(config)?;
        let presigner = HttpPresigner::new(backend.clone(), config.image_presign_path());
        let images = Arc::new(PresignedImageCache::new(
            presigner,
            CacheSettings::from_config(config),
        ));

        Ok(Arc::new(Self {
            config: EdgeConfig::from_provider(config),
            backend,
            images,
        }))
    }
}
