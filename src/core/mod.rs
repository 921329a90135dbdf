pub mod auth_events;
pub mod backend;
pub mod clock;
pub mod image_cache;
pub mod image_refresh;
pub mod scroll_lock;
pub mod session;

pub use crate::domain::model::{ImageSource, PresignedUrl, SignedUrlPayload};
pub use crate::domain::ports::{Clock, ConfigProvider, KeyValueStore, Presigner, ScrollSurface};
pub use crate::utils::error::Result;
