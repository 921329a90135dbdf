pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{FileStore, MemoryStore};
pub use config::{EdgeConfig, TomlConfig};
pub use crate::core::{
    auth_events::{AuthEvent, AuthEventBus},
    backend::{BackendClient, HttpPresigner},
    image_cache::{CacheSettings, PresignedImageCache},
    image_refresh::{ImageListWatch, ImageWatch},
    scroll_lock::{ScrollLock, WheelChain},
    session::SessionStore,
};
pub use server::{build_router, serve, AppState};
pub use utils::error::{EdgeError, Result};
