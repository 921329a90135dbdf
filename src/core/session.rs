use crate::core::auth_events::{AuthEvent, AuthEventBus};
use crate::domain::model::{AuthSession, RecentlyViewedItem};
use crate::domain::ports::KeyValueStore;
use crate::utils::error::Result;
use chrono::Utc;
use serde::de::DeserializeOwned;

pub mod keys {
    pub const AUTH: &str = "wearsearch.auth";
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const USER: &str = "user";
    pub const RECENTLY_VIEWED: &str = "wearsearch_recently_viewed";
    pub const COOKIES_ACCEPTED: &str = "cookiesAccepted";
}

pub const RECENTLY_VIEWED_LIMIT: usize = 20;

/// Typed access to the session blobs kept in a [`KeyValueStore`].
pub struct SessionStore<S: KeyValueStore> {
    store: S,
    events: AuthEventBus,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S, events: AuthEventBus) -> Self {
        Self { store, events }
    }

    pub fn events(&self) -> &AuthEventBus {
        &self.events
    }

    pub async fn save_auth(&self, session: &AuthSession) -> Result<()> {
        let json = serde_json::to_string(session)?;
        self.store.write(keys::AUTH, &json).await?;

        self.events.publish(AuthEvent::SignedIn {
            user_id: session.user_id(),
        });
        Ok(())
    }

    /// 優先讀取 `wearsearch.auth`，否則退回舊版的 `access_token` + `user`
    pub async fn load_auth(&self) -> Result<Option<AuthSession>> {
        if let Some(session) = self.read_json::<AuthSession>(keys::AUTH).await? {
            return Ok(Some(session));
        }

        let Some(raw_token) = self.store.read(keys::ACCESS_TOKEN).await? else {
            return Ok(None);
        };

        // 舊版 token 可能是純字串，也可能是 JSON 字串
        let token = serde_json::from_str::<String>(&raw_token)
            .unwrap_or_else(|_| raw_token.trim().to_string());
        if token.is_empty() {
            return Ok(None);
        }

        let user = self.read_json::<serde_json::Value>(keys::USER).await?;
        Ok(Some(AuthSession { token, user }))
    }

    pub async fn clear_auth(&self, reason: &str) -> Result<()> {
        self.remove_auth_keys().await?;
        self.events.publish(AuthEvent::SignedOut {
            reason: reason.to_string(),
        });
        Ok(())
    }

    pub async fn expire_session(&self) -> Result<()> {
        self.remove_auth_keys().await?;
        self.events.publish(AuthEvent::SessionExpired);
        Ok(())
    }

    async fn remove_auth_keys(&self) -> Result<()> {
        for key in [keys::AUTH, keys::ACCESS_TOKEN, keys::USER] {
            self.store.remove(key).await?;
        }
        Ok(())
    }

    /// Newest first, one entry per product id, capped at [`RECENTLY_VIEWED_LIMIT`].
    pub async fn record_view(&self, mut item: RecentlyViewedItem) -> Result<Vec<RecentlyViewedItem>> {
        if item.viewed_at.is_none() {
            item.viewed_at = Some(Utc::now());
        }

        let mut items = self.recently_viewed().await?;
        items.retain(|existing| existing.id != item.id);
        items.insert(0, item);
        items.truncate(RECENTLY_VIEWED_LIMIT);

        let json = serde_json::to_string(&items)?;
        self.store.write(keys::RECENTLY_VIEWED, &json).await?;
        Ok(items)
    }

    pub async fn recently_viewed(&self) -> Result<Vec<RecentlyViewedItem>> {
        Ok(self
            .read_json::<Vec<RecentlyViewedItem>>(keys::RECENTLY_VIEWED)
            .await?
            .unwrap_or_default())
    }

    pub async fn cookies_accepted(&self) -> Result<bool> {
        Ok(self
            .read_json::<bool>(keys::COOKIES_ACCEPTED)
            .await?
            .unwrap_or(false))
    }

    pub async fn set_cookies_accepted(&self, accepted: bool) -> Result<()> {
        self.store
            .write(keys::COOKIES_ACCEPTED, if accepted { "true" } else { "false" })
            .await
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.store.read(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("Ignoring corrupt session value under '{}': {}", key, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;

    fn item(id: &str) -> RecentlyViewedItem {
        RecentlyViewedItem {
            id: id.to_string(),
            name: Some(format!("Product {}", id)),
            image: None,
            viewed_at: None,
        }
    }

    #[tokio::test]
    async fn test_save_and_load_auth_publishes_sign_in() {
        let bus = AuthEventBus::default();
        let mut events = bus.subscribe();
        let session = SessionStore::new(MemoryStore::new(), bus);

        let auth = AuthSession {
            token: "jwt-token".to_string(),
            user: Some(serde_json::json!({"id": "u-1"})),
        };
        session.save_auth(&auth).await.unwrap();

        assert_eq!(session.load_auth().await.unwrap(), Some(auth));
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::SignedIn {
                user_id: Some("u-1".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_legacy_token_fallback() {
        let store = MemoryStore::new();
        store.write(keys::ACCESS_TOKEN, "plain-token").await.unwrap();
        store.write(keys::USER, r#"{"id": 7}"#).await.unwrap();
        let session = SessionStore::new(store, AuthEventBus::default());

        let auth = session.load_auth().await.unwrap().unwrap();
        assert_eq!(auth.token, "plain-token");
        assert_eq!(auth.user_id().as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_corrupt_auth_blob_falls_back() {
        let store = MemoryStore::new();
        store.write(keys::AUTH, "{not json").await.unwrap();
        store.write(keys::ACCESS_TOKEN, "\"quoted-token\"").await.unwrap();
        let session = SessionStore::new(store, AuthEventBus::default());

        let auth = session.load_auth().await.unwrap().unwrap();
        assert_eq!(auth.token, "quoted-token");
        assert_eq!(auth.user, None);
    }

    #[tokio::test]
    async fn test_recently_viewed_dedupes_and_caps() {
        let session = SessionStore::new(MemoryStore::new(), AuthEventBus::default());

        for i in 0..25 {
            session.record_view(item(&i.to_string())).await.unwrap();
        }
        let items = session.record_view(item("10")).await.unwrap();

        assert_eq!(items.len(), RECENTLY_VIEWED_LIMIT);
        assert_eq!(items[0].id, "10");
        assert_eq!(items.iter().filter(|i| i.id == "10").count(), 1);
        assert_eq!(items[1].id, "24");
        assert!(items[0].viewed_at.is_some());
    }

    #[tokio::test]
    async fn test_cookies_accepted_defaults_false() {
        let session = SessionStore::new(MemoryStore::new(), AuthEventBus::default());

        assert!(!session.cookies_accepted().await.unwrap());
        session.set_cookies_accepted(true).await.unwrap();
        assert!(session.cookies_accepted().await.unwrap());
    }
}
