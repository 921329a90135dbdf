use crate::core::clock::SystemClock;
use crate::domain::model::{ImageSource, PresignedUrl};
use crate::domain::ports::{Clock, ConfigProvider, Presigner};
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub capacity: usize,
    /// 命中快取所需的最少剩餘有效時間
    pub min_validity: Duration,
    pub refresh_lead: Duration,
    pub min_refresh_delay: Duration,
    pub default_ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: 1024,
            min_validity: Duration::seconds(1),
            refresh_lead: Duration::seconds(30),
            min_refresh_delay: Duration::seconds(1),
            default_ttl: Duration::seconds(300),
        }
    }
}

impl CacheSettings {
    pub fn from_config(config: &impl ConfigProvider) -> Self {
        Self {
            capacity: config.image_cache_capacity(),
            default_ttl: Duration::seconds(config.image_default_ttl_secs() as i64),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub fetches: u64,
    pub failures: u64,
}

/// `max(expires_at - now - lead, floor)`, as a sleep duration.
pub fn refresh_delay(
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
    lead: Duration,
    floor: Duration,
) -> std::time::Duration {
    let wait = (expires_at - now - lead).max(floor);
    wait.to_std()
        .or_else(|_| floor.to_std())
        .unwrap_or(std::time::Duration::from_secs(1))
}

type InFlight = Arc<OnceCell<Option<PresignedUrl>>>;

enum Lookup {
    Hit(PresignedUrl),
    Wait(InFlight),
}

/// Cache-aside store of presigned URLs keyed by storage key.
///
/// Concurrent misses on the same key share one presign request. Entries are
/// bounded by `CacheSettings::capacity`; when full, expired entries go first,
/// then the one closest to expiry.
pub struct PresignedImageCache<P, C = SystemClock> {
    presigner: P,
    clock: C,
    settings: CacheSettings,
    entries: Mutex<HashMap<String, PresignedUrl>>,
    in_flight: Mutex<HashMap<String, InFlight>>,
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    failures: AtomicU64,
}

impl<P: Presigner> PresignedImageCache<P, SystemClock> {
    pub fn new(presigner: P, settings: CacheSettings) -> Self {
        Self::with_clock(presigner, SystemClock, settings)
    }
}

impl<P: Presigner, C: Clock> PresignedImageCache<P, C> {
    pub fn with_clock(presigner: P, clock: C, settings: CacheSettings) -> Self {
        Self {
            presigner,
            clock,
            settings,
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Direct URLs pass through, keys resolve to a presigned URL, and any
    /// failure yields an empty string so the caller can show a placeholder.
    pub async fn resolve(&self, input: &str) -> String {
        match ImageSource::classify(input) {
            ImageSource::Empty => String::new(),
            ImageSource::Direct(url) => url.to_string(),
            ImageSource::Key(key) => self
                .resolve_key(key, self.settings.min_validity)
                .await
                .map(|entry| entry.url)
                .unwrap_or_default(),
        }
    }

    pub async fn resolve_entry(&self, key: &str) -> Option<PresignedUrl> {
        match ImageSource::classify(key) {
            ImageSource::Key(key) => self.resolve_key(key, self.settings.min_validity).await,
            _ => None,
        }
    }

    pub async fn resolve_many(&self, inputs: &[String]) -> Vec<String> {
        join_all(inputs.iter().map(|input| self.resolve(input))).await
    }

    pub fn refresh_delay(&self, expires_at: DateTime<Utc>) -> std::time::Duration {
        refresh_delay(
            expires_at,
            self.clock.now(),
            self.settings.refresh_lead,
            self.settings.min_refresh_delay,
        )
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// 若剩餘時間不超過 `min_remaining` 就重新取得
    pub(crate) async fn resolve_key(
        &self,
        key: &str,
        min_remaining: Duration,
    ) -> Option<PresignedUrl> {
        let cell = match self.lookup(key, min_remaining) {
            Lookup::Hit(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry);
            }
            Lookup::Wait(cell) => cell,
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = cell.get_or_init(|| self.fetch_and_store(key)).await.clone();
        self.finish_in_flight(key, &cell);
        result
    }

    fn lookup(&self, key: &str, min_remaining: Duration) -> Lookup {
        if let Some(entry) = self.cached(key, min_remaining) {
            return Lookup::Hit(entry);
        }

        let mut in_flight = lock(&self.in_flight);
        if let Some(cell) = in_flight.get(key) {
            return Lookup::Wait(Arc::clone(cell));
        }

        // 另一個請求可能剛完成並移除了 in-flight 記錄
        if let Some(entry) = self.cached(key, min_remaining) {
            return Lookup::Hit(entry);
        }

        let cell: InFlight = Arc::new(OnceCell::new());
        in_flight.insert(key.to_string(), Arc::clone(&cell));
        Lookup::Wait(cell)
    }

    fn cached(&self, key: &str, min_remaining: Duration) -> Option<PresignedUrl> {
        let now = self.clock.now();
        lock(&self.entries)
            .get(key)
            .filter(|entry| entry.remaining(now) > min_remaining)
            .cloned()
    }

    fn finish_in_flight(&self, key: &str, cell: &InFlight) {
        let mut in_flight = lock(&self.in_flight);
        if in_flight.get(key).is_some_and(|current| Arc::ptr_eq(current, cell)) {
            in_flight.remove(key);
        }
    }

    async fn fetch_and_store(&self, key: &str) -> Option<PresignedUrl> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Presigning image key {}", key);

        let payload = match self.presigner.presign(key).await {
            Ok(payload) => payload,
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Failed to presign image key {}: {}", key, e);
                return None;
            }
        };

        match payload.normalize(self.clock.now(), self.settings.default_ttl) {
            Some(entry) => {
                self.store(key, entry.clone());
                Some(entry)
            }
            None => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Presign response for {} carried no URL", key);
                None
            }
        }
    }

    fn store(&self, key: &str, entry: PresignedUrl) {
        let mut entries = lock(&self.entries);

        if !entries.contains_key(key) && entries.len() >= self.settings.capacity {
            let now = self.clock.now();
            entries.retain(|_, cached| cached.expires_at > now);

            if entries.len() >= self.settings.capacity {
                let victim = entries
                    .iter()
                    .min_by_key(|(_, cached)| cached.expires_at)
                    .map(|(k, _)| k.clone());
                if let Some(victim) = victim {
                    tracing::debug!("Image cache full, evicting {}", victim);
                    entries.remove(&victim);
                }
            }
        }

        entries.insert(key.to_string(), entry);
    }

    pub fn invalidate(&self, key: &str) -> bool {
        lock(&self.entries).remove(key).is_some()
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
