use crate::core::image_cache::PresignedImageCache;
use crate::domain::model::ImageSource;
use crate::domain::ports::{Clock, Presigner};
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A resolved image URL that keeps itself fresh.
///
/// The background refresh task belongs to the watch and is aborted on drop.
pub struct ImageWatch {
    receiver: watch::Receiver<String>,
    task: Option<JoinHandle<()>>,
}

impl ImageWatch {
    fn fixed(url: String) -> Self {
        let (_tx, receiver) = watch::channel(url);
        Self {
            receiver,
            task: None,
        }
    }

    pub fn current(&self) -> String {
        self.receiver.borrow().clone()
    }

    /// Waits for the next refreshed URL. `None` once refreshing has stopped.
    pub async fn changed(&mut self) -> Option<String> {
        self.receiver.changed().await.ok()?;
        Some(self.current())
    }

    pub fn is_refreshing(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ImageWatch {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Ordered list of resolved URLs sharing a single refresh timer.
pub struct ImageListWatch {
    receiver: watch::Receiver<Vec<String>>,
    task: Option<JoinHandle<()>>,
}

impl ImageListWatch {
    pub fn current(&self) -> Vec<String> {
        self.receiver.borrow().clone()
    }

    pub async fn changed(&mut self) -> Option<Vec<String>> {
        self.receiver.changed().await.ok()?;
        Some(self.current())
    }

    pub fn is_refreshing(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ImageListWatch {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<P, C> PresignedImageCache<P, C>
where
    P: Presigner + 'static,
    C: Clock + 'static,
{
    pub async fn watch(self: &Arc<Self>, input: &str) -> ImageWatch {
        let key = match ImageSource::classify(input) {
            ImageSource::Empty => return ImageWatch::fixed(String::new()),
            ImageSource::Direct(url) => return ImageWatch::fixed(url.to_string()),
            ImageSource::Key(key) => key.to_string(),
        };

        let Some(entry) = self.resolve_key(&key, self.settings().min_validity).await else {
            return ImageWatch::fixed(String::new());
        };

        let (tx, receiver) = watch::channel(entry.url);
        let cache = Arc::clone(self);
        let task = tokio::spawn(async move {
            cache.refresh_loop(key, entry.expires_at, tx).await;
        });

        ImageWatch {
            receiver,
            task: Some(task),
        }
    }

    pub async fn watch_many(self: &Arc<Self>, inputs: &[String]) -> ImageListWatch {
        let inputs = inputs.to_vec();
        let (urls, earliest) = self.resolve_list(&inputs, self.settings().min_validity).await;
        let (tx, receiver) = watch::channel(urls);

        let task = earliest.map(|earliest| {
            let cache = Arc::clone(self);
            tokio::spawn(async move {
                cache.refresh_list_loop(inputs, earliest, tx).await;
            })
        });

        ImageListWatch { receiver, task }
    }

    async fn refresh_loop(
        self: Arc<Self>,
        key: String,
        mut expires_at: DateTime<Utc>,
        tx: watch::Sender<String>,
    ) {
        loop {
            tokio::time::sleep(self.refresh_delay(expires_at)).await;
            if tx.is_closed() {
                return;
            }

            match self.resolve_key(&key, self.settings().refresh_lead).await {
                Some(entry) => {
                    expires_at = entry.expires_at;
                    tx.send_if_modified(|current| {
                        if *current == entry.url {
                            return false;
                        }
                        *current = entry.url;
                        true
                    });
                }
                None => {
                    tracing::warn!("Refreshing image {} failed, falling back to placeholder", key);
                    tx.send_replace(String::new());
                    return;
                }
            }
        }
    }

    async fn refresh_list_loop(
        self: Arc<Self>,
        inputs: Vec<String>,
        mut earliest: DateTime<Utc>,
        tx: watch::Sender<Vec<String>>,
    ) {
        loop {
            tokio::time::sleep(self.refresh_delay(earliest)).await;
            if tx.is_closed() {
                return;
            }

            let (urls, next) = self.resolve_list(&inputs, self.settings().refresh_lead).await;
            tx.send_if_modified(|current| {
                if *current == urls {
                    return false;
                }
                *current = urls;
                true
            });

            match next {
                Some(next) => earliest = next,
                None => return,
            }
        }
    }

    /// 並行解析整份清單，並回傳最早的過期時間
    async fn resolve_list(
        &self,
        inputs: &[String],
        min_remaining: Duration,
    ) -> (Vec<String>, Option<DateTime<Utc>>) {
        let resolved = join_all(inputs.iter().map(|input| async move {
            match ImageSource::classify(input) {
                ImageSource::Empty => (String::new(), None),
                ImageSource::Direct(url) => (url.to_string(), None),
                ImageSource::Key(key) => match self.resolve_key(key, min_remaining).await {
                    Some(entry) => (entry.url, Some(entry.expires_at)),
                    None => (String::new(), None),
                },
            }
        }))
        .await;

        let now = self.now();
        let earliest = resolved
            .iter()
            .filter_map(|(_, expires_at)| *expires_at)
            .filter(|expires_at| *expires_at > now)
            .min();
        let urls = resolved.into_iter().map(|(url, _)| url).collect();

        (urls, earliest)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::clock::ManualClock;
    use crate::core::image_cache::test_support::CountingPresigner;
    use crate::core::image_cache::{CacheSettings, PresignedImageCache};
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    type TestCache = PresignedImageCache<Arc<CountingPresigner>, Arc<ManualClock>>;

    fn build(presigner: CountingPresigner) -> (Arc<TestCache>, Arc<CountingPresigner>, Arc<ManualClock>) {
        let presigner = Arc::new(presigner);
        let clock = Arc::new(ManualClock::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap()));
        let cache = Arc::new(PresignedImageCache::with_clock(
            Arc::clone(&presigner),
            Arc::clone(&clock),
            CacheSettings::default(),
        ));
        (cache, presigner, clock)
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_refreshes_before_expiry() {
        let (cache, presigner, _) = build(CountingPresigner::with_ttl("hero.jpg", 10));

        let mut watch = cache.watch("hero.jpg").await;
        assert_eq!(watch.current(), "https://signed/hero.jpg?v=1");
        assert!(watch.is_refreshing());

        let next = watch.changed().await;
        assert_eq!(next.as_deref(), Some("https://signed/hero.jpg?v=2"));
        assert_eq!(presigner.calls("hero.jpg"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_watch_stops_refresh() {
        let (cache, presigner, _) = build(CountingPresigner::with_ttl("hero.jpg", 10));

        let watch = cache.watch("hero.jpg").await;
        drop(watch);
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;

        assert_eq!(presigner.calls("hero.jpg"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_direct_url_watch_has_no_timer() {
        let (cache, presigner, _) = build(CountingPresigner::default());

        let watch = cache.watch("https://cdn.wearsearch.com/logo.svg").await;
        assert_eq!(watch.current(), "https://cdn.wearsearch.com/logo.svg");
        assert!(!watch.is_refreshing());
        assert_eq!(presigner.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_falls_back_to_empty() {
        let mut presigner = CountingPresigner::with_ttl("gone.jpg", 5);
        presigner.fail_after = Some(1);
        let (cache, presigner, _) = build(presigner);

        let mut watch = cache.watch("gone.jpg").await;
        assert_eq!(watch.current(), "https://signed/gone.jpg?v=1");

        assert_eq!(watch.changed().await.as_deref(), Some(""));
        assert_eq!(watch.changed().await, None);
        assert_eq!(presigner.calls("gone.jpg"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_many_refreshes_earliest_only() {
        let mut presigner = CountingPresigner::default();
        presigner.ttl_secs.insert("front.jpg".to_string(), 100);
        presigner.ttl_secs.insert("back.jpg".to_string(), 31);
        let (cache, presigner, clock) = build(presigner);

        let inputs = vec![
            "https://cdn.wearsearch.com/static.jpg".to_string(),
            "front.jpg".to_string(),
            "back.jpg".to_string(),
        ];
        let mut watch = cache.watch_many(&inputs).await;
        assert_eq!(
            watch.current(),
            vec![
                "https://cdn.wearsearch.com/static.jpg".to_string(),
                "https://signed/front.jpg?v=1".to_string(),
                "https://signed/back.jpg?v=1".to_string(),
            ]
        );

        clock.advance(Duration::seconds(10));
        let urls = watch.changed().await.unwrap();

        assert_eq!(urls[1], "https://signed/front.jpg?v=1");
        assert_eq!(urls[2], "https://signed/back.jpg?v=2");
        assert_eq!(presigner.calls("front.jpg"), 1);
        assert_eq!(presigner.calls("back.jpg"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_many_without_keys_has_no_timer() {
        let (cache, _, _) = build(CountingPresigner::default());

        let watch = cache
            .watch_many(&["/placeholder.png".to_string(), String::new()])
            .await;
        assert_eq!(watch.current(), vec!["/placeholder.png".to_string(), String::new()]);
        assert!(!watch.is_refreshing());
    }
}
