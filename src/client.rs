//! Cache-augmented API client
//!
//! [`ApiClient`] turns an [`Operation`] into a [`Deferred`] result. The
//! dynamic call mode goes through the cache store; typed call modes always
//! hit the network and never touch the cache.
//!
//! Cache reads and writes are asymmetric in the dynamic mode:
//! reads only happen when the caller asks for them, but every successful
//! fetch is written through to the store.

use chrono::Duration;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::api::{describe, Endpoint, Operation};
use crate::cache::CacheStore;
use crate::decode::{decode_dynamic, decode_many, decode_one, JsonMap};
use crate::deferred::Deferred;
use crate::error::ApiError;
use crate::transport::Transport;

/// Time-to-live for cached responses in hours
pub const CACHE_TTL_HOURS: i64 = 24;

/// Configuration for an [`ApiClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long written cache entries stay fresh
    pub cache_ttl: Duration,
    /// Fail the call when a fetched response cannot be cached
    ///
    /// When false, the write failure is logged and the fresh value is still returned.
    pub fail_on_cache_write: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::hours(CACHE_TTL_HOURS),
            fail_on_cache_write: false,
        }
    }
}

/// Orchestrates cache lookups, network fetches and decoding
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    cache: Arc<dyn CacheStore>,
    config: ClientConfig,
}

impl ApiClient {
    /// Creates a new ApiClient with default configuration
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            transport,
            cache,
            config: ClientConfig::default(),
        }
    }

    /// Replaces the client configuration
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Calls an operation and decodes the response into a JSON object
    ///
    /// With `use_cache`, a fresh cache entry short-circuits the network.
    /// Every successful fetch is written to the cache regardless of `use_cache`.
    pub fn call_dynamic(&self, operation: Operation, use_cache: bool) -> Deferred<JsonMap> {
        let client = self.clone();
        Deferred::spawn(async move { client.fetch_dynamic(operation, use_cache).await })
    }

    /// Calls an operation and decodes the response into a single model
    pub fn call_one<T>(&self, operation: Operation) -> Deferred<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let client = self.clone();
        Deferred::spawn(async move {
            let text = client.fetch_fresh(&describe(operation)).await?;
            decode_one(&text)
        })
    }

    /// Calls an operation and decodes the response into a sequence of models
    ///
    /// Elements that are null or fail to decode come back as `None`.
    pub fn call_many<T>(&self, operation: Operation) -> Deferred<Vec<Option<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let client = self.clone();
        Deferred::spawn(async move {
            let text = client.fetch_fresh(&describe(operation)).await?;
            decode_many(&text)
        })
    }

    /// Dynamic call mode, run in place
    ///
    /// Exactly one of the cache path or the network path runs per call.
    pub async fn fetch_dynamic(
        &self,
        operation: Operation,
        use_cache: bool,
    ) -> Result<JsonMap, ApiError> {
        let endpoint = describe(operation);
        let cache_key = endpoint.cache_key();

        if use_cache {
            if let Some(text) = self.cache.get(&cache_key).await {
                tracing::info!(key = %cache_key, "fetch from cache");
                return decode_dynamic(&text);
            }
        }

        let text = self.fetch_fresh(&endpoint).await?;
        self.write_through(&cache_key, &text).await?;

        tracing::info!(key = %cache_key, "fetch from request");
        decode_dynamic(&text)
    }

    /// Fetches the endpoint from the network
    async fn fetch_fresh(&self, endpoint: &Endpoint) -> Result<String, ApiError> {
        self.transport.fetch(endpoint).await.map_err(|e| {
            tracing::warn!(path = %endpoint.path, error = %e, "request failed");
            ApiError::from(e)
        })
    }

    /// Stores a fetched response, overwriting any previous entry
    async fn write_through(&self, cache_key: &str, text: &str) -> Result<(), ApiError> {
        match self.cache.set(cache_key, text, self.config.cache_ttl).await {
            Ok(()) => Ok(()),
            Err(e) if self.config.fail_on_cache_write => Err(ApiError::CacheWrite(e)),
            Err(e) => {
                tracing::warn!(key = %cache_key, error = %e, "failed to cache response");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, MemoryCache};
    use crate::models::Story;
    use crate::transport::TransportError;
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    const LATEST_BODY: &str = r#"{"date":"20180117","stories":[{"id":1,"title":"A"}]}"#;

    /// Transport that serves a fixed body and counts calls
    struct FakeTransport {
        body: Option<String>,
        calls: AtomicUsize,
        barrier: Option<Barrier>,
    }

    impl FakeTransport {
        fn serving(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: Some(body.to_string()),
                calls: AtomicUsize::new(0),
                barrier: None,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                body: None,
                calls: AtomicUsize::new(0),
                barrier: None,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn fetch(&self, endpoint: &Endpoint) -> Result<String, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }
            self.body.clone().ok_or_else(|| TransportError::Status {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                url: endpoint.url(),
            })
        }
    }

    /// Cache store whose writes always fail
    struct ReadOnlyCache;

    #[async_trait]
    impl CacheStore for ReadOnlyCache {
        async fn entry(&self, _key: &str) -> Option<crate::cache::CacheEntry> {
            None
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only store",
            )))
        }
    }

    fn client_with(transport: Arc<FakeTransport>, cache: Arc<dyn CacheStore>) -> ApiClient {
        ApiClient::new(transport, cache)
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.cache_ttl, Duration::seconds(86_400));
        assert!(!config.fail_on_cache_write);
    }

    #[tokio::test]
    async fn test_cached_call_on_empty_cache_fetches_once_and_writes_entry() {
        let transport = FakeTransport::serving(LATEST_BODY);
        let cache = Arc::new(MemoryCache::new());
        let client = client_with(transport.clone(), cache.clone());

        let before = Utc::now();
        let map = client.call_dynamic(Operation::Latest, true).await.unwrap();
        let after = Utc::now();

        assert_eq!(transport.calls(), 1);
        assert_eq!(map.get("date"), Some(&json!("20180117")));
        assert_eq!(map.get("stories"), Some(&json!([{"id": 1, "title": "A"}])));

        let entry = cache.entry("dictionary:/news/latest").await.expect("entry should be written");
        assert_eq!(entry.value, LATEST_BODY);
        assert!(entry.expires_at >= before + Duration::seconds(86_400));
        assert!(entry.expires_at <= after + Duration::seconds(86_400));
    }

    #[tokio::test]
    async fn test_cached_call_with_fresh_entry_skips_network() {
        let transport = FakeTransport::serving(LATEST_BODY);
        let cache = Arc::new(MemoryCache::new());
        let client = client_with(transport.clone(), cache);

        let first = client.call_dynamic(Operation::Latest, true).await.unwrap();
        let second = client.call_dynamic(Operation::Latest, true).await.unwrap();

        assert_eq!(transport.calls(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cache_hit_uses_only_cached_text() {
        let transport = FakeTransport::failing();
        let cache = Arc::new(MemoryCache::new());
        cache
            .set("dictionary:/news/latest", r#"{"date":"cached"}"#, Duration::hours(1))
            .await
            .unwrap();
        let client = client_with(transport.clone(), cache);

        let map = client.call_dynamic(Operation::Latest, true).await.unwrap();

        assert_eq!(transport.calls(), 0);
        assert_eq!(map.get("date"), Some(&json!("cached")));
    }

    #[tokio::test]
    async fn test_expired_entry_behaves_like_empty_cache() {
        let transport = FakeTransport::serving(LATEST_BODY);
        let cache = Arc::new(MemoryCache::new());
        cache
            .set("dictionary:/news/latest", r#"{"date":"stale"}"#, Duration::zero())
            .await
            .unwrap();
        let client = client_with(transport.clone(), cache.clone());

        let map = client.call_dynamic(Operation::Latest, true).await.unwrap();

        assert_eq!(transport.calls(), 1);
        assert_eq!(map.get("date"), Some(&json!("20180117")));
        let entry = cache.entry("dictionary:/news/latest").await.unwrap();
        assert_eq!(entry.value, LATEST_BODY);
        assert!(!entry.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn test_uncached_call_ignores_entry_but_still_writes() {
        let transport = FakeTransport::serving(LATEST_BODY);
        let cache = Arc::new(MemoryCache::new());
        cache
            .set("dictionary:/news/latest", r#"{"date":"old"}"#, Duration::hours(1))
            .await
            .unwrap();
        let client = client_with(transport.clone(), cache.clone());

        let map = client.call_dynamic(Operation::Latest, false).await.unwrap();

        assert_eq!(transport.calls(), 1);
        assert_eq!(map.get("date"), Some(&json!("20180117")));
        assert_eq!(cache.get("dictionary:/news/latest").await.as_deref(), Some(LATEST_BODY));
    }

    #[tokio::test]
    async fn test_transport_failure_resolves_failure_without_cache_write() {
        let transport = FakeTransport::failing();
        let cache = Arc::new(MemoryCache::new());
        let client = client_with(transport.clone(), cache.clone());

        let result = client.call_dynamic(Operation::Latest, true).await;

        assert!(matches!(result, Err(ApiError::Transport(_))));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_cache_write_failure_still_returns_value_by_default() {
        let transport = FakeTransport::serving(LATEST_BODY);
        let client = client_with(transport, Arc::new(ReadOnlyCache));

        let map = client.call_dynamic(Operation::Latest, true).await.unwrap();

        assert_eq!(map.get("date"), Some(&json!("20180117")));
    }

    #[tokio::test]
    async fn test_cache_write_failure_fails_call_when_strict() {
        let transport = FakeTransport::serving(LATEST_BODY);
        let client = client_with(transport, Arc::new(ReadOnlyCache)).with_config(ClientConfig {
            fail_on_cache_write: true,
            ..Default::default()
        });

        let result = client.call_dynamic(Operation::Latest, true).await;

        assert!(matches!(result, Err(ApiError::CacheWrite(CacheError::Io(_)))));
    }

    #[tokio::test]
    async fn test_dynamic_call_rejects_non_object_payload() {
        let transport = FakeTransport::serving("[1,2,3]");
        let client = client_with(transport, Arc::new(MemoryCache::new()));

        let result = client.call_dynamic(Operation::Latest, false).await;

        assert!(matches!(result, Err(ApiError::Schema(_))));
    }

    #[tokio::test]
    async fn test_round_trip_through_cache_matches_direct_decode() {
        let transport = FakeTransport::serving(LATEST_BODY);
        let cache = Arc::new(MemoryCache::new());
        let client = client_with(transport, cache.clone());

        let fresh = client.call_dynamic(Operation::Latest, true).await.unwrap();
        let cached_text = cache.get("dictionary:/news/latest").await.unwrap();

        assert_eq!(decode_dynamic(&cached_text).unwrap(), fresh);
        assert_eq!(decode_dynamic(LATEST_BODY).unwrap(), fresh);
    }

    #[tokio::test]
    async fn test_typed_call_decodes_model_with_absent_optionals() {
        let transport = FakeTransport::serving(r#"{"id":42,"title":"T"}"#);
        let cache = Arc::new(MemoryCache::new());
        let client = client_with(transport.clone(), cache.clone());

        let story: Story = client.call_one(Operation::Content(42)).await.unwrap();

        assert_eq!(story.id, 42);
        assert_eq!(story.title, "T");
        assert!(story.images.is_none());
        assert!(story.image.is_none());
        // Typed calls never write the cache
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_typed_call_ignores_cache() {
        let transport = FakeTransport::serving(r#"{"id":42,"title":"network"}"#);
        let cache = Arc::new(MemoryCache::new());
        cache
            .set("dictionary:/news/42", r#"{"id":42,"title":"cached"}"#, Duration::hours(1))
            .await
            .unwrap();
        let client = client_with(transport.clone(), cache);

        let story: Story = client.call_one(Operation::Content(42)).await.unwrap();

        assert_eq!(transport.calls(), 1);
        assert_eq!(story.title, "network");
    }

    #[tokio::test]
    async fn test_typed_call_missing_required_field() {
        let transport = FakeTransport::serving(r#"{"title":"T"}"#);
        let client = client_with(transport, Arc::new(MemoryCache::new()));

        let result = client.call_one::<Story>(Operation::Content(42)).await;

        assert!(matches!(result, Err(ApiError::Schema(_))));
    }

    #[tokio::test]
    async fn test_typed_sequence_call() {
        let transport = FakeTransport::serving(r#"[{"id":1,"title":"A"},{"title":"no id"}]"#);
        let client = client_with(transport, Arc::new(MemoryCache::new()));

        let stories = client.call_many::<Story>(Operation::Latest).await.unwrap();

        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].as_ref().map(|s| s.title.as_str()), Some("A"));
        assert!(stories[1].is_none());
    }

    #[tokio::test]
    async fn test_concurrent_misses_both_fetch_and_last_write_wins() {
        let transport = Arc::new(FakeTransport {
            body: Some(LATEST_BODY.to_string()),
            calls: AtomicUsize::new(0),
            barrier: Some(Barrier::new(2)),
        });
        let cache = Arc::new(MemoryCache::new());
        let client = client_with(transport.clone(), cache.clone());

        let (a, b) = tokio::join!(
            client.call_dynamic(Operation::Latest, true),
            client.call_dynamic(Operation::Latest, true),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(transport.calls(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_dynamic_runs_in_place() {
        let transport = FakeTransport::serving(LATEST_BODY);
        let client = client_with(transport.clone(), Arc::new(MemoryCache::new()));

        let map = client.fetch_dynamic(Operation::Latest, false).await.unwrap();

        assert!(map.contains_key("stories"));
        assert_eq!(transport.calls(), 1);
    }

    /// Store whose reads take a while to complete
    struct SlowCache {
        inner: MemoryCache,
        delay: std::time::Duration,
    }

    #[async_trait]
    impl CacheStore for SlowCache {
        async fn entry(&self, key: &str) -> Option<crate::cache::CacheEntry> {
            tokio::time::sleep(self.delay).await;
            self.inner.entry(key).await
        }

        async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
            self.inner.set(key, value, ttl).await
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_slow_cache_read_does_not_stall_other_tasks() {
        let transport = FakeTransport::failing();
        let inner = MemoryCache::new();
        inner
            .set("dictionary:/news/latest", LATEST_BODY, Duration::hours(1))
            .await
            .unwrap();
        let cache = Arc::new(SlowCache {
            inner,
            delay: std::time::Duration::from_millis(200),
        });
        let client = client_with(transport.clone(), cache);

        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let ticker = tokio::spawn(async move {
            loop {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let map = client.call_dynamic(Operation::Latest, true).await.unwrap();
        ticker.abort();

        assert_eq!(map.get("date"), Some(&json!("20180117")));
        assert_eq!(transport.calls(), 0);
        assert!(
            ticks.load(Ordering::SeqCst) >= 5,
            "other task made {} ticks during the cache read",
            ticks.load(Ordering::SeqCst)
        );
    }

    #[test]
    fn test_call_outside_runtime_resolves_with_error() {
        let transport = FakeTransport::serving(LATEST_BODY);
        let client = client_with(transport.clone(), Arc::new(MemoryCache::new()));

        let result = futures::executor::block_on(client.call_dynamic(Operation::Latest, true));

        assert!(matches!(result, Err(ApiError::NoRuntime(_))));
        assert_eq!(transport.calls(), 0);
    }
}
