//! Cache Facade Tests
//!
//! Validates `CacheStrategy` over real providers and the HTTP gateway.
//!
//! ## Test Scopes
//! - **Validation**: Bad keys and oversized values never reach the provider.
//! - **Metadata**: Content types, TTL expiry and compression flags.
//! - **Metrics**: Hit/miss/eviction counting and size reset on clear.
//! - **Configuration**: Strategy selection and endpoint parsing.
//! - **Gateway**: `/cache` and `/metrics` over a loopback listener.

#[cfg(test)]
mod tests {
    use crate::cache::handlers::{gateway_routes, value_from_request};
    use crate::cache::strategy::split_endpoint;
    use crate::cache::{CacheSettings, CacheStrategy, CacheValue, MetricsSnapshot, Strategy};
    use crate::cluster::{CacheOptions, DistributedCache};
    use crate::config::{AppConfig, CacheConfig};
    use crate::error::{CacheError, Result};
    use crate::storage::{CacheEntry, CacheProvider, ContentType, Lookup, MemoryCache, Metadata};

    use async_trait::async_trait;
    use axum::extract::Extension;
    use axum::http::{HeaderMap, HeaderValue, header};
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // ============================================================
    // TEST DOUBLES
    // ============================================================

    /// Memory provider that counts every call it receives.
    struct CountingProvider {
        inner: Arc<MemoryCache>,
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: MemoryCache::new(),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn stored(&self, key: &str) -> CacheEntry {
            match self.inner.retrieve(key).await.unwrap() {
                Lookup::Hit(entry) => entry,
                other => panic!("Expected stored entry for {}, got {:?}", key, other),
            }
        }
    }

    #[async_trait]
    impl CacheProvider for CountingProvider {
        async fn store(&self, key: &str, entry: CacheEntry) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.store(key, entry).await
        }

        async fn retrieve(&self, key: &str) -> Result<Lookup> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.retrieve(key).await
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(key).await
        }

        async fn clear(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.clear().await
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn settings() -> CacheSettings {
        CacheSettings {
            ttl: Duration::from_secs(60),
            max_size: 0,
            compression: false,
            compression_threshold: 1024,
        }
    }

    fn facade(settings: CacheSettings) -> (Arc<CountingProvider>, CacheStrategy) {
        let provider = CountingProvider::new();
        let strategy = CacheStrategy::with_provider(provider.clone(), settings);
        (provider, strategy)
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        id: u32,
        name: String,
        tags: Vec<String>,
    }

    // ============================================================
    // VALIDATION TESTS
    // ============================================================

    #[tokio::test]
    async fn test_invalid_keys_never_reach_the_provider() {
        let (provider, cache) = facade(settings());
        let long_key = "k".repeat(257);

        assert!(matches!(cache.get("").await, Err(CacheError::EmptyKey)));
        assert!(matches!(cache.set("", "v").await, Err(CacheError::EmptyKey)));
        assert!(matches!(cache.delete("").await, Err(CacheError::EmptyKey)));
        assert!(matches!(
            cache.get(&long_key).await,
            Err(CacheError::KeyTooLong { len: 257, max: 256 })
        ));
        assert!(matches!(
            cache.set(&long_key, "v").await,
            Err(CacheError::KeyTooLong { .. })
        ));

        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_key_at_limit_is_accepted() {
        let (_, cache) = facade(settings());
        let key = "k".repeat(256);

        cache.set(&key, "v").await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Some(CacheValue::from("v")));
    }

    #[tokio::test]
    async fn test_oversized_value_is_rejected() {
        let (provider, cache) = facade(CacheSettings {
            max_size: 8,
            ..settings()
        });

        let err = cache.set("k", vec![0u8; 9]).await.unwrap_err();
        assert!(matches!(err, CacheError::ValueTooLarge { size: 9, limit: 8 }));
        assert_eq!(provider.calls(), 0);

        cache.set("k", vec![0u8; 8]).await.unwrap();
    }

    // ============================================================
    // METADATA TESTS
    // ============================================================

    #[tokio::test]
    async fn test_metadata_records_content_type_and_size() {
        let (provider, cache) = facade(settings());

        cache.set("text", "hello").await.unwrap();
        cache.set("bin", vec![1u8, 2, 3]).await.unwrap();
        cache
            .set_json("json", &serde_json::json!({"a": 1}))
            .await
            .unwrap();

        let text = provider.stored("text").await;
        assert_eq!(text.metadata.content_type, ContentType::Text);
        assert_eq!(text.metadata.size, 5);
        assert!(!text.metadata.compressed);
        assert!(text.metadata.expires_at > text.metadata.created_at);

        assert_eq!(provider.stored("bin").await.metadata.content_type, ContentType::Binary);
        assert_eq!(
            provider.stored("json").await.metadata.content_type,
            ContentType::Structured
        );
    }

    #[tokio::test]
    async fn test_values_decode_to_their_original_shape() {
        let (_, cache) = facade(settings());

        cache.set("text", "hello").await.unwrap();
        cache.set("bin", vec![0xffu8, 0x00]).await.unwrap();

        let text = cache.get("text").await.unwrap().unwrap();
        assert_eq!(text.as_text(), Some("hello"));
        assert_eq!(
            cache.get("bin").await.unwrap(),
            Some(CacheValue::Binary(vec![0xff, 0x00]))
        );
    }

    #[tokio::test]
    async fn test_large_values_are_compressed_transparently() {
        let (provider, cache) = facade(CacheSettings {
            compression: true,
            compression_threshold: 64,
            ..settings()
        });
        let payload = "replicated ".repeat(200);

        cache.set("big", payload.as_str()).await.unwrap();
        cache.set("small", "tiny").await.unwrap();

        let big = provider.stored("big").await;
        assert!(big.metadata.compressed);
        assert_eq!(big.metadata.size, payload.len() as u64);
        assert!(big.value.len() < payload.len());
        assert!(!provider.stored("small").await.metadata.compressed);

        assert_eq!(
            cache.get("big").await.unwrap(),
            Some(CacheValue::Text(payload))
        );
    }

    #[tokio::test]
    async fn test_compression_disabled_stores_raw_bytes() {
        let (provider, cache) = facade(CacheSettings {
            compression: false,
            compression_threshold: 1,
            ..settings()
        });

        cache.set("k", "some text value").await.unwrap();

        let entry = provider.stored("k").await;
        assert!(!entry.metadata.compressed);
        assert_eq!(entry.value, b"some text value".to_vec());
    }

    // ============================================================
    // TTL AND METRICS TESTS
    // ============================================================

    #[tokio::test]
    async fn test_expired_entry_is_absent_and_counted_as_eviction() {
        let (_, cache) = facade(settings());

        cache
            .set_with_ttl("short", "v", Duration::from_millis(20))
            .await
            .unwrap();
        assert!(cache.get("short").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get("short").await.unwrap(), None);

        let stats = cache.metrics();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.get("short").await.unwrap(), None);
        assert_eq!(cache.metrics().evictions, 1, "Purged entry is a plain miss");
    }

    #[tokio::test]
    async fn test_huge_ttl_does_not_overflow() {
        let (provider, cache) = facade(settings());

        cache
            .set_with_ttl("forever", "v", Duration::from_secs(u64::MAX))
            .await
            .unwrap();

        assert!(!provider.stored("forever").await.is_expired());
    }

    #[tokio::test]
    async fn test_metrics_track_hits_misses_and_size() {
        let (_, cache) = facade(settings());

        cache.set("a", "12345").await.unwrap();
        cache.set("b", vec![0u8; 10]).await.unwrap();
        cache.get("a").await.unwrap();
        cache.get("a").await.unwrap();
        cache.get("missing").await.unwrap();

        let stats = cache.metrics();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 15);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);

        cache.clear().await.unwrap();
        let stats = cache.metrics();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 2, "Counters survive clear");
        assert_eq!(cache.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_undecodable_hit_counts_as_miss() {
        let (provider, cache) = facade(settings());
        let now = chrono::Utc::now();
        let corrupt = CacheEntry::new(
            b"not gzip".to_vec(),
            Metadata {
                created_at: now,
                expires_at: now + chrono::Duration::minutes(1),
                size: 8,
                compressed: true,
                content_type: ContentType::Text,
            },
        );
        provider.inner.store("k", corrupt).await.unwrap();

        let err = cache.get("k").await.unwrap_err();
        assert!(matches!(err, CacheError::Codec(_)));

        let stats = cache.metrics();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_provider_error_counts_as_miss() {
        let cluster = DistributedCache::new(Vec::new(), CacheOptions::default());
        let cache = CacheStrategy::with_distributed(cluster, settings());

        let err = cache.get("k").await.unwrap_err();
        assert!(matches!(err, CacheError::NoHealthyNode));
        assert_eq!(cache.metrics().misses, 1);
    }

    #[test]
    fn test_hit_rate_without_traffic() {
        let snapshot = MetricsSnapshot {
            hits: 0,
            misses: 0,
            evictions: 0,
            size: 0,
            last_updated: chrono::Utc::now(),
        };
        assert_eq!(snapshot.hit_rate(), 0.0);
    }

    // ============================================================
    // JSON HELPERS
    // ============================================================

    #[tokio::test]
    async fn test_json_round_trip() {
        let (_, cache) = facade(settings());
        let profile = Profile {
            id: 42,
            name: "ada".to_string(),
            tags: vec!["admin".to_string()],
        };

        cache.set_json("profile:42", &profile).await.unwrap();
        let loaded: Option<Profile> = cache.get_json("profile:42").await.unwrap();

        assert_eq!(loaded, Some(profile));
        assert_eq!(cache.get_json::<Profile>("profile:0").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_json_on_non_json_is_codec_error() {
        let (_, cache) = facade(settings());
        cache.set("plain", "not json").await.unwrap();

        let err = cache.get_json::<Profile>("plain").await.unwrap_err();
        assert!(matches!(err, CacheError::Codec(_)));
    }

    // ============================================================
    // CONFIGURATION TESTS
    // ============================================================

    #[test]
    fn test_strategy_names() {
        assert_eq!(Strategy::from_config("memory"), Strategy::Memory);
        assert_eq!(Strategy::from_config("Remote"), Strategy::Remote);
        assert_eq!(Strategy::from_config("redis"), Strategy::Remote);
        assert_eq!(Strategy::from_config(" distributed "), Strategy::Distributed);
        assert_eq!(Strategy::from_config("memcached"), Strategy::Memory);
        assert_eq!(Strategy::from_config(""), Strategy::Memory);
    }

    #[test]
    fn test_zero_ttl_falls_back_to_a_day() {
        let config = CacheConfig {
            ttl_secs: 0,
            ..CacheConfig::default()
        };
        assert_eq!(CacheSettings::from(&config).ttl, Duration::from_secs(86_400));
    }

    #[test]
    fn test_split_endpoint() {
        assert_eq!(split_endpoint("a=127.0.0.1:7001"), ("a", "127.0.0.1:7001"));
        assert_eq!(split_endpoint("127.0.0.1:7001"), ("127.0.0.1:7001", "127.0.0.1:7001"));
        assert_eq!(
            split_endpoint("redis://host/0?password=x"),
            ("redis://host/0?password=x", "redis://host/0?password=x")
        );
        assert_eq!(split_endpoint("=oops"), ("=oops", "=oops"));
    }

    #[tokio::test]
    async fn test_from_config_memory() {
        let cache = CacheStrategy::from_config(&AppConfig::default()).await.unwrap();

        assert_eq!(cache.provider_name(), "memory");
        assert!(cache.distributed().is_none());
        cache.set("k", "v").await.unwrap();
        assert!(cache.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_from_config_remote() {
        let mut config = AppConfig::default();
        config.cache.strategy = "remote".to_string();
        config.cache.distribution = vec!["memory://solo".to_string()];

        let cache = CacheStrategy::from_config(&config).await.unwrap();
        assert_eq!(cache.provider_name(), "remote");
        cache.set("k", "v").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(CacheValue::from("v")));
    }

    #[tokio::test]
    async fn test_from_config_distributed() {
        let mut config = AppConfig::default();
        config.cache.strategy = "distributed".to_string();
        config.cache.distribution = vec![
            "a=memory://a".to_string(),
            "b=memory://b".to_string(),
            "c=memory://c".to_string(),
        ];

        let cache = CacheStrategy::from_config(&config).await.unwrap();
        assert_eq!(cache.provider_name(), "distributed");

        let cluster = cache.distributed().unwrap();
        let ids: Vec<String> = cluster.nodes().iter().map(|n| n.id.to_string()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(cluster.options().replication_factor, 2);

        cache.set("user:42", "payload").await.unwrap();
        assert_eq!(
            cache.get("user:42").await.unwrap(),
            Some(CacheValue::from("payload"))
        );
    }

    #[tokio::test]
    async fn test_from_config_needs_endpoints() {
        for strategy in ["remote", "distributed"] {
            let mut config = AppConfig::default();
            config.cache.strategy = strategy.to_string();

            let err = CacheStrategy::from_config(&config).await.err().unwrap();
            assert!(matches!(err, CacheError::Config(_)), "{}", strategy);
        }
    }

    // ============================================================
    // GATEWAY TESTS
    // ============================================================

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn test_value_from_request() {
        assert_eq!(
            value_from_request(&headers("text/plain; charset=utf-8"), b"hi").unwrap(),
            CacheValue::Text("hi".to_string())
        );
        assert_eq!(
            value_from_request(&headers("application/json"), br#"{"a":1}"#).unwrap(),
            CacheValue::Structured(serde_json::json!({"a": 1}))
        );
        assert_eq!(
            value_from_request(&HeaderMap::new(), b"\x00\x01").unwrap(),
            CacheValue::Binary(vec![0, 1])
        );
        assert!(value_from_request(&headers("application/json"), b"{").is_err());
        assert!(value_from_request(&headers("text/plain"), b"\xff\xfe").is_err());
    }

    async fn spawn_gateway(settings: CacheSettings) -> String {
        let cache = Arc::new(CacheStrategy::with_provider(MemoryCache::new(), settings));
        let app = gateway_routes().layer(Extension(cache));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_gateway_put_get_delete() {
        let base = spawn_gateway(settings()).await;
        let client = reqwest::Client::new();

        let put = client
            .put(format!("{}/cache/greeting", base))
            .header("content-type", "text/plain")
            .body("hello")
            .send()
            .await
            .unwrap();
        assert_eq!(put.status(), reqwest::StatusCode::NO_CONTENT);

        let get = client
            .get(format!("{}/cache/greeting", base))
            .send()
            .await
            .unwrap();
        assert_eq!(get.status(), reqwest::StatusCode::OK);
        assert_eq!(get.headers()["content-type"], "text/plain");
        assert_eq!(get.text().await.unwrap(), "hello");

        let delete = client
            .delete(format!("{}/cache/greeting", base))
            .send()
            .await
            .unwrap();
        assert_eq!(delete.status(), reqwest::StatusCode::NO_CONTENT);

        let missing = client
            .get(format!("{}/cache/greeting", base))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_gateway_error_statuses() {
        let base = spawn_gateway(CacheSettings {
            max_size: 4,
            ..settings()
        })
        .await;
        let client = reqwest::Client::new();

        let too_large = client
            .put(format!("{}/cache/k", base))
            .body(vec![0u8; 5])
            .send()
            .await
            .unwrap();
        assert_eq!(too_large.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);

        let long_key = "k".repeat(300);
        let bad_key = client
            .get(format!("{}/cache/{}", base, long_key))
            .send()
            .await
            .unwrap();
        assert_eq!(bad_key.status(), reqwest::StatusCode::BAD_REQUEST);

        let bad_json = client
            .put(format!("{}/cache/k", base))
            .header("content-type", "application/json")
            .body("{")
            .send()
            .await
            .unwrap();
        assert_eq!(bad_json.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_gateway_metrics_and_clear() {
        let base = spawn_gateway(settings()).await;
        let client = reqwest::Client::new();

        client
            .put(format!("{}/cache/a", base))
            .body(vec![1u8, 2, 3])
            .send()
            .await
            .unwrap();
        client.get(format!("{}/cache/a", base)).send().await.unwrap();
        client.get(format!("{}/cache/b", base)).send().await.unwrap();

        let stats: MetricsSnapshot = client
            .get(format!("{}/metrics", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 3);

        let clear = client.delete(format!("{}/cache", base)).send().await.unwrap();
        assert_eq!(clear.status(), reqwest::StatusCode::NO_CONTENT);

        let stats: MetricsSnapshot = client
            .get(format!("{}/metrics", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats.size, 0);
    }
}
