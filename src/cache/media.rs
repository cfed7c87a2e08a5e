//! Two-tier media cache keyed by source URL.
//!
//! The memory tier is an LRU over decoded blobs, bounded both by item
//! count and by total byte cost. The durable tier is a best-effort
//! response cache on disk, keyed by a hash of the URL; losing it only
//! costs a refetch. `fetch_and_cache` walks memory -> disk -> network
//! and deduplicates concurrent fetches for the same URL into a single
//! in-flight request.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::Config;

/// HTTP request timeout for media downloads, in seconds.
const MEDIA_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Unrecognized image payload from {0}")]
    InvalidPayload(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Raw byte transport for media URLs.
///
/// Split out from the cache so tests (and hosts with their own HTTP
/// stack) can substitute the network.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, MediaError>;
}

pub struct HttpTransport {
    client: Client,
}

#[async_trait]
impl MediaTransport for HttpTransport {
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, MediaError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Transport(format!(
                "status {} fetching {}",
                status, url
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))
    }
}

/// Memory tier: LRU by recency with byte-cost accounting on top of the
/// item-count bound the LRU itself enforces.
struct MemoryTier {
    entries: LruCache<String, Bytes>,
    total_cost: usize,
    cost_limit: usize,
}

impl MemoryTier {
    fn new(item_limit: usize, cost_limit: usize) -> Self {
        let capacity = NonZeroUsize::new(item_limit.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            total_cost: 0,
            cost_limit,
        }
    }

    fn get(&mut self, url: &str) -> Option<Bytes> {
        self.entries.get(url).cloned()
    }

    fn insert(&mut self, url: String, blob: Bytes) {
        let cost = blob.len();
        // push reports the displaced entry whether it was a same-key
        // replace or a count-limit eviction.
        if let Some((_, displaced)) = self.entries.push(url, blob) {
            self.total_cost -= displaced.len();
        }
        self.total_cost += cost;

        while self.total_cost > self.cost_limit && !self.entries.is_empty() {
            if let Some((evicted_url, evicted)) = self.entries.pop_lru() {
                self.total_cost -= evicted.len();
                debug!(url = %evicted_url, bytes = evicted.len(), "Evicted media blob over cost budget");
            }
        }
    }
}

/// URL-keyed media cache with an in-memory LRU tier and a durable disk
/// tier. Safe for concurrent use from many prefetch tasks.
pub struct MediaCache {
    memory: Mutex<MemoryTier>,
    dir: PathBuf,
    transport: Arc<dyn MediaTransport>,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MediaCache {
    pub fn new(dir: PathBuf, config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(MEDIA_TIMEOUT_SECS))
            .build()?;
        Self::with_transport(
            dir,
            config.media_item_limit,
            config.media_cost_limit,
            Arc::new(HttpTransport { client }),
        )
    }

    pub fn with_transport(
        dir: PathBuf,
        item_limit: usize,
        cost_limit: usize,
        transport: Arc<dyn MediaTransport>,
    ) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create media cache directory: {}", dir.display()))?;
        Ok(Self {
            memory: Mutex::new(MemoryTier::new(item_limit, cost_limit)),
            dir,
            transport,
            inflight: Mutex::new(HashMap::new()),
        })
    }

    /// Memory-tier lookup only; refreshes the entry's recency.
    pub async fn get(&self, url: &str) -> Option<Bytes> {
        self.memory.lock().await.get(url)
    }

    /// Insert into the memory tier, evicting over either budget.
    pub async fn put(&self, url: &str, blob: Bytes) {
        self.memory.lock().await.insert(url.to_string(), blob);
    }

    /// Number of cached blobs and their total byte cost in the memory tier.
    pub async fn stats(&self) -> (usize, usize) {
        let memory = self.memory.lock().await;
        (memory.entries.len(), memory.total_cost)
    }

    /// Drop the whole memory tier. The durable tier is left in place.
    pub async fn clear(&self) {
        let mut memory = self.memory.lock().await;
        memory.entries.clear();
        memory.total_cost = 0;
    }

    /// Resolve a URL through memory tier, durable tier, then network,
    /// populating both tiers on the way back.
    ///
    /// Concurrent calls for the same URL share one in-flight request;
    /// late arrivals are served from the memory tier once the first
    /// caller lands.
    pub async fn fetch_and_cache(&self, url: &str) -> Result<Bytes, MediaError> {
        if let Some(blob) = self.get(url).await {
            debug!(url, "Media served from memory tier");
            return Ok(blob);
        }

        let gate = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(url.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let _guard = gate.lock().await;
        let result = self.fetch_uncached(url).await;
        self.inflight.lock().await.remove(url);
        result
    }

    async fn fetch_uncached(&self, url: &str) -> Result<Bytes, MediaError> {
        // A concurrent fetch for this key may have landed while we
        // waited on the gate.
        if let Some(blob) = self.get(url).await {
            debug!(url, "Media served from memory tier");
            return Ok(blob);
        }

        if let Some(blob) = self.read_durable(url).await {
            debug!(url, "Media served from durable tier");
            self.put(url, blob.clone()).await;
            return Ok(blob);
        }

        debug!(url, "Downloading media");
        let blob = self.transport.fetch_bytes(url).await?;
        if !looks_like_image(&blob) {
            return Err(MediaError::InvalidPayload(url.to_string()));
        }

        self.write_durable(url, &blob).await;
        self.put(url, blob.clone()).await;
        Ok(blob)
    }

    fn blob_path(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        self.dir.join(format!("{:x}", hasher.finalize()))
    }

    async fn read_durable(&self, url: &str) -> Option<Bytes> {
        let path = self.blob_path(url);
        let read = tokio::task::spawn_blocking(move || {
            if !path.exists() {
                return None;
            }
            std::fs::read(&path).ok()
        })
        .await;

        match read {
            Ok(Some(data)) => Some(Bytes::from(data)),
            Ok(None) => None,
            Err(e) => {
                warn!(url, error = %e, "Durable tier read task failed");
                None
            }
        }
    }

    async fn write_durable(&self, url: &str, blob: &Bytes) {
        let path = self.blob_path(url);
        let data = blob.clone();
        let written = tokio::task::spawn_blocking(move || std::fs::write(&path, &data)).await;

        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(url, error = %e, "Failed to write durable media tier"),
            Err(e) => warn!(url, error = %e, "Durable tier write task failed"),
        }
    }
}

/// Check whether the payload starts like a known image format
/// (JPEG, PNG, GIF, WEBP, BMP).
fn looks_like_image(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    match &data[0..4] {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, _] => true,
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47] => true,
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38] => true,
        // WEBP: 52 49 46 46 ... 57 45 42 50
        [0x52, 0x49, 0x46, 0x46] => &data[8..12] == b"WEBP",
        // BMP: 42 4D
        [0x42, 0x4D, _, _] => true,
        _ => false,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: AtomicUsize,
        payload: Bytes,
    }

    impl CountingTransport {
        fn new(payload: Bytes) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                payload,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MediaTransport for CountingTransport {
        async fn fetch_bytes(&self, _url: &str) -> Result<Bytes, MediaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.payload.clone())
        }
    }

    fn png_bytes(size: usize) -> Bytes {
        let mut data = vec![0u8; size.max(12)];
        data[0..4].copy_from_slice(&[0x89, 0x50, 0x4E, 0x47]);
        Bytes::from(data)
    }

    fn cache_with(transport: Arc<CountingTransport>) -> (tempfile::TempDir, MediaCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache =
            MediaCache::with_transport(dir.path().to_path_buf(), 100, 1024 * 1024, transport)
                .unwrap();
        (dir, cache)
    }

    #[tokio::test]
    async fn test_second_fetch_served_from_memory() {
        let transport = CountingTransport::new(png_bytes(64));
        let (_dir, cache) = cache_with(transport.clone());

        let url = "https://example.com/a.png";
        cache.fetch_and_cache(url).await.unwrap();
        cache.fetch_and_cache(url).await.unwrap();

        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_same_key_fetches_share_one_request() {
        let transport = CountingTransport::new(png_bytes(64));
        let (_dir, cache) = cache_with(transport.clone());

        let url = "https://example.com/a.png";
        let (a, b) = tokio::join!(cache.fetch_and_cache(url), cache.fetch_and_cache(url));

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_durable_tier_survives_memory_loss() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://example.com/a.png";

        let first = CountingTransport::new(png_bytes(64));
        let cache = MediaCache::with_transport(
            dir.path().to_path_buf(),
            100,
            1024 * 1024,
            first.clone(),
        )
        .unwrap();
        cache.fetch_and_cache(url).await.unwrap();
        assert_eq!(first.calls(), 1);

        // A fresh cache over the same directory models an app restart:
        // the memory tier is gone, the durable tier is not.
        let second = CountingTransport::new(png_bytes(64));
        let cache = MediaCache::with_transport(
            dir.path().to_path_buf(),
            100,
            1024 * 1024,
            second.clone(),
        )
        .unwrap();
        let blob = cache.fetch_and_cache(url).await.unwrap();

        assert_eq!(second.calls(), 0);
        assert_eq!(blob.len(), 64);
    }

    #[tokio::test]
    async fn test_invalid_payload_is_rejected_and_not_cached() {
        let transport = CountingTransport::new(Bytes::from_static(b"definitely not an image"));
        let (_dir, cache) = cache_with(transport.clone());

        let url = "https://example.com/a.png";
        assert!(matches!(
            cache.fetch_and_cache(url).await,
            Err(MediaError::InvalidPayload(_))
        ));
        assert!(cache.get(url).await.is_none());

        // A retry goes back to the network rather than caching the junk.
        let _ = cache.fetch_and_cache(url).await;
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_cost_eviction_is_lru() {
        let dir = tempfile::tempdir().unwrap();
        let transport = CountingTransport::new(png_bytes(12));
        let cache =
            MediaCache::with_transport(dir.path().to_path_buf(), 10, 1000, transport).unwrap();

        cache.put("a", png_bytes(400)).await;
        cache.put("b", png_bytes(400)).await;

        // Touch A so B becomes least recently used.
        assert!(cache.get("a").await.is_some());

        // Inserting C goes over the 1000-byte budget and must evict B.
        cache.put("c", png_bytes(400)).await;

        assert!(cache.get("a").await.is_some());
        assert!(cache.get("b").await.is_none());
        assert!(cache.get("c").await.is_some());

        let (count, cost) = cache.stats().await;
        assert_eq!(count, 2);
        assert_eq!(cost, 800);
    }

    #[tokio::test]
    async fn test_item_count_eviction() {
        let dir = tempfile::tempdir().unwrap();
        let transport = CountingTransport::new(png_bytes(12));
        let cache = MediaCache::with_transport(dir.path().to_path_buf(), 2, 1024 * 1024, transport)
            .unwrap();

        cache.put("a", png_bytes(16)).await;
        cache.put("b", png_bytes(16)).await;
        cache.put("c", png_bytes(16)).await;

        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_some());
        assert!(cache.get("c").await.is_some());

        let (count, cost) = cache.stats().await;
        assert_eq!(count, 2);
        assert_eq!(cost, 32);
    }

    #[tokio::test]
    async fn test_clear_resets_cost_accounting() {
        let dir = tempfile::tempdir().unwrap();
        let transport = CountingTransport::new(png_bytes(12));
        let cache =
            MediaCache::with_transport(dir.path().to_path_buf(), 10, 1000, transport).unwrap();

        cache.put("a", png_bytes(100)).await;
        cache.clear().await;

        let (count, cost) = cache.stats().await;
        assert_eq!(count, 0);
        assert_eq!(cost, 0);
    }

    #[test]
    fn test_looks_like_image() {
        assert!(looks_like_image(&png_bytes(16)));
        let mut jpeg = vec![0u8; 16];
        jpeg[0..3].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
        assert!(looks_like_image(&jpeg));
        assert!(!looks_like_image(b"GIF9"));
        assert!(!looks_like_image(b"plain text that is long enough"));
    }
}
