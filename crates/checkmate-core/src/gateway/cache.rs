//! Content-addressed response cache in front of a [`ModelGateway`].
//!
//! The key is the SHA-256 of the exact request: system message and prompt
//! together, so the same prompt under another system message is a miss. Entries are evicted
//! least-recently-used first once `capacity` is reached. Only successful
//! completions are stored.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use sha2::{Digest as Sha2Digest, Sha256};
use tracing::debug;

use super::{CompletionRequest, GatewayError, ModelGateway};
use crate::metrics::METRICS;

/// SHA-256 digest of a prompt or of a whole request.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptDigest([u8; 32]);

impl PromptDigest {
    pub fn compute(prompt: &str) -> Self {
        Self::from_hash(Sha256::digest(prompt.as_bytes()).as_slice())
    }

    /// Digest of system message and prompt. The system part is
    /// length-prefixed so `("ab", "c")` and `("a", "bc")` differ.
    pub fn for_request(request: &CompletionRequest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((request.system.len() as u64).to_le_bytes());
        hasher.update(request.system.as_bytes());
        hasher.update(request.prompt.as_bytes());
        Self::from_hash(hasher.finalize().as_slice())
    }

    fn from_hash(hash: &[u8]) -> Self {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(hash);
        Self(bytes)
    }

    /// Hex-encoded string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PromptDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PromptDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PromptDigest({})",
            self.to_hex().chars().take(12).collect::<String>()
        )
    }
}

#[derive(Default)]
struct LruState {
    entries: HashMap<PromptDigest, String>,
    // front = least recently used
    order: VecDeque<PromptDigest>,
}

impl LruState {
    fn touch(&mut self, key: PromptDigest) {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key);
    }
}

/// Bounded LRU map from prompt digest to completion text.
pub struct ResponseCache {
    capacity: usize,
    state: Mutex<LruState>,
}

impl ResponseCache {
    /// `capacity` of 0 stores nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(LruState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruState> {
        // entries stay consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &PromptDigest) -> Option<String> {
        let mut state = self.lock();
        let value = state.entries.get(key).cloned()?;
        state.touch(*key);
        Some(value)
    }

    pub fn insert(&self, key: PromptDigest, value: String) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.lock();
        if state.entries.insert(key, value).is_none() {
            while state.entries.len() > self.capacity {
                let Some(oldest) = state.order.pop_front() else {
                    break;
                };
                state.entries.remove(&oldest);
                debug!(digest = ?oldest, "evicted cached response");
            }
        }
        state.touch(key);
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }
}

/// Memoises successful completions of the wrapped gateway.
pub struct CachedGateway<G> {
    inner: G,
    cache: ResponseCache,
}

impl<G: ModelGateway> CachedGateway<G> {
    pub fn new(inner: G, capacity: usize) -> Self {
        Self {
            inner,
            cache: ResponseCache::new(capacity),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: ModelGateway> ModelGateway for CachedGateway<G> {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let key = PromptDigest::for_request(request);
        if let Some(hit) = self.cache.get(&key) {
            METRICS.inc_cache_hits();
            debug!(digest = ?key, "prompt served from cache");
            return Ok(hit);
        }

        // lock is released before awaiting
        let text = self.inner.complete(request).await?;
        self.cache.insert(key, text.clone());
        Ok(text)
    }
}
