use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use moka::future::Cache;

use crate::config::{CacheConfig, VotingConfig};
use crate::models::voting::SummaryPayload;
use crate::store::VoteStore;

/// Shared application context handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VoteStore>,
    pub cache: Arc<ApiCache>,
    pub voting: VotingConfig,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn VoteStore>, cache: Arc<ApiCache>, voting: VotingConfig) -> Self {
        Self {
            store,
            cache,
            voting,
            start_time: Instant::now(),
        }
    }
}

pub const SUMMARY_CACHE_KEY: &str = "summary";

/// Summary tagged with the ballot generation it was computed at.
#[derive(Clone)]
pub struct CachedSummary {
    generation: u64,
    payload: Arc<SummaryPayload>,
}

pub struct ApiCache {
    /// Latest roster + tally, dropped whenever a ballot is accepted.
    pub summary: Cache<&'static str, CachedSummary>,
    /// Bumped on every accepted ballot. An entry tagged with an older
    /// generation is never served.
    generation: AtomicU64,
}

impl ApiCache {
    pub fn new(config: &CacheConfig) -> Self {
        let summary = Cache::builder()
            .max_capacity(16)
            .time_to_live(config.summary_ttl())
            .build();

        Self {
            summary,
            generation: AtomicU64::new(0),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cached summary, if one was computed after the latest accepted ballot.
    pub async fn cached_summary(&self) -> Option<Arc<SummaryPayload>> {
        let cached = self.summary.get(SUMMARY_CACHE_KEY).await?;
        if cached.generation != self.generation() {
            self.summary.invalidate(SUMMARY_CACHE_KEY).await;
            return None;
        }
        Some(cached.payload)
    }

    /// Caches `payload` as computed from store reads that started at
    /// `generation`.
    pub async fn store_summary(&self, generation: u64, payload: Arc<SummaryPayload>) {
        if generation != self.generation() {
            return;
        }
        self.summary
            .insert(
                SUMMARY_CACHE_KEY,
                CachedSummary {
                    generation,
                    payload,
                },
            )
            .await;
    }

    pub fn invalidate_summary(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.summary.invalidate_all();
    }
}
