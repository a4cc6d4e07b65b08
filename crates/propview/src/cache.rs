//! Time-boxed memoization of table fetches
//!
//! Results are keyed by `(table, limit)` and kept for a fixed TTL. Entries are
//! immutable once written and replaced wholesale when they expire. Failed
//! fetches are cached too, so a broken table is retried only after the window
//! passes or the cache is invalidated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::source::{FetchError, TableSource};
use crate::table::Table;

/// Outcome of one fetch, shared between every reader of the cache entry
pub type FetchResult = Result<Arc<Table>, FetchError>;

/// Time source for expiry decisions
pub trait Clock: Send + Sync {
  fn now(&self) -> Instant;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> Instant {
    Instant::now()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
  table: String,
  limit: u32,
}

impl CacheKey {
  fn new(table: &str, limit: u32) -> Self {
    Self { table: table.to_string(), limit }
  }
}

struct CacheEntry {
  result: FetchResult,
  // None when the TTL reaches past what `Instant` can represent
  expires_at: Option<Instant>,
}

impl CacheEntry {
  fn is_fresh(&self, now: Instant) -> bool {
    self.expires_at.map_or(true, |expires_at| expires_at > now)
  }
}

/// Shared fetch cache
pub struct FetchCache {
  ttl: Duration,
  clock: Arc<dyn Clock>,
  entries: RwLock<HashMap<CacheKey, Arc<CacheEntry>>>,
  // One gate per key so concurrent misses issue a single query
  gates: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl FetchCache {
  pub fn new(ttl: Duration) -> Self {
    Self::with_clock(ttl, Arc::new(SystemClock))
  }

  pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
    Self { ttl, clock, entries: RwLock::new(HashMap::new()), gates: Mutex::new(HashMap::new()) }
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  /// Cached result for a key, if one exists and has not expired
  pub fn lookup(&self, table: &str, limit: u32) -> Option<FetchResult> {
    let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
    let entry = entries.get(&CacheKey::new(table, limit))?;
    entry.is_fresh(self.clock.now()).then(|| entry.result.clone())
  }

  /// Return the cached result for `(table, limit)` or fetch it from `source`
  pub async fn get_or_fetch(&self, source: &dyn TableSource, table: &str, limit: u32) -> FetchResult {
    if let Some(hit) = self.lookup(table, limit) {
      tracing::debug!(table, limit, "fetch cache hit");
      return hit;
    }

    let key = CacheKey::new(table, limit);
    let gate = self.gate(&key);
    let _guard = gate.lock().await;

    // Another caller may have filled the entry while we waited
    if let Some(hit) = self.lookup(table, limit) {
      tracing::debug!(table, limit, "fetch cache filled while waiting");
      return hit;
    }

    tracing::debug!(table, limit, "fetch cache miss");
    let result = source.fetch_table(table, limit).await.map(Arc::new);
    if let Err(e) = &result {
      tracing::warn!(table, error = %e, "fetch failed; caching failure for the cache window");
    }

    let expires_at = self.clock.now().checked_add(self.ttl);
    let entry = Arc::new(CacheEntry { result: result.clone(), expires_at });
    self.entries.write().unwrap_or_else(PoisonError::into_inner).insert(key, entry);
    result
  }

  /// Drop every entry for `table`, whatever its limit. Returns how many were removed.
  pub fn invalidate(&self, table: &str) -> usize {
    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
    let before = entries.len();
    entries.retain(|key, _| key.table != table);
    self.prune_gates(|key| key.table == table);
    before - entries.len()
  }

  /// Drop everything. Returns how many entries were removed.
  pub fn invalidate_all(&self) -> usize {
    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
    let removed = entries.len();
    entries.clear();
    self.prune_gates(|_| true);
    removed
  }

  /// Number of stored entries, expired ones included
  pub fn len(&self) -> usize {
    self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn gate(&self, key: &CacheKey) -> Arc<tokio::sync::Mutex<()>> {
    let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
    gates.entry(key.clone()).or_default().clone()
  }

  /// Drop idle gates matching `matches`. A gate still held by an in-flight
  /// fetch stays so its waiters keep sharing one query.
  fn prune_gates(&self, matches: impl Fn(&CacheKey) -> bool) {
    let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
    gates.retain(|key, gate| !matches(key) || Arc::strong_count(gate) > 1);
  }

  #[cfg(test)]
  fn gate_count(&self) -> usize {
    self.gates.lock().unwrap_or_else(PoisonError::into_inner).len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::source::MockTableSource;
  use crate::value::Value;

  struct ManualClock {
    now: Mutex<Instant>,
  }

  impl ManualClock {
    fn new() -> Self {
      Self { now: Mutex::new(Instant::now()) }
    }

    fn advance(&self, by: Duration) {
      *self.now.lock().unwrap() += by;
    }
  }

  impl Clock for ManualClock {
    fn now(&self) -> Instant {
      *self.now.lock().unwrap()
    }
  }

  fn one_row() -> Table {
    Table::from_rows(["id"], vec![vec![Value::Int(1)]])
  }

  #[tokio::test]
  async fn test_second_fetch_within_ttl_hits_cache() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().times(1).returning(|_, _| Ok(one_row()));

    let cache = FetchCache::new(Duration::from_secs(300));
    let first = cache.get_or_fetch(&source, "Agent", 1000).await.unwrap();
    let second = cache.get_or_fetch(&source, "Agent", 1000).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
  }

  #[tokio::test]
  async fn test_expired_entry_is_refetched() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().times(2).returning(|_, _| Ok(one_row()));

    let clock = Arc::new(ManualClock::new());
    let cache = FetchCache::with_clock(Duration::from_secs(300), clock.clone());

    cache.get_or_fetch(&source, "Agent", 1000).await.unwrap();
    clock.advance(Duration::from_secs(299));
    cache.get_or_fetch(&source, "Agent", 1000).await.unwrap();
    clock.advance(Duration::from_secs(1));
    cache.get_or_fetch(&source, "Agent", 1000).await.unwrap();
  }

  #[tokio::test]
  async fn test_limit_is_part_of_key() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().times(2).returning(|_, _| Ok(one_row()));

    let cache = FetchCache::new(Duration::from_secs(300));
    cache.get_or_fetch(&source, "Agent", 10).await.unwrap();
    cache.get_or_fetch(&source, "Agent", 20).await.unwrap();
    assert_eq!(cache.len(), 2);
  }

  #[tokio::test]
  async fn test_failures_are_cached_until_invalidated() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().times(2).returning(|table, _| {
      Err(FetchError::Query { table: table.to_string(), message: "boom".to_string() })
    });

    let cache = FetchCache::new(Duration::from_secs(300));
    assert!(cache.get_or_fetch(&source, "Agent", 1000).await.is_err());
    assert!(cache.get_or_fetch(&source, "Agent", 1000).await.is_err());

    assert_eq!(cache.invalidate("Agent"), 1);
    assert!(cache.get_or_fetch(&source, "Agent", 1000).await.is_err());
  }

  #[tokio::test]
  async fn test_invalidate_all_clears_every_table() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().returning(|_, _| Ok(one_row()));

    let cache = FetchCache::new(Duration::from_secs(300));
    cache.get_or_fetch(&source, "Agent", 1000).await.unwrap();
    cache.get_or_fetch(&source, "Property", 1000).await.unwrap();

    assert_eq!(cache.invalidate_all(), 2);
    assert!(cache.is_empty());
    assert!(cache.lookup("Agent", 1000).is_none());
  }

  #[tokio::test]
  async fn test_zero_ttl_never_serves_stale_data() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().times(2).returning(|_, _| Ok(one_row()));

    let clock = Arc::new(ManualClock::new());
    let cache = FetchCache::with_clock(Duration::ZERO, clock);
    cache.get_or_fetch(&source, "Agent", 1000).await.unwrap();
    cache.get_or_fetch(&source, "Agent", 1000).await.unwrap();
  }

  #[tokio::test]
  async fn test_unrepresentable_ttl_never_expires() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().times(1).returning(|_, _| Ok(one_row()));

    let clock = Arc::new(ManualClock::new());
    let cache = FetchCache::with_clock(Duration::from_secs(u64::MAX), clock.clone());
    cache.get_or_fetch(&source, "Agent", 1000).await.unwrap();
    clock.advance(Duration::from_secs(365 * 24 * 60 * 60));
    cache.get_or_fetch(&source, "Agent", 1000).await.unwrap();
  }

  #[tokio::test]
  async fn test_invalidation_drops_idle_gates() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().returning(|_, _| Ok(one_row()));

    let cache = FetchCache::new(Duration::from_secs(300));
    cache.get_or_fetch(&source, "Agent", 1000).await.unwrap();
    cache.get_or_fetch(&source, "Property", 1000).await.unwrap();
    assert_eq!(cache.gate_count(), 2);

    cache.invalidate("Agent");
    assert_eq!(cache.gate_count(), 1);

    cache.invalidate_all();
    assert_eq!(cache.gate_count(), 0);
  }
}
