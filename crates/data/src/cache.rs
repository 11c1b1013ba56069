//! Time-bounded memoization of query results.
//!
//! Each cached operation owns a [`TtlCache`] keyed by its argument tuple, so
//! the pair (operation, arguments) identifies an entry. Entries are served
//! until their time-to-live elapses and are then recomputed on the next
//! request. The data is read-only, so nothing is ever invalidated early.
//! Two requests racing on the same missing key may both run the query; the
//! last result written wins.

use async_trait::async_trait;
use compass_core::{CacheConfig, IssuerType, SegmentFilter, TimeWindow};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::models::{
    ActivitySummary, BondRecord, IsinCount, IssueQuote, IssueTrade, VenueActivity, VenueVolume,
    VolumePoint,
};
use crate::source::{DashboardSource, DataResult};

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

/// Map from key to value with an optional per-cache time-to-live.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    name: &'static str,
    ttl: Option<Duration>,
    entries: RwLock<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Entries expire `ttl` after they were stored.
    #[must_use]
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl: Some(ttl),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Entries live for the life of the process.
    #[must_use]
    pub fn without_expiry(name: &'static str) -> Self {
        Self {
            name,
            ttl: None,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the value if present and not expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    /// Stores `value`, replacing any previous entry and dropping expired ones.
    pub async fn insert(&self, key: K, value: V) {
        let now = Instant::now();
        let expires_at = self.ttl.map(|ttl| now + ttl);
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_fresh(now));
        entries.insert(key, Entry { value, expires_at });
    }

    /// Serves a fresh entry or runs `load` and stores its success.
    /// Failures are returned to the caller and never cached.
    ///
    /// # Errors
    /// Propagates the error returned by `load`.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<V, E>> + Send,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!(cache = self.name, "cache hit");
            return Ok(value);
        }

        tracing::debug!(cache = self.name, "cache miss");
        let value = load().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Wraps a [`DashboardSource`] and memoizes its cacheable lookups.
///
/// Reference lookups (eligible venues, rankings, bond rows) use the lookup
/// TTL, headline metrics use the longer metrics TTL and the country list is
/// kept for the life of the process. Per-issue and asset class series are
/// passed straight through.
pub struct CachedDashboardSource<S> {
    inner: S,
    eligible_venues: TtlCache<TimeWindow, Vec<String>>,
    countries: TtlCache<(), Vec<String>>,
    most_traded: TtlCache<(TimeWindow, Option<IssuerType>), Vec<IsinCount>>,
    most_quoted: TtlCache<TimeWindow, Vec<IsinCount>>,
    bonds: TtlCache<String, Option<BondRecord>>,
    activity_summary: TtlCache<TimeWindow, ActivitySummary>,
    venue_activity: TtlCache<(TimeWindow, IssuerType), Vec<VenueActivity>>,
}

impl<S: DashboardSource> CachedDashboardSource<S> {
    #[must_use]
    pub fn new(inner: S, config: &CacheConfig) -> Self {
        let lookup = config.lookup_ttl();
        let metrics = config.metrics_ttl();
        Self {
            inner,
            eligible_venues: TtlCache::new("eligible_venues", lookup),
            countries: TtlCache::without_expiry("countries"),
            most_traded: TtlCache::new("most_traded", lookup),
            most_quoted: TtlCache::new("most_quoted", lookup),
            bonds: TtlCache::new("bonds", lookup),
            activity_summary: TtlCache::new("activity_summary", metrics),
            venue_activity: TtlCache::new("venue_activity", metrics),
        }
    }

    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: DashboardSource> DashboardSource for CachedDashboardSource<S> {
    async fn eligible_venues(&self, window: TimeWindow) -> DataResult<Vec<String>> {
        self.eligible_venues
            .get_or_try_insert_with(window, || self.inner.eligible_venues(window))
            .await
    }

    async fn countries(&self) -> DataResult<Vec<String>> {
        self.countries
            .get_or_try_insert_with((), || self.inner.countries())
            .await
    }

    async fn most_traded(
        &self,
        window: TimeWindow,
        issuer_type: Option<IssuerType>,
    ) -> DataResult<Vec<IsinCount>> {
        self.most_traded
            .get_or_try_insert_with((window, issuer_type), || {
                self.inner.most_traded(window, issuer_type)
            })
            .await
    }

    async fn most_quoted(&self, window: TimeWindow) -> DataResult<Vec<IsinCount>> {
        self.most_quoted
            .get_or_try_insert_with(window, || self.inner.most_quoted(window))
            .await
    }

    async fn segment_trades(&self, filter: &SegmentFilter) -> DataResult<Vec<VolumePoint>> {
        self.inner.segment_trades(filter).await
    }

    async fn segment_trades_per_venue(
        &self,
        filter: &SegmentFilter,
    ) -> DataResult<Vec<VenueVolume>> {
        self.inner.segment_trades_per_venue(filter).await
    }

    async fn issue_trades(
        &self,
        isin: &str,
        window: TimeWindow,
        venues: &[String],
    ) -> DataResult<Vec<IssueTrade>> {
        self.inner.issue_trades(isin, window, venues).await
    }

    async fn issue_quotes(&self, isin: &str, window: TimeWindow) -> DataResult<Vec<IssueQuote>> {
        self.inner.issue_quotes(isin, window).await
    }

    async fn bond(&self, isin: &str) -> DataResult<Option<BondRecord>> {
        self.bonds
            .get_or_try_insert_with(isin.to_string(), || self.inner.bond(isin))
            .await
    }

    async fn activity_summary(&self, window: TimeWindow) -> DataResult<ActivitySummary> {
        self.activity_summary
            .get_or_try_insert_with(window, || self.inner.activity_summary(window))
            .await
    }

    async fn venue_activity(
        &self,
        window: TimeWindow,
        issuer_type: IssuerType,
    ) -> DataResult<Vec<VenueActivity>> {
        self.venue_activity
            .get_or_try_insert_with((window, issuer_type), || {
                self.inner.venue_activity(window, issuer_type)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataAccessError;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts how often each query reaches the underlying source.
    #[derive(Default)]
    struct CountingSource {
        venues_calls: AtomicUsize,
        countries_calls: AtomicUsize,
        most_traded_calls: AtomicUsize,
        summary_calls: AtomicUsize,
        issue_trade_calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn answer<T>(&self, counter: &AtomicUsize, value: T) -> DataResult<T> {
            counter.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DataAccessError::Connection("refused".to_string()))
            } else {
                Ok(value)
            }
        }
    }

    #[async_trait]
    impl DashboardSource for CountingSource {
        async fn eligible_venues(&self, _window: TimeWindow) -> DataResult<Vec<String>> {
            self.answer(
                &self.venues_calls,
                vec!["BMTF".to_string(), "TREU".to_string()],
            )
        }

        async fn countries(&self) -> DataResult<Vec<String>> {
            self.answer(&self.countries_calls, vec!["Germany".to_string()])
        }

        async fn most_traded(
            &self,
            _window: TimeWindow,
            issuer_type: Option<IssuerType>,
        ) -> DataResult<Vec<IsinCount>> {
            let how_many = if issuer_type == Some(IssuerType::Corporate) { 3 } else { 7 };
            self.answer(
                &self.most_traded_calls,
                vec![IsinCount {
                    isin: "GB00BL68HJ26".to_string(),
                    how_many,
                }],
            )
        }

        async fn most_quoted(&self, _window: TimeWindow) -> DataResult<Vec<IsinCount>> {
            Ok(Vec::new())
        }

        async fn segment_trades(&self, _filter: &SegmentFilter) -> DataResult<Vec<VolumePoint>> {
            Ok(Vec::new())
        }

        async fn segment_trades_per_venue(
            &self,
            _filter: &SegmentFilter,
        ) -> DataResult<Vec<VenueVolume>> {
            Ok(Vec::new())
        }

        async fn issue_trades(
            &self,
            _isin: &str,
            _window: TimeWindow,
            _venues: &[String],
        ) -> DataResult<Vec<IssueTrade>> {
            self.answer(&self.issue_trade_calls, Vec::new())
        }

        async fn issue_quotes(
            &self,
            _isin: &str,
            _window: TimeWindow,
        ) -> DataResult<Vec<IssueQuote>> {
            Ok(Vec::new())
        }

        async fn bond(&self, _isin: &str) -> DataResult<Option<BondRecord>> {
            Ok(None)
        }

        async fn activity_summary(&self, _window: TimeWindow) -> DataResult<ActivitySummary> {
            self.answer(
                &self.summary_calls,
                ActivitySummary {
                    isin_count: 10,
                    trade_count: 42,
                    venue_count: 3,
                },
            )
        }

        async fn venue_activity(
            &self,
            _window: TimeWindow,
            _issuer_type: IssuerType,
        ) -> DataResult<Vec<VenueActivity>> {
            Ok(Vec::new())
        }
    }

    fn config() -> CacheConfig {
        CacheConfig {
            lookup_ttl_secs: 2 * 60 * 60,
            metrics_ttl_secs: 6 * 60 * 60,
        }
    }

    fn day(d: u32) -> TimeWindow {
        TimeWindow::day(NaiveDate::from_ymd_opt(2023, 6, d).unwrap())
    }

    fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_lookup_within_ttl_runs_query_once() {
        let cached = CachedDashboardSource::new(CountingSource::default(), &config());

        let first = cached.eligible_venues(day(2)).await.unwrap();
        tokio::time::advance(Duration::from_secs(60 * 60)).await;
        let second = cached.eligible_venues(day(2)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls(&cached.inner().venues_calls), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_lookup_is_recomputed() {
        let cached = CachedDashboardSource::new(CountingSource::default(), &config());

        cached.eligible_venues(day(2)).await.unwrap();
        tokio::time::advance(Duration::from_secs(2 * 60 * 60 + 1)).await;
        cached.eligible_venues(day(2)).await.unwrap();

        assert_eq!(calls(&cached.inner().venues_calls), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn different_arguments_are_separate_entries() {
        let cached = CachedDashboardSource::new(CountingSource::default(), &config());

        let gov = cached
            .most_traded(day(2), Some(IssuerType::Government))
            .await
            .unwrap();
        let corp = cached
            .most_traded(day(2), Some(IssuerType::Corporate))
            .await
            .unwrap();
        cached
            .most_traded(day(2), Some(IssuerType::Government))
            .await
            .unwrap();
        cached.most_traded(day(3), Some(IssuerType::Government)).await.unwrap();

        assert_ne!(gov, corp);
        assert_eq!(calls(&cached.inner().most_traded_calls), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn metrics_outlive_the_lookup_ttl() {
        let cached = CachedDashboardSource::new(CountingSource::default(), &config());

        cached.activity_summary(day(2)).await.unwrap();
        tokio::time::advance(Duration::from_secs(3 * 60 * 60)).await;
        cached.activity_summary(day(2)).await.unwrap();
        assert_eq!(calls(&cached.inner().summary_calls), 1);

        tokio::time::advance(Duration::from_secs(3 * 60 * 60 + 1)).await;
        cached.activity_summary(day(2)).await.unwrap();
        assert_eq!(calls(&cached.inner().summary_calls), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn countries_never_expire() {
        let cached = CachedDashboardSource::new(CountingSource::default(), &config());

        cached.countries().await.unwrap();
        tokio::time::advance(Duration::from_secs(90 * 24 * 60 * 60)).await;
        cached.countries().await.unwrap();

        assert_eq!(calls(&cached.inner().countries_calls), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cached = CachedDashboardSource::new(CountingSource::failing(), &config());

        assert!(cached.eligible_venues(day(2)).await.is_err());
        assert!(cached.eligible_venues(day(2)).await.is_err());

        assert_eq!(calls(&cached.inner().venues_calls), 2);
        assert!(cached.eligible_venues.is_empty().await);
    }

    #[tokio::test]
    async fn per_issue_queries_pass_through() {
        let cached = CachedDashboardSource::new(CountingSource::default(), &config());
        let venues = vec!["BMTF".to_string()];

        cached.issue_trades("XS0000000000", day(2), &venues).await.unwrap();
        cached.issue_trades("XS0000000000", day(2), &venues).await.unwrap();

        assert_eq!(calls(&cached.inner().issue_trade_calls), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn insert_purges_expired_entries() {
        let cache: TtlCache<u32, &str> = TtlCache::new("test", Duration::from_secs(10));

        cache.insert(1, "one").await;
        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get(&1).await, None);

        cache.insert(2, "two").await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&2).await, Some("two"));
    }
}
