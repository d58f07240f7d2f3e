//! Core rotator: an ordered pool of proxy-bound clients and the policy
//! for handing out the next one.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use futures::future;
use log::{debug, info, warn};
use parking_lot::Mutex;
use rand::seq::SliceRandom;

use crate::client::{build_client, probe_client, ProxyClient};
use crate::config::{ProxyEndpoint, RotatorConfig, SelectionMode};
use crate::cookies::CookieGroup;
use crate::error::{Result, RotatorError};

/// Wall-clock source for time-windowed selection, swappable in tests.
pub(crate) trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The process clock.
struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// An endpoint dropped during construction because its probe failed.
#[derive(Debug, Clone)]
pub struct ExcludedEndpoint {
    /// Proxy URL of the dropped endpoint.
    pub url: String,
    /// Why the probe considered it unusable.
    pub detail: String,
}

/// A rotating pool of proxy-bound HTTP clients.
///
/// Construction probes every configured proxy and keeps the reachable ones
/// in input order; [`next`](Self::next) hands out clients according to the
/// configured selection policy. All methods take `&self`; share the rotator
/// behind an `Arc` for concurrent use.
pub struct ProxyRotator {
    /// Immutable pool snapshots; every mutation swaps in a fresh `Vec`.
    /// Non-empty from construction onward — nothing ever removes entries.
    entries: ArcSwap<Vec<Arc<ProxyClient>>>,
    /// Serializes pool mutations. Held only across the in-memory swap,
    /// never across I/O.
    mutate: Mutex<()>,
    /// Cursor for indexed selection.
    cursor: AtomicUsize,
    created_at: Instant,
    selection: SelectionMode,
    shuffle: bool,
    probe_url: String,
    probe_timeout: Duration,
    /// Cookie stores by group identifier, shared with pool entries.
    groups: Mutex<HashMap<String, Arc<CookieGroup>>>,
    excluded: Vec<ExcludedEndpoint>,
    clock: Arc<dyn Clock>,
}

impl ProxyRotator {
    /// Build a rotator from the configuration.
    ///
    /// Every endpoint gets a client first (a malformed URL or failed client
    /// construction is fatal), then all candidates are probed concurrently.
    /// Unreachable proxies are excluded with a warning — see
    /// [`excluded_endpoints`](Self::excluded_endpoints) — and construction
    /// fails only if no usable proxy remains.
    pub async fn new(config: RotatorConfig) -> Result<Self> {
        Self::build(config, Arc::new(SystemClock)).await
    }

    async fn build(config: RotatorConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let endpoints = config.endpoints()?;

        if let SelectionMode::TimeWindowed { window } = config.selection {
            if window.as_millis() == 0 {
                return Err(RotatorError::ZeroWindow);
            }
            if config.shuffle {
                debug!("shuffle is ignored in time-windowed mode");
            }
        }

        // One store per distinct non-empty identifier, opened before any
        // client so endpoints sharing an identifier share the instance.
        let mut groups: HashMap<String, Arc<CookieGroup>> = HashMap::new();
        for endpoint in &endpoints {
            if endpoint.cookie_group.is_empty() || groups.contains_key(&endpoint.cookie_group) {
                continue;
            }
            let group = Arc::new(CookieGroup::open(endpoint.cookie_group.clone())?);
            groups.insert(endpoint.cookie_group.clone(), group);
        }

        let mut candidates = Vec::with_capacity(endpoints.len());
        for endpoint in &endpoints {
            let group = groups.get(&endpoint.cookie_group);
            candidates.push(Arc::new(build_client(endpoint, group)?));
        }

        let probe_url = config.probe_url.as_str();
        let probes = future::join_all(
            candidates
                .iter()
                .map(|entry| probe_client(entry.client(), probe_url, config.probe_timeout)),
        )
        .await;

        let mut entries = Vec::with_capacity(candidates.len());
        let mut excluded = Vec::new();
        for (entry, (usable, detail)) in candidates.into_iter().zip(probes) {
            if usable {
                entries.push(entry);
            } else {
                let detail = detail.unwrap_or_else(|| "probe failed".to_string());
                warn!("proxy {} excluded from pool: {}", entry.proxy_url(), detail);
                excluded.push(ExcludedEndpoint {
                    url: entry.proxy_url().to_string(),
                    detail,
                });
            }
        }

        if entries.is_empty() {
            return Err(RotatorError::NoUsableProxies {
                probed: endpoints.len(),
            });
        }

        info!(
            "proxy rotator ready: {}/{} endpoints usable",
            entries.len(),
            endpoints.len()
        );

        Ok(Self {
            entries: ArcSwap::from_pointee(entries),
            mutate: Mutex::new(()),
            cursor: AtomicUsize::new(0),
            created_at: clock.now(),
            selection: config.selection,
            shuffle: config.shuffle,
            probe_url: config.probe_url,
            probe_timeout: config.probe_timeout,
            groups: Mutex::new(groups),
            excluded,
            clock,
        })
    }

    /// Hand out the next client according to the selection policy.
    ///
    /// Never performs I/O. Both the pool length and the returned entry come
    /// from one snapshot captured at entry, so a concurrent [`add`](Self::add)
    /// is observed wholly or not at all.
    pub fn next(&self) -> Arc<ProxyClient> {
        let entries = self.entries.load();
        // Non-empty by construction; nothing removes entries.
        let len = entries.len();

        let position = match self.selection {
            SelectionMode::TimeWindowed { window } => {
                let elapsed = self.clock.now().duration_since(self.created_at);
                ((elapsed.as_millis() / window.as_millis()) % len as u128) as usize
            }
            SelectionMode::Indexed => {
                // Publish `selected + 1` rather than blindly incrementing:
                // concurrent callers land on distinct positions and the
                // cursor self-corrects if the pool length changed since it
                // was last written.
                let mut cursor = self.cursor.load(Ordering::Relaxed);
                loop {
                    let position = cursor % len;
                    match self.cursor.compare_exchange_weak(
                        cursor,
                        position + 1,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => break position,
                        Err(seen) => cursor = seen,
                    }
                }
            }
        };

        let selected = Arc::clone(&entries[position]);

        // Selecting the last index completes a traversal; the reshuffle
        // reorders later cycles only. Time-windowed selection skips the
        // flag so window positions stay deterministic.
        if self.shuffle && self.selection == SelectionMode::Indexed && position + 1 == len {
            self.reshuffle();
        }

        selected
    }

    fn reshuffle(&self) {
        let _guard = self.mutate.lock();
        let current = self.entries.load_full();
        let mut reordered = (*current).clone();
        reordered.shuffle(&mut rand::rng());
        self.entries.store(Arc::new(reordered));
    }

    /// Build, probe, and append one more proxy client.
    ///
    /// The cookie store for `cookie_group` is reused if this rotator
    /// already holds it, created otherwise. An endpoint that fails its
    /// probe is dropped and reported as `Ok(false)`, mirroring
    /// construction's best-effort policy; `Ok(true)` means the entry is
    /// live at the end of the pool.
    pub async fn add(
        &self,
        proxy_url: &str,
        cookie_group: &str,
        timeout: Duration,
    ) -> Result<bool> {
        let endpoint = ProxyEndpoint {
            url: proxy_url.to_string(),
            cookie_group: cookie_group.to_string(),
            timeout,
        };

        let group = self.group_for(&endpoint.cookie_group)?;
        let entry = Arc::new(build_client(&endpoint, group.as_ref())?);

        let (usable, detail) =
            probe_client(entry.client(), &self.probe_url, self.probe_timeout).await;
        if !usable {
            warn!(
                "proxy {} not added: {}",
                proxy_url,
                detail.unwrap_or_else(|| "probe failed".to_string())
            );
            return Ok(false);
        }

        {
            let _guard = self.mutate.lock();
            let current = self.entries.load_full();
            let mut grown = (*current).clone();
            grown.push(entry);
            self.entries.store(Arc::new(grown));
        }

        info!("proxy {} added to pool", proxy_url);
        Ok(true)
    }

    /// Existing store for the identifier, or a freshly opened one
    /// registered for future reuse. The file load happens outside the
    /// registry lock; losing a creation race adopts the winner's store, so
    /// one identifier never maps to two stores.
    fn group_for(&self, name: &str) -> Result<Option<Arc<CookieGroup>>> {
        if name.is_empty() {
            return Ok(None);
        }
        if let Some(group) = self.groups.lock().get(name) {
            return Ok(Some(Arc::clone(group)));
        }

        let fresh = Arc::new(CookieGroup::open(name)?);
        let mut groups = self.groups.lock();
        Ok(Some(Arc::clone(
            groups.entry(name.to_string()).or_insert(fresh),
        )))
    }

    /// Re-probe every pooled client and report usability keyed by proxy
    /// URL.
    ///
    /// Purely observational: pool membership never changes here, and
    /// eviction is the caller's decision. Entries sharing one proxy URL
    /// collapse to a single key.
    pub async fn health_check_all(&self) -> HashMap<String, bool> {
        let entries = self.entries.load_full();
        info!("health checking {} proxies", entries.len());

        let probes = future::join_all(
            entries
                .iter()
                .map(|entry| probe_client(entry.client(), &self.probe_url, self.probe_timeout)),
        )
        .await;

        let mut report = HashMap::with_capacity(entries.len());
        for (entry, (usable, detail)) in entries.iter().zip(probes) {
            if let Some(detail) = detail {
                warn!("proxy {} unusable: {}", entry.proxy_url(), detail);
            }
            report.insert(entry.proxy_url().to_string(), usable);
        }
        report
    }

    /// Flush every cookie store this rotator has opened. Stops at the
    /// first failing store.
    pub fn save_all_cookies(&self) -> Result<()> {
        let groups: Vec<Arc<CookieGroup>> = self.groups.lock().values().cloned().collect();
        for group in groups {
            group.save()?;
        }
        Ok(())
    }

    /// Number of usable clients currently pooled.
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    /// Whether the pool is empty. Construction guarantees it is not.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Endpoints dropped during construction because their probe failed.
    pub fn excluded_endpoints(&self) -> &[ExcludedEndpoint] {
        &self.excluded
    }
}

impl fmt::Debug for ProxyRotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyRotator")
            .field("entries", &self.entries)
            .field("cursor", &self.cursor)
            .field("created_at", &self.created_at)
            .field("selection", &self.selection)
            .field("shuffle", &self.shuffle)
            .field("probe_url", &self.probe_url)
            .field("probe_timeout", &self.probe_timeout)
            .field("excluded", &self.excluded)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RotatorConfigBuilder;
    use crate::testutil::{dead_proxy_url, FakeProxy, PROBE_URL};
    use std::collections::HashSet;
    use tempfile::tempdir;
    use tokio_test::assert_ok;

    async fn fleet(n: usize) -> (Vec<FakeProxy>, Vec<String>) {
        let mut proxies = Vec::with_capacity(n);
        let mut urls = Vec::with_capacity(n);
        for _ in 0..n {
            let proxy = FakeProxy::start().await;
            urls.push(proxy.url());
            proxies.push(proxy);
        }
        (proxies, urls)
    }

    fn config_for(urls: &[String]) -> RotatorConfigBuilder {
        RotatorConfig::builder()
            .proxies(urls.to_vec())
            .timeout(Duration::from_secs(2))
            .probe_url(PROBE_URL)
            .probe_timeout(Duration::from_secs(5))
    }

    struct ManualClock {
        start: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                start: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            })
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.start + *self.offset.lock()
        }
    }

    #[tokio::test]
    async fn test_construct_keeps_reachable_endpoints_in_order() {
        let (_proxies, urls) = fleet(3).await;
        let rotator = ProxyRotator::new(config_for(&urls).build()).await.unwrap();

        assert_eq!(rotator.len(), 3);
        assert!(!rotator.is_empty());
        assert!(rotator.excluded_endpoints().is_empty());
        for url in &urls {
            assert_eq!(rotator.next().proxy_url(), url);
        }
    }

    #[tokio::test]
    async fn test_construct_excludes_unreachable_endpoints() {
        let live = FakeProxy::start().await;
        let dead = dead_proxy_url().await;
        let urls = vec![live.url(), dead.clone()];
        let rotator = ProxyRotator::new(config_for(&urls).build()).await.unwrap();

        assert_eq!(rotator.len(), 1);
        assert_eq!(rotator.next().proxy_url(), live.url());

        let excluded = rotator.excluded_endpoints();
        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].url, dead);
        assert!(!excluded[0].detail.is_empty());
    }

    #[tokio::test]
    async fn test_construct_fails_when_nothing_survives_probing() {
        let urls = vec![dead_proxy_url().await, dead_proxy_url().await];
        let err = ProxyRotator::new(config_for(&urls).build())
            .await
            .unwrap_err();
        assert!(matches!(err, RotatorError::NoUsableProxies { probed: 2 }));
    }

    #[tokio::test]
    async fn test_construct_rejects_empty_endpoint_list() {
        let err = ProxyRotator::new(RotatorConfig::builder().build())
            .await
            .unwrap_err();
        assert!(matches!(err, RotatorError::NoEndpoints));
    }

    #[tokio::test]
    async fn test_construct_rejects_mismatched_cookie_groups() {
        let urls = vec![
            "http://127.0.0.1:1".to_string(),
            "http://127.0.0.1:2".to_string(),
        ];
        let config = config_for(&urls).cookie_groups(vec!["only-one"]).build();
        let err = ProxyRotator::new(config).await.unwrap_err();
        assert!(matches!(
            err,
            RotatorError::CookieGroupMismatch {
                endpoints: 2,
                groups: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_construct_rejects_malformed_proxy_url() {
        let live = FakeProxy::start().await;
        let urls = vec![live.url(), "definitely not a url".to_string()];
        let err = ProxyRotator::new(config_for(&urls).build())
            .await
            .unwrap_err();
        assert!(matches!(err, RotatorError::InvalidProxyUrl { .. }));
    }

    #[tokio::test]
    async fn test_construct_rejects_zero_window() {
        let urls = vec!["http://127.0.0.1:1".to_string()];
        let config = config_for(&urls)
            .selection(SelectionMode::TimeWindowed {
                window: Duration::ZERO,
            })
            .build();
        assert!(matches!(
            ProxyRotator::new(config).await.unwrap_err(),
            RotatorError::ZeroWindow
        ));
    }

    #[tokio::test]
    async fn test_shared_group_identifiers_share_one_store() {
        let dir = tempdir().unwrap();
        let jar = dir.path().join("session.json");
        let jar = jar.to_str().unwrap();
        let (_proxies, urls) = fleet(3).await;
        let config = config_for(&urls).cookie_groups(vec![jar, "", jar]).build();
        let rotator = ProxyRotator::new(config).await.unwrap();

        let first = rotator.next();
        let second = rotator.next();
        let third = rotator.next();

        let a = first.cookie_group().expect("first entry has a store");
        assert!(second.cookie_group().is_none());
        let c = third.cookie_group().expect("third entry has a store");
        assert!(Arc::ptr_eq(a, c), "same identifier, same store instance");
    }

    #[tokio::test]
    async fn test_indexed_rotation_cycles_in_input_order() {
        let (_proxies, urls) = fleet(3).await;
        let rotator = ProxyRotator::new(config_for(&urls).build()).await.unwrap();

        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(rotator.next().proxy_url().to_string());
        }
        assert_eq!(seen[..3], urls[..]);
        assert_eq!(seen[3..], urls[..]);
    }

    #[tokio::test]
    async fn test_shuffle_fires_only_after_a_full_traversal() {
        let (_proxies, urls) = fleet(4).await;
        let rotator = ProxyRotator::new(config_for(&urls).shuffle(true).build())
            .await
            .unwrap();

        // The reshuffle happens after the last selection of a cycle, so
        // the first cycle still runs in construction order.
        let first_cycle: Vec<String> = (0..4)
            .map(|_| rotator.next().proxy_url().to_string())
            .collect();
        assert_eq!(first_cycle[..], urls[..]);

        // Later cycles may be reordered but still visit each entry once.
        let second_cycle: HashSet<String> = (0..4)
            .map(|_| rotator.next().proxy_url().to_string())
            .collect();
        assert_eq!(second_cycle, urls.iter().cloned().collect::<HashSet<_>>());
    }

    #[tokio::test]
    async fn test_time_windowed_selection_follows_the_clock() {
        let (_proxies, urls) = fleet(3).await;
        let clock = ManualClock::new();
        let config = config_for(&urls)
            .selection(SelectionMode::TimeWindowed {
                window: Duration::from_millis(1000),
            })
            // Ignored in this mode; selections below stay deterministic.
            .shuffle(true)
            .build();
        let rotator = ProxyRotator::build(config, clock.clone()).await.unwrap();

        assert_eq!(rotator.next().proxy_url(), urls[0]);
        clock.advance(Duration::from_millis(400));
        assert_eq!(rotator.next().proxy_url(), urls[0]);

        clock.advance(Duration::from_millis(600));
        assert_eq!(rotator.next().proxy_url(), urls[1]);
        assert_eq!(rotator.next().proxy_url(), urls[1]);

        clock.advance(Duration::from_millis(1000));
        assert_eq!(rotator.next().proxy_url(), urls[2]);

        clock.advance(Duration::from_millis(1000));
        assert_eq!(rotator.next().proxy_url(), urls[0]);
    }

    #[tokio::test]
    async fn test_health_check_reports_without_evicting() {
        let live = FakeProxy::start().await;
        let mut dying = FakeProxy::start().await;
        let urls = vec![live.url(), dying.url()];
        let rotator = ProxyRotator::new(config_for(&urls).build()).await.unwrap();
        assert_eq!(rotator.len(), 2);

        let dying_url = dying.url();
        dying.shutdown().await;

        let report = rotator.health_check_all().await;
        assert_eq!(report.len(), 2);
        assert!(report[&live.url()]);
        assert!(!report[&dying_url]);
        // Observational only: the dark entry stays pooled.
        assert_eq!(rotator.len(), 2);
    }

    #[tokio::test]
    async fn test_add_appends_usable_proxy_at_the_end() {
        let (_proxies, urls) = fleet(2).await;
        let rotator = ProxyRotator::new(config_for(&urls).build()).await.unwrap();

        let extra = FakeProxy::start().await;
        let added =
            tokio_test::assert_ok!(rotator.add(&extra.url(), "", Duration::from_secs(2)).await);
        assert!(added);
        assert_eq!(rotator.len(), 3);

        assert_eq!(rotator.next().proxy_url(), urls[0]);
        assert_eq!(rotator.next().proxy_url(), urls[1]);
        assert_eq!(rotator.next().proxy_url(), extra.url());
    }

    #[tokio::test]
    async fn test_add_drops_unreachable_proxy() {
        let (_proxies, urls) = fleet(1).await;
        let rotator = ProxyRotator::new(config_for(&urls).build()).await.unwrap();

        let added = rotator
            .add(&dead_proxy_url().await, "", Duration::from_secs(2))
            .await
            .unwrap();
        assert!(!added);
        assert_eq!(rotator.len(), 1);
    }

    #[tokio::test]
    async fn test_add_reuses_existing_cookie_store() {
        let dir = tempdir().unwrap();
        let jar = dir.path().join("shared.json");
        let jar = jar.to_str().unwrap();
        let (_proxies, urls) = fleet(1).await;
        let config = config_for(&urls).cookie_groups(vec![jar]).build();
        let rotator = ProxyRotator::new(config).await.unwrap();

        let extra = FakeProxy::start().await;
        assert!(rotator
            .add(&extra.url(), jar, Duration::from_secs(2))
            .await
            .unwrap());

        let first = rotator.next();
        let second = rotator.next();
        assert!(Arc::ptr_eq(
            first.cookie_group().unwrap(),
            second.cookie_group().unwrap()
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_lose_nothing() {
        let (_proxies, urls) = fleet(1).await;
        let rotator = Arc::new(ProxyRotator::new(config_for(&urls).build()).await.unwrap());

        let mut extras = Vec::new();
        for _ in 0..8 {
            extras.push(FakeProxy::start().await);
        }

        let mut handles = Vec::new();
        for extra in &extras {
            let rotator = Arc::clone(&rotator);
            let url = extra.url();
            handles.push(tokio::spawn(async move {
                rotator.add(&url, "", Duration::from_secs(2)).await.unwrap()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(rotator.len(), 9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_next_stays_fair_without_mutation() {
        let (_proxies, urls) = fleet(4).await;
        let rotator = Arc::new(ProxyRotator::new(config_for(&urls).build()).await.unwrap());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let rotator = Arc::clone(&rotator);
            handles.push(tokio::spawn(async move {
                (0..25)
                    .map(|_| rotator.next().proxy_url().to_string())
                    .collect::<Vec<_>>()
            }));
        }

        let mut counts: HashMap<String, usize> = HashMap::new();
        for handle in handles {
            for url in handle.await.unwrap() {
                *counts.entry(url).or_insert(0) += 1;
            }
        }

        // 100 distinct cursor positions over 4 entries: 25 hits each.
        assert_eq!(counts.len(), 4);
        for url in &urls {
            assert_eq!(counts[url], 25);
        }
    }

    #[tokio::test]
    async fn test_cookies_flow_between_sharing_clients_and_reach_disk() {
        let dir = tempdir().unwrap();
        let jar = dir.path().join("session.json");
        let jar_name = jar.to_str().unwrap();

        let baker = FakeProxy::with_set_cookie("session=abc123; Max-Age=3600; Path=/").await;
        let reader = FakeProxy::start().await;
        let urls = vec![baker.url(), reader.url()];
        let config = config_for(&urls)
            .cookie_groups(vec![jar_name, jar_name])
            .build();
        let rotator = ProxyRotator::new(config).await.unwrap();

        // The construction probe through `baker` already banked the cookie.
        let first = rotator.next();
        let second = rotator.next();
        assert_eq!(second.proxy_url(), reader.url());

        second
            .client()
            .get("http://probe.invalid/page")
            .send()
            .await
            .unwrap();
        let seen = reader.cookies_seen();
        assert!(
            seen.iter().any(|c| c.contains("session=abc123")),
            "sharing client never presented the cookie: {:?}",
            seen
        );

        first.save_cookies().unwrap();
        assert!(jar.exists());
        let reopened = CookieGroup::open(jar_name).unwrap();
        let store = reopened.store();
        let store = store.lock().unwrap();
        assert!(store.iter_any().any(|c| c.name() == "session"));
    }

    #[tokio::test]
    async fn test_cookies_persist_across_rotators() {
        let dir = tempdir().unwrap();
        let jar = dir.path().join("session.json");
        let jar_name = jar.to_str().unwrap();

        let baker = FakeProxy::with_set_cookie("token=stored; Max-Age=3600; Path=/").await;
        {
            let config = config_for(&[baker.url()])
                .cookie_groups(vec![jar_name])
                .build();
            let rotator = ProxyRotator::new(config).await.unwrap();
            rotator.save_all_cookies().unwrap();
        }

        let plain = FakeProxy::start().await;
        let config = config_for(&[plain.url()])
            .cookie_groups(vec![jar_name])
            .build();
        let rotator = ProxyRotator::new(config).await.unwrap();
        rotator
            .next()
            .client()
            .get("http://probe.invalid/again")
            .send()
            .await
            .unwrap();

        assert!(plain
            .cookies_seen()
            .iter()
            .any(|c| c.contains("token=stored")));
    }

    #[tokio::test]
    async fn test_save_all_cookies_touches_every_group() {
        let dir = tempdir().unwrap();
        let jar_a = dir.path().join("a.json");
        let jar_b = dir.path().join("b.json");
        let (_proxies, urls) = fleet(2).await;
        let config = config_for(&urls)
            .cookie_groups(vec![jar_a.to_str().unwrap(), jar_b.to_str().unwrap()])
            .build();
        let rotator = ProxyRotator::new(config).await.unwrap();

        rotator.save_all_cookies().unwrap();
        assert!(jar_a.exists());
        assert!(jar_b.exists());
    }
}
