//! Configuration for the proxy rotator.

use std::time::Duration;

use crate::error::{Result, RotatorError};

/// Policy for choosing the next client from the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Advance a cursor by one on every call, cycling through the pool.
    Indexed,
    /// Derive the position from the time elapsed since construction,
    /// divided into fixed-size windows. Every call within one window
    /// returns the same client.
    TimeWindowed {
        /// Width of one selection window.
        window: Duration,
    },
}

/// Immutable descriptor of one upstream proxy.
#[derive(Debug, Clone)]
pub struct ProxyEndpoint {
    /// Proxy URL of the form `scheme://[user:pass@]host:port`.
    pub url: String,
    /// Cookie-group identifier; the empty string means no persistent
    /// cookies for this endpoint.
    pub cookie_group: String,
    /// Request timeout for the built client; zero disables the timeout.
    pub timeout: Duration,
}

/// Configuration for the proxy rotator.
#[derive(Debug, Clone)]
pub struct RotatorConfig {
    /// Ordered proxy URLs, one client per entry.
    pub proxies: Vec<String>,
    /// Cookie-group identifiers paired with `proxies` by position. `None`
    /// means no endpoint gets persistent cookies; when set, the length
    /// must match `proxies` and clients sharing a non-empty identifier
    /// share one cookie store.
    pub cookie_groups: Option<Vec<String>>,
    /// Request timeout applied to every built client; zero disables it.
    pub timeout: Duration,
    /// Selection policy for [`next`](crate::ProxyRotator::next).
    pub selection: SelectionMode,
    /// Reshuffle the pool after each full traversal. Only meaningful in
    /// indexed mode; time-windowed selection ignores it.
    pub shuffle: bool,
    /// URL requested through each candidate client to probe reachability.
    pub probe_url: String,
    /// Upper bound on a single probe, independent of the client timeout.
    pub probe_timeout: Duration,
}

impl RotatorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> RotatorConfigBuilder {
        RotatorConfigBuilder::new()
    }

    /// Pair proxies with their cookie groups into endpoint descriptors,
    /// validating the list shapes.
    pub(crate) fn endpoints(&self) -> Result<Vec<ProxyEndpoint>> {
        if self.proxies.is_empty() {
            return Err(RotatorError::NoEndpoints);
        }

        let groups = match &self.cookie_groups {
            Some(groups) if groups.len() != self.proxies.len() => {
                return Err(RotatorError::CookieGroupMismatch {
                    endpoints: self.proxies.len(),
                    groups: groups.len(),
                });
            }
            Some(groups) => groups.clone(),
            None => vec![String::new(); self.proxies.len()],
        };

        Ok(self
            .proxies
            .iter()
            .zip(groups)
            .map(|(url, cookie_group)| ProxyEndpoint {
                url: url.clone(),
                cookie_group,
                timeout: self.timeout,
            })
            .collect())
    }
}

/// Builder for `RotatorConfig`.
pub struct RotatorConfigBuilder {
    proxies: Vec<String>,
    cookie_groups: Option<Vec<String>>,
    timeout: Option<Duration>,
    selection: Option<SelectionMode>,
    shuffle: Option<bool>,
    probe_url: Option<String>,
    probe_timeout: Option<Duration>,
}

impl RotatorConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            proxies: Vec::new(),
            cookie_groups: None,
            timeout: None,
            selection: None,
            shuffle: None,
            probe_url: None,
            probe_timeout: None,
        }
    }

    /// Set the ordered proxy URLs, one client per entry.
    pub fn proxies(mut self, proxies: Vec<impl Into<String>>) -> Self {
        self.proxies = proxies.into_iter().map(Into::into).collect();
        self
    }

    /// Set the cookie-group identifiers, paired with the proxies by
    /// position. Use the empty string for endpoints without persistent
    /// cookies.
    pub fn cookie_groups(mut self, groups: Vec<impl Into<String>>) -> Self {
        self.cookie_groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    /// Set the per-request timeout applied to every built client. Zero
    /// disables the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the selection policy.
    pub fn selection(mut self, selection: SelectionMode) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Enable reshuffling of the pool after each full traversal.
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = Some(shuffle);
        self
    }

    /// Set the URL used for reachability probes.
    pub fn probe_url(mut self, url: impl Into<String>) -> Self {
        self.probe_url = Some(url.into());
        self
    }

    /// Set the upper bound on a single probe.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> RotatorConfig {
        RotatorConfig {
            proxies: self.proxies,
            cookie_groups: self.cookie_groups,
            timeout: self.timeout.unwrap_or(Duration::from_secs(30)),
            selection: self.selection.unwrap_or(SelectionMode::Indexed),
            shuffle: self.shuffle.unwrap_or(false),
            probe_url: self
                .probe_url
                .unwrap_or_else(|| "https://www.google.com".to_string()),
            probe_timeout: self.probe_timeout.unwrap_or(Duration::from_secs(10)),
        }
    }
}

impl Default for RotatorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
