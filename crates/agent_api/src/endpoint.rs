use std::sync::{Mutex, MutexGuard};

use log::{debug, warn};
use time::OffsetDateTime;

use crate::error::AgentApiError;
use crate::url::normalize_endpoint_url;

/// One candidate service URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub last_success: Option<OffsetDateTime>,
}

#[derive(Debug, Default)]
struct PoolState {
    last_success: Option<usize>,
    stamps: Vec<Option<OffsetDateTime>>,
}

/// Fixed list of candidate endpoints plus the last-success cache.
///
/// One pool is shared by every stream of a client. Two streams racing on the
/// cache can at worst cost one extra attempt.
#[derive(Debug)]
pub struct EndpointPool {
    urls: Vec<String>,
    state: Mutex<PoolState>,
}

impl EndpointPool {
    pub fn new(urls: impl IntoIterator<Item = impl AsRef<str>>) -> Result<Self, AgentApiError> {
        let urls = urls
            .into_iter()
            .map(|url| normalize_endpoint_url(url.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if urls.is_empty() {
            return Err(AgentApiError::NoEndpoints);
        }

        let state = PoolState {
            last_success: None,
            stamps: vec![None; urls.len()],
        };
        Ok(Self {
            urls,
            state: Mutex::new(state),
        })
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn url(&self, index: usize) -> Option<&str> {
        self.urls.get(index).map(String::as_str)
    }

    /// Snapshot of every endpoint with its last success timestamp.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let state = self.lock_state();
        self.urls
            .iter()
            .zip(state.stamps.iter())
            .map(|(url, stamp)| Endpoint {
                url: url.clone(),
                last_success: *stamp,
            })
            .collect()
    }

    /// URL of the cached last-success endpoint, if any.
    pub fn preferred(&self) -> Option<&str> {
        let index = self.lock_state().last_success?;
        self.url(index)
    }

    /// Indices to try for one request: the cached endpoint first, then the
    /// rest of the list circularly. Always exactly `len()` entries.
    pub fn attempt_order(&self) -> Vec<usize> {
        let start = self.lock_state().last_success.unwrap_or(0);
        let len = self.urls.len();
        (0..len).map(|offset| (start + offset) % len).collect()
    }

    pub fn record_success(&self, index: usize) {
        if index >= self.urls.len() {
            return;
        }
        let mut state = self.lock_state();
        state.last_success = Some(index);
        state.stamps[index] = Some(OffsetDateTime::now_utc());
        debug!("endpoint {} marked as preferred", self.urls[index]);
    }

    pub fn record_failure(&self, index: usize, reason: &str) {
        let Some(url) = self.url(index) else {
            return;
        };
        warn!("endpoint {url} failed: {reason}");

        let mut state = self.lock_state();
        if state.last_success == Some(index) {
            state.last_success = None;
        }
    }

    /// Forget the cached endpoint and all success timestamps.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.last_success = None;
        state.stamps.iter_mut().for_each(|stamp| *stamp = None);
    }

    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
