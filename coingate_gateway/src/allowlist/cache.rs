use std::{
    collections::HashSet,
    fmt::Debug,
    net::IpAddr,
    str::FromStr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        RwLock,
    },
};

use chrono::{DateTime, Duration, Utc};
use log::*;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    allowlist::{Clock, SystemClock},
    traits::CallbackIpSource,
};

#[derive(Debug, Clone, Error)]
pub enum AllowlistError {
    #[error("Could not fetch the callback IP list. {0}")]
    FetchFailed(String),
    #[error("The callback IP list is empty")]
    EmptyList,
    #[error("The callback IP list contains an invalid address: {0}")]
    InvalidAddress(String),
    #[error("A concurrent refresh of the callback IP list just failed")]
    RefreshFailed,
}

/// An immutable snapshot of the trusted callback IPs. A refresh builds a new entry and swaps it in whole; an entry is
/// never modified after it is created.
#[derive(Debug, Clone)]
pub struct AllowlistEntry {
    ips: HashSet<IpAddr>,
    fetched_at: DateTime<Utc>,
}

impl AllowlistEntry {
    pub fn new(ips: HashSet<IpAddr>, fetched_at: DateTime<Utc>) -> Self {
        Self { ips, fetched_at }
    }

    /// Builds an entry from the raw strings of an IP list. The whole list is rejected if it is empty or if any entry
    /// is not a valid IP address.
    pub fn try_from_list(list: &[String], fetched_at: DateTime<Utc>) -> Result<Self, AllowlistError> {
        if list.is_empty() {
            return Err(AllowlistError::EmptyList);
        }
        let ips = list
            .iter()
            .map(|s| {
                IpAddr::from_str(s.trim())
                    .map(|ip| ip.to_canonical())
                    .map_err(|_| AllowlistError::InvalidAddress(s.clone()))
            })
            .collect::<Result<HashSet<IpAddr>, AllowlistError>>()?;
        Ok(Self::new(ips, fetched_at))
    }

    /// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`), as seen on a dual-stack socket, match their IPv4 entry.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.ips.contains(&ip.to_canonical())
    }

    pub(crate) fn len(&self) -> usize {
        self.ips.len()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// An entry whose expiry lies beyond the range of `DateTime` never goes stale.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.fetched_at.checked_add_signed(ttl).map_or(true, |expires_at| now < expires_at)
    }
}

/// Caches the callback IP allowlist for `ttl`, refreshing it from `source` on demand.
///
/// * Readers take a cheap snapshot (an `Arc`) of the current entry, so a refresh never exposes a half-built set.
/// * Only one refresh runs at a time. Callers that queue up behind a refresh use its outcome instead of starting
///   another fetch.
/// * A failed refresh leaves the previous entry in place, but a stale entry is never used to grant trust. Until a
///   fetch succeeds, every IP is untrusted.
pub struct AllowlistCache<S, K = SystemClock> {
    source: S,
    clock: K,
    ttl: Duration,
    current: RwLock<Option<Arc<AllowlistEntry>>>,
    refresh_lock: Mutex<()>,
    // Number of completed refresh attempts, successful or not.
    attempts: AtomicU64,
}

impl<S, K> Debug for AllowlistCache<S, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AllowlistCache(ttl: {}h)", self.ttl.num_hours())
    }
}

impl<S, K> AllowlistCache<S, K>
where
    S: CallbackIpSource,
    K: Clock,
{
    pub fn new(source: S, clock: K, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Is `ip` allowed to deliver callbacks right now? Triggers a refresh if the cached list is missing or expired.
    pub async fn is_trusted(&self, ip: &IpAddr) -> bool {
        match self.fresh_entry().await {
            Ok(entry) => {
                let trusted = entry.contains(ip);
                trace!("🛡️ {ip} is {}in the callback allowlist", if trusted { "" } else { "NOT " });
                trusted
            },
            Err(e) => {
                warn!("🛡️ No valid callback IP allowlist is available, so {ip} is not trusted. {e}");
                false
            },
        }
    }

    /// Returns the cached entry if it is still within its TTL, otherwise fetches a new one.
    pub async fn fresh_entry(&self) -> Result<Arc<AllowlistEntry>, AllowlistError> {
        if let Some(entry) = self.fresh_snapshot() {
            return Ok(entry);
        }
        let seen_attempts = self.attempts.load(Ordering::SeqCst);
        let _guard = self.refresh_lock.lock().await;
        // Someone else may have refreshed while we were waiting for the lock
        if let Some(entry) = self.fresh_snapshot() {
            return Ok(entry);
        }
        if self.attempts.load(Ordering::SeqCst) != seen_attempts {
            debug!("🛡️ A refresh of the callback IP allowlist failed while this request was waiting for it");
            return Err(AllowlistError::RefreshFailed);
        }
        self.refresh().await
    }

    /// The current entry, fresh or not.
    pub fn snapshot(&self) -> Option<Arc<AllowlistEntry>> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn fresh_snapshot(&self) -> Option<Arc<AllowlistEntry>> {
        let now = self.clock.now();
        self.snapshot().filter(|entry| entry.is_fresh(now, self.ttl))
    }

    fn store(&self, entry: Arc<AllowlistEntry>) {
        match self.current.write() {
            Ok(mut guard) => *guard = Some(entry),
            Err(poisoned) => *poisoned.into_inner() = Some(entry),
        }
    }

    async fn refresh(&self) -> Result<Arc<AllowlistEntry>, AllowlistError> {
        debug!("🛡️ Refreshing the callback IP allowlist");
        let result = match self.source.fetch_callback_ips().await {
            Ok(list) => AllowlistEntry::try_from_list(&list, self.clock.now()),
            Err(e) => Err(AllowlistError::FetchFailed(e.to_string())),
        };
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match result {
            Ok(entry) => {
                let entry = Arc::new(entry);
                self.store(Arc::clone(&entry));
                info!(
                    "🛡️ Callback IP allowlist refreshed. {} addresses trusted for {}h",
                    entry.len(),
                    self.ttl.num_hours()
                );
                Ok(entry)
            },
            Err(e) => {
                match self.snapshot() {
                    Some(stale) => error!(
                        "🛡️ Could not refresh the callback IP allowlist. {e}. The previous list ({} addresses, fetched \
                         at {}) has expired and will not be used. All callbacks are rejected until a refresh succeeds.",
                        stale.len(),
                        stale.fetched_at()
                    ),
                    None => error!(
                        "🛡️ Could not fetch the callback IP allowlist. {e}. All callbacks are rejected until a fetch \
                         succeeds."
                    ),
                }
                Err(e)
            },
        }
    }
}
