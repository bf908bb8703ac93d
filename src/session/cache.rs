//! Session cache with single-flight construction.
//!
//! # Per-key state
//! ```text
//! Absent ──claim──▶ Building ──ok──▶ Ready
//!                      │                │
//!                      └──err──▶ (previous state kept)
//! Ready ──endpoint mismatch / forced refresh──▶ Building
//! ```
//!
//! Each key (the single query slot, or one account address) holds the last
//! session that was built successfully plus at most one construction in
//! flight. Callers asking for the same endpoint pair while a construction is
//! running join it instead of starting their own. A newer request for a
//! different pair supersedes the running flight: the superseded build still
//! answers its own waiters but no longer updates the cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use tokio::sync::watch;

use crate::config::schema::EndpointConfig;
use crate::ledger::types::{ConnectionError, ConnectionResult, EndpointPair};
use crate::observability::metrics;
use crate::session::types::{QuerySession, Session, SigningSession};

type Outcome<S> = Option<ConnectionResult<Arc<S>>>;

/// A construction that has been claimed but not completed.
struct InFlight<S> {
    id: u64,
    endpoints: EndpointPair,
    rx: watch::Receiver<Outcome<S>>,
}

impl<S> InFlight<S> {
    /// False once the building task went away without publishing.
    fn is_live(&self) -> bool {
        self.rx.has_changed().is_ok()
    }
}

struct Slot<S> {
    ready: Option<Arc<S>>,
    in_flight: Option<InFlight<S>>,
}

impl<S> Default for Slot<S> {
    fn default() -> Self {
        Self {
            ready: None,
            in_flight: None,
        }
    }
}

impl<S: Session> Slot<S> {
    fn ready_for(&self, endpoints: &EndpointPair) -> Option<Arc<S>> {
        self.ready
            .as_ref()
            .filter(|session| session.endpoints() == endpoints)
            .cloned()
    }

    /// Cached session for `endpoints`. A hit is the most recent request for
    /// this key, so a flight for any other pair stops being current.
    fn hit(&mut self, endpoints: &EndpointPair) -> Option<Arc<S>> {
        let session = self.ready_for(endpoints)?;
        if self
            .in_flight
            .as_ref()
            .is_some_and(|flight| &flight.endpoints != endpoints)
        {
            self.in_flight = None;
        }
        Some(session)
    }

    fn store(&mut self, session: Arc<S>) {
        self.ready = Some(session);
    }

    fn join_or_lead(&mut self, endpoints: EndpointPair, id: u64) -> Claim<S> {
        if let Some(flight) = &self.in_flight {
            if flight.endpoints == endpoints && flight.is_live() {
                return Claim::Join(Waiter {
                    rx: flight.rx.clone(),
                });
            }
        }

        let (tx, rx) = watch::channel(None);
        self.in_flight = Some(InFlight {
            id,
            endpoints: endpoints.clone(),
            rx,
        });
        Claim::Lead(Ticket { id, endpoints, tx })
    }

    /// Clear the flight if `id` is still the current one.
    fn finish(&mut self, id: u64) -> bool {
        match &self.in_flight {
            Some(flight) if flight.id == id => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }
}

/// Result of claiming a cache key.
pub enum Claim<S> {
    /// A valid session is cached.
    Ready(Arc<S>),
    /// Another caller is already building a session for the same endpoints.
    Join(Waiter<S>),
    /// The caller must build the session and hand it back via `complete_*`.
    Lead(Ticket<S>),
}

/// Handle for awaiting an in-flight construction.
pub struct Waiter<S> {
    rx: watch::Receiver<Outcome<S>>,
}

impl<S: Session> Waiter<S> {
    /// Wait for the construction to finish and return its result.
    pub async fn wait(mut self) -> ConnectionResult<Arc<S>> {
        let result = match self.rx.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone().unwrap_or_else(|| Err(aborted())),
            Err(_) => Err(aborted()),
        };
        result
    }
}

/// Exclusive right to build the session for one key.
pub struct Ticket<S> {
    id: u64,
    endpoints: EndpointPair,
    tx: watch::Sender<Outcome<S>>,
}

impl<S: Session> Ticket<S> {
    /// Endpoint pair the session must be built against.
    pub fn endpoints(&self) -> &EndpointPair {
        &self.endpoints
    }

    /// Waiter that observes this ticket's outcome.
    pub fn subscribe(&self) -> Waiter<S> {
        Waiter {
            rx: self.tx.subscribe(),
        }
    }

    fn publish(self, result: ConnectionResult<Arc<S>>) {
        let _ = self.tx.send(Some(result));
    }
}

fn aborted() -> ConnectionError {
    ConnectionError::Internal("Session construction ended without a result".to_string())
}

/// Holds the query slot and the per-address signing sessions.
pub struct SessionCache {
    query: Mutex<Slot<QuerySession>>,
    signing: DashMap<String, Slot<SigningSession>>,
    next_flight: AtomicU64,
}

impl SessionCache {
    pub fn new() -> Self {
        Self {
            query: Mutex::new(Slot::default()),
            signing: DashMap::new(),
            next_flight: AtomicU64::new(1),
        }
    }

    fn query_slot(&self) -> MutexGuard<'_, Slot<QuerySession>> {
        // Slot updates cannot leave it half-written, so a poisoned lock is still usable.
        self.query.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> u64 {
        self.next_flight.fetch_add(1, Ordering::Relaxed)
    }

    /// Cached query session for `config`'s endpoints, unless `force_refresh`.
    pub fn lookup_query(&self, config: &EndpointConfig, force_refresh: bool) -> Option<Arc<QuerySession>> {
        if force_refresh {
            return None;
        }
        self.query_slot().ready_for(&config.endpoints())
    }

    /// Replace the query slot.
    pub fn store_query(&self, session: Arc<QuerySession>) {
        self.query_slot().store(session);
    }

    /// Cached signing session for `address`, if built against `config`'s endpoints.
    pub fn lookup_signing(&self, address: &str, config: &EndpointConfig) -> Option<Arc<SigningSession>> {
        self.signing
            .get(address)
            .and_then(|slot| slot.ready_for(&config.endpoints()))
    }

    /// Insert or replace the signing session for `address`.
    pub fn store_signing(&self, address: &str, session: Arc<SigningSession>) {
        self.signing.entry(address.to_string()).or_default().store(session);
        metrics::record_cache_entries(self.signing_len());
    }

    /// Return the cached query session, join a running build, or lead a new one.
    pub fn claim_query(&self, config: &EndpointConfig, force_refresh: bool) -> Claim<QuerySession> {
        let endpoints = config.endpoints();
        let mut slot = self.query_slot();
        if !force_refresh {
            if let Some(session) = slot.hit(&endpoints) {
                return Claim::Ready(session);
            }
        }
        slot.join_or_lead(endpoints, self.next_id())
    }

    /// Signing counterpart of [`claim_query`](Self::claim_query).
    pub fn claim_signing(&self, address: &str, config: &EndpointConfig) -> Claim<SigningSession> {
        let endpoints = config.endpoints();
        let mut slot = self.signing.entry(address.to_string()).or_default();
        if let Some(session) = slot.hit(&endpoints) {
            return Claim::Ready(session);
        }
        slot.join_or_lead(endpoints, self.next_id())
    }

    /// Finish a query construction and wake everyone waiting on it.
    pub fn complete_query(&self, ticket: Ticket<QuerySession>, result: ConnectionResult<Arc<QuerySession>>) {
        {
            let mut slot = self.query_slot();
            if slot.finish(ticket.id) {
                if let Ok(session) = &result {
                    slot.store(session.clone());
                }
            } else {
                tracing::debug!(endpoints = %ticket.endpoints, "Query build superseded, not caching");
            }
        }
        ticket.publish(result);
    }

    /// Finish a signing construction and wake everyone waiting on it.
    pub fn complete_signing(
        &self,
        address: &str,
        ticket: Ticket<SigningSession>,
        result: ConnectionResult<Arc<SigningSession>>,
    ) {
        let current = match self.signing.get_mut(address) {
            Some(mut slot) => {
                let current = slot.finish(ticket.id);
                if current {
                    if let Ok(session) = &result {
                        slot.store(session.clone());
                    }
                }
                current
            }
            None => false,
        };

        if current {
            metrics::record_cache_entries(self.signing_len());
        } else {
            tracing::debug!(
                address = %address,
                endpoints = %ticket.endpoints,
                "Signing build superseded, not caching"
            );
        }
        ticket.publish(result);
    }

    /// Endpoint pair of the cached query session.
    pub fn query_endpoints(&self) -> Option<EndpointPair> {
        self.query_slot()
            .ready
            .as_ref()
            .map(|session| session.endpoints().clone())
    }

    /// Addresses with a cached signing session.
    pub fn signing_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self
            .signing
            .iter()
            .filter(|entry| entry.value().ready.is_some())
            .map(|entry| entry.key().clone())
            .collect();
        addresses.sort();
        addresses
    }

    fn signing_len(&self) -> usize {
        self.signing.iter().filter(|entry| entry.value().ready.is_some()).count()
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("query", &self.query_endpoints())
            .field("signing", &self.signing_addresses())
            .finish()
    }
}
