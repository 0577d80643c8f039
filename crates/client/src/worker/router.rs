//! Request routing.
//!
//! Every intercepted request takes exactly one of three paths:
//!
//! - **Network-first** for anything under `/api/`: the live response always
//!   wins; successful GETs are copied into the dynamic partition; on a
//!   network failure GETs fall back to the cache and everything else gets a
//!   literal 503.
//! - **Cache-first** for every other GET: a stored entry is returned without
//!   touching the network; a miss fetches and opportunistically stores
//!   complete same-origin 200s; a failed navigation falls back to the cached
//!   offline document.
//! - **Passthrough** for every other non-GET: forwarded untouched.
//!
//! Cache writes are detached tasks. The response is handed back before the
//! write completes, and a failed write is only logged.

use std::sync::Arc;

use mealsw_core::{CacheDb, Destination, Error, Request, Response};
use tokio::task::JoinHandle;
use url::Url;

use crate::fetch::Network;

/// Path prefix of requests served network-first.
pub const API_PREFIX: &str = "/api/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
    Passthrough,
}

/// Pick the strategy for a request: path prefix first, then method.
pub fn select_strategy(request: &Request) -> Strategy {
    if request.url.path().starts_with(API_PREFIX) {
        Strategy::NetworkFirst
    } else if request.method.is_get() {
        Strategy::CacheFirst
    } else {
        Strategy::Passthrough
    }
}

/// A detached write into a partition.
///
/// Dropping the handle leaves the write running. Awaiting [`CacheWrite::stored`]
/// observes its completion; the write may already have finished, or failed.
#[derive(Debug)]
pub struct CacheWrite {
    handle: JoinHandle<bool>,
}

impl CacheWrite {
    fn spawn(db: CacheDb, partition: String, request: Request, response: Response) -> Self {
        let handle = tokio::spawn(async move {
            let result = async {
                let partition = db.open_partition(&partition).await?;
                partition.put(&request, &response).await
            }
            .await;

            match result {
                Ok(()) => {
                    tracing::debug!(url = %request.url, partition, "cached response");
                    true
                }
                Err(e) => {
                    tracing::warn!(url = %request.url, partition, error = %e, "cache write failed");
                    false
                }
            }
        });

        Self { handle }
    }

    /// Wait for the write; true if the entry was stored.
    pub async fn stored(self) -> bool {
        self.handle.await.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Network,
    CacheHit,
    Fallback,
    Synthetic,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Network => "network",
            OutcomeKind::CacheHit => "cache-hit",
            OutcomeKind::Fallback => "fallback",
            OutcomeKind::Synthetic => "synthetic",
        }
    }
}

/// What the router handed back for one request.
#[derive(Debug)]
pub enum RouteOutcome {
    /// Live network response, with the cache write it triggered (if any).
    Network { response: Response, write: Option<CacheWrite> },
    /// Served from a partition without touching the network.
    CacheHit(Response),
    /// Network failed; whatever the cache held. `None` means no value.
    Fallback(Option<Response>),
    /// Network failed and no cache entry may answer: a literal 503.
    Synthetic(Response),
}

impl RouteOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            RouteOutcome::Network { .. } => OutcomeKind::Network,
            RouteOutcome::CacheHit(_) => OutcomeKind::CacheHit,
            RouteOutcome::Fallback(_) => OutcomeKind::Fallback,
            RouteOutcome::Synthetic(_) => OutcomeKind::Synthetic,
        }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            RouteOutcome::Network { response, .. } => Some(response),
            RouteOutcome::CacheHit(response) | RouteOutcome::Synthetic(response) => Some(response),
            RouteOutcome::Fallback(response) => response.as_ref(),
        }
    }

    /// The response for the requester. Any pending write keeps running.
    pub fn into_response(self) -> Option<Response> {
        match self {
            RouteOutcome::Network { response, .. } => Some(response),
            RouteOutcome::CacheHit(response) | RouteOutcome::Synthetic(response) => Some(response),
            RouteOutcome::Fallback(response) => response,
        }
    }

    /// Take the pending cache write, if this outcome started one.
    pub fn take_write(&mut self) -> Option<CacheWrite> {
        match self {
            RouteOutcome::Network { write, .. } => write.take(),
            _ => None,
        }
    }
}

/// Dispatches intercepted requests. Needs only the store and the network.
#[derive(Clone)]
pub struct Router {
    db: CacheDb,
    network: Arc<dyn Network>,
    dynamic: String,
    offline_document: Url,
}

impl Router {
    pub fn new(db: CacheDb, network: Arc<dyn Network>, dynamic: impl Into<String>, offline_document: Url) -> Self {
        Self { db, network, dynamic: dynamic.into(), offline_document }
    }

    /// Route one request.
    ///
    /// The only error is a failed passthrough request, which is surfaced to
    /// the requester as-is.
    pub async fn route(&self, request: Request) -> Result<RouteOutcome, Error> {
        let strategy = select_strategy(&request);
        tracing::debug!(method = %request.method, url = %request.url, ?strategy, "routing request");

        match strategy {
            Strategy::NetworkFirst => Ok(self.network_first(request).await),
            Strategy::CacheFirst => Ok(self.cache_first(request).await),
            Strategy::Passthrough => {
                let response = self.network.fetch(&request).await?;
                Ok(RouteOutcome::Network { response, write: None })
            }
        }
    }

    async fn network_first(&self, request: Request) -> RouteOutcome {
        match self.network.fetch(&request).await {
            Ok(response) => {
                let write = (response.is_ok() && request.method.is_get())
                    .then(|| self.store(request.clone(), response.clone()));
                RouteOutcome::Network { response, write }
            }
            Err(e) if request.method.is_get() => {
                tracing::debug!(url = %request.url, error = %e, "network failed; falling back to cache");
                RouteOutcome::Fallback(self.lookup(&request).await)
            }
            Err(e) => {
                tracing::debug!(method = %request.method, url = %request.url, error = %e, "network failed; 503");
                RouteOutcome::Synthetic(Response::service_unavailable())
            }
        }
    }

    async fn cache_first(&self, request: Request) -> RouteOutcome {
        if let Some(cached) = self.lookup(&request).await {
            tracing::debug!(url = %request.url, "cache hit");
            return RouteOutcome::CacheHit(cached);
        }

        match self.network.fetch(&request).await {
            Ok(response) => {
                let write = response
                    .is_complete_basic()
                    .then(|| self.store(request.clone(), response.clone()));
                RouteOutcome::Network { response, write }
            }
            Err(e) if request.destination == Destination::Document => {
                tracing::debug!(url = %request.url, error = %e, "navigation failed; serving offline document");
                RouteOutcome::Fallback(self.lookup(&Request::get(self.offline_document.clone())).await)
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "network failed; 503");
                RouteOutcome::Synthetic(Response::service_unavailable())
            }
        }
    }

    /// Look a request up in any partition. Store errors count as a miss.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.db.match_any(request).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed");
                None
            }
        }
    }

    fn store(&self, request: Request, response: Response) -> CacheWrite {
        CacheWrite::spawn(self.db.clone(), self.dynamic.clone(), request, response)
    }
}
