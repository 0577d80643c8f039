//! The offline layer.
//!
//! A [`Worker`] is constructed once per process and owns everything the
//! layer needs: the partition store, the network seam, the host seam and the
//! two background timers. The host shim calls its lifecycle methods:
//!
//! 1. [`Worker::on_install`] precaches the static manifest
//! 2. [`Worker::on_activate`] purges stale partitions, claims clients, arms timers
//! 3. [`Worker::on_fetch`] routes every intercepted request
//! 4. [`Worker::on_message`] answers the control protocol

pub mod host;
pub mod message;
pub mod notify;
pub mod router;
pub mod sweep;
pub mod timers;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use mealsw_core::{CacheDb, CacheNames, Error, Request};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use url::Url;

use crate::fetch::{Network, resolve};

use self::host::Host;
use self::message::{ControlMessage, ReplyPort, VersionReply};
use self::notify::{ACTION_EXPLORE, Notification, PushPayload};
use self::router::{RouteOutcome, Router};
use self::sweep::{EvictionPolicy, SweepReport};
use self::timers::Timers;

/// Assets precached on install, relative to the origin.
pub const STATIC_FILES: [&str; 6] = [
    "/",
    "/index.html",
    "/app.js",
    "/manifest.json",
    "/static/icons/icon-192x192.png",
    "/static/icons/icon-512x512.png",
];

/// Sync tag that triggers the offline data sync.
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Origin the layer is registered for.
    pub origin: Url,
    pub names: CacheNames,
    pub static_files: Vec<String>,
    /// Document served when a navigation fails offline.
    pub offline_document: String,
    pub eviction: EvictionPolicy,
    pub sweep_interval: Duration,
    pub update_interval: Duration,
}

impl WorkerConfig {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            names: CacheNames::default(),
            static_files: STATIC_FILES.iter().map(|s| s.to_string()).collect(),
            offline_document: "/index.html".to_string(),
            eviction: EvictionPolicy::default(),
            sweep_interval: Duration::from_secs(60),
            update_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleState {
    Parsed,
    Installing,
    Installed,
    InstallFailed,
    Activating,
    Activated,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::InstallFailed => "install-failed",
            LifecycleState::Activating => "activating",
            LifecycleState::Activated => "activated",
        }
    }
}

/// The offline caching and request interception layer.
///
/// Cheap to clone; clones share the same store, timers and state.
#[derive(Clone)]
pub struct Worker {
    config: Arc<WorkerConfig>,
    db: CacheDb,
    network: Arc<dyn Network>,
    host: Arc<dyn Host>,
    router: Router,
    state: Arc<RwLock<LifecycleState>>,
    timers: Arc<Mutex<Option<Timers>>>,
}

impl Worker {
    pub fn new(
        config: WorkerConfig, db: CacheDb, network: Arc<dyn Network>, host: Arc<dyn Host>,
    ) -> Result<Self, Error> {
        let offline_document = resolve(&config.origin, &config.offline_document)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", config.offline_document, e)))?;
        let router = Router::new(db.clone(), network.clone(), config.names.dynamic(), offline_document);

        Ok(Self {
            config: Arc::new(config),
            db,
            network,
            host,
            router,
            state: Arc::new(RwLock::new(LifecycleState::Parsed)),
            timers: Arc::new(Mutex::new(None)),
        })
    }

    /// Resolve a path or URL against the worker's origin.
    pub fn resolve(&self, target: &str) -> Result<Url, Error> {
        resolve(&self.config.origin, target).map_err(|e| Error::InvalidUrl(format!("{target}: {e}")))
    }

    /// Precache the static manifest, then ask the host to skip waiting.
    ///
    /// Returns the number of assets stored. If any asset fails to fetch or
    /// store, the ones that succeeded stay in the static partition and the
    /// install fails with every failed path named.
    pub async fn on_install(&self) -> Result<usize, Error> {
        self.set_state(LifecycleState::Installing).await;
        tracing::info!(partition = %self.config.names.static_assets(), "installing");

        match self.precache().await {
            Ok(stored) => {
                self.set_state(LifecycleState::Installed).await;
                tracing::info!(stored, "install complete");
                self.host.skip_waiting().await;
                Ok(stored)
            }
            Err(e) => {
                self.set_state(LifecycleState::InstallFailed).await;
                tracing::error!(error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<usize, Error> {
        let partition = self.db.open_partition(&self.config.names.static_assets()).await?;
        let requests = self
            .config
            .static_files
            .iter()
            .map(|path| self.resolve(path).map(Request::get))
            .collect::<Result<Vec<_>, _>>()?;

        let fetched = join_all(requests.iter().map(|request| self.network.fetch(request))).await;

        let mut stored = 0;
        let mut failed = Vec::new();
        for (request, result) in requests.iter().zip(fetched) {
            let path = request.url.path();
            match result {
                Ok(response) if response.is_ok() => match partition.put(request, &response).await {
                    Ok(()) => stored += 1,
                    Err(e) => failed.push(format!("{path}: {e}")),
                },
                Ok(response) => failed.push(format!("{path}: HTTP {}", response.status)),
                Err(e) => failed.push(format!("{path}: {e}")),
            }
        }

        if failed.is_empty() { Ok(stored) } else { Err(Error::InstallFailed(failed.join("; "))) }
    }

    /// Delete every partition outside the allow-list, claim open clients and
    /// arm the background timers. Returns the names of deleted partitions.
    ///
    /// Timers are armed on the first activation only. A failed claim is
    /// logged and does not stop activation.
    pub async fn on_activate(&self) -> Result<Vec<String>, Error> {
        self.set_state(LifecycleState::Activating).await;

        let mut deleted = Vec::new();
        for name in self.db.partition_names().await? {
            if self.config.names.is_live(&name) {
                continue;
            }
            if self.db.delete_partition(&name).await? {
                tracing::info!(partition = %name, "deleted stale partition");
                deleted.push(name);
            }
        }

        // Pages left unclaimed pick the worker up on their next load.
        if let Err(e) = self.host.claim_clients().await {
            tracing::warn!(error = %e, "could not claim open clients");
        }

        let mut timers = self.timers.lock().await;
        if timers.is_none() {
            *timers = Some(Timers::start(
                self.db.clone(),
                self.config.eviction,
                self.config.sweep_interval,
                self.host.clone(),
                self.config.update_interval,
            ));
        }
        drop(timers);

        self.set_state(LifecycleState::Activated).await;
        tracing::info!(version = %self.version(), purged = deleted.len(), "activated");
        Ok(deleted)
    }

    /// Route an intercepted request.
    pub async fn on_fetch(&self, request: Request) -> Result<RouteOutcome, Error> {
        self.router.route(request).await
    }

    /// Handle a control message. `get-version` answers on `reply` if one was supplied.
    pub async fn on_message(&self, message: ControlMessage, reply: Option<ReplyPort>) {
        match message {
            ControlMessage::SkipWaiting => self.host.skip_waiting().await,
            ControlMessage::GetVersion => {
                let Some(port) = reply else {
                    tracing::debug!("get-version without a reply port");
                    return;
                };
                if port.send(VersionReply { version: self.version() }).is_err() {
                    tracing::debug!("version reply dropped; requester went away");
                }
            }
        }
    }

    /// Handle a background sync event. Returns whether the tag was recognised.
    pub async fn on_sync(&self, tag: &str) -> bool {
        if tag != BACKGROUND_SYNC_TAG {
            tracing::debug!(tag, "ignoring sync tag");
            return false;
        }

        tracing::info!("background sync started");
        self.sync_offline_data().await;
        tracing::info!("background sync completed");
        true
    }

    // Offline mutations are not queued anywhere yet, so there is nothing to replay.
    async fn sync_offline_data(&self) {}

    /// Show a notification for a push message. An empty payload shows nothing.
    pub async fn on_push(&self, payload: Option<&[u8]>) -> Result<bool, Error> {
        let Some(data) = payload.filter(|d| !d.is_empty()) else {
            return Ok(false);
        };

        let payload: PushPayload =
            serde_json::from_slice(data).map_err(|e| Error::InvalidInput(format!("push payload: {e}")))?;
        let notification = Notification::from_push(payload, Utc::now());
        self.host.show_notification(notification).await?;
        Ok(true)
    }

    /// Handle a click on a notification or one of its actions.
    pub async fn on_notification_click(&self, action: Option<&str>) -> Result<(), Error> {
        match action {
            Some(ACTION_EXPLORE) => self.host.open_window("/").await,
            other => {
                tracing::debug!(action = ?other, "notification closed");
                Ok(())
            }
        }
    }

    /// Run one eviction sweep now.
    pub async fn sweep_now(&self) -> Result<SweepReport, Error> {
        sweep::sweep(&self.db, self.config.eviction).await
    }

    pub fn version(&self) -> String {
        self.config.names.version()
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Stop the background timers.
    pub async fn shutdown(&self) {
        if let Some(timers) = self.timers.lock().await.take() {
            timers.stop();
        }
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn origin(&self) -> &Url {
        &self.config.origin
    }

    pub fn names(&self) -> &CacheNames {
        &self.config.names
    }

    async fn set_state(&self, state: LifecycleState) {
        *self.state.write().await = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::message::reply_channel;
    use crate::testing::{ORIGIN, RecordingHost, ScriptedNetwork};
    use crate::worker::router::OutcomeKind;
    use mealsw_core::{Method, Response};

    struct Fixture {
        worker: Worker,
        network: Arc<ScriptedNetwork>,
        host: Arc<RecordingHost>,
        db: CacheDb,
    }

    async fn fixture() -> Fixture {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(ScriptedNetwork::new());
        let host = Arc::new(RecordingHost::new());
        let config = WorkerConfig::new(Url::parse(ORIGIN).unwrap());
        let worker = Worker::new(config, db.clone(), network.clone(), host.clone()).unwrap();
        Fixture { worker, network, host, db }
    }

    fn script_manifest(network: &ScriptedNetwork) {
        for path in STATIC_FILES {
            network.respond("GET", path, Response::new(200, format!("asset {path}")));
        }
    }

    #[tokio::test]
    async fn test_install_precaches_manifest() {
        let f = fixture().await;
        script_manifest(&f.network);

        assert_eq!(f.worker.on_install().await.unwrap(), 6);
        assert_eq!(f.worker.state().await, LifecycleState::Installed);
        assert_eq!(f.host.events(), vec!["skip-waiting"]);

        let keys = f.db.partition("erica-meal-static-v3.4.4").keys().await.unwrap();
        assert_eq!(keys.len(), 6);
        assert!(keys.iter().all(|k| k.method == "GET"));
    }

    #[tokio::test]
    async fn test_install_failure_keeps_successful_entries() {
        let f = fixture().await;
        script_manifest(&f.network);
        f.network.fail("GET", "/app.js");

        let err = f.worker.on_install().await.unwrap_err();
        assert!(matches!(&err, Error::InstallFailed(msg) if msg.contains("/app.js")));
        assert_eq!(f.worker.state().await, LifecycleState::InstallFailed);
        assert!(f.host.events().is_empty());

        let partition = f.db.partition("erica-meal-static-v3.4.4");
        assert_eq!(partition.entry_count().await.unwrap(), 5);
        let app = Request::get(f.worker.resolve("/app.js").unwrap());
        assert!(partition.match_request(&app).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_install_rejects_non_ok_asset() {
        let f = fixture().await;
        script_manifest(&f.network);
        f.network.respond("GET", "/manifest.json", Response::new(404, "missing"));

        let err = f.worker.on_install().await.unwrap_err();
        assert!(matches!(&err, Error::InstallFailed(msg) if msg.contains("/manifest.json: HTTP 404")));
    }

    #[tokio::test]
    async fn test_activate_purges_stale_partitions() {
        let f = fixture().await;
        for name in ["erica-meal-static-v3.4.2", "erica-meal-static-v3.4.4", "erica-meal-dynamic-v3.4.4", "other"] {
            f.db.open_partition(name).await.unwrap();
        }

        let deleted = f.worker.on_activate().await.unwrap();
        assert_eq!(deleted, vec!["erica-meal-static-v3.4.2", "other"]);
        assert_eq!(
            f.db.partition_names().await.unwrap(),
            vec!["erica-meal-static-v3.4.4", "erica-meal-dynamic-v3.4.4"]
        );
        assert_eq!(f.host.events(), vec!["claim"]);
        assert_eq!(f.worker.state().await, LifecycleState::Activated);

        f.worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_activate_survives_failed_claim() {
        let f = fixture().await;
        f.db.open_partition("erica-meal-static-v3.4.2").await.unwrap();
        f.host.set_claim_fails(true);

        let deleted = f.worker.on_activate().await.unwrap();
        assert_eq!(deleted, vec!["erica-meal-static-v3.4.2"]);
        assert_eq!(f.host.events(), vec!["claim"]);
        assert_eq!(f.worker.state().await, LifecycleState::Activated);
        assert!(f.worker.timers.lock().await.is_some());

        f.worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_activate_is_idempotent() {
        let f = fixture().await;
        script_manifest(&f.network);
        f.worker.on_install().await.unwrap();

        assert!(f.worker.on_activate().await.unwrap().is_empty());
        assert!(f.worker.on_activate().await.unwrap().is_empty());
        assert_eq!(f.db.partition("erica-meal-static-v3.4.4").entry_count().await.unwrap(), 6);
        assert_eq!(f.host.events(), vec!["skip-waiting", "claim", "claim"]);
        assert!(f.worker.timers.lock().await.is_some());

        f.worker.shutdown().await;
        assert!(f.worker.timers.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_get_version_reply() {
        let f = fixture().await;
        let (port, rx) = reply_channel();

        f.worker.on_message(ControlMessage::GetVersion, Some(port)).await;
        assert_eq!(rx.await.unwrap().version, "v3.4.4");
    }

    #[tokio::test]
    async fn test_skip_waiting_message() {
        let f = fixture().await;
        f.worker.on_message(ControlMessage::SkipWaiting, None).await;
        assert_eq!(f.host.events(), vec!["skip-waiting"]);
    }

    #[tokio::test]
    async fn test_get_version_without_port_is_ignored() {
        let f = fixture().await;
        f.worker.on_message(ControlMessage::GetVersion, None).await;
        assert!(f.host.events().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_api_offline_end_to_end() {
        let f = fixture().await;
        let path = "/api/v1/meals?year=2025&month=1&day=1";
        let body = r#"{"meals":[{"type":"lunch","menu":["rice","soup"]}]}"#;
        f.network.respond("GET", path, Response::new(200, body));

        let request = Request::get(f.worker.resolve(path).unwrap());
        let mut online = f.worker.on_fetch(request.clone()).await.unwrap();
        assert!(online.take_write().unwrap().stored().await);

        f.network.set_offline(true);
        let offline = f.worker.on_fetch(request).await.unwrap();
        assert_eq!(offline.kind(), OutcomeKind::Fallback);
        assert_eq!(offline.into_response().unwrap().body.as_ref(), body.as_bytes());

        let post = Request::new(Method::Post, f.worker.resolve("/api/v1/something").unwrap());
        let outcome = f.worker.on_fetch(post).await.unwrap();
        assert_eq!(outcome.into_response().unwrap().status, 503);
    }

    #[tokio::test]
    async fn test_sync_tags() {
        let f = fixture().await;
        assert!(f.worker.on_sync(BACKGROUND_SYNC_TAG).await);
        assert!(!f.worker.on_sync("periodic").await);
    }

    #[tokio::test]
    async fn test_push_shows_notification() {
        let f = fixture().await;
        let shown = f
            .worker
            .on_push(Some(br#"{"title":"Menu updated","body":"Dinner changed","primaryKey":1}"#.as_slice()))
            .await
            .unwrap();
        assert!(shown);

        let notifications = f.host.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "Menu updated");
        assert_eq!(notifications[0].vibrate, vec![100, 50, 100]);
    }

    #[tokio::test]
    async fn test_push_empty_or_invalid() {
        let f = fixture().await;
        assert!(!f.worker.on_push(None).await.unwrap());
        assert!(!f.worker.on_push(Some(b"".as_slice())).await.unwrap());
        assert!(matches!(f.worker.on_push(Some(b"not json".as_slice())).await, Err(Error::InvalidInput(_))));
        assert!(f.host.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_notification_click() {
        let f = fixture().await;
        f.worker.on_notification_click(Some("explore")).await.unwrap();
        f.worker.on_notification_click(Some("close")).await.unwrap();
        f.worker.on_notification_click(None).await.unwrap();
        assert_eq!(f.host.events(), vec!["open:/"]);
    }

    #[test]
    fn test_lifecycle_state_names() {
        assert_eq!(LifecycleState::InstallFailed.as_str(), "install-failed");
        let json = serde_json::to_value(LifecycleState::InstallFailed).unwrap();
        assert_eq!(json, serde_json::json!("install-failed"));
    }

    #[tokio::test]
    async fn test_new_rejects_bad_offline_document() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mut config = WorkerConfig::new(Url::parse(ORIGIN).unwrap());
        config.offline_document = "ftp://elsewhere/index.html".into();

        let result = Worker::new(config, db, Arc::new(ScriptedNetwork::new()), Arc::new(RecordingHost::new()));
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
