//! Local host environment for the worker.
//!
//! There are no browser tabs behind this process, so client control and
//! window/notification requests are recorded in the log. The update check is
//! real: the worker's own definition is fetched through the network and its
//! digest compared with the one seen last.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mealsw_client::{Host, Network, Notification, UpdateCheck};
use mealsw_core::{Error, Request};
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;
use url::Url;

pub struct LocalHost {
    network: Arc<dyn Network>,
    script_url: Url,
    digest: Mutex<Option<String>>,
    updates: mpsc::UnboundedSender<()>,
    skip_waiting: AtomicBool,
}

impl LocalHost {
    /// `updates` receives one message per detected change; the receiver
    /// runs the fresh install/activate cycle.
    pub fn new(network: Arc<dyn Network>, script_url: Url, updates: mpsc::UnboundedSender<()>) -> Self {
        Self { network, script_url, digest: Mutex::new(None), updates, skip_waiting: AtomicBool::new(false) }
    }

    /// Whether the worker asked to activate without waiting.
    pub fn skipped_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    async fn fetch_digest(&self) -> Result<String, Error> {
        let response = self.network.fetch(&Request::get(self.script_url.clone())).await?;
        if !response.is_ok() {
            return Err(Error::HttpError(format!("{} returned {}", self.script_url, response.status)));
        }
        Ok(hex::encode(Sha256::digest(&response.body)))
    }
}

#[async_trait]
impl Host for LocalHost {
    async fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
        tracing::info!("worker skipped waiting");
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        tracing::info!("worker claimed clients");
        Ok(())
    }

    /// The first successful check records a baseline and reports `Unchanged`.
    async fn check_for_update(&self) -> Result<UpdateCheck, Error> {
        let digest = self.fetch_digest().await?;

        let previous = {
            let mut seen = self
                .digest
                .lock()
                .map_err(|_| Error::Host("update digest lock poisoned".into()))?;
            seen.replace(digest.clone())
        };

        match previous {
            Some(previous) if previous != digest => {
                tracing::info!(script = %self.script_url, digest, "worker definition changed");
                if self.updates.send(()).is_err() {
                    tracing::warn!("update receiver closed; not reinstalling");
                }
                Ok(UpdateCheck::Changed)
            }
            _ => Ok(UpdateCheck::Unchanged),
        }
    }

    async fn show_notification(&self, notification: Notification) -> Result<(), Error> {
        let payload =
            serde_json::to_string(&notification).map_err(|e| Error::Host(format!("notification: {e}")))?;
        tracing::info!(title = %notification.title, notification = %payload, "showing notification");
        Ok(())
    }

    async fn open_window(&self, path: &str) -> Result<(), Error> {
        tracing::info!(path, "opening window");
        Ok(())
    }
}
