//! Test doubles for the network and host seams.
//!
//! Built for this crate's tests and, behind the `test-util` feature, for
//! downstream crates that drive a [`Worker`](crate::Worker) without a live
//! origin.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use mealsw_core::{Error, Request, Response};
use url::Url;

use crate::fetch::Network;
use crate::worker::host::{Host, UpdateCheck};
use crate::worker::notify::Notification;

pub const ORIGIN: &str = "http://localhost:8000";

enum Scripted {
    Respond(Response),
    Fail,
}

/// Network that answers from a script and records every call.
///
/// Routes are keyed by method and absolute URL, query included.
/// Unscripted requests get a 404.
#[derive(Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute URL of `target` (a path with optional query) on [`ORIGIN`].
    pub fn url(&self, target: &str) -> Url {
        Url::parse(ORIGIN).unwrap().join(target).unwrap()
    }

    fn route_key(&self, method: &str, target: &str) -> String {
        format!("{} {}", method.to_ascii_uppercase(), self.url(target))
    }

    pub fn respond(&self, method: &str, target: &str, response: Response) {
        let key = self.route_key(method, target);
        self.routes.lock().unwrap().insert(key, Scripted::Respond(response));
    }

    pub fn fail(&self, method: &str, target: &str) {
        let key = self.route_key(method, target);
        self.routes.lock().unwrap().insert(key, Scripted::Fail);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let key = format!("{} {}", request.method, request.url);
        self.calls.lock().unwrap().push(key.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{}: offline", request.url)));
        }

        match self.routes.lock().unwrap().get(&key) {
            Some(Scripted::Respond(response)) => Ok(response.clone()),
            Some(Scripted::Fail) => Err(Error::Network(format!("{}: connection refused", request.url))),
            None => Ok(Response::new(404, "not found")),
        }
    }
}

/// Host that records what it was asked to do.
pub struct RecordingHost {
    events: Mutex<Vec<String>>,
    notifications: Mutex<Vec<Notification>>,
    update: Mutex<Result<UpdateCheck, String>>,
    update_checks: AtomicUsize,
    claim_fails: AtomicBool,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
            update: Mutex::new(Ok(UpdateCheck::Unchanged)),
            update_checks: AtomicUsize::new(0),
            claim_fails: AtomicBool::new(false),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn update_checks(&self) -> usize {
        self.update_checks.load(Ordering::SeqCst)
    }

    pub fn set_update_result(&self, result: Result<UpdateCheck, String>) {
        *self.update.lock().unwrap() = result;
    }

    pub fn set_claim_fails(&self, fails: bool) {
        self.claim_fails.store(fails, Ordering::SeqCst);
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

#[async_trait]
impl Host for RecordingHost {
    async fn skip_waiting(&self) {
        self.record("skip-waiting");
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        self.record("claim");
        if self.claim_fails.load(Ordering::SeqCst) {
            return Err(Error::Host("no clients to claim".into()));
        }
        Ok(())
    }

    async fn check_for_update(&self) -> Result<UpdateCheck, Error> {
        self.update_checks.fetch_add(1, Ordering::SeqCst);
        self.update.lock().unwrap().clone().map_err(Error::Host)
    }

    async fn show_notification(&self, notification: Notification) -> Result<(), Error> {
        self.record(format!("notify:{}", notification.title));
        self.notifications.lock().unwrap().push(notification);
        Ok(())
    }

    async fn open_window(&self, path: &str) -> Result<(), Error> {
        self.record(format!("open:{path}"));
        Ok(())
    }
}
