//! Host environment seam.
//!
//! The worker never drives clients, windows or its own registration
//! directly; it asks the host through this trait.

use async_trait::async_trait;
use mealsw_core::Error;

use super::notify::Notification;

/// Result of a self-update check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateCheck {
    Unchanged,
    /// A newer definition was found; the host runs a fresh install/activate cycle.
    Changed,
}

#[async_trait]
pub trait Host: Send + Sync {
    /// Take effect immediately instead of waiting for old instances to close.
    async fn skip_waiting(&self);

    /// Take control of every open client without a reload.
    async fn claim_clients(&self) -> Result<(), Error>;

    /// Refetch the layer's own definition and compare it with the installed one.
    async fn check_for_update(&self) -> Result<UpdateCheck, Error>;

    async fn show_notification(&self, notification: Notification) -> Result<(), Error>;

    async fn open_window(&self, path: &str) -> Result<(), Error>;
}
