//! Client side of meal-sw.
//!
//! This crate provides the network seam and the offline worker: lifecycle,
//! request routing, eviction and the update poller.

pub mod fetch;
pub mod worker;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use fetch::{FetchConfig, HttpNetwork, Network};
pub use worker::host::{Host, UpdateCheck};
pub use worker::message::{ControlMessage, VersionReply, reply_channel};
pub use worker::notify::Notification;
pub use worker::router::{OutcomeKind, RouteOutcome, Strategy, select_strategy};
pub use worker::sweep::{EvictionPolicy, SweepReport};
pub use worker::{LifecycleState, Worker, WorkerConfig};
