//! Core types and shared functionality for meal-sw.
//!
//! This crate provides:
//! - Request/response model shared by the store, network and worker
//! - Versioned partition naming
//! - Durable partition store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod names;

pub use cache::{CacheDb, Partition, PartitionSummary, StoredRequest};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Destination, Method, Request, Response, ResponseKind};
pub use names::CacheNames;
