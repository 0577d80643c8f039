//! SQLite-backed partition store.
//!
//! This module provides durable, named key→response partitions using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Request-addressed keys using SHA-256 hashing of method and URL
//! - Insertion-ordered enumeration (the eviction order)
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::CacheDb;
pub use partitions::{Partition, PartitionSummary, StoredRequest};
