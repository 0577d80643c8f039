//! Partition store MCP tools.
//!
//! This module provides tools for inspecting and sweeping the worker's partitions.

pub mod list;
pub mod sweep;

pub use list::{CacheListParams, list_impl};
pub use sweep::sweep_impl;
