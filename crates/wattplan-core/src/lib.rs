//! wattplan-core: Core types for the wattplan utilization planner
//!
//! This crate provides the fundamental types used throughout wattplan:
//! - Cluster, server group and server descriptions
//! - Utilization policy bounds
//! - Cluster file and daemon configuration formats
//! - Error handling

pub mod config;
pub mod error;
pub mod model;

pub use config::*;
pub use error::*;
pub use model::*;
