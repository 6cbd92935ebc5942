//! wattplan-api: REST API server for wattplan
//!
//! This crate exposes the planner over HTTP:
//! - Minimum-power allocation for a cluster and rate
//! - Static full-speed baseline
//! - Service status

pub mod rest;

pub use rest::create_router;
