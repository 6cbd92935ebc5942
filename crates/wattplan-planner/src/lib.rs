//! wattplan-planner: Minimum-power utilization planning for wattplan
//!
//! This crate turns a cluster description and a target service rate into
//! per-server operating points:
//! - Linear power model
//! - Intra-group utilization distribution
//! - Group bound propagation and branch-and-bound search
//! - Export of the winning assignment

pub mod bounds;
pub mod distributor;
pub mod export;
pub mod planner;
pub mod power;
pub mod search;

pub use distributor::UtilDistributor;
pub use export::{baseline_allocation, realized_rate, AllocationResult, ServerAllocation};
pub use planner::{Planner, SweepOutcome};
pub use search::{UtilizationAssignment, UtilizationSearch};
