//! CLI commands implementation

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;
use wattplan_core::{ClusterFile, ClusterSpec, UtilizationPolicy};
use wattplan_planner::{realized_rate, AllocationResult, Planner};

/// API client for communicating with the daemon
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Plan response from API
#[derive(Debug, Deserialize)]
pub struct PlanResponse {
    pub plan_id: Uuid,
    pub created_at: String,
    pub rate: f64,
    pub baseline_power: f64,
    pub allocation: AllocationResult,
}

fn load_cluster(path: &Path) -> Result<(ClusterSpec, Option<f64>)> {
    let file = ClusterFile::from_file(path)?;
    let rate = file.rate;
    let cluster = file
        .into_cluster()
        .with_context(|| format!("Invalid cluster in {}", path.display()))?;
    Ok((cluster, rate))
}

fn resolve_rate(arg: Option<f64>, file_rate: Option<f64>) -> Result<f64> {
    arg.or(file_rate)
        .context("No rate given: pass --rate or set `rate` in the cluster file")
}

fn savings_percent(planned: f64, baseline: f64) -> f64 {
    if baseline <= 0.0 {
        return 0.0;
    }
    (baseline - planned) / baseline * 100.0
}

/// Plan the minimum-power allocation locally
pub fn plan(path: &Path, rate: Option<f64>, policy: UtilizationPolicy, json: bool) -> Result<()> {
    let (cluster, file_rate) = load_cluster(path)?;
    let rate = resolve_rate(rate, file_rate)?;
    let planner = Planner::new(cluster, policy)?;

    let allocation = planner.plan(rate)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&allocation)?);
        return Ok(());
    }

    let baseline = planner.baseline();
    print_allocation(&allocation);
    println!();
    println!(
        "Rate: {} requested, {:.2} delivered",
        rate,
        realized_rate(planner.cluster(), &allocation)
    );
    println!(
        "Power: {:.2} W (baseline {:.2} W, {:.1}% saved)",
        allocation.total_power,
        baseline.total_power,
        savings_percent(allocation.total_power, baseline.total_power)
    );

    Ok(())
}

/// Show the full-speed baseline allocation
pub fn baseline(path: &Path, policy: UtilizationPolicy, json: bool) -> Result<()> {
    let (cluster, _) = load_cluster(path)?;
    let planner = Planner::new(cluster, policy)?;
    let baseline = planner.baseline();

    if json {
        println!("{}", serde_json::to_string_pretty(&baseline)?);
    } else {
        print_allocation(&baseline);
        println!();
        println!(
            "Rate: {:.2}, Power: {:.2} W",
            realized_rate(planner.cluster(), &baseline),
            baseline.total_power
        );
    }

    Ok(())
}

/// Plan several rates and print one line per rate
pub fn sweep(path: &Path, rates: &[f64], policy: UtilizationPolicy) -> Result<()> {
    let (cluster, _) = load_cluster(path)?;
    let planner = Planner::new(cluster, policy)?;
    let baseline_power = planner.baseline().total_power;

    println!("{:<12} {:<14} {:<10}", "RATE", "POWER (W)", "SAVED");
    println!("{}", "-".repeat(40));
    for outcome in planner.sweep(rates) {
        match outcome.result {
            Ok(allocation) => println!(
                "{:<12} {:<14.2} {:.1}%",
                outcome.rate,
                allocation.total_power,
                savings_percent(allocation.total_power, baseline_power)
            ),
            Err(e) => println!("{:<12} {}", outcome.rate, e),
        }
    }

    Ok(())
}

/// Check a cluster description and print its capacity
pub fn validate(path: &Path, policy: UtilizationPolicy) -> Result<()> {
    let (cluster, rate) = load_cluster(path)?;

    println!(
        "Cluster OK: {} groups, {} servers",
        cluster.groups.len(),
        cluster.server_count()
    );
    for group in &cluster.groups {
        println!(
            "  {} - {} servers, throughput {}",
            group.name,
            group.len(),
            group.throughput
        );
    }
    println!(
        "Rate range: {:.2} - {:.2}",
        cluster.floor_rate(&policy),
        cluster.full_capacity_rate(&policy)
    );
    if let Some(rate) = rate {
        println!("Default rate: {}", rate);
    }

    Ok(())
}

/// Send a planning request to the daemon
pub async fn submit(client: &ApiClient, path: &Path, rate: Option<f64>) -> Result<()> {
    let (cluster, file_rate) = load_cluster(path)?;
    let rate = resolve_rate(rate, file_rate)?;

    #[derive(Serialize)]
    struct PlanRequest {
        cluster: ClusterSpec,
        rate: f64,
    }

    let response = client
        .client
        .post(client.url("/api/v1/plan"))
        .json(&PlanRequest { cluster, rate })
        .send()
        .await?;

    if response.status().is_success() {
        let plan: PlanResponse = response.json().await?;
        println!("Plan {} ({})", plan.plan_id, plan.created_at);
        print_allocation(&plan.allocation);
        println!();
        println!(
            "Rate: {}, Power: {:.2} W (baseline {:.2} W)",
            plan.rate, plan.allocation.total_power, plan.baseline_power
        );
        Ok(())
    } else {
        let status = response.status();
        let error = response.text().await?;
        bail!("Failed to plan allocation ({}): {}", status, error);
    }
}

/// Helper to print an allocation table
fn print_allocation(allocation: &AllocationResult) {
    println!(
        "{:<8} {:<8} {:<12} {:<12} {:<16}",
        "SERVER", "UTIL", "FLOPS", "SPEED", "WATTS"
    );
    println!("{}", "-".repeat(60));
    for (id, server) in allocation.iter() {
        println!(
            "{:<8} {:<8.2} {:<12} {:<12} {:<16}",
            id,
            server.utilization,
            server.flops,
            server.speed_mflops(),
            server.watt_per_state()
        );
    }
}
