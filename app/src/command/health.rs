use anyhow::bail;
use colored::Colorize;
use teller_transport::Backoff;
use tracing::info;

use super::init_common_components;

/// Attempts made by `health --wait` before giving up.
const WAIT_ATTEMPTS: usize = 10;

/// Input parameters for the Health command strategy.
#[derive(Debug, Clone)]
pub struct HealthInput {
    /// Keep polling until the backend answers
    pub wait: bool,
    /// Backend base URL override
    pub api_url: Option<String>,
}

/// Strategy for checking backend liveness.
///
/// Fails when the backend is unreachable or reports itself unhealthy.
#[derive(Debug, Clone, Copy)]
pub struct HealthStrategy;

impl super::CommandStrategy for HealthStrategy {
    type Input = HealthInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = init_common_components(input.api_url)?;

        let report = if input.wait {
            info!("Waiting for {} to become reachable", common.transport.base_url());
            common
                .transport
                .wait_until_reachable(&Backoff::standard(WAIT_ATTEMPTS))
                .await?
        } else {
            common.transport.health().await?
        };

        let status = if report.is_healthy() {
            report.status.green().bold()
        } else {
            report.status.red().bold()
        };
        println!("Backend: {}", common.transport.base_url());
        println!("Status: {status}");
        println!("Timestamp: {}", report.timestamp);
        if let Some(db) = report.database["status"].as_str() {
            println!("Database: {db}");
        }
        let mut services: Vec<_> = report.services.iter().collect();
        services.sort();
        for (name, state) in services {
            println!("  {name}: {state}");
        }

        if !report.is_healthy() {
            bail!("Backend reported status '{}'", report.status);
        }
        Ok(())
    }
}
