//! Health command - asks a running Startpage server how it is doing.
//!
//! Exits non-zero unless the server answers `/health` with a healthy report.

use std::time::Duration;

use super::serve::HealthResponse;
use crate::cli::HealthArgs;

/// The `/health` URL for a server base URL, which may already name it.
fn health_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with("/health") {
        base.to_string()
    } else {
        format!("{base}/health")
    }
}

/// Fetch and decode the server's health report.
async fn check(url: &str, timeout: Duration) -> Result<HealthResponse, String> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| format!("cannot build HTTP client: {e}"))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("failed to connect to {url}: {e}"))?;
    if !response.status().is_success() {
        return Err(format!("server returned HTTP status {}", response.status()));
    }
    let report: HealthResponse = response
        .json()
        .await
        .map_err(|e| format!("not a Startpage health report: {e}"))?;
    if report.status != "healthy" {
        return Err(format!("server reports status {}", report.status));
    }
    Ok(report)
}

/// Run the health check command
pub async fn run(args: &HealthArgs) -> Result<(), Box<dyn std::error::Error>> {
    let url = health_url(&args.url);
    match check(&url, Duration::from_secs(args.timeout)).await {
        Ok(report) => {
            println!(
                "healthy: {} backend, {} active session(s)",
                report.backend, report.sessions
            );
            Ok(())
        }
        Err(reason) => {
            eprintln!("unhealthy: {reason}");
            std::process::exit(1);
        }
    }
}
