//! Health check command - probes a running Sealnote server.

use std::time::Duration;

use crate::cli::HealthArgs;

/// Probe the server's /health endpoint and report its status.
///
/// Exits nonzero when the server is unreachable or reports anything other
/// than healthy, so the command doubles as a container liveness probe.
pub async fn run(args: &HealthArgs) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("http://{}:{}/health", args.host, args.port);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    match probe(&client, &url).await {
        Ok(backend) => {
            println!("{url}: healthy (backend: {backend})");
            Ok(())
        }
        Err(reason) => {
            eprintln!("{url}: unhealthy ({reason})");
            std::process::exit(1);
        }
    }
}

/// Fetch and interpret the health body, returning the backend kind the
/// server reports.
async fn probe(client: &reqwest::Client, url: &str) -> Result<String, String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("connection failed: {e}"))?;
    if !response.status().is_success() {
        return Err(format!("HTTP status {}", response.status()));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| format!("malformed health body: {e}"))?;

    match body.get("status").and_then(|s| s.as_str()) {
        Some("healthy") => {
            let backend = body
                .get("backend")
                .and_then(|b| b.as_str())
                .unwrap_or("unknown");
            Ok(backend.to_string())
        }
        Some(other) => Err(format!("server reported status \"{other}\"")),
        None => Err("health body missing status field".to_string()),
    }
}
