//! Print the effective orchestrator configuration and optionally validate a resource
//! definition.
//!
//! Usage: `dispatch_config [definition.json]`, reading configuration from `./config`.

use anyhow::{Context, Result};
use fleet_dispatch::logging::init_structured_logging;
use fleet_dispatch::orchestration::PollSchedule;
use fleet_dispatch::{ConfigLoader, ResourceDefinition};

fn main() -> Result<()> {
    init_structured_logging();

    let loader = ConfigLoader::new("config");
    let config = loader
        .load()
        .with_context(|| format!("loading configuration for '{}'", loader.environment()))?;

    println!("Environment: {}", loader.environment());
    println!("{}", serde_json::to_string_pretty(&config)?);

    if let Some(path) = std::env::args().nth(1) {
        let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
        let definition =
            ResourceDefinition::from_json(&json).with_context(|| format!("parsing {path}"))?;
        let request = definition
            .to_request(config.default_execution_timeout_seconds)
            .with_context(|| format!("validating {path}"))?;

        let deadline = config.run_deadline(request.execution_timeout());
        println!(
            "Definition OK: document {} against {} selector entries, run deadline {}s",
            request.document_name,
            request.targets.targets().len(),
            deadline.as_secs()
        );

        let destroy = definition.destroy_request(config.default_execution_timeout_seconds);
        if let Some(destroy) = destroy {
            let destroy =
                destroy.with_context(|| format!("validating destroy command in {path}"))?;
            println!("Destroy command: {}", destroy.document_name);
        }
    }

    let readiness = PollSchedule::new(config.readiness_timeout(), config.poll_interval());
    println!(
        "Readiness: up to {} polls every {}ms",
        readiness.attempts, config.poll_interval_ms
    );

    Ok(())
}
