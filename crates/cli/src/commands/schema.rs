use anyhow::Result;
use sluice_core::orchestrator::Orchestrator;

pub fn execute() -> Result<()> {
    let schema = Orchestrator::schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
