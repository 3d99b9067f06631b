use anyhow::Result;
use colored::*;
use sluice_core::execution::RunOutcome;
use sluice_core::orchestrator::Orchestrator;
use sluice_core::SluiceError;
use tracing::info;

pub async fn execute(orchestrator: &Orchestrator, task: &str) -> Result<()> {
    println!(
        "{} {} {}",
        "Running task".bold(),
        task.cyan(),
        format!("({})", orchestrator.mode()).dimmed()
    );
    println!();

    // Ctrl-C interrupts the run and stops long-running tasks
    let shutdown = orchestrator.shutdown_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            shutdown.cancel();
        }
    });

    let result = match orchestrator.run(task).await {
        Ok(RunOutcome::Done) => Ok(()),
        Ok(RunOutcome::Live(live)) => {
            println!(
                "{} {} {}",
                "Watching".cyan().bold(),
                live.names().join(", "),
                "(press Ctrl-C to stop)".dimmed()
            );
            live.wait().await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) if orchestrator.shutdown_token().is_cancelled() => {
            println!();
            println!("{}", "Stopped".yellow().bold());
            Ok(())
        }
        Ok(()) => {
            println!();
            println!(
                "{} {}",
                "✓".green().bold(),
                "All tasks completed successfully!".green().bold()
            );
            Ok(())
        }
        Err(SluiceError::Interrupted) => {
            println!();
            println!("{}", "Interrupted".yellow().bold());
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Failed to run task: {}", e)),
    }
}
