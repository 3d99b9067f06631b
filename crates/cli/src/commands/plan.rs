use anyhow::Result;
use colored::*;
use sluice_core::orchestrator::Orchestrator;

pub fn execute(orchestrator: &Orchestrator, task: &str) -> Result<()> {
    println!("{} {}", "Execution plan for".bold(), task.cyan());

    let result = orchestrator
        .plan(task)
        .map_err(|e| anyhow::anyhow!("Failed to get execution plan: {}", e))?;

    println!("\n{}:", "Execution order".bold());
    let steps = result.plan.steps();
    for (i, step) in steps.iter().enumerate() {
        let color = result
            .task_colors
            .get(&step.task)
            .copied()
            .unwrap_or(Color::White);
        let after: Vec<&str> = step.after.iter().map(|&j| steps[j].task.as_str()).collect();
        if after.is_empty() {
            println!("  {}. {}", i + 1, step.task.color(color));
        } else {
            println!(
                "  {}. {} {}",
                i + 1,
                step.task.color(color),
                format!("after {}", after.join(", ")).dimmed()
            );
        }
    }

    Ok(())
}
