use anyhow::Result;
use colored::*;
use sluice_core::orchestrator::Orchestrator;
use sluice_core::results::TaskKind;

pub fn execute(orchestrator: &Orchestrator) -> Result<()> {
    let result = orchestrator.list_tasks();

    println!(
        "{} {}",
        "Tasks".bold().underline(),
        format!("({})", orchestrator.mode()).dimmed()
    );

    if result.tasks.is_empty() {
        println!("  {}", "No tasks registered".dimmed());
        return Ok(());
    }

    for task in &result.tasks {
        let color = result
            .task_colors
            .get(&task.name)
            .copied()
            .unwrap_or(Color::White);
        let mut line = format!("{}", task.name.color(color).bold());
        if task.kind == TaskKind::Composite {
            line.push_str(&format!(" {}", "[composite]".blue()));
        }
        if task.long_running {
            line.push_str(&format!(" {}", "[long-running]".cyan()));
        }
        if let Some(description) = &task.description {
            line.push_str(&format!("  {}", description.dimmed()));
        }
        println!("{}", line);

        if !task.dependencies.is_empty() {
            println!("    {} {}", "after:".dimmed(), task.dependencies.join(", "));
        }
        if !task.members.is_empty() {
            println!("    {} {}", "runs:".dimmed(), task.members.join(", "));
        }
    }

    Ok(())
}
