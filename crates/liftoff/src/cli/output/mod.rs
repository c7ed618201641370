//! Output formatting utilities

use console::{style, Style};
use liftoff_tasks::{SubmitEvent, SubmitReporter};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled header
pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Style for task ids
pub fn id_style() -> Style {
    Style::new().yellow()
}

/// Style for paths
pub fn path_style() -> Style {
    Style::new().cyan()
}

/// Prints submission progress to the terminal.
///
/// Each definition is printed before it is sent and each queue response
/// after it arrives, so the log of a decision task shows exactly what
/// was scheduled.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl SubmitReporter for ConsoleReporter {
    fn report(&self, event: &SubmitEvent) {
        match event {
            SubmitEvent::GroupStarted { group, task_count } => {
                println!();
                println!(
                    "{}",
                    header(&format!("Group {} ({} tasks)", group, task_count))
                );
            }
            SubmitEvent::Submitting { id, definition } => {
                info(&format!("Task {}", id_style().apply_to(id)));
                let rendered = serde_json::to_string_pretty(definition).unwrap_or_default();
                println!("{}", style(rendered).dim());
            }
            SubmitEvent::Created { id, response } => {
                success(&format!("Created {}", id_style().apply_to(id)));
                println!("{}", key_value("response", &response.to_string()));
            }
            SubmitEvent::Confirmed { .. } => {}
            SubmitEvent::Failed { id, error: message } => {
                error(&format!("{}: {}", id_style().apply_to(id), message));
            }
            SubmitEvent::Completed { total, duration } => {
                println!();
                success(&format!(
                    "Submitted {} tasks in {:.1}s",
                    total,
                    duration.as_secs_f64()
                ));
            }
        }
    }
}
