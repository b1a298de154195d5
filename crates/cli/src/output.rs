//! Console rendering of watch events

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use pollwatch::{ChangeEvent, ChangeKind, PollFailure};

/// Colored line with a local timestamp
pub fn render_event(event: &ChangeEvent, at: DateTime<Local>) -> String {
    let kind = match event.kind {
        ChangeKind::Created => format!("{:<8}", "created").green().to_string(),
        ChangeKind::Deleted => format!("{:<8}", "deleted").red().to_string(),
        ChangeKind::Modified => format!("{:<8}", "modified").yellow().to_string(),
    };
    format!(
        "{} {} {}",
        at.format("%H:%M:%S%.3f").to_string().dimmed(),
        kind,
        event.path.display()
    )
}

/// Warning line for a recoverable poll failure
pub fn render_failure(failure: &PollFailure) -> String {
    format!(
        "{} {}: {}",
        "warning:".yellow().bold(),
        failure.path.display(),
        failure.error
    )
}
