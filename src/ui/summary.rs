use std::io::IsTerminal;

use crossterm::style::Stylize;

use crate::args::OutputFormat;
use crate::error::AppResult;
use crate::metrics::RunSummary;

const RULE_WIDTH: usize = 50;

#[must_use]
pub fn banner_line(url: &str, duration_secs: u64) -> String {
    format!(
        "Sending requests to {} for {} seconds...",
        url, duration_secs
    )
}

/// Prints the pre-run banner. JSON output keeps stdout machine-readable, so
/// the banner is skipped there.
pub fn print_banner(url: &str, duration_secs: u64, format: OutputFormat) {
    if format == OutputFormat::Text {
        println!("{}", banner_line(url, duration_secs));
    }
}

#[must_use]
pub fn summary_lines(summary: &RunSummary, use_color: bool) -> Vec<String> {
    let rule = "=".repeat(RULE_WIDTH);
    let success = format!("Successful Requests: {}", summary.success);
    let failure = format!("Failed Requests: {}", summary.failure);

    let mut lines = Vec::with_capacity(7);
    lines.push(String::new());
    lines.push(rule.clone());
    lines.push(format!("Total Requests Sent: {}", summary.total));
    if use_color {
        lines.push(success.green().to_string());
        lines.push(failure.red().to_string());
    } else {
        lines.push(success);
        lines.push(failure);
    }
    lines.push(format!("Elapsed: {:.2}s", summary.elapsed.as_secs_f64()));
    if summary.interrupted {
        let note = "Run interrupted before its deadline".to_owned();
        lines.push(if use_color {
            note.yellow().to_string()
        } else {
            note
        });
    }
    lines.push(rule);
    lines
}

/// # Errors
///
/// Returns an error if the summary cannot be serialized.
pub fn summary_json(summary: &RunSummary) -> AppResult<String> {
    Ok(serde_json::to_string(summary)?)
}

/// Writes the final summary to stdout in the selected format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_summary(summary: &RunSummary, format: OutputFormat, no_color: bool) -> AppResult<()> {
    match format {
        OutputFormat::Json => println!("{}", summary_json(summary)?),
        OutputFormat::Text => {
            let use_color = !no_color && std::io::stdout().is_terminal();
            for line in summary_lines(summary, use_color) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
