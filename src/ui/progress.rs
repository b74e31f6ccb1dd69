use std::io::Write;

use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use tracing::info;

use crate::metrics::{ProgressSnapshot, RunSummary};

use super::ProgressReporter;

/// Width of the request bar in cells.
const BAR_WIDTH: usize = 30;

/// Redraws a single status line on stderr after every tick.
#[derive(Debug, Clone, Copy)]
pub struct TerminalProgress {
    no_color: bool,
}

impl TerminalProgress {
    #[must_use]
    pub const fn new(no_color: bool) -> Self {
        Self { no_color }
    }
}

impl ProgressReporter for TerminalProgress {
    fn on_tick(&self, snapshot: &ProgressSnapshot) {
        let line = build_progress_line(snapshot, self.no_color);
        if let Err(err) = render_progress_line(&line) {
            tracing::debug!("Failed to render progress line: {}", err);
        }
    }

    fn on_finish(&self, _summary: &RunSummary) {
        let mut out = std::io::stderr();
        if out.write_all(b"\n").and_then(|()| out.flush()).is_err() {
            tracing::debug!("Failed to finish progress line");
        }
    }
}

/// Logs one line per tick, for runs without a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn on_tick(&self, snapshot: &ProgressSnapshot) {
        info!(
            "tick {}/{} | sent {}/{} | success {} | failed {}",
            snapshot.ticks_done,
            snapshot.total_ticks,
            snapshot.issued,
            snapshot.total_requests,
            snapshot.success,
            snapshot.failure
        );
    }
}

fn render_progress_line(line: &[ProgressSegment]) -> Result<(), std::io::Error> {
    let mut out = std::io::stderr();
    queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    for segment in line {
        if let Some(color) = segment.color {
            queue!(
                out,
                SetForegroundColor(color),
                Print(&segment.text),
                ResetColor
            )?;
        } else {
            queue!(out, Print(&segment.text))?;
        }
    }
    out.flush()?;
    Ok(())
}

pub(super) fn build_progress_line(
    snapshot: &ProgressSnapshot,
    no_color: bool,
) -> Vec<ProgressSegment> {
    let goal = u128::from(snapshot.total_requests.max(1));
    let done = u128::from(snapshot.success.saturating_add(snapshot.failure)).min(goal);
    let width = u128::try_from(BAR_WIDTH).unwrap_or(u128::MAX);

    let filled = done
        .saturating_mul(width)
        .checked_div(goal)
        .unwrap_or(0);
    let complete_size = usize::try_from(filled).unwrap_or(BAR_WIDTH).min(BAR_WIDTH);
    let incomplete_size = BAR_WIDTH.saturating_sub(complete_size);

    let percent_x100 = done.saturating_mul(10_000).checked_div(goal).unwrap_or(0);
    let percent_whole = percent_x100.checked_div(100).unwrap_or(0);
    let percent_frac = percent_x100.checked_rem(100).unwrap_or(0);

    let bar = format!(
        "[{}{}] {}/{}",
        "#".repeat(complete_size),
        "-".repeat(incomplete_size),
        done,
        snapshot.total_requests
    );
    let percent_text = format!(" {}.{:02}%", percent_whole, percent_frac);
    let success_text = format!(" | Success: {}", snapshot.success);
    let failure_text = format!(" | Failed: {}", snapshot.failure);
    let tick_text = format!(
        " | tick {}/{}",
        snapshot.ticks_done, snapshot.total_ticks
    );

    let colored = |text: String, color: Color| {
        if no_color {
            ProgressSegment::plain(text)
        } else {
            ProgressSegment::colored(text, color)
        }
    };

    vec![
        ProgressSegment::plain(bar),
        colored(percent_text, Color::Cyan),
        colored(success_text, Color::Green),
        colored(failure_text, Color::Red),
        colored(tick_text, Color::Yellow),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ProgressSegment {
    pub(super) text: String,
    pub(super) color: Option<Color>,
}

impl ProgressSegment {
    const fn plain(text: String) -> Self {
        Self { text, color: None }
    }

    const fn colored(text: String, color: Color) -> Self {
        Self {
            text,
            color: Some(color),
        }
    }
}
