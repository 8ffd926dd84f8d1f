//! Display logic for the inspector CLI.
//!
//! This module handles terminal output: the run header, one colored line per
//! probed platform, the summary, the final match list, the platform listing
//! and a spinner for quiet mode. Uses only the `console` crate.

use console::{pad_str, style, Alignment, Term};
use inspector_lib::{Catalogue, ProbeOutcome, ProbeReport, ProbeResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a new spinner with the given message.
    ///
    /// Returns `None` when stderr is not a terminal.
    pub fn start(message: String) -> Option<Self> {
        if !Term::stderr().is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a run.
pub fn print_header(username: &str, platform_count: usize, concurrency: usize) {
    println!(
        "{} {} {}",
        style("inspector").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "- Searching '{}' on {} platform{}",
            username,
            platform_count,
            if platform_count == 1 { "" } else { "s" }
        ))
        .dim(),
    );
    println!("{}", style(format!("Concurrency: {}", concurrency)).dim());
    println!();
}

// ── Single report line ───────────────────────────────────────────────────────

/// Width of the widest status word, `NOT FOUND`.
const STATUS_WIDTH: usize = 9;

fn pad_status(word: &str) -> String {
    pad_str(word, STATUS_WIDTH, Alignment::Left, None).into_owned()
}

/// Format and print one probe report with colors and alignment.
///
/// If `counter` is Some((current, total)), a progress prefix like `[3/8]` is shown.
pub fn print_report(report: &ProbeReport, counter: Option<(usize, usize)>) {
    let name_width = 16;
    let padded_name = pad_str(&report.name, name_width, Alignment::Left, Some(".."));

    let prefix = match counter {
        Some((cur, total)) => format!("{} ", style(format!("[{}/{}]", cur, total)).dim()),
        None => String::new(),
    };

    match &report.outcome {
        ProbeOutcome::Matched { .. } => {
            println!(
                "  {}{}  {}  {}",
                prefix,
                style(&padded_name).white(),
                style(pad_status("FOUND")).green().bold(),
                style(&report.url).dim(),
            );
        }
        ProbeOutcome::NotMatched { status } => {
            println!(
                "  {}{}  {}  {}",
                prefix,
                style(&padded_name).white(),
                style(pad_status("NOT FOUND")).red(),
                style(format!("HTTP {}", status)).dim(),
            );
        }
        ProbeOutcome::Failed { error } => {
            println!(
                "  {}{}  {}  {}",
                prefix,
                style(&padded_name).white(),
                style(pad_status("ERROR")).yellow(),
                style(error.brief()).dim(),
            );
        }
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Per-outcome tallies for the summary line.
#[derive(Debug, Default)]
pub struct Counts {
    pub found: usize,
    pub not_found: usize,
    pub failed: usize,
}

/// Print a one-line summary of the run.
pub fn print_summary(counts: &Counts, duration: Duration) {
    let total = counts.found + counts.not_found + counts.failed;
    let secs = duration.as_secs_f64();

    let mut parts = vec![
        style(format!("{} found", counts.found)).green().to_string(),
        style(format!("{} not found", counts.not_found)).red().to_string(),
    ];
    if counts.failed > 0 {
        parts.push(style(format!("{} errors", counts.failed)).yellow().to_string());
    }

    println!(
        "Checked {} platform{} in {:.1}s: {}",
        total,
        if total == 1 { "" } else { "s" },
        secs,
        parts.join(", "),
    );
}

// ── Match list ───────────────────────────────────────────────────────────────

/// Print the final list of matches, or an explicit "no matches" message.
pub fn print_matches(username: &str, matches: &[ProbeResult]) {
    for line in format_matches(username, matches) {
        println!("{}", line);
    }
}

/// Plain-text lines for the match list.
pub fn format_matches(username: &str, matches: &[ProbeResult]) -> Vec<String> {
    if matches.is_empty() {
        return vec!["No matches found.".to_string()];
    }

    let mut lines = vec![
        String::new(),
        format!("username: {} was found on:-", username),
    ];
    lines.extend(matches.iter().map(|m| format!("{} : {}", m.name, m.url)));
    lines
}

// ── Platform listing ─────────────────────────────────────────────────────────

/// Print every platform group with its platforms.
pub fn print_platforms(catalogue: &Catalogue) {
    let heading = style("Available platform groups:").yellow().bold();

    println!();
    println!("{}", heading);
    println!();

    for group in catalogue.groups() {
        println!(
            "  {} {}  {}",
            style(format!("{:<10}", group.id)).green().bold(),
            style(format!("({})", group.platforms.len())).cyan(),
            style(&group.description).dim(),
        );
        let names: Vec<&str> = group.platforms.iter().map(|p| p.name.as_str()).collect();
        println!("    {}", names.join(", "));
    }

    println!();
    println!("Use: inspector <username> --platform <group>");
}
