//! Terminal rendering of the overlay.

use colored::Colorize;

use deepguard_core::merge::SiteStatus;

use crate::session::ReadyState;

/// Status tag as printed in the site list.
pub fn status_label(status: SiteStatus) -> &'static str {
    match status {
        SiteStatus::Scanning => "SCANNING",
        SiteStatus::Safe => "SAFE",
        SiteStatus::Threat => "THREAT",
    }
}

/// One-line progress summary, e.g. `Scanned 1 of 2 sites (50.0%), 0 deepfakes`.
pub fn progress_line(ready: &ReadyState) -> String {
    let summary = ready.summary();
    format!(
        "Scanned {} of {} sites ({:.1}%), {} deepfakes",
        summary.total_scanned,
        ready.websites().len(),
        ready.progress_percent(),
        summary.deepfakes_found,
    )
}

/// Print the full overlay: progress line followed by every listed site.
pub fn print_ready(ready: &ReadyState) {
    println!("{}", "── DeepGuard global scan ─────────────────────────────".bright_black());
    println!("{}", progress_line(ready).as_str().bold());

    for (site, status) in ready.site_statuses() {
        let tag = format!("{:<8}", status_label(status));
        let tag = match status {
            SiteStatus::Scanning => tag.as_str().bright_black(),
            SiteStatus::Safe => tag.as_str().green(),
            SiteStatus::Threat => tag.as_str().red().bold(),
        };

        match ready.merged().get(site) {
            Some(record) if status != SiteStatus::Scanning => {
                println!("  {tag}  {site}  {} {:.1}%", record.prediction, record.confidence);
            }
            _ => println!("  {tag}  {site}"),
        }
    }

    println!();
}

/// Print the load failure and how to retry.
pub fn print_error(message: &str) {
    let line = format!("Could not load the website list: {message}");
    eprintln!("{} {}", "✖".red(), line.as_str().red());
    eprintln!("Reload the overlay (run deepguard-watch again) to retry.");
}
