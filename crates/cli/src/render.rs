//! Plain-text rendering of console views.

use vaultview_browse::{BrowserView, Listing, LoadState};
use vaultview_progress::{format_bytes, ProgressView};
use vaultview_watch::{ConsumptionTotals, RowStatus, TaskRow};

/// Print a task list.
pub fn print_rows(title: &str, rows: &[TaskRow]) {
    println!("{} ({})", title, rows.len());
    for row in rows {
        println!("  {}", row_line(row));
    }
}

fn row_line(row: &TaskRow) -> String {
    let state = row.state.map(|s| s.as_str()).unwrap_or("UNKNOWN");
    let mut line = format!("{} | {}", row.task_id, state);

    if let Some(progress) = &row.progress {
        line.push_str(&format!(" | {}", progress_line(progress)));
    }
    if let Some(plan) = &row.owner_plan_id {
        line.push_str(&format!(" | plan {}", plan));
    }
    if let RowStatus::Error(message) = &row.status {
        line.push_str(&format!(" | {}", message));
    }
    line
}

/// One-line progress summary.
pub fn progress_line(view: &ProgressView) -> String {
    let percent = view
        .percent_complete
        .map(|p| format!("{:.1}%", p))
        .unwrap_or_else(|| "--".to_string());
    format!(
        "{} | {} | {} | ETA {}",
        percent, view.formatted_transferred, view.formatted_speed, view.formatted_eta
    )
}

/// Print consumption totals.
pub fn print_consumption(totals: &ConsumptionTotals) {
    println!(
        "Consumption: {} over {} tasks",
        format_bytes(totals.total_bytes),
        totals.task_count
    );
    for (plan, bytes) in &totals.by_plan {
        println!("  {}: {}", plan, format_bytes(*bytes));
    }
    if totals.unassigned_bytes > 0 {
        println!("  (no plan): {}", format_bytes(totals.unassigned_bytes));
    }
}

/// Print a browser view.
pub fn print_browser(view: &BrowserView) {
    let trail: Vec<&str> = view.breadcrumbs.iter().map(|n| n.label.as_str()).collect();
    println!("{}", trail.join(" > "));
    println!("[{}]", view.display_path);

    match view.state {
        LoadState::Idle => println!("  (not loaded)"),
        LoadState::Loading => println!("  loading..."),
        LoadState::Error => println!(
            "  error: {}",
            view.error.as_deref().unwrap_or("unknown failure")
        ),
        LoadState::Loaded if view.listing.is_empty() => println!("  (empty)"),
        LoadState::Loaded => print_listing(&view.listing),
    }
}

fn print_listing(listing: &Listing) {
    match listing {
        Listing::Entries(entries) => {
            for entry in entries {
                match (entry.is_directory, entry.size_bytes) {
                    (true, _) => println!("  {}/", entry.name),
                    (false, Some(size)) => println!("  {}  {}", entry.name, format_bytes(size)),
                    (false, None) => println!("  {}", entry.name),
                }
            }
        }
        Listing::Chunks(chunks) => {
            for chunk in chunks {
                println!(
                    "  #{:<4} {}  {}  {:?}",
                    chunk.sequence,
                    chunk.chunk_id,
                    format_bytes(chunk.size_bytes),
                    chunk.status
                );
            }
        }
    }
}
