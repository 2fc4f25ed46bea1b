//! Human-facing formatting of rates, durations and sizes.

/// Shown wherever a value cannot be estimated yet.
pub const UNKNOWN: &str = "--";

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * 1024.0;
const GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Format a transfer rate.
///
/// Below 1024 B/s the integer part is shown in B/s; below 1 MiB/s the rate is
/// shown in KB/s with two decimals, above that in MB/s with two decimals.
pub fn format_speed(bytes_per_sec: f64) -> String {
    if !bytes_per_sec.is_finite() {
        return UNKNOWN.to_string();
    }
    // a shrinking counter is shown as a stalled transfer
    let speed = bytes_per_sec.max(0.0);

    if speed < KB {
        format!("{} B/s", speed.trunc() as u64)
    } else if speed < MB {
        format!("{:.2} KB/s", speed / KB)
    } else {
        format!("{:.2} MB/s", speed / MB)
    }
}

/// Format a remaining time. Components are truncated, not rounded.
pub fn format_eta(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return UNKNOWN.to_string();
    }
    let total = seconds.trunc() as u64;

    if total < 60 {
        format!("{}s", total)
    } else if total < 3600 {
        format!("{}m {}s", total / 60, total % 60)
    } else {
        format!("{}h {}m", total / 3600, (total % 3600) / 60)
    }
}

/// Format a byte count.
pub fn format_bytes(bytes: u64) -> String {
    let value = bytes as f64;
    if value < KB {
        format!("{} B", bytes)
    } else if value < MB {
        format!("{:.2} KB", value / KB)
    } else if value < GB {
        format!("{:.2} MB", value / MB)
    } else {
        format!("{:.2} GB", value / GB)
    }
}

/// Format `completed / total` byte counters.
pub fn format_transferred(completed: u64, total: u64) -> String {
    format!("{} / {}", format_bytes(completed), format_bytes(total))
}
