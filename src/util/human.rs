/// Format a raw byte count into a human-readable string: "12.5 GB"
pub fn fmt_bytes(bytes: u64) -> String {
    const TB: f64 = 1_099_511_627_776.0;
    const GB: f64 = 1_073_741_824.0;
    const MB: f64 = 1_048_576.0;
    const KB: f64 = 1_024.0;
    let b = bytes as f64;
    if b >= TB      { format!("{:.1} TB", b / TB) }
    else if b >= GB { format!("{:.1} GB", b / GB) }
    else if b >= MB { format!("{:.1} MB", b / MB) }
    else if b >= KB { format!("{:.1} KB", b / KB) }
    else            { format!("{} B", bytes) }
}

/// "used / total" for a usage sample, or "unknown" when total is zero.
pub fn fmt_usage(used: u64, total: u64) -> String {
    if total == 0 { return "unknown".to_string(); }
    format!("{} / {}", fmt_bytes(used), fmt_bytes(total))
}
