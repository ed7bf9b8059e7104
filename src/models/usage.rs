use serde::Serialize;

/// Space accounting for one mounted filesystem. `total_bytes == 0` means unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    pub mount_point: String,
    pub total_bytes: u64,
    pub used_bytes:  u64,
    pub free_bytes:  u64,
}

impl DiskUsage {
    pub fn unavailable(mount_point: &str) -> Self {
        Self { mount_point: mount_point.to_string(), total_bytes: 0, used_bytes: 0, free_bytes: 0 }
    }

    pub fn is_known(&self) -> bool { self.total_bytes != 0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageClassification {
    pub percent_used: u8,
    pub is_warning:   bool,
}

/// Classify a usage sample against `warning_threshold` (percent, 0-100).
///
/// No sample reads as 0% used. A sample with zero total reads as 100% used,
/// so an unreadable filesystem is never reported as comfortably empty.
pub fn classify(usage: Option<&DiskUsage>, warning_threshold: u8) -> UsageClassification {
    let percent_used = match usage {
        None                         => 0,
        Some(u) if u.total_bytes == 0 => 100,
        Some(u) => {
            let pct = u.used_bytes as u128 * 100 / u.total_bytes as u128;
            pct.min(100) as u8
        }
    };
    UsageClassification { percent_used, is_warning: percent_used >= warning_threshold }
}
