//! Storage figures shown above the selection tree.

use serde::{Deserialize, Serialize};

/// Device storage bar figures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub other_apps_percent: u8,
    /// End of the app segment, drawn on top of the other-apps segment
    pub this_app_percent: u8,
    pub human_readable_used_of_total: String,
}

/// Content of the pre-sync confirmation dialog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfirmation {
    pub projected_bytes: u64,
    pub projected_size_label: String,
    pub wifi_only: bool,
}

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with decimal short units, e.g. `1.5 MB`.
pub fn format_short_file_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else if value >= 100.0 {
        format!("{:.0} {}", value, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_short_file_size() {
        assert_eq!(format_short_file_size(0), "0 B");
        assert_eq!(format_short_file_size(999), "999 B");
        assert_eq!(format_short_file_size(1_500), "1.5 KB");
        assert_eq!(format_short_file_size(250_000_000), "250 MB");
        assert_eq!(format_short_file_size(20_000_000_000), "20.0 GB");
    }
}
