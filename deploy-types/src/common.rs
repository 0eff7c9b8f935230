// SPDX-License-Identifier: GPL-3.0-only

//! Common utility helpers shared across models

use num_format::{Locale, ToFormattedString};

/// One mebibyte in bytes.
pub const MIB: u64 = 1024 * 1024;

/// Convert bytes to a human-readable string (e.g., "1.50 GB")
pub fn bytes_to_pretty(bytes: u64, add_bytes: bool) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let pretty = if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    };

    if add_bytes && unit > 0 {
        format!("{} ({} bytes)", pretty, bytes.to_formatted_string(&Locale::en))
    } else {
        pretty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_bytes_is_zero_b() {
        assert_eq!(bytes_to_pretty(0, false), "0 B");
    }

    #[test]
    fn mib_values_render_in_mb() {
        assert_eq!(bytes_to_pretty(499 * MIB, false), "499.00 MB");
    }

    #[test]
    fn add_bytes_appends_exact_count() {
        assert_eq!(
            bytes_to_pretty(2 * MIB, true),
            "2.00 MB (2,097,152 bytes)"
        );
    }
}
