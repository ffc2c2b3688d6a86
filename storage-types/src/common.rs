//! Byte ranges and human-readable sizes shared by the presentable model

use anyhow::Result;
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};

const UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// A contiguous byte region of a block device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    /// Start byte (inclusive)
    pub start: u64,

    /// End byte (exclusive)
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, size: u64) -> Self {
        Self {
            start,
            end: start.saturating_add(size),
        }
    }

    /// Get the size of this range in bytes
    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// True when `offset` lies strictly inside the range (the start itself is excluded).
    pub fn strictly_contains(&self, offset: u64) -> bool {
        offset > self.start && offset < self.end
    }
}

/// Convert bytes to human-readable format (e.g., "1.50 GB")
pub fn bytes_to_pretty(bytes: &u64, add_bytes: bool) -> String {
    let mut steps = 0;
    let mut val: f64 = *bytes as f64;

    while val > 1024. && steps < UNITS.len() - 1 {
        val /= 1024.;
        steps += 1;
    }

    let unit = UNITS[steps];

    if add_bytes {
        let bytes_str = bytes.to_formatted_string(&Locale::en);
        format!("{:.2} {} ({} bytes)", val, unit, bytes_str)
    } else {
        format!("{:.2} {}", val, unit)
    }
}

/// Parse human-readable format to bytes (e.g., "1.5 GB" -> bytes)
pub fn pretty_to_bytes(pretty: &str) -> Result<u64> {
    let split = pretty.split_whitespace().collect::<Vec<&str>>();
    let string_value = split
        .first()
        .ok_or_else(|| anyhow::anyhow!("Invalid input"))?;

    let mut val: f64 = string_value.parse()?;
    let unit = if split.len() > 1 {
        *split
            .last()
            .ok_or_else(|| anyhow::anyhow!("Invalid input"))?
    } else {
        "B"
    };

    let steps = UNITS
        .iter()
        .position(|candidate| *candidate == unit)
        .ok_or_else(|| anyhow::anyhow!("Invalid unit: {}", unit))?;

    for _ in 0..steps {
        val *= 1024.;
    }

    Ok(val as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_sizes_use_binary_steps() {
        assert_eq!(bytes_to_pretty(&512, false), "512.00 B");
        assert_eq!(bytes_to_pretty(&(100 * 1024 * 1024 * 1024), false), "100.00 GB");
        assert_eq!(
            bytes_to_pretty(&(3 * 1024 * 1024), true),
            "3.00 MB (3,145,728 bytes)"
        );
    }

    #[test]
    fn parses_pretty_sizes_and_bare_numbers() {
        assert_eq!(pretty_to_bytes("100.00 GB").unwrap(), 100 * 1024 * 1024 * 1024);
        assert_eq!(pretty_to_bytes("4096").unwrap(), 4096);
        assert!(pretty_to_bytes("12 parsecs").is_err());
    }

    #[test]
    fn strict_containment_excludes_range_start() {
        let range = ByteRange::new(0, 1000);
        assert!(!range.strictly_contains(0));
        assert!(range.strictly_contains(1));
        assert!(!range.strictly_contains(1000));
        assert_eq!(range.size(), 1000);
    }
}
