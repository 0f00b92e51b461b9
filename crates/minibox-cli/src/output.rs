//! Text rendering for `mbx` reports.
//!
//! Sizes are shown in binary units, quota use as a percentage.

const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

/// Renders `bytes` with the largest binary unit that keeps the value >= 1,
/// e.g. `500.0 MiB`. Plain bytes are printed without a fraction.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Formats `used` as a percentage of `limit`, e.g. "12.5%".
///
/// A zero limit is reported as "n/a".
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn percent_of(used: u64, limit: u64) -> String {
    if limit == 0 {
        return "n/a".to_string();
    }
    format!("{:.1}%", used as f64 * 100.0 / limit as f64)
}
