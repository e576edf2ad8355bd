//! Amount normalisation for Korean currency strings.
//!
//! Converts an extracted amount excerpt (e.g., "5천만원", "1억", "3000만원")
//! into an integer number of won so results from different insurers can be
//! placed side by side.
//!
//! # Scale units
//!
//! - 억: ×100,000,000
//! - 천만: ×10,000,000
//! - 만: ×10,000
//! - 원: ×1
//!
//! Scales are tried in that order and the first one that matches anywhere in
//! the string wins; compound amounts such as "1억5천만원" are not summed.

use std::sync::LazyLock;

use regex::Regex;

/// Scale patterns in priority order. Digits may carry thousands separators.
static SCALES: LazyLock<Vec<(Regex, i64)>> = LazyLock::new(|| {
    [
        (r"(\d[\d,]*)\s*억", 100_000_000),
        (r"(\d[\d,]*)\s*천만", 10_000_000),
        (r"(\d[\d,]*)\s*만", 10_000),
        (r"(\d[\d,]*)\s*원", 1),
    ]
    .into_iter()
    .map(|(pattern, unit)| (Regex::new(pattern).expect("static scale pattern"), unit))
    .collect()
});

/// Normalise an amount string into won.
///
/// Returns `None` when no scale pattern matches or the product overflows.
/// Never estimates: a percentage or bare keyword yields `None`.
pub fn normalize_amount(value: &str) -> Option<i64> {
    for (re, unit) in SCALES.iter() {
        if let Some(caps) = re.captures(value) {
            let digits: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
            let base: i64 = digits.parse().ok()?;
            return base.checked_mul(*unit);
        }
    }
    None
}
