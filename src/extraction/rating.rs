//! Rating normalization.
//!
//! Widgets expose scores in many shapes (`data-rating="8"`, `"4.5 out of 5"`,
//! `"80%"`). We take the first run of digits and halve it, rounding half up,
//! then clamp into `0..=5`. This assumes a 10-point source scale and is an
//! approximation: a plain `"4"` on a 5-star widget becomes 2.

use regex::Regex;
use std::sync::OnceLock;

static DIGIT_RUN: OnceLock<Option<Regex>> = OnceLock::new();

fn digit_run() -> Option<&'static Regex> {
    // ASCII only; `\d` would also accept other Unicode digit classes.
    DIGIT_RUN
        .get_or_init(|| Regex::new("[0-9]+").ok())
        .as_ref()
}

/// First run of ASCII digits in `raw`. Runs too long for `u64` saturate.
pub fn first_digit_run(raw: &str) -> Option<u64> {
    digit_run()?
        .find(raw)
        .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
}

/// `clamp(round(score / 2), 0, 5)` with halves rounded up.
pub fn to_five_point_scale(score: u64) -> u8 {
    (score / 2 + score % 2).min(5) as u8
}

/// Raw attribute or text value to a 0..=5 rating. No digits means 0.
pub fn normalize_rating(raw: &str) -> u8 {
    to_five_point_scale(first_digit_run(raw).unwrap_or(0))
}
