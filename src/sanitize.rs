//! Argument normalization applied before command formatting.
//!
//! The wire protocol distinguishes "unspecified/unlimited" from literal
//! zero, so every command taking these argument kinds runs the same rules
//! before its line is formatted.

use crate::constants::{
    DEFAULT_AUDIO_FORMAT, DEFAULT_ESCAPE_DIGITS, NO_ESCAPE_DIGITS, WAIT_FOREVER,
};

/// Convert a timeout in seconds to wire milliseconds.
///
/// Absent, zero or negative means "wait forever" (`-1` on the wire).
pub fn timeout(secs: Option<i32>) -> i64 {
    match secs {
        Some(s) if s > 0 => i64::from(s) * 1000,
        _ => WAIT_FOREVER,
    }
}

/// Normalize an escape-digit set.
///
/// Absent digits fall back to `#`; explicitly empty digits become the `X`
/// sentinel, which matches no DTMF digit.
pub fn escape_digits(digits: Option<&str>) -> &str {
    match digits {
        None => DEFAULT_ESCAPE_DIGITS,
        Some("") => NO_ESCAPE_DIGITS,
        Some(d) => d,
    }
}

/// Normalize a maximum digit count into its wire token.
///
/// Absent, zero or negative means "unlimited", rendered as an empty token.
pub fn max_digits(count: Option<i32>) -> String {
    match count {
        Some(n) if n > 0 => n.to_string(),
        _ => String::new(),
    }
}

/// Normalize an audio format name, defaulting the codec.
pub fn audio_format(format: Option<&str>) -> &str {
    match format {
        None | Some("") => DEFAULT_AUDIO_FORMAT,
        Some(f) => f,
    }
}
