//! Response decoding into a structured return status.

use crate::constants::{NO_DIGIT_RESULT, SUCCESS_CODE, TIMEOUT_MARKER};
use std::fmt;

/// Decoded status of one command/response cycle.
///
/// Created per dispatch, immutable afterwards. Callers must check
/// [`is_command_error`](Self::is_command_error) before trusting
/// [`result`](Self::result).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnStatus {
    command: String,
    raw: Option<String>,
    code: Option<u16>,
    result: Option<String>,
}

impl ReturnStatus {
    /// Decode one raw response line for `command`.
    ///
    /// `raw` is `None` when the stream closed before a line arrived; the
    /// status then decodes as a command error with no usable result.
    pub fn decode(command: impl Into<String>, raw: Option<String>) -> Self {
        let command = command.into();
        let raw = raw.map(|line| {
            line.trim_end_matches(|c| c == '\r' || c == '\n')
                .to_string()
        });

        let mut code = None;
        let mut result = None;
        if let Some(line) = raw.as_deref() {
            let mut tokens = line.split_whitespace();
            code = tokens
                .next()
                .and_then(|t| t.parse::<u16>().ok());
            // The result is only meaningful on a success code; anything
            // else is the engine's free-form complaint text.
            if code == Some(SUCCESS_CODE) {
                result = tokens
                    .next()
                    .and_then(|t| t.split_once('='))
                    .map(|(_, value)| value.to_string());
            }
        }

        Self {
            command,
            raw,
            code,
            result,
        }
    }

    /// The command line this status answers.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The raw response line, `None` if the stream closed.
    pub fn raw(&self) -> Option<&str> {
        self.raw
            .as_deref()
    }

    /// Numeric status code, if the first token parsed as one.
    pub fn code(&self) -> Option<u16> {
        self.code
    }

    /// The decoded `result=` value.
    pub fn result(&self) -> Option<&str> {
        self.result
            .as_deref()
    }

    /// `true` when the status code was not `200` or no result value could
    /// be extracted.
    pub fn is_command_error(&self) -> bool {
        self.result
            .is_none()
            || self.code != Some(SUCCESS_CODE)
    }

    /// `true` only when the raw line carries the `(timeout)` marker.
    pub fn is_timeout(&self) -> bool {
        self.raw
            .as_deref()
            .is_some_and(|line| line.contains(TIMEOUT_MARKER))
    }

    /// The parenthesized qualifier, e.g. `timeout`, `dtmf`, `hangup`.
    pub fn qualifier(&self) -> Option<&str> {
        let line = self
            .raw
            .as_deref()?;
        let start = line.find('(')? + 1;
        let len = line[start..].find(')')?;
        Some(&line[start..start + len])
    }

    /// The `endpos=<n>` field reported by playback and recording commands.
    pub fn endpos(&self) -> Option<u64> {
        self.raw
            .as_deref()?
            .split_whitespace()
            .find_map(|t| t.strip_prefix("endpos="))
            .and_then(|v| {
                v.parse()
                    .ok()
            })
    }

    /// The pressed DTMF digit for digit-oriented commands.
    ///
    /// A result of literal `0` denotes "no digit", not the NUL character;
    /// any other value is the ASCII code of the digit pressed.
    pub fn digit(&self) -> Option<char> {
        let result = self
            .result
            .as_deref()?;
        if result == NO_DIGIT_RESULT {
            return None;
        }
        result
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
    }

    /// The raw digit string collected by multi-digit reads.
    pub fn digits(&self) -> &str {
        self.result
            .as_deref()
            .unwrap_or("")
    }
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} >> {}",
            self.command,
            self.raw
                .as_deref()
                .unwrap_or("(no response)")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_success_with_zero_result() {
        let rs = ReturnStatus::decode("ANSWER", Some("200 result=0".to_string()));
        assert!(!rs.is_command_error());
        assert_eq!(rs.code(), Some(200));
        assert_eq!(rs.result(), Some("0"));
        assert!(!rs.is_timeout());
    }

    #[test]
    fn decode_non_success_code_is_command_error() {
        let rs = ReturnStatus::decode(
            "BOGUS",
            Some("510 Invalid or unknown command".to_string()),
        );
        assert!(rs.is_command_error());
        assert_eq!(rs.code(), Some(510));
        assert_eq!(rs.result(), None);
    }

    #[test]
    fn decode_closed_stream_is_command_error() {
        let rs = ReturnStatus::decode("ANSWER", None);
        assert!(rs.is_command_error());
        assert_eq!(rs.raw(), None);
        assert_eq!(rs.code(), None);
        assert_eq!(rs.result(), None);
    }

    #[test]
    fn decode_missing_result_token_is_command_error() {
        let rs = ReturnStatus::decode("ANSWER", Some("200".to_string()));
        assert!(rs.is_command_error());
        assert_eq!(rs.code(), Some(200));
    }

    #[test]
    fn timeout_marker_detected() {
        let rs = ReturnStatus::decode(
            "GET DATA prompt 2000 4",
            Some("200 result=42 (timeout)".to_string()),
        );
        assert!(rs.is_timeout());
        assert_eq!(rs.qualifier(), Some("timeout"));
        assert_eq!(rs.digits(), "42");

        let rs = ReturnStatus::decode(
            "GET DATA prompt 2000 4",
            Some("200 result=42".to_string()),
        );
        assert!(!rs.is_timeout());
        assert_eq!(rs.qualifier(), None);
    }

    #[test]
    fn endpos_parsed_from_playback_responses() {
        let rs = ReturnStatus::decode(
            "STREAM FILE welcome #",
            Some("200 result=0 endpos=163840".to_string()),
        );
        assert_eq!(rs.endpos(), Some(163840));

        let rs = ReturnStatus::decode(
            "RECORD FILE msg gsm # -1",
            Some("200 result=53 (dtmf) endpos=8000".to_string()),
        );
        assert_eq!(rs.qualifier(), Some("dtmf"));
        assert_eq!(rs.endpos(), Some(8000));
    }

    #[test]
    fn digit_zero_means_no_digit() {
        let rs = ReturnStatus::decode("WAIT FOR DIGIT -1", Some("200 result=0".to_string()));
        assert_eq!(rs.digit(), None);
    }

    #[test]
    fn digit_decodes_ascii_code() {
        let rs = ReturnStatus::decode("WAIT FOR DIGIT -1", Some("200 result=53".to_string()));
        assert_eq!(rs.digit(), Some('5'));

        let rs = ReturnStatus::decode("WAIT FOR DIGIT -1", Some("200 result=35".to_string()));
        assert_eq!(rs.digit(), Some('#'));
    }

    #[test]
    fn display_renders_command_and_raw_line() {
        let rs = ReturnStatus::decode("ANSWER", Some("200 result=0".to_string()));
        assert_eq!(rs.to_string(), "ANSWER >> 200 result=0");

        let rs = ReturnStatus::decode("ANSWER", None);
        assert_eq!(rs.to_string(), "ANSWER >> (no response)");
    }

    #[test]
    fn trailing_newline_stripped_before_decode() {
        let rs = ReturnStatus::decode("ANSWER", Some("200 result=0\r\n".to_string()));
        assert_eq!(rs.raw(), Some("200 result=0"));
        assert_eq!(rs.result(), Some("0"));
    }
}
