//! Protocol constants and wire literals.

/// Status code denoting protocol-level success in a response line.
pub const SUCCESS_CODE: u16 = 200;

/// Command line terminator.
pub const LINE_TERMINATOR: &str = "\n";

/// Marker substring the engine appends when an operation timed out.
pub const TIMEOUT_MARKER: &str = "(timeout)";

/// Wire sentinel for "wait forever" timeouts.
pub const WAIT_FOREVER: i64 = -1;

/// Escape digits used when the caller supplies none.
pub const DEFAULT_ESCAPE_DIGITS: &str = "#";

/// Wire sentinel meaning "accept no escape digit at all".
pub const NO_ESCAPE_DIGITS: &str = "X";

/// Audio format used when the caller supplies none.
pub const DEFAULT_AUDIO_FORMAT: &str = "gsm";

/// Result value digit-oriented commands use for "no digit pressed".
pub const NO_DIGIT_RESULT: &str = "0";

/// Diagnostic-stream prefix for outbound command lines.
pub const DIAG_SENT_PREFIX: &str = "    -- agi << ";

/// Diagnostic-stream prefix for inbound response lines.
pub const DIAG_RECV_PREFIX: &str = "    -- agi >> ";
