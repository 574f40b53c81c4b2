//! Command formatting and per-command result classification.

use crate::constants::{NO_ESCAPE_DIGITS, WAIT_FOREVER};
use crate::error::{AgiError, AgiResult};
use crate::sanitize;
use std::fmt::Write as _;

/// Validate that a user-provided string contains no newline characters.
///
/// AGI commands are line-delimited; embedded newlines would allow
/// injection of arbitrary protocol commands.
fn validate_no_newlines(s: &str, context: &str) -> AgiResult<()> {
    if s.contains('\n') || s.contains('\r') {
        return Err(AgiError::invalid_argument(format!(
            "{} must not contain newlines",
            context
        )));
    }
    Ok(())
}

/// AGI command types.
///
/// Each variant carries caller-level arguments; sanitization and argument
/// preconditions run in [`to_wire_format`](Self::to_wire_format), before
/// any bytes are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgiCommand {
    /// Answer the channel if not already up.
    Answer,
    /// Schedule an automatic hangup `seconds` into the future; 0 disables.
    SetAutoHangup { seconds: u32 },
    /// Query the status of a channel (the current one if `None`).
    ChannelStatus { channel: Option<String> },
    /// Execute a dialplan application with optional options.
    Exec {
        application: String,
        options: Option<String>,
    },
    /// Play a prompt and collect DTMF digits.
    GetData {
        file: String,
        timeout: Option<i32>,
        max_digits: Option<i32>,
    },
    /// Read a channel variable.
    GetVariable { name: String },
    /// Hang up a channel (the current one if `None`).
    Hangup { channel: Option<String> },
    /// Do nothing; the engine echoes a success status.
    Noop { message: String },
    /// Receive one character of text; requires a positive timeout.
    ReceiveChar { timeout: i32 },
    /// Receive a text string; requires a positive timeout.
    ReceiveText { timeout: i32 },
    /// Record channel audio to a file until an escape digit or timeout.
    RecordFile {
        file: String,
        format: Option<String>,
        escape_digits: Option<String>,
        timeout: Option<i32>,
        beep: bool,
    },
    /// Say a digit string, interruptible by the escape digits.
    SayDigits {
        digits: String,
        escape_digits: Option<String>,
    },
    /// Say a number, interruptible by the escape digits.
    SayNumber {
        number: i64,
        escape_digits: Option<String>,
    },
    /// Say a character string phonetically.
    SayPhonetic {
        text: String,
        escape_digits: Option<String>,
    },
    /// Say a time given as UNIX epoch seconds.
    SayTime {
        epoch_secs: i64,
        escape_digits: Option<String>,
    },
    /// Send an image on the channel.
    SendImage { image: String },
    /// Send a text on the channel.
    SendText { text: String },
    /// Change the caller id of the current channel.
    SetCallerId { number: String },
    /// Set the dialplan context for continuation after exit.
    SetContext { context: String },
    /// Set the dialplan extension for continuation after exit.
    SetExtension { extension: String },
    /// Toggle the music-on-hold generator.
    SetMusic { on: bool, class: Option<String> },
    /// Set the dialplan priority for continuation after exit.
    SetPriority { priority: i32 },
    /// Set a channel variable.
    SetVariable { name: String, value: String },
    /// Stream an audio file, interruptible by the escape digits.
    StreamFile {
        file: String,
        escape_digits: Option<String>,
    },
    /// Toggle TDD transmission/reception on capable channels.
    TddMode { on: bool },
    /// Send a message to the console verbose log, level 1-4.
    Verbose { message: String, level: u8 },
    /// Wait for a single DTMF digit.
    WaitForDigit { timeout: Option<i32> },
    /// Raw passthrough for commands without a typed variant.
    Raw { command: String },
}

/// Join a verb and its arguments, skipping empty tokens.
fn format_command(verb: &str, args: &[&str]) -> String {
    let mut line = String::from(verb);
    for arg in args {
        if arg.is_empty() {
            continue;
        }
        line.push(' ');
        line.push_str(arg);
    }
    line
}

impl AgiCommand {
    /// Validate all user-supplied fields, then convert to the wire line
    /// (without terminator).
    pub fn to_wire_format(&self) -> AgiResult<String> {
        match self {
            AgiCommand::Answer => Ok("ANSWER".to_string()),
            AgiCommand::SetAutoHangup { seconds } => {
                Ok(format_command("SET AUTOHANGUP", &[&seconds.to_string()]))
            }
            AgiCommand::ChannelStatus { channel } => {
                if let Some(c) = channel {
                    validate_no_newlines(c, "channel name")?;
                }
                Ok(format_command(
                    "CHANNEL STATUS",
                    &[channel
                        .as_deref()
                        .unwrap_or("")],
                ))
            }
            AgiCommand::Exec {
                application,
                options,
            } => {
                validate_no_newlines(application, "application name")?;
                if let Some(o) = options {
                    validate_no_newlines(o, "application options")?;
                }
                Ok(format_command(
                    "EXEC",
                    &[
                        application,
                        options
                            .as_deref()
                            .unwrap_or(""),
                    ],
                ))
            }
            AgiCommand::GetData {
                file,
                timeout,
                max_digits,
            } => {
                validate_no_newlines(file, "file name")?;
                let timeout = sanitize::timeout(*timeout);
                let max_digits = sanitize::max_digits(*max_digits);
                Ok(format_command(
                    "GET DATA",
                    &[file, &timeout.to_string(), &max_digits],
                ))
            }
            AgiCommand::GetVariable { name } => {
                validate_no_newlines(name, "variable name")?;
                Ok(format_command("GET VARIABLE", &[name]))
            }
            AgiCommand::Hangup { channel } => {
                if let Some(c) = channel {
                    validate_no_newlines(c, "channel name")?;
                }
                Ok(format_command(
                    "HANGUP",
                    &[channel
                        .as_deref()
                        .unwrap_or("")],
                ))
            }
            AgiCommand::Noop { message } => {
                validate_no_newlines(message, "message")?;
                Ok(format_command("NOOP", &[message]))
            }
            AgiCommand::ReceiveChar { timeout } => {
                let timeout = Self::positive_timeout(*timeout)?;
                Ok(format_command("RECEIVE CHAR", &[&timeout.to_string()]))
            }
            AgiCommand::ReceiveText { timeout } => {
                let timeout = Self::positive_timeout(*timeout)?;
                Ok(format_command("RECEIVE TEXT", &[&timeout.to_string()]))
            }
            AgiCommand::RecordFile {
                file,
                format,
                escape_digits,
                timeout,
                beep,
            } => {
                validate_no_newlines(file, "file name")?;
                let format = sanitize::audio_format(format.as_deref());
                let escape = sanitize::escape_digits(escape_digits.as_deref());
                let timeout = sanitize::timeout(*timeout);
                // Without an escape digit or a timeout the recording could
                // never terminate.
                if escape == NO_ESCAPE_DIGITS && timeout == WAIT_FOREVER {
                    return Err(AgiError::invalid_argument(
                        "need at least one escape digit or a positive timeout",
                    ));
                }
                let mut line = format_command(
                    "RECORD FILE",
                    &[file, format, escape, &timeout.to_string()],
                );
                if *beep {
                    line.push_str(" beep");
                }
                Ok(line)
            }
            AgiCommand::SayDigits {
                digits,
                escape_digits,
            } => {
                validate_no_newlines(digits, "digit string")?;
                let escape = sanitize::escape_digits(escape_digits.as_deref());
                Ok(format_command("SAY DIGITS", &[digits, escape]))
            }
            AgiCommand::SayNumber {
                number,
                escape_digits,
            } => {
                let escape = sanitize::escape_digits(escape_digits.as_deref());
                Ok(format_command("SAY NUMBER", &[&number.to_string(), escape]))
            }
            AgiCommand::SayPhonetic {
                text,
                escape_digits,
            } => {
                validate_no_newlines(text, "text")?;
                let escape = sanitize::escape_digits(escape_digits.as_deref());
                Ok(format_command("SAY PHONETIC", &[text, escape]))
            }
            AgiCommand::SayTime {
                epoch_secs,
                escape_digits,
            } => {
                let escape = sanitize::escape_digits(escape_digits.as_deref());
                Ok(format_command(
                    "SAY TIME",
                    &[&epoch_secs.to_string(), escape],
                ))
            }
            AgiCommand::SendImage { image } => {
                validate_no_newlines(image, "image name")?;
                Ok(format_command("SEND IMAGE", &[image]))
            }
            AgiCommand::SendText { text } => {
                validate_no_newlines(text, "text")?;
                Ok(format_command("SEND TEXT", &[text]))
            }
            AgiCommand::SetCallerId { number } => {
                validate_no_newlines(number, "caller id number")?;
                Ok(format_command("SET CALLERID", &[number]))
            }
            AgiCommand::SetContext { context } => {
                validate_no_newlines(context, "context name")?;
                Ok(format_command("SET CONTEXT", &[context]))
            }
            AgiCommand::SetExtension { extension } => {
                validate_no_newlines(extension, "extension")?;
                Ok(format_command("SET EXTENSION", &[extension]))
            }
            AgiCommand::SetMusic { on, class } => {
                if let Some(c) = class {
                    validate_no_newlines(c, "music class")?;
                }
                let mode = if *on { "ON" } else { "OFF" };
                Ok(format_command(
                    "SET MUSIC",
                    &[
                        mode,
                        class
                            .as_deref()
                            .unwrap_or("default"),
                    ],
                ))
            }
            AgiCommand::SetPriority { priority } => {
                Ok(format_command("SET PRIORITY", &[&priority.to_string()]))
            }
            AgiCommand::SetVariable { name, value } => {
                validate_no_newlines(name, "variable name")?;
                validate_no_newlines(value, "variable value")?;
                let mut line = format_command("SET VARIABLE", &[name]);
                // The value is quoted so that embedded spaces survive the
                // engine's argument splitting.
                let _ = write!(line, " \"{}\"", value);
                Ok(line)
            }
            AgiCommand::StreamFile {
                file,
                escape_digits,
            } => {
                validate_no_newlines(file, "file name")?;
                let escape = sanitize::escape_digits(escape_digits.as_deref());
                Ok(format_command("STREAM FILE", &[file, escape]))
            }
            AgiCommand::TddMode { on } => {
                let mode = if *on { "ON" } else { "OFF" };
                Ok(format_command("TDD MODE", &[mode]))
            }
            AgiCommand::Verbose { message, level } => {
                validate_no_newlines(message, "message")?;
                Ok(format!("VERBOSE \"{}\" {}", message, level))
            }
            AgiCommand::WaitForDigit { timeout } => {
                let timeout = sanitize::timeout(*timeout);
                Ok(format_command("WAIT FOR DIGIT", &[&timeout.to_string()]))
            }
            AgiCommand::Raw { command } => {
                validate_no_newlines(command, "command")?;
                if command
                    .trim()
                    .is_empty()
                {
                    return Err(AgiError::invalid_argument("command must not be empty"));
                }
                Ok(command
                    .trim()
                    .to_string())
            }
        }
    }

    /// Decoded result values this command's contract treats as a hard
    /// failure rather than data.
    ///
    /// Digit-oriented commands report pressed digits (and `0` for "no
    /// digit") through the same field, so only the documented failure
    /// literal counts; commands like `GET VARIABLE` treat every decoded
    /// value as data.
    pub(crate) fn failure_results(&self) -> &'static [&'static str] {
        match self {
            AgiCommand::Exec { .. } => &["-2"],
            AgiCommand::Answer
            | AgiCommand::ChannelStatus { .. }
            | AgiCommand::GetData { .. }
            | AgiCommand::Hangup { .. }
            | AgiCommand::ReceiveChar { .. }
            | AgiCommand::ReceiveText { .. }
            | AgiCommand::RecordFile { .. }
            | AgiCommand::SayDigits { .. }
            | AgiCommand::SayNumber { .. }
            | AgiCommand::SayPhonetic { .. }
            | AgiCommand::SayTime { .. }
            | AgiCommand::SendImage { .. }
            | AgiCommand::SendText { .. }
            | AgiCommand::StreamFile { .. }
            | AgiCommand::TddMode { .. }
            | AgiCommand::WaitForDigit { .. } => &["-1"],
            AgiCommand::SetAutoHangup { .. }
            | AgiCommand::GetVariable { .. }
            | AgiCommand::Noop { .. }
            | AgiCommand::SetCallerId { .. }
            | AgiCommand::SetContext { .. }
            | AgiCommand::SetExtension { .. }
            | AgiCommand::SetMusic { .. }
            | AgiCommand::SetPriority { .. }
            | AgiCommand::SetVariable { .. }
            | AgiCommand::Verbose { .. }
            | AgiCommand::Raw { .. } => &[],
        }
    }

    fn positive_timeout(secs: i32) -> AgiResult<i64> {
        let timeout = sanitize::timeout(Some(secs));
        if timeout == WAIT_FOREVER {
            return Err(AgiError::invalid_argument("timeout must be positive"));
        }
        Ok(timeout)
    }
}
