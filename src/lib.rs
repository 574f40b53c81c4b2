//! Synchronous Asterisk Gateway Interface (AGI) client.
//!
//! Asterisk runs a dialplan script as a child process and talks to it over
//! the script's standard streams: at startup the engine pushes a block of
//! `agi_*` call metadata, then the script drives the call leg one
//! line-delimited command/response exchange at a time.
//!
//! # Architecture
//!
//! - [`AgiClient`] — the session object owning the streams, the cached
//!   startup environment and the resolved caller identity
//! - [`AgiCommand`] — typed command variants with wire formatting and
//!   argument sanitization
//! - [`ReturnStatus`] — the decoded status of one command/response cycle
//!
//! Every command method funnels through [`AgiClient::dispatch`], which
//! holds one lock across the write-then-read pair so concurrent callers
//! cannot interleave their exchanges. Dispatch is blocking throughout;
//! timeouts are protocol arguments interpreted by the engine, not
//! transport deadlines.
//!
//! # Examples
//!
//! A dialplan script over the process standard streams:
//!
//! ```rust,no_run
//! use asterisk_agi::{AgiClient, AgiResult};
//!
//! fn main() -> AgiResult<()> {
//!     let agi = AgiClient::from_stdio();
//!
//!     agi.answer()?;
//!     agi.stream_file("welcome", Some("#"))?;
//!
//!     let input = agi.wait_for_digits("enter-pin", Some(10), Some(4))?;
//!     if !input.is_timeout() {
//!         agi.say_digits(input.digits(), None)?;
//!     }
//!
//!     agi.hangup(None)?;
//!     Ok(())
//! }
//! ```
//!
//! Any pair of byte streams works, which is how the crate is tested:
//!
//! ```rust
//! use asterisk_agi::AgiClient;
//! use std::io::Cursor;
//!
//! let script = "agi_callerid: \"John Smith\" <5551234567>\n\n200 result=0\n";
//! let client = AgiClient::from_streams(
//!     Cursor::new(script.as_bytes().to_vec()),
//!     Vec::<u8>::new(),
//! );
//!
//! assert_eq!(client.calleridnumber().unwrap(), "5551234567");
//! let status = client.answer().unwrap();
//! assert_eq!(status.result(), Some("0"));
//! ```
//!
//! # Errors
//!
//! Failures surface as [`AgiError`]: a non-success response raises
//! [`AgiError::CommandFailed`], a peer that closed its read side raises
//! [`AgiError::Hangup`] (an expected end-of-call condition, distinct from
//! protocol faults), and rejected arguments raise
//! [`AgiError::InvalidArgument`] before any bytes are sent. Commands
//! whose documented "failure" results are really data (pressed digits,
//! channel states, unset variables) return the status for the caller to
//! interpret instead of raising.

#[macro_use]
mod macros;

pub mod caller;
pub mod client;
pub mod command;
pub mod constants;
pub mod env;
pub mod error;
pub mod response;
pub mod sanitize;

mod transport;

pub use caller::CallerIdentity;
pub use client::{AgiClient, DialProtocol};
pub use command::AgiCommand;
pub use env::{EnvKey, Environment, ParseEnvKeyError};
pub use error::{AgiError, AgiResult};
pub use response::ReturnStatus;
