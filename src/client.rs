//! The AGI session client: owns the streams, the cached environment and
//! the command dispatch funnel.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use crate::caller::CallerIdentity;
use crate::command::AgiCommand;
use crate::constants::{DIAG_RECV_PREFIX, DIAG_SENT_PREFIX};
use crate::env::{EnvKey, Environment};
use crate::error::{AgiError, AgiResult};
use crate::response::ReturnStatus;
use crate::transport::{Streams, Transport};

/// Dial technologies the [`AgiClient::dial`] helper can assemble a dial
/// string for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialProtocol {
    /// A local dialplan channel, `LOCAL/<number>@<context>`.
    Local,
    /// An IAX2 peer, `IAX2/<username>@<context>/<number>`.
    Iax2,
}

/// One AGI session controlling one active call leg.
///
/// The client owns the three shared streams, the startup environment and
/// the resolved caller identity; share it by reference (or `Arc`) across
/// threads. Every command method funnels through
/// [`dispatch`](AgiClient::dispatch), which keeps each command/response
/// pair atomic.
///
/// Dispatch is blocking: a hung peer blocks the calling thread until the
/// peer's stream actually closes. Timeouts are protocol arguments passed
/// to the engine, never transport deadlines.
pub struct AgiClient {
    transport: Transport,
    env: OnceCell<Environment>,
    caller: OnceCell<CallerIdentity>,
    debug: AtomicBool,
}

impl std::fmt::Debug for AgiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgiClient")
            .field("environment_loaded", &self.env.get().is_some())
            .field("debug", &self.debug_enabled())
            .finish()
    }
}

impl AgiClient {
    /// Session over the process standard streams, the way the engine
    /// spawns dialplan scripts. The diagnostic channel goes to stderr.
    pub fn from_stdio() -> Self {
        Self::from_streams(BufReader::new(io::stdin()), io::stdout())
            .with_diagnostic(io::stderr())
    }

    /// Session over arbitrary streams, for embedding and tests.
    pub fn from_streams(
        response_in: impl BufRead + Send + 'static,
        command_out: impl Write + Send + 'static,
    ) -> Self {
        Self {
            transport: Transport::new(Box::new(response_in), Box::new(command_out)),
            env: OnceCell::new(),
            caller: OnceCell::new(),
            debug: AtomicBool::new(false),
        }
    }

    /// Attach a diagnostic stream for the `-- agi <<` / `-- agi >>` trace
    /// lines emitted in debug mode.
    pub fn with_diagnostic(self, diagnostic: impl Write + Send + 'static) -> Self {
        self.transport
            .set_diagnostic(Box::new(diagnostic));
        self
    }

    /// Enable or disable diagnostic trace lines.
    pub fn set_debug(&self, enabled: bool) {
        self.debug
            .store(enabled, Ordering::Relaxed);
    }

    /// `true` when diagnostic trace lines are enabled.
    pub fn debug_enabled(&self) -> bool {
        self.debug
            .load(Ordering::Relaxed)
    }

    // ---- startup environment ------------------------------------------

    /// The startup metadata block, ingested from the response stream on
    /// first access and cached for the session lifetime.
    pub fn environment(&self) -> AgiResult<&Environment> {
        if let Some(env) = self
            .env
            .get()
        {
            return Ok(env);
        }
        let mut streams = self
            .transport
            .lock();
        self.ingest_environment(&mut streams)
    }

    fn ingest_environment<'a>(&'a self, streams: &mut Streams) -> AgiResult<&'a Environment> {
        self.env
            .get_or_try_init(|| {
                trace!("reading startup environment block");
                Environment::read_from(streams.response_reader()).map_err(AgiError::from)
            })
    }

    /// One metadata value from the startup block.
    pub fn env_var(&self, key: impl AsRef<str>) -> AgiResult<Option<&str>> {
        Ok(self
            .environment()?
            .get(key))
    }

    /// The script path or URL the engine was asked to run.
    pub fn request(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::Request)
    }

    /// The engine's identifier for this call leg.
    pub fn channel(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::Channel)
    }

    /// Language configured for the channel.
    pub fn language(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::Language)
    }

    /// Channel technology, e.g. `SIP`.
    pub fn channel_type(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::Type)
    }

    /// Unique id of this call.
    pub fn uniqueid(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::UniqueId)
    }

    /// Caller presentation indicator.
    pub fn callingpres(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::CallingPres)
    }

    /// ANI II digits.
    pub fn callingani2(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::CallingAni2)
    }

    /// Caller type-of-number.
    pub fn callington(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::CallingTon)
    }

    /// Caller transit network selector.
    pub fn callingtns(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::CallingTns)
    }

    /// Dialed number identifier.
    pub fn dnid(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::Dnid)
    }

    /// Redirecting number, if the call was forwarded.
    pub fn rdnis(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::Rdnis)
    }

    /// Dialplan context the script was entered from.
    pub fn context(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::Context)
    }

    /// Dialplan extension the script was entered from.
    pub fn extension(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::Extension)
    }

    /// Dialplan priority the script was entered from.
    pub fn priority(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::Priority)
    }

    /// Whether the script runs in enhanced mode.
    pub fn enhanced(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::Enhanced)
    }

    /// Billing account code configured for the channel.
    pub fn accountcode(&self) -> AgiResult<Option<&str>> {
        self.env_var(EnvKey::AccountCode)
    }

    // ---- caller identity ----------------------------------------------

    /// The normalized caller identity, resolved once and cached.
    pub fn caller_identity(&self) -> AgiResult<&CallerIdentity> {
        if let Some(id) = self
            .caller
            .get()
        {
            return Ok(id);
        }
        let env = self.environment()?;
        Ok(self
            .caller
            .get_or_init(|| CallerIdentity::resolve(env)))
    }

    /// Combined caller id, e.g. `"John Smith" <5551234567>`; empty for
    /// unidentified callers, regardless of engine version.
    pub fn callerid(&self) -> AgiResult<&str> {
        Ok(self
            .caller_identity()?
            .combined())
    }

    /// Caller display name, e.g. `John Smith`; empty for unidentified.
    pub fn calleridname(&self) -> AgiResult<&str> {
        Ok(self
            .caller_identity()?
            .name())
    }

    /// Caller number, e.g. `5551234567`; empty for unidentified.
    pub fn calleridnumber(&self) -> AgiResult<&str> {
        Ok(self
            .caller_identity()?
            .number())
    }

    // ---- dispatch ------------------------------------------------------

    /// Send one command and decode the single response line.
    ///
    /// The write and the read happen under one exclusive acquisition of
    /// the stream bundle, so concurrent dispatches cannot interleave
    /// their command/response pairs. If nothing has consumed the startup
    /// block yet it is drained first, keeping the response stream
    /// aligned with command responses.
    ///
    /// Returns [`AgiError::CommandFailed`] when the decoded status
    /// signals failure for this command's contract, and
    /// [`AgiError::Hangup`] when the peer closed its read side (no
    /// response read is attempted then).
    pub fn dispatch(&self, command: AgiCommand) -> AgiResult<ReturnStatus> {
        let line = command.to_wire_format()?;
        let status = {
            let mut streams = self
                .transport
                .lock();
            self.ingest_environment(&mut streams)?;
            if self.debug_enabled() {
                streams.diag(DIAG_SENT_PREFIX, &line);
            }
            trace!(command = %line, "dispatching");
            streams.write_command(&line)?;
            let raw = streams.read_response()?;
            if self.debug_enabled() {
                streams.diag(
                    DIAG_RECV_PREFIX,
                    raw.as_deref()
                        .unwrap_or(""),
                );
            }
            ReturnStatus::decode(line, raw)
        };
        debug!(status = %status, "response decoded");

        if status.is_command_error()
            || status
                .result()
                .is_some_and(|r| {
                    command
                        .failure_results()
                        .contains(&r)
                })
        {
            return Err(AgiError::CommandFailed { status });
        }
        Ok(status)
    }

    /// Send a raw command line unchanged.
    pub fn raw_command(&self, command: &str) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::Raw {
            command: command.to_string(),
        })
    }

    // ---- commands ------------------------------------------------------

    /// Answer the channel if not already in answer state.
    pub fn answer(&self) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::Answer)
    }

    /// Cause the channel to hang up automatically `seconds` into the
    /// future; `0` disables the feature.
    pub fn set_auto_hangup(&self, seconds: u32) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::SetAutoHangup { seconds })
    }

    /// Status of the named channel, or of the current channel for `None`.
    ///
    /// The decoded result is the numeric channel state (`0` down and
    /// available through `7` busy).
    pub fn channel_status(&self, channel: Option<&str>) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::ChannelStatus {
            channel: channel.map(str::to_string),
        })
    }

    /// Execute a dialplan application with the given options.
    pub fn exec(&self, application: &str, options: Option<&str>) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::Exec {
            application: application.to_string(),
            options: options.map(str::to_string),
        })
    }

    /// Play `file` and collect DTMF digits.
    ///
    /// `timeout` is the per-digit wait in seconds (absent, zero or
    /// negative waits forever); `max_digits` bounds the collected string
    /// (absent, zero or negative is unlimited). Pressing `#` terminates
    /// input. Check [`ReturnStatus::is_timeout`] on the result, then read
    /// [`ReturnStatus::digits`].
    pub fn wait_for_digits(
        &self,
        file: &str,
        timeout: Option<i32>,
        max_digits: Option<i32>,
    ) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::GetData {
            file: file.to_string(),
            timeout,
            max_digits,
        })
    }

    /// Read a channel variable.
    ///
    /// A result of `0` means the variable is not set; `1` means the value
    /// follows. The unset case returns normally: absence is data here.
    pub fn get_variable(&self, name: &str) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::GetVariable {
            name: name.to_string(),
        })
    }

    /// Hang up the named channel, or the current channel for `None`.
    pub fn hangup(&self, channel: Option<&str>) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::Hangup {
            channel: channel.map(str::to_string),
        })
    }

    /// Do nothing; useful as a keepalive or trace marker.
    pub fn noop(&self, message: &str) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::Noop {
            message: message.to_string(),
        })
    }

    /// Receive one character of text; `timeout_secs` must be positive.
    ///
    /// Most channel technologies do not support text reception.
    pub fn receive_char(&self, timeout_secs: i32) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::ReceiveChar {
            timeout: timeout_secs,
        })
    }

    /// Receive a text string; `timeout_secs` must be positive.
    pub fn receive_text(&self, timeout_secs: i32) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::ReceiveText {
            timeout: timeout_secs,
        })
    }

    /// Record channel audio to `file` until an escape digit, silence or
    /// the timeout; the format defaults to `gsm` and the escape digits to
    /// `#`. Inspect [`ReturnStatus::qualifier`] and
    /// [`ReturnStatus::endpos`] on the result.
    pub fn record_file(
        &self,
        file: &str,
        format: Option<&str>,
        escape_digits: Option<&str>,
        timeout: Option<i32>,
        beep: bool,
    ) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::RecordFile {
            file: file.to_string(),
            format: format.map(str::to_string),
            escape_digits: escape_digits.map(str::to_string),
            timeout,
            beep,
        })
    }

    /// Say a digit string, returning early if an escape digit is pressed.
    pub fn say_digits(&self, digits: &str, escape_digits: Option<&str>) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::SayDigits {
            digits: digits.to_string(),
            escape_digits: escape_digits.map(str::to_string),
        })
    }

    /// Say a number, returning early if an escape digit is pressed.
    pub fn say_number(&self, number: i64, escape_digits: Option<&str>) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::SayNumber {
            number,
            escape_digits: escape_digits.map(str::to_string),
        })
    }

    /// Say a character string phonetically.
    pub fn say_phonetic(&self, text: &str, escape_digits: Option<&str>) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::SayPhonetic {
            text: text.to_string(),
            escape_digits: escape_digits.map(str::to_string),
        })
    }

    /// Say a time given as UNIX epoch seconds.
    pub fn say_time(&self, epoch_secs: i64, escape_digits: Option<&str>) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::SayTime {
            epoch_secs,
            escape_digits: escape_digits.map(str::to_string),
        })
    }

    /// Send an image on the channel. Image names carry no extension.
    pub fn send_image(&self, image: &str) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::SendImage {
            image: image.to_string(),
        })
    }

    /// Send a text on the channel.
    pub fn send_text(&self, text: &str) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::SendText {
            text: text.to_string(),
        })
    }

    /// Change the caller id of the current channel.
    pub fn set_caller_id(&self, number: &str) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::SetCallerId {
            number: number.to_string(),
        })
    }

    /// Set the context for continuation upon exiting the script.
    ///
    /// The engine does not verify the context exists; an invalid one
    /// drops the call.
    pub fn set_context(&self, context: &str) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::SetContext {
            context: context.to_string(),
        })
    }

    /// Set the extension for continuation upon exiting the script.
    pub fn set_extension(&self, extension: &str) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::SetExtension {
            extension: extension.to_string(),
        })
    }

    /// Enable or disable the music-on-hold generator; the class defaults
    /// to `default`.
    pub fn set_music(&self, on: bool, class: Option<&str>) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::SetMusic {
            on,
            class: class.map(str::to_string),
        })
    }

    /// Set the priority for continuation upon exiting the script.
    pub fn set_priority(&self, priority: i32) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::SetPriority { priority })
    }

    /// Set a channel variable. Channel variables die with the channel.
    pub fn set_variable(&self, name: &str, value: &str) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::SetVariable {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Stream an audio file, allowing playback to be interrupted by the
    /// escape digits. The file name carries no extension.
    pub fn stream_file(&self, file: &str, escape_digits: Option<&str>) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::StreamFile {
            file: file.to_string(),
            escape_digits: escape_digits.map(str::to_string),
        })
    }

    /// Enable or disable TDD transmission/reception on the channel.
    pub fn tdd_mode(&self, on: bool) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::TddMode { on })
    }

    /// Send a message to the console verbose log at the given level
    /// (1-4).
    pub fn verbose(&self, message: &str, level: u8) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::Verbose {
            message: message.to_string(),
            level,
        })
    }

    /// Wait for one DTMF digit; absent, zero or negative waits forever.
    ///
    /// Read the key through [`ReturnStatus::digit`]: `None` means the
    /// wait timed out.
    pub fn wait_for_digit(&self, timeout: Option<i32>) -> AgiResult<ReturnStatus> {
        self.dispatch(AgiCommand::WaitForDigit { timeout })
    }

    // ---- synthetic helpers --------------------------------------------

    /// Place an outbound call through the dialplan `Dial` application.
    ///
    /// `context` defaults to `default`; IAX2 dialing requires a
    /// `username`.
    pub fn dial(
        &self,
        number: &str,
        protocol: DialProtocol,
        username: Option<&str>,
        context: Option<&str>,
        timeout: Option<i32>,
        options: Option<&str>,
    ) -> AgiResult<ReturnStatus> {
        let number = number.trim();
        if number.is_empty() {
            return Err(AgiError::invalid_argument("dial needs a number"));
        }
        let context = context.unwrap_or("default");
        let base = match protocol {
            DialProtocol::Local => format!("LOCAL/{}@{}", number, context),
            DialProtocol::Iax2 => {
                let username = username
                    .ok_or_else(|| AgiError::invalid_argument("IAX2 dialing needs a username"))?;
                format!("IAX2/{}@{}/{}", username, context, number)
            }
        };
        let timeout = timeout
            .map(|t| t.to_string())
            .unwrap_or_default();
        let dial_string = format!("{}|{}|{}", base, timeout, options.unwrap_or(""));
        self.exec("DIAL", Some(&dial_string))
    }

    /// Update context, extension and priority in one call; `None` leaves
    /// the engine's current value untouched.
    pub fn jump_to(
        &self,
        context: Option<&str>,
        extension: Option<&str>,
        priority: Option<i32>,
    ) -> AgiResult<()> {
        if let Some(context) = context {
            self.set_context(context)?;
        }
        if let Some(extension) = extension {
            self.set_extension(extension)?;
        }
        if let Some(priority) = priority {
            self.set_priority(priority)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io::{Cursor, Read};
    use std::sync::Arc;

    /// Captures everything the client writes to the command stream.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(
                self.0
                    .lock()
                    .clone(),
            )
            .unwrap()
        }
    }

    struct BrokenPipeWriter;

    impl Write for BrokenPipeWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Panics on any read, proving the code path never touched the
    /// response stream.
    struct ExplodingReader;

    impl Read for ExplodingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            panic!("response read attempted after transport failure");
        }
    }

    const ENV_BLOCK: &str = "agi_request: /usr/share/agi/ivr\n\
                             agi_channel: SIP/1000-00000001\n\
                             agi_callerid: 5551234567\n\
                             agi_calleridname: John Smith\n\
                             agi_context: inbound\n\
                             \n";

    fn scripted_client(responses: &str) -> (AgiClient, SharedBuf) {
        let script = format!("{}{}", ENV_BLOCK, responses);
        let written = SharedBuf::default();
        let client = AgiClient::from_streams(
            Cursor::new(script.into_bytes()),
            written.clone(),
        );
        (client, written)
    }

    #[test]
    fn answer_round_trip() {
        let (client, written) = scripted_client("200 result=0\n");
        let status = client
            .answer()
            .unwrap();
        assert!(!status.is_command_error());
        assert_eq!(status.result(), Some("0"));
        assert_eq!(written.contents(), "ANSWER\n");
    }

    #[test]
    fn answer_failure_result_raises() {
        let (client, _written) = scripted_client("200 result=-1\n");
        let err = client
            .answer()
            .unwrap_err();
        match err {
            AgiError::CommandFailed { status } => {
                assert_eq!(status.result(), Some("-1"));
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }

    #[test]
    fn unknown_command_status_raises() {
        let (client, _written) = scripted_client("510 Invalid or unknown command\n");
        let err = client
            .raw_command("FLY TO THE MOON")
            .unwrap_err();
        assert!(matches!(err, AgiError::CommandFailed { .. }));
    }

    #[test]
    fn dispatch_drains_startup_block_first() {
        // No explicit environment access before the first command; the
        // response must still line up with ANSWER, not with the metadata.
        let (client, written) = scripted_client("200 result=0\n");
        let status = client
            .answer()
            .unwrap();
        assert_eq!(status.result(), Some("0"));
        assert_eq!(written.contents(), "ANSWER\n");
        // And the block is available afterwards without further reads.
        assert_eq!(
            client
                .channel()
                .unwrap(),
            Some("SIP/1000-00000001")
        );
    }

    #[test]
    fn environment_is_ingested_once() {
        let (client, _written) = scripted_client("200 result=0\n");
        assert_eq!(
            client
                .request()
                .unwrap(),
            Some("/usr/share/agi/ivr")
        );
        assert_eq!(
            client
                .context()
                .unwrap(),
            Some("inbound")
        );
        // A command still pairs with the next scripted response, so the
        // second environment access cannot have re-read the stream.
        let status = client
            .answer()
            .unwrap();
        assert_eq!(status.result(), Some("0"));
    }

    #[test]
    fn caller_identity_resolved_and_cached() {
        let (client, _written) = scripted_client("");
        assert_eq!(
            client
                .callerid()
                .unwrap(),
            "\"John Smith\" <5551234567>"
        );
        assert_eq!(client.calleridname().unwrap(), "John Smith");
        assert_eq!(client.calleridnumber().unwrap(), "5551234567");
        // Second lookup hits the cache and yields the same triple.
        assert_eq!(
            client
                .callerid()
                .unwrap(),
            "\"John Smith\" <5551234567>"
        );
    }

    #[test]
    fn get_variable_unset_is_not_an_error() {
        let (client, written) = scripted_client("200 result=0\n");
        let status = client
            .get_variable("MISSING")
            .unwrap();
        assert_eq!(status.result(), Some("0"));
        assert_eq!(written.contents(), "GET VARIABLE MISSING\n");
    }

    #[test]
    fn wait_for_digit_decodes_pressed_key() {
        let (client, written) = scripted_client("200 result=53\n");
        let status = client
            .wait_for_digit(Some(10))
            .unwrap();
        assert_eq!(status.digit(), Some('5'));
        assert_eq!(written.contents(), "WAIT FOR DIGIT 10000\n");
    }

    #[test]
    fn wait_for_digits_reports_timeout() {
        let (client, _written) = scripted_client("200 result=12 (timeout)\n");
        let status = client
            .wait_for_digits("prompts/enter-pin", Some(5), Some(4))
            .unwrap();
        assert!(status.is_timeout());
        assert_eq!(status.digits(), "12");
    }

    #[test]
    fn broken_pipe_raises_hangup_without_reading() {
        let reader = BufReader::new(
            Cursor::new(ENV_BLOCK.as_bytes().to_vec()).chain(ExplodingReader),
        );
        let client = AgiClient::from_streams(reader, BrokenPipeWriter);
        let err = client
            .answer()
            .unwrap_err();
        assert!(matches!(err, AgiError::Hangup));
    }

    #[test]
    fn closed_response_stream_is_command_error() {
        // Environment block present but no response line at all.
        let (client, _written) = scripted_client("");
        let err = client
            .answer()
            .unwrap_err();
        match err {
            AgiError::CommandFailed { status } => assert_eq!(status.raw(), None),
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }

    #[test]
    fn invalid_argument_sends_no_bytes() {
        let (client, written) = scripted_client("200 result=0\n");
        let err = client
            .receive_char(0)
            .unwrap_err();
        assert!(matches!(err, AgiError::InvalidArgument { .. }));
        assert_eq!(written.contents(), "");
    }

    #[test]
    fn debug_mode_traces_both_directions() {
        let diag = SharedBuf::default();
        let script = format!("{}200 result=0\n", ENV_BLOCK);
        let client = AgiClient::from_streams(
            Cursor::new(script.into_bytes()),
            SharedBuf::default(),
        )
        .with_diagnostic(diag.clone());
        client.set_debug(true);
        client
            .answer()
            .unwrap();
        let trace = diag.contents();
        assert!(trace.contains("    -- agi << ANSWER\n"));
        assert!(trace.contains("    -- agi >> 200 result=0\n"));
    }

    #[test]
    fn debug_disabled_stays_silent() {
        let diag = SharedBuf::default();
        let script = format!("{}200 result=0\n", ENV_BLOCK);
        let client = AgiClient::from_streams(
            Cursor::new(script.into_bytes()),
            SharedBuf::default(),
        )
        .with_diagnostic(diag.clone());
        client
            .answer()
            .unwrap();
        assert_eq!(diag.contents(), "");
    }

    #[test]
    fn dial_assembles_local_dial_string() {
        let (client, written) = scripted_client("200 result=0\n");
        client
            .dial("1000", DialProtocol::Local, None, None, Some(30), None)
            .unwrap();
        assert_eq!(written.contents(), "EXEC DIAL LOCAL/1000@default|30|\n");
    }

    #[test]
    fn dial_iax2_requires_username() {
        let (client, written) = scripted_client("200 result=0\n");
        let err = client
            .dial("5551234", DialProtocol::Iax2, None, None, None, None)
            .unwrap_err();
        assert!(matches!(err, AgiError::InvalidArgument { .. }));
        assert_eq!(written.contents(), "");

        client
            .dial(
                "5551234",
                DialProtocol::Iax2,
                Some("trunkuser"),
                Some("outbound"),
                None,
                None,
            )
            .unwrap();
        assert_eq!(
            written.contents(),
            "EXEC DIAL IAX2/trunkuser@outbound/5551234||\n"
        );
    }

    #[test]
    fn jump_to_issues_only_requested_updates() {
        let (client, written) = scripted_client("200 result=0\n200 result=0\n");
        client
            .jump_to(Some("support"), None, Some(1))
            .unwrap();
        assert_eq!(
            written.contents(),
            "SET CONTEXT support\nSET PRIORITY 1\n"
        );
    }
}
