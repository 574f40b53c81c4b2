//! The shared stream bundle and its exclusive-access discipline.
//!
//! A dispatch is a write-then-read pair that must stay atomic with respect
//! to any other dispatch, startup-block ingestion or diagnostic write,
//! otherwise a response line could be misattributed to the wrong command.
//! One mutex over the whole bundle is the only concurrency control in the
//! crate; contenders block until the bundle is free.

use crate::constants::LINE_TERMINATOR;
use crate::error::{AgiError, AgiResult};
use parking_lot::{Mutex, MutexGuard};
use std::io::{self, BufRead, Write};

/// The three streams a session talks through.
pub(crate) struct Streams {
    command_out: Box<dyn Write + Send>,
    response_in: Box<dyn BufRead + Send>,
    diagnostic: Option<Box<dyn Write + Send>>,
}

impl Streams {
    fn map_write_error(e: io::Error) -> AgiError {
        // A peer that closed its read side means the call leg ended.
        if e.kind() == io::ErrorKind::BrokenPipe {
            AgiError::Hangup
        } else {
            AgiError::Io(e)
        }
    }

    /// Write one command line and flush.
    ///
    /// On [`AgiError::Hangup`] the caller must not attempt a response
    /// read.
    pub(crate) fn write_command(&mut self, line: &str) -> AgiResult<()> {
        self.command_out
            .write_all(line.as_bytes())
            .map_err(Self::map_write_error)?;
        self.command_out
            .write_all(LINE_TERMINATOR.as_bytes())
            .map_err(Self::map_write_error)?;
        self.command_out
            .flush()
            .map_err(Self::map_write_error)
    }

    /// Blocking read of one response line, stripped of its terminator.
    /// `None` means the stream closed.
    pub(crate) fn read_response(&mut self) -> AgiResult<Option<String>> {
        let mut line = String::new();
        if self
            .response_in
            .read_line(&mut line)?
            == 0
        {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    /// The raw response reader, for startup-block ingestion.
    pub(crate) fn response_reader(&mut self) -> &mut dyn BufRead {
        &mut *self.response_in
    }

    /// Write an advisory trace line to the diagnostic stream, if any.
    ///
    /// Diagnostic output is not part of the protocol contract, so write
    /// failures are swallowed rather than failing the command.
    pub(crate) fn diag(&mut self, prefix: &str, text: &str) {
        if let Some(d) = self
            .diagnostic
            .as_mut()
        {
            let _ = writeln!(d, "{}{}", prefix, text);
            let _ = d.flush();
        }
    }
}

/// Single mutual-exclusion guard over the stream bundle.
pub(crate) struct Transport {
    streams: Mutex<Streams>,
}

impl Transport {
    pub(crate) fn new(
        response_in: Box<dyn BufRead + Send>,
        command_out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            streams: Mutex::new(Streams {
                command_out,
                response_in,
                diagnostic: None,
            }),
        }
    }

    pub(crate) fn set_diagnostic(&self, diagnostic: Box<dyn Write + Send>) {
        self.streams
            .lock()
            .diagnostic = Some(diagnostic);
    }

    /// Exclusive access to the bundle. The guard releases on every exit
    /// path; there is no timeout or fairness guarantee.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Streams> {
        self.streams
            .lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct BrokenPipeWriter;

    impl Write for BrokenPipeWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn transport_with(script: &str, out: Box<dyn Write + Send>) -> Transport {
        Transport::new(Box::new(Cursor::new(script.as_bytes().to_vec())), out)
    }

    #[test]
    fn read_response_strips_terminator() {
        let t = transport_with("200 result=1\n", Box::new(Vec::<u8>::new()));
        let mut streams = t.lock();
        assert_eq!(
            streams
                .read_response()
                .unwrap(),
            Some("200 result=1".to_string())
        );
        assert_eq!(streams.read_response().unwrap(), None);
    }

    #[test]
    fn broken_pipe_write_maps_to_hangup() {
        let t = transport_with("", Box::new(BrokenPipeWriter));
        let mut streams = t.lock();
        assert!(matches!(
            streams.write_command("ANSWER"),
            Err(AgiError::Hangup)
        ));
    }

    #[test]
    fn diag_failure_is_swallowed() {
        let t = transport_with("", Box::new(Vec::<u8>::new()));
        t.set_diagnostic(Box::new(BrokenPipeWriter));
        let mut streams = t.lock();
        streams.diag("    -- agi << ", "ANSWER");
    }
}
