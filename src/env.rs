//! Startup environment ingestion and typed metadata key names.

use std::collections::HashMap;
use std::io::{self, BufRead};
use tracing::trace;

/// Error returned when parsing an unrecognized metadata key name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnvKeyError(pub String);

impl std::fmt::Display for ParseEnvKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown environment key: {}", self.0)
    }
}

impl std::error::Error for ParseEnvKeyError {}

define_wire_enum! {
    error_type: ParseEnvKeyError,
    /// Metadata keys the engine pushes in the startup block.
    ///
    /// These are the `agi_*` names on the wire. Use with
    /// [`Environment::get`] for type-safe lookups; engines may send keys
    /// outside this set, which stay reachable by their string name.
    pub enum EnvKey {
        Request => "agi_request",
        Channel => "agi_channel",
        Language => "agi_language",
        Type => "agi_type",
        UniqueId => "agi_uniqueid",
        CallerId => "agi_callerid",
        CallerIdName => "agi_calleridname",
        CallingPres => "agi_callingpres",
        CallingAni2 => "agi_callingani2",
        CallingTon => "agi_callington",
        CallingTns => "agi_callingtns",
        Dnid => "agi_dnid",
        Rdnis => "agi_rdnis",
        Context => "agi_context",
        Extension => "agi_extension",
        Priority => "agi_priority",
        Enhanced => "agi_enhanced",
        AccountCode => "agi_accountcode",
    }
}

/// Immutable key/value snapshot of the startup metadata block.
///
/// Populated exactly once per session; concurrent readers see the same
/// snapshot for the process lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Read `key: value` lines until a blank line or end of stream.
    ///
    /// Values are trimmed of surrounding whitespace; lines with an empty
    /// or absent key are discarded; a duplicate key overwrites the earlier
    /// value. A stream that closes before any data simply yields an empty
    /// environment; absence of a key is a representable state, not a
    /// fault.
    pub(crate) fn read_from(reader: &mut dyn BufRead) -> io::Result<Self> {
        let mut vars = HashMap::new();
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }
            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            vars.insert(
                key.to_string(),
                value
                    .trim()
                    .to_string(),
            );
        }
        trace!(keys = vars.len(), "startup environment ingested");
        Ok(Self { vars })
    }

    /// Look up a metadata value by key.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        self.vars
            .get(key.as_ref())
            .map(String::as_str)
    }

    /// `true` when the key was present in the startup block.
    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.vars
            .contains_key(key.as_ref())
    }

    /// Number of ingested keys.
    pub fn len(&self) -> usize {
        self.vars
            .len()
    }

    /// `true` when the startup block carried no usable keys.
    pub fn is_empty(&self) -> bool {
        self.vars
            .is_empty()
    }
}
