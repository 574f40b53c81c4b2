//! Caller identity normalization across engine wire formats.
//!
//! Different engine versions encode the calling party inconsistently: some
//! send one composite string, some send name and number as separate keys,
//! some send only a number. The resolver folds all of them into one
//! normalized record.

use crate::env::{EnvKey, Environment};

/// The closed set of shapes a raw `agi_callerid` value can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawFormat<'a> {
    /// The literal `unknown`, an unidentified caller.
    Unknown,
    /// Two or more digits and nothing else, e.g. `5551234567`.
    BareNumber(&'a str),
    /// Anything else, e.g. `"John Smith" <5551234567>`.
    Composite(&'a str),
}

fn classify(raw: &str) -> RawFormat<'_> {
    if raw == "unknown" {
        RawFormat::Unknown
    } else if raw.len() >= 2
        && raw
            .bytes()
            .all(|b| b.is_ascii_digit())
    {
        RawFormat::BareNumber(raw)
    } else {
        RawFormat::Composite(raw)
    }
}

/// Text inside the first double-quoted substring, quotes stripped and
/// trimmed; empty if none found.
fn quoted_section(raw: &str) -> &str {
    let Some(start) = raw
        .find('"')
        .map(|i| i + 1)
    else {
        return "";
    };
    match raw[start..].find('"') {
        Some(len) => raw[start..start + len].trim(),
        None => "",
    }
}

/// Text inside the first `<...>` substring, brackets stripped and trimmed;
/// empty if none found.
fn bracketed_number(raw: &str) -> &str {
    let Some(start) = raw
        .find('<')
        .map(|i| i + 1)
    else {
        return "";
    };
    match raw[start..].find('>') {
        Some(len) => raw[start..start + len].trim(),
        None => "",
    }
}

/// Normalized calling-party record, resolved once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    name: String,
    number: String,
    combined: String,
}

impl CallerIdentity {
    /// Derive the identity from the raw startup metadata.
    ///
    /// The client caches the result, so repeated lookups never re-parse.
    pub(crate) fn resolve(env: &Environment) -> Self {
        let raw = env
            .get(EnvKey::CallerId)
            .unwrap_or("")
            .trim();
        let explicit_name = env.get(EnvKey::CallerIdName);

        match classify(raw) {
            RawFormat::Unknown => Self::from_parts("", ""),
            RawFormat::BareNumber(number) => {
                Self::from_parts(explicit_name.unwrap_or(""), number)
            }
            RawFormat::Composite(raw) => match explicit_name {
                // Engines that never send a separate name key: pull both
                // pieces out of the composite string.
                None => Self::from_parts(quoted_section(raw), bracketed_number(raw)),
                // Engines that send both: the raw value is the number,
                // whatever shape it has.
                Some(name) => Self::from_parts(name, raw),
            },
        }
    }

    fn from_parts(name: &str, number: &str) -> Self {
        let combined = match (name.is_empty(), number.is_empty()) {
            (true, true) => String::new(),
            (true, false) => number.to_string(),
            (false, true) => format!("\"{name}\""),
            (false, false) => format!("\"{name}\" <{number}>"),
        };
        Self {
            name: name.to_string(),
            number: number.to_string(),
            combined,
        }
    }

    /// Display name, empty for unidentified callers.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calling number, empty for unidentified callers.
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Canonical combined rendering, e.g. `"John Smith" <5551234567>`.
    pub fn combined(&self) -> &str {
        &self.combined
    }
}
