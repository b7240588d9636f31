//! # GMCP - Generic MUD Communication Protocol
//!
//! Out-of-band messages travel inside a sub-negotiation block as
//! `<Package.Name> <json>`:
//!
//! ```text
//! IAC SB GMCP "Room.Info {\"num\": 1}" IAC SE
//! ```

use crate::protocol::{IAC, TelnetOption, TelnetSequence};

/// Wrap an already formatted GMCP line in sub-negotiation framing
pub fn encode(message: &str) -> Vec<u8> {
    TelnetSequence::SubNegotiation {
        option: TelnetOption::GMCP,
        data: escape_iac(message.as_bytes()),
    }
    .to_bytes()
}

/// Join a package name and its JSON body into one GMCP line
pub fn format_message(package: &str, json: &str) -> String {
    if json.is_empty() {
        package.to_string()
    } else {
        format!("{package} {json}")
    }
}

/// Split an inbound GMCP payload into package name and optional JSON body
pub fn split_message(payload: &str) -> (&str, Option<&str>) {
    match payload.trim().split_once(' ') {
        Some((package, body)) => (package, Some(body.trim_start())),
        None => (payload.trim(), None),
    }
}

/// Double every IAC byte so a payload cannot terminate its own block
pub fn escape_iac(data: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(data.len());
    for &byte in data {
        escaped.push(byte);
        if byte == IAC {
            escaped.push(IAC);
        }
    }
    escaped
}
