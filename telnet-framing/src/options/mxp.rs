//! # MXP - MUD eXtension Protocol
//!
//! Once the client agrees (`IAC DO MXP`) the server opens MXP with an empty
//! sub-negotiation. Markup is then carried in "line mode" escapes:
//!
//! ```text
//! ESC [ <code> z <text> ESC [ 3 z
//! ```
//!
//! Code 1 is a secure line; 10-19 are user-defined room/element lines.

use crate::protocol::{TelnetOption, TelnetSequence};

/// Line mode code for a secure line
pub const SECURE_LINE: u32 = 1;
/// Line mode code used for room names
pub const ROOM_NAME_LINE: u32 = 10;

/// `IAC SB MXP IAC SE`, which switches MXP on in the client
pub fn enable_sequence() -> Vec<u8> {
    TelnetSequence::SubNegotiation {
        option: TelnetOption::MXP,
        data: Vec::new(),
    }
    .to_bytes()
}

/// Wrap text in a numbered line-mode escape and its reset
pub fn secure_line(text: &str, code: u32, line_ending: &str) -> String {
    format!("\x1b[{code}z{text}\x1b[3z{line_ending}")
}

/// A clickable `<send>` element that issues `command item`
pub fn send_link(command: &str, target: &str, label: &str) -> String {
    format!("<send \"{command} {target}\">{label}</send>")
}

/// Strip a leading quantity from a list item: `"2 rusty swords."` targets
/// `"rusty swords"`; anything else targets itself.
pub fn link_target(item: &str) -> &str {
    match item.split_once(' ') {
        Some((count, rest)) if count.parse::<i64>().is_ok() => {
            let mut chars = rest.chars();
            chars.next_back();
            chars.as_str()
        }
        _ => item,
    }
}
