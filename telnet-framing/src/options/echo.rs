//! # Echo Option (RFC 857)
//!
//! A server that announces `WILL ECHO` takes over echoing, which makes the
//! client stop printing what the user types. MUD servers use this to hide
//! password input; they never echo anything back themselves.
//!
//! ```text
//! IAC WILL ECHO   -> client hides local echo
//! IAC WONT ECHO   -> client echoes locally again
//! ```

use crate::protocol::{NegotiationVerb, TelnetOption, TelnetSequence};

/// Bytes that switch the client's local echo on (`enabled`) or off
pub fn remote_echo(enabled: bool) -> Vec<u8> {
    let verb = if enabled {
        NegotiationVerb::Wont
    } else {
        NegotiationVerb::Will
    };
    TelnetSequence::negotiate(verb, TelnetOption::ECHO).to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_echo_sends_wont() {
        assert_eq!(remote_echo(true), vec![255, 252, 1]);
    }

    #[test]
    fn test_disable_echo_sends_will() {
        assert_eq!(remote_echo(false), vec![255, 251, 1]);
    }
}
