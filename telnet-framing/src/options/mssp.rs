//! # MSSP - MUD Server Status Protocol
//!
//! Sent in reply to `IAC DO MSSP`:
//!
//! ```text
//! IAC SB MSSP MSSP_VAR "PLAYERS" MSSP_VAL "3" MSSP_VAR "UPTIME" MSSP_VAL "42" ... IAC SE
//! ```

use super::OptionError;
use crate::protocol::{TelnetOption, TelnetSequence};
use std::fmt::Display;

/// Marks the start of a variable name
pub const MSSP_VAR: u8 = 1;
/// Marks the start of a value
pub const MSSP_VAL: u8 = 2;

/// Ordered MSSP variable list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsspStatus {
    variables: Vec<(String, String)>,
}

impl MsspStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a variable, keeping insertion order on the wire
    pub fn with(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Display) {
        self.variables.push((name.into(), value.to_string()));
    }

    pub fn variables(&self) -> &[(String, String)] {
        &self.variables
    }

    /// First value recorded under `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|(var, _)| var == name)
            .map(|(_, val)| val.as_str())
    }

    /// Sub-negotiation payload without the IAC SB / IAC SE framing
    pub fn payload(&self) -> Vec<u8> {
        let mut data = Vec::new();
        for (name, value) in &self.variables {
            data.push(MSSP_VAR);
            data.extend(name.bytes().filter(|b| !is_marker(*b)));
            data.push(MSSP_VAL);
            data.extend(value.bytes().filter(|b| !is_marker(*b)));
        }
        data
    }

    /// Complete `IAC SB MSSP ... IAC SE` reply
    pub fn to_bytes(&self) -> Vec<u8> {
        TelnetSequence::SubNegotiation {
            option: TelnetOption::MSSP,
            data: self.payload(),
        }
        .to_bytes()
    }

    /// Decode a sub-negotiation payload back into variables
    pub fn decode(payload: &[u8]) -> Result<Self, OptionError> {
        let mut status = MsspStatus::new();
        let mut iter = payload.split(|b| *b == MSSP_VAR);

        match iter.next() {
            Some([]) => {}
            _ => {
                return Err(OptionError::InvalidData(
                    "MSSP payload must start with MSSP_VAR".to_string(),
                ));
            }
        }

        for pair in iter {
            let mut parts = pair.splitn(2, |b| *b == MSSP_VAL);
            let name = parts.next().unwrap_or_default();
            let value = parts.next().ok_or_else(|| {
                OptionError::InvalidData(format!(
                    "MSSP variable {} has no value",
                    String::from_utf8_lossy(name)
                ))
            })?;
            status.push(
                String::from_utf8_lossy(name),
                String::from_utf8_lossy(value),
            );
        }

        Ok(status)
    }
}

fn is_marker(byte: u8) -> bool {
    matches!(byte, MSSP_VAR | MSSP_VAL | crate::protocol::IAC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mssp_wire_layout() {
        let status = MsspStatus::new().with("PLAYERS", 3).with("NAME", "WeeMud");
        let mut expected = vec![255, 250, 70, MSSP_VAR];
        expected.extend_from_slice(b"PLAYERS");
        expected.push(MSSP_VAL);
        expected.extend_from_slice(b"3");
        expected.push(MSSP_VAR);
        expected.extend_from_slice(b"NAME");
        expected.push(MSSP_VAL);
        expected.extend_from_slice(b"WeeMud");
        expected.extend_from_slice(&[255, 240]);

        assert_eq!(status.to_bytes(), expected);
    }

    #[test]
    fn test_decode_payload() {
        let status = MsspStatus::new().with("PLAYERS", 12).with("UPTIME", 3600);
        let decoded = MsspStatus::decode(&status.payload()).unwrap();

        assert_eq!(decoded.get("PLAYERS"), Some("12"));
        assert_eq!(decoded.get("UPTIME"), Some("3600"));
        assert_eq!(decoded.get("NAME"), None);
    }

    #[test]
    fn test_decode_rejects_missing_value() {
        assert!(MsspStatus::decode(&[MSSP_VAR, b'X']).is_err());
        assert!(MsspStatus::decode(b"junk").is_err());
    }

    #[test]
    fn test_marker_bytes_are_stripped_from_values() {
        let status = MsspStatus::new().with("NAME", "We\u{1}e");
        assert_eq!(MsspStatus::decode(&status.payload()).unwrap().get("NAME"), Some("Wee"));
    }
}
