//! # NAWS Option (RFC 1073)
//!
//! The server sends `IAC DO NAWS`; a willing client answers `IAC WILL NAWS`
//! and then reports its size, again on every resize:
//!
//! ```text
//! IAC SB NAWS <width-high> <width-low> <height-high> <height-low> IAC SE
//! ```
//!
//! Both values are 16-bit big-endian. Zero means "unknown". The values are
//! decoded as signed so that a bogus report (0xFFxx) reads as negative and
//! is ignored by callers instead of producing a 65000 column terminal.

use super::OptionError;
use std::fmt;

/// Terminal window size as reported by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    /// Terminal width in characters
    pub width: i16,
    /// Terminal height in lines
    pub height: i16,
}

impl WindowSize {
    pub fn new(width: i16, height: i16) -> Self {
        Self { width, height }
    }

    /// Decode the four payload bytes of a NAWS sub-negotiation
    pub fn decode(data: &[u8]) -> Result<Self, OptionError> {
        let [w_hi, w_lo, h_hi, h_lo] = data else {
            return Err(OptionError::InvalidData(format!(
                "NAWS size data must be exactly 4 bytes, got {}",
                data.len()
            )));
        };

        Ok(Self {
            width: i16::from_be_bytes([*w_hi, *w_lo]),
            height: i16::from_be_bytes([*h_hi, *h_lo]),
        })
    }

    /// Encode as a NAWS payload; used by test clients
    pub fn encode(&self) -> [u8; 4] {
        let [w_hi, w_lo] = self.width.to_be_bytes();
        let [h_hi, h_lo] = self.height.to_be_bytes();
        [w_hi, w_lo, h_hi, h_lo]
    }

    /// Width, if the client reported a usable one
    pub fn positive_width(&self) -> Option<u16> {
        (self.width > 0).then_some(self.width as u16)
    }

    /// Height, if the client reported a usable one
    pub fn positive_height(&self) -> Option<u16> {
        (self.height > 0).then_some(self.height as u16)
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_window_size() {
        let size = WindowSize::decode(&[0x00, 0x50, 0x00, 0x18]).unwrap();
        assert_eq!(size, WindowSize::new(80, 24));

        let size = WindowSize::decode(&[0x00, 0x84, 0x00, 0x2B]).unwrap();
        assert_eq!(size, WindowSize::new(132, 43));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert!(WindowSize::decode(&[0x00, 0x50, 0x00]).is_err());
        assert!(WindowSize::decode(&[0x00, 0x50, 0x00, 0x18, 0x00]).is_err());
        assert!(WindowSize::decode(&[]).is_err());
    }

    #[test]
    fn test_negative_and_zero_dimensions_are_not_positive() {
        let size = WindowSize::decode(&[0xFF, 0xFF, 0x00, 0x00]).unwrap();
        assert_eq!(size.width, -1);
        assert_eq!(size.positive_width(), None);
        assert_eq!(size.positive_height(), None);

        let size = WindowSize::new(120, 0);
        assert_eq!(size.positive_width(), Some(120));
        assert_eq!(size.positive_height(), None);
    }

    #[test]
    fn test_encode_matches_wire_order() {
        assert_eq!(WindowSize::new(80, 24).encode(), [0x00, 0x50, 0x00, 0x18]);
    }

    #[test]
    fn test_window_size_display() {
        assert_eq!(WindowSize::new(80, 24).to_string(), "80x24");
    }
}
