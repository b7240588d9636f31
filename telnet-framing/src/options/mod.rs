//! # Telnet Option Payloads
//!
//! Encoders and decoders for the options a MUD server negotiates:
//!
//! - **Echo** (RFC 857): toggling client-side echo for password prompts
//! - **NAWS** (RFC 1073): client window size reports
//! - **MSSP**: server status variables for crawlers and clients
//! - **MXP**: secure-line markup
//! - **GMCP**: JSON side channel

pub mod echo;
pub mod gmcp;
pub mod mssp;
pub mod mxp;
pub mod naws;

pub use echo::remote_echo;
pub use mssp::MsspStatus;
pub use naws::WindowSize;

use thiserror::Error;

/// Errors that can occur while decoding option payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    /// Sub-negotiation payload has the wrong shape
    #[error("Invalid option data: {0}")]
    InvalidData(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_error_display() {
        let error = OptionError::InvalidData("test".to_string());
        assert_eq!(error.to_string(), "Invalid option data: test");
    }
}
