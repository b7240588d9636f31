//! # Telnet Framing Library
//!
//! The protocol half of a small MUD server:
//! - RFC 854: Telnet Protocol Specification (https://tools.ietf.org/html/rfc854)
//! - RFC 857: Echo, RFC 1073: NAWS
//! - MUD extensions: MSSP, MXP and GMCP
//!
//! ## Architecture Overview
//!
//! - `protocol`: control and option byte values, outbound sequences
//! - `parser`: the per-connection incremental framing state machine
//! - `options`: option payload encoders and decoders
//!
//! The crate does no I/O. A server feeds received bytes to a
//! [`FramingParser`] and writes the byte vectors produced by `options` to
//! its sockets.

pub mod options;
pub mod parser;
pub mod protocol;

pub use options::{MsspStatus, OptionError, WindowSize};
pub use parser::{Frame, FramingParser};
pub use protocol::{IAC, NegotiationVerb, TelnetCommand, TelnetOption, TelnetSequence};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
