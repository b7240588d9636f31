//! # Telnet Protocol Constants and Types
//!
//! Byte values from **RFC 854** / **RFC 855** plus the MUD extension options
//! this crate understands.
//!
//! ### Command Structure
//! - Negotiation: `IAC WILL/WONT/DO/DONT <option>`
//! - Sub-negotiation: `IAC SB <option> <parameters...> IAC SE`
//! - A data byte of 255 travels as `IAC IAC`

/// IAC - Interpret As Command (RFC 854, Section 4)
///
/// Every byte following an IAC is protocol control, never text.
pub const IAC: u8 = 255;

/// Telnet command bytes that can follow an IAC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TelnetCommand {
    /// End of subnegotiation parameters
    SE = 240,
    /// No operation
    NOP = 241,
    /// Subnegotiation begin: `IAC SB <option> <data...> IAC SE`
    SB = 250,
    /// Sender wants to enable an option on its side
    WILL = 251,
    /// Sender refuses or wants to disable an option on its side
    WONT = 252,
    /// Sender asks the receiver to enable an option
    DO = 253,
    /// Sender asks the receiver to disable an option
    DONT = 254,
}

impl TelnetCommand {
    /// Convert a byte to a command this crate handles
    ///
    /// ```
    /// use telnet_framing::protocol::TelnetCommand;
    ///
    /// assert_eq!(TelnetCommand::from_byte(251), Some(TelnetCommand::WILL));
    /// assert_eq!(TelnetCommand::from_byte(100), None);
    /// ```
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            240 => Some(TelnetCommand::SE),
            241 => Some(TelnetCommand::NOP),
            250 => Some(TelnetCommand::SB),
            251 => Some(TelnetCommand::WILL),
            252 => Some(TelnetCommand::WONT),
            253 => Some(TelnetCommand::DO),
            254 => Some(TelnetCommand::DONT),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// The four option negotiation verbs (RFC 854)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationVerb {
    Will,
    Wont,
    Do,
    Dont,
}

impl NegotiationVerb {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match TelnetCommand::from_byte(byte)? {
            TelnetCommand::WILL => Some(NegotiationVerb::Will),
            TelnetCommand::WONT => Some(NegotiationVerb::Wont),
            TelnetCommand::DO => Some(NegotiationVerb::Do),
            TelnetCommand::DONT => Some(NegotiationVerb::Dont),
            _ => None,
        }
    }

    pub fn command(self) -> TelnetCommand {
        match self {
            NegotiationVerb::Will => TelnetCommand::WILL,
            NegotiationVerb::Wont => TelnetCommand::WONT,
            NegotiationVerb::Do => TelnetCommand::DO,
            NegotiationVerb::Dont => TelnetCommand::DONT,
        }
    }

    /// True for WILL and DO, the verbs that ask for an option to be on
    pub fn is_positive(self) -> bool {
        matches!(self, NegotiationVerb::Will | NegotiationVerb::Do)
    }
}

/// Telnet options negotiated by a MUD server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(non_camel_case_types)] // Protocol constants traditionally use SCREAMING_SNAKE_CASE
pub enum TelnetOption {
    /// Echo (RFC 857)
    ECHO = 1,
    /// Negotiate About Window Size (RFC 1073)
    NAWS = 31,
    /// MUD Server Status Protocol
    MSSP = 70,
    /// MUD eXtension Protocol
    MXP = 91,
    /// Generic MUD Communication Protocol
    GMCP = 201,
}

impl TelnetOption {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(TelnetOption::ECHO),
            31 => Some(TelnetOption::NAWS),
            70 => Some(TelnetOption::MSSP),
            91 => Some(TelnetOption::MXP),
            201 => Some(TelnetOption::GMCP),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// An outbound Telnet command sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelnetSequence {
    /// `IAC <verb> <option>`
    Negotiation {
        verb: NegotiationVerb,
        option: TelnetOption,
    },

    /// `IAC SB <option> <data...> IAC SE`
    ///
    /// The payload is written verbatim; callers that may carry a 255 byte
    /// must escape it first.
    SubNegotiation { option: TelnetOption, data: Vec<u8> },
}

impl TelnetSequence {
    pub fn negotiate(verb: NegotiationVerb, option: TelnetOption) -> Self {
        TelnetSequence::Negotiation { verb, option }
    }

    /// Serialize this sequence to bytes for transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            TelnetSequence::Negotiation { verb, option } => {
                vec![IAC, verb.command().to_byte(), option.to_byte()]
            }
            TelnetSequence::SubNegotiation { option, data } => {
                let mut bytes = Vec::with_capacity(data.len() + 5);
                bytes.push(IAC);
                bytes.push(TelnetCommand::SB.to_byte());
                bytes.push(option.to_byte());
                bytes.extend_from_slice(data);
                bytes.push(IAC);
                bytes.push(TelnetCommand::SE.to_byte());
                bytes
            }
        }
    }
}
