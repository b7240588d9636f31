//! # Telnet Framing Parser
//!
//! Turns the raw inbound byte stream of one connection into completed input
//! lines and protocol frames, one byte at a time. State is kept between
//! calls, so a sequence split across two socket reads parses exactly like
//! the same bytes read at once.
//!
//! ## States
//! - **Normal**: text. IAC switches to Command, `\n` completes a line,
//!   backspace/DEL erase one character.
//! - **Command**: after IAC. WILL/WONT/DO/DONT are remembered until the option
//!   byte arrives; SB starts a sub-negotiation; IAC IAC is a literal 255.
//! - **Subnegotiation**: after IAC SB, waiting for the option byte.
//! - **CollectingOption**: gathering the payload until IAC SE.
//! - **Discarding**: a block broken by a stray IAC; skipped until IAC SE, or
//!   until IAC WILL/WONT/DO/DONT starts a fresh negotiation.
//!
//! Lines are UTF-8 when they decode as such, otherwise Latin-1.
//!
//! Malformed input never produces an error. Broken sequences are dropped and
//! parsing resumes in Normal.

use crate::options::WindowSize;
use crate::protocol::{IAC, NegotiationVerb, TelnetCommand, TelnetOption};

/// Default cap on a buffered input line, in bytes
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;
/// Default cap on a buffered sub-negotiation payload, in bytes
pub const DEFAULT_MAX_SUBNEGOTIATION_LENGTH: usize = 8192;

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7F;
const NUL: u8 = 0x00;

/// Something the parser recognised in the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A completed line of text, newline removed, otherwise untrimmed
    Line(String),
    /// `IAC <verb> <option>`; the option is raw so unknown ones still parse
    Negotiation { verb: NegotiationVerb, option: u8 },
    /// A well-formed NAWS report
    WindowSize(WindowSize),
    /// Any other completed `IAC SB <option> ... IAC SE` block
    Subnegotiation { option: u8, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParserState {
    Normal,
    Command {
        verb: Option<NegotiationVerb>,
    },
    Subnegotiation,
    CollectingOption {
        option: u8,
        data: Vec<u8>,
        saw_iac: bool,
        overflowed: bool,
    },
    /// Skipping the rest of a broken block until `IAC SE` or a fresh negotiation
    Discarding {
        saw_iac: bool,
    },
}

/// Per-connection incremental Telnet parser
#[derive(Debug, Clone)]
pub struct FramingParser {
    state: ParserState,
    line: Vec<u8>,
    max_line_length: usize,
    max_subnegotiation_length: usize,
}

impl Default for FramingParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FramingParser {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_LINE_LENGTH, DEFAULT_MAX_SUBNEGOTIATION_LENGTH)
    }

    /// Create a parser with explicit buffer caps
    ///
    /// Bytes past `max_line_length` are dropped until the next newline.
    /// Sub-negotiation blocks longer than `max_subnegotiation_length` are
    /// discarded whole.
    pub fn with_limits(max_line_length: usize, max_subnegotiation_length: usize) -> Self {
        Self {
            state: ParserState::Normal,
            line: Vec::new(),
            max_line_length,
            max_subnegotiation_length,
        }
    }

    /// Parse a chunk of bytes, returning every frame it completes
    ///
    /// # Example
    /// ```rust
    /// use telnet_framing::parser::{Frame, FramingParser};
    ///
    /// let mut parser = FramingParser::new();
    /// assert!(parser.parse(b"look ar").is_empty());
    /// assert_eq!(parser.parse(b"ound\r\n"), vec![Frame::Line("look around\r".into())]);
    /// ```
    pub fn parse(&mut self, input: &[u8]) -> Vec<Frame> {
        input.iter().filter_map(|&byte| self.feed(byte)).collect()
    }

    /// Advance the state machine by one byte
    pub fn feed(&mut self, byte: u8) -> Option<Frame> {
        match &mut self.state {
            ParserState::Normal => self.normal(byte),

            ParserState::Command { verb } => {
                let pending = *verb;
                self.command(pending, byte)
            }

            ParserState::Subnegotiation => {
                self.state = ParserState::CollectingOption {
                    option: byte,
                    data: Vec::new(),
                    saw_iac: false,
                    overflowed: false,
                };
                None
            }

            ParserState::CollectingOption {
                data,
                saw_iac,
                overflowed,
                ..
            } => {
                if *saw_iac {
                    *saw_iac = false;
                    if byte == TelnetCommand::SE.to_byte() {
                        return self.finish_subnegotiation();
                    }
                    if byte != IAC {
                        // IAC <cmd> inside a block: the block is broken.
                        self.state = ParserState::Discarding { saw_iac: true };
                        return self.feed(byte);
                    }
                } else if byte == IAC {
                    *saw_iac = true;
                    return None;
                }

                if data.len() < self.max_subnegotiation_length {
                    data.push(byte);
                } else {
                    *overflowed = true;
                }
                None
            }

            ParserState::Discarding { saw_iac } => {
                if !*saw_iac {
                    *saw_iac = byte == IAC;
                    return None;
                }
                *saw_iac = false;
                if byte == TelnetCommand::SE.to_byte() {
                    self.state = ParserState::Normal;
                } else if let Some(verb) = NegotiationVerb::from_byte(byte) {
                    self.state = ParserState::Command { verb: Some(verb) };
                }
                None
            }
        }
    }

    /// True while a protocol sequence is only partially received
    pub fn in_sequence(&self) -> bool {
        !matches!(self.state, ParserState::Normal)
    }

    /// Bytes buffered for the line currently being typed
    pub fn pending_line(&self) -> &[u8] {
        &self.line
    }

    /// Reset to the initial state, dropping any partial input
    pub fn reset(&mut self) {
        self.state = ParserState::Normal;
        self.line.clear();
    }

    fn normal(&mut self, byte: u8) -> Option<Frame> {
        match byte {
            IAC => {
                self.state = ParserState::Command { verb: None };
                None
            }
            b'\n' => {
                let line = decode_line(std::mem::take(&mut self.line));
                Some(Frame::Line(line))
            }
            BACKSPACE | DELETE => {
                self.erase_char();
                None
            }
            NUL => None,
            _ => {
                self.push_text(byte);
                None
            }
        }
    }

    fn command(&mut self, pending: Option<NegotiationVerb>, byte: u8) -> Option<Frame> {
        if let Some(verb) = NegotiationVerb::from_byte(byte) {
            self.state = ParserState::Command { verb: Some(verb) };
            return None;
        }

        if byte == TelnetCommand::SB.to_byte() {
            self.state = ParserState::Subnegotiation;
            return None;
        }

        self.state = ParserState::Normal;
        match pending {
            Some(verb) => Some(Frame::Negotiation { verb, option: byte }),
            None => {
                if byte == IAC {
                    self.push_text(IAC);
                }
                None
            }
        }
    }

    fn finish_subnegotiation(&mut self) -> Option<Frame> {
        let state = std::mem::replace(&mut self.state, ParserState::Normal);
        let ParserState::CollectingOption {
            option,
            data,
            overflowed,
            ..
        } = state
        else {
            return None;
        };

        if overflowed {
            return None;
        }

        if option == TelnetOption::NAWS.to_byte() {
            WindowSize::decode(&data).ok().map(Frame::WindowSize)
        } else {
            Some(Frame::Subnegotiation { option, data })
        }
    }

    fn push_text(&mut self, byte: u8) {
        if self.line.len() < self.max_line_length {
            self.line.push(byte);
        }
    }

    /// Remove the last character, including all bytes of a UTF-8 sequence
    fn erase_char(&mut self) {
        while let Some(byte) = self.line.pop() {
            if byte & 0b1100_0000 != 0b1000_0000 {
                break;
            }
        }
    }
}

/// UTF-8 when valid, otherwise each byte read as a Latin-1 character
fn decode_line(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}
