use crate::config::{ClientConfig, MudConfig};
use crate::events::ClientId;

use jiff::Timestamp;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::{Duration, Instant};
use telnet_framing::options::{gmcp, mxp};
use telnet_framing::{Frame, FramingParser, MsspStatus, NegotiationVerb, TelnetOption, WindowSize};
use tracing::{debug, trace};

/// Options the client has agreed to, plus echo state set by the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub echo_suppressed: bool,
    pub window_size_reported: bool,
    pub mxp_enabled: bool,
    pub gmcp_enabled: bool,
}

/// Server facts needed to answer an MSSP request
#[derive(Debug, Clone)]
pub struct ServerStatus<'a> {
    pub players: usize,
    pub uptime: Duration,
    pub name: &'a str,
    pub extra: &'a BTreeMap<String, String>,
}

impl ServerStatus<'_> {
    pub fn mssp(&self) -> MsspStatus {
        let mut status = MsspStatus::new()
            .with("PLAYERS", self.players)
            .with("UPTIME", self.uptime.as_secs())
            .with("NAME", self.name);
        for (name, value) in self.extra {
            status.push(name.as_str(), value);
        }
        status
    }
}

/// Output of feeding received bytes through a session
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Received {
    /// Completed input lines, in arrival order, untrimmed
    pub lines: Vec<String>,
    /// Protocol replies to write back to the client
    pub replies: Vec<u8>,
}

/// Per-connection Telnet state: parser, negotiated options and window size
#[derive(Debug, Clone)]
pub struct TelnetSession {
    parser: FramingParser,
    capabilities: Capabilities,
    width: u16,
    height: u16,
    color_enabled: bool,
}

impl TelnetSession {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            parser: FramingParser::with_limits(
                config.max_line_length,
                config.max_subnegotiation_length,
            ),
            capabilities: Capabilities::default(),
            width: config.default_width,
            height: config.default_height,
            color_enabled: config.color_enabled,
        }
    }

    /// Feed raw socket bytes, applying any negotiation they carry
    pub fn receive(&mut self, data: &[u8], status: &ServerStatus<'_>) -> Received {
        let mut received = Received::default();
        for frame in self.parser.parse(data) {
            match frame {
                Frame::Line(line) => received.lines.push(line),
                Frame::Negotiation { verb, option } => {
                    self.negotiate(verb, option, status, &mut received.replies)
                }
                Frame::WindowSize(size) => self.resize(size),
                Frame::Subnegotiation { option, data } => self.subnegotiation(option, &data),
            }
        }
        received
    }

    fn negotiate(
        &mut self,
        verb: NegotiationVerb,
        option: u8,
        status: &ServerStatus<'_>,
        replies: &mut Vec<u8>,
    ) {
        trace!(?verb, option, "negotiation");
        match TelnetOption::from_byte(option) {
            Some(TelnetOption::MXP) => {
                let enabled = &mut self.capabilities.mxp_enabled;
                if toggle(enabled, verb.is_positive()) {
                    debug!(enabled = *enabled, "MXP");
                    if *enabled {
                        replies.extend(mxp::enable_sequence());
                    }
                }
            }
            Some(TelnetOption::GMCP) => {
                let enabled = &mut self.capabilities.gmcp_enabled;
                if toggle(enabled, verb.is_positive()) {
                    debug!(enabled = *enabled, "GMCP");
                    if *enabled {
                        replies.extend(mxp::enable_sequence());
                    }
                }
            }
            Some(TelnetOption::MSSP) if verb == NegotiationVerb::Do => {
                let mssp = status.mssp();
                debug!(players = status.players, "sending MSSP status");
                replies.extend(mssp.to_bytes());
            }
            // ECHO is driven from our side; the client's answer needs no action.
            _ => {}
        }
    }

    fn resize(&mut self, size: WindowSize) {
        let mut changed = false;
        if let Some(width) = size.positive_width() {
            self.width = width;
            changed = true;
        }
        if let Some(height) = size.positive_height() {
            self.height = height;
            changed = true;
        }
        if changed {
            self.capabilities.window_size_reported = true;
            debug!(width = self.width, height = self.height, "window size");
        }
    }

    fn subnegotiation(&mut self, option: u8, data: &[u8]) {
        if option == TelnetOption::GMCP.to_byte() {
            let payload = String::from_utf8_lossy(data);
            let (package, _) = gmcp::split_message(&payload);
            debug!(package, "GMCP from client");
        } else {
            trace!(option, len = data.len(), "ignored sub-negotiation");
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn color_enabled(&self) -> bool {
        self.color_enabled
    }

    pub fn set_color_enabled(&mut self, enabled: bool) {
        self.color_enabled = enabled;
    }

    pub fn set_echo_suppressed(&mut self, suppressed: bool) {
        self.capabilities.echo_suppressed = suppressed;
    }
}

/// Set `flag` to `value`, reporting whether it changed
fn toggle(flag: &mut bool, value: bool) -> bool {
    let changed = *flag != value;
    *flag = value;
    changed
}

/// What a single non-blocking read produced
#[derive(Debug)]
pub enum ReadOutcome {
    Data(usize),
    /// Nothing to read right now
    Idle,
    /// The peer closed the connection
    Closed,
    Failed(io::Error),
}

/// Snapshot of a connection for the game loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientInfo {
    pub id: ClientId,
    pub addr: SocketAddr,
    pub connected_at: Timestamp,
    pub capabilities: Capabilities,
    pub width: u16,
    pub height: u16,
    pub color_enabled: bool,
}

/// One accepted client socket and its Telnet session
#[derive(Debug)]
pub struct Connection {
    id: ClientId,
    stream: TcpStream,
    addr: SocketAddr,
    connected_at: Timestamp,
    last_check: Instant,
    session: TelnetSession,
    outbox: Vec<u8>,
    max_output: usize,
}

impl Connection {
    /// Wrap an accepted stream, switching it to non-blocking mode
    pub fn new(
        id: ClientId,
        stream: TcpStream,
        addr: SocketAddr,
        config: &MudConfig,
    ) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;

        Ok(Self {
            id,
            stream,
            addr,
            connected_at: Timestamp::now(),
            last_check: Instant::now(),
            session: TelnetSession::new(&config.client),
            outbox: Vec::new(),
            max_output: config.server.max_output_buffer,
        })
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn session(&self) -> &TelnetSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TelnetSession {
        &mut self.session
    }

    /// Queue bytes and push as much as the socket takes
    pub fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        trace!(id = %self.id, len = bytes.len(), "send");
        self.outbox.extend_from_slice(bytes);
        self.flush()
    }

    /// Write queued bytes until the socket would block
    ///
    /// Fails when the peer is gone or the queue outgrows its limit.
    pub fn flush(&mut self) -> io::Result<()> {
        while !self.outbox.is_empty() {
            match self.stream.write(&self.outbox) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.outbox.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        if self.outbox.len() > self.max_output {
            return Err(io::Error::other(format!(
                "{} bytes of unsent output",
                self.outbox.len()
            )));
        }
        Ok(())
    }

    pub fn has_pending_output(&self) -> bool {
        !self.outbox.is_empty()
    }

    /// One non-blocking read into `buf`
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> ReadOutcome {
        match self.stream.read(buf) {
            Ok(0) => ReadOutcome::Closed,
            Ok(n) => ReadOutcome::Data(n),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                ReadOutcome::Idle
            }
            Err(e) => ReadOutcome::Failed(e),
        }
    }

    /// Feed received bytes through the session inside this client's span
    pub fn receive(&mut self, data: &[u8], status: &ServerStatus<'_>) -> Received {
        let span = tracing::debug_span!("client", id = %self.id);
        let _enter = span.enter();
        self.session.receive(data, status)
    }

    pub fn liveness_due(&self, now: Instant, interval: Duration) -> bool {
        now.duration_since(self.last_check) >= interval
    }

    pub fn mark_checked(&mut self, now: Instant) {
        self.last_check = now;
    }

    /// Close both directions; errors are irrelevant at this point
    pub fn close(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    pub fn info(&self) -> ClientInfo {
        ClientInfo {
            id: self.id,
            addr: self.addr,
            connected_at: self.connected_at,
            capabilities: self.session.capabilities(),
            width: self.session.width(),
            height: self.session.height(),
            color_enabled: self.session.color_enabled(),
        }
    }
}
