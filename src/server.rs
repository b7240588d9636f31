use crate::config::{MudConfig, ServerConfig};
use crate::connection::{ClientInfo, Connection, ReadOutcome, ServerStatus};
use crate::errors::{MudResult, SendError};
use crate::events::{ClientId, Event, EventQueue};
use crate::format::{self, MessageOptions, RoomInfo};

use jiff::Timestamp;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::ops::ControlFlow;
use std::thread;
use std::time::{Duration, Instant};
use telnet_framing::options::{echo, gmcp, mxp};
use telnet_framing::{NegotiationVerb, TelnetOption, TelnetSequence};
use tracing::{debug, info, trace, warn};

const SERVER_FULL: &[u8] = b"Sorry, the MUD has reached its maximum number of concurrent \
connections. Please try again later.\r\n";

/// Telnet connection registry and poller
///
/// Everything happens inside [`MudServer::update`]: new sockets are accepted,
/// idle ones are probed, input is parsed into events and queued output is
/// flushed. The game loop reads the events of the last tick through the query
/// methods and answers through the send methods.
#[derive(Debug)]
pub struct MudServer {
    listener: TcpListener,
    config: MudConfig,
    clients: BTreeMap<ClientId, Connection>,
    next_id: ClientId,
    events: EventQueue,
    started: Instant,
    started_at: Timestamp,
    read_buf: Vec<u8>,
}

impl MudServer {
    /// Bind the configured address and start listening
    pub fn bind(config: &MudConfig) -> MudResult<Self> {
        let listener = TcpListener::bind(config.server.bind_addr())?;
        Self::from_listener(listener, config)
    }

    /// Serve on an already bound listener
    pub fn from_listener(listener: TcpListener, config: &MudConfig) -> MudResult<Self> {
        listener.set_nonblocking(true)?;
        info!(addr = %listener.local_addr()?, "listening");

        Ok(Self {
            listener,
            config: config.clone(),
            clients: BTreeMap::new(),
            next_id: ClientId::new(0),
            events: EventQueue::new(),
            started: Instant::now(),
            started_at: Timestamp::now(),
            read_buf: vec![0; config.server.read_chunk()],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn config(&self) -> &MudConfig {
        &self.config
    }

    /// Run one tick. Never blocks.
    pub fn update(&mut self) {
        self.check_for_new_connections();
        self.check_liveness();
        self.check_for_messages();
        self.flush_output();
        self.events.advance();
    }

    fn check_for_new_connections(&mut self) {
        for _ in 0..self.config.server.accept_per_tick.max(1) {
            match self.listener.accept() {
                Ok((stream, addr)) => self.register(stream, addr),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    break;
                }
            }
        }
    }

    fn register(&mut self, stream: TcpStream, addr: SocketAddr) {
        if self.clients.len() >= self.config.server.max_connections {
            info!(%addr, "server full, rejecting connection");
            reject(stream);
            return;
        }

        let id = self.next_id;
        let connection = match Connection::new(id, stream, addr, &self.config) {
            Ok(connection) => connection,
            Err(e) => {
                warn!(%addr, error = %e, "could not set up connection");
                return;
            }
        };
        self.next_id = id.next();
        self.clients.insert(id, connection);
        self.events.push(Event::NewConnection(id));
        info!(%id, %addr, "new connection");

        let greeting: Vec<u8> = [
            (NegotiationVerb::Will, TelnetOption::MSSP),
            (NegotiationVerb::Will, TelnetOption::GMCP),
            (NegotiationVerb::Will, TelnetOption::MXP),
            (NegotiationVerb::Do, TelnetOption::NAWS),
        ]
        .into_iter()
        .flat_map(|(verb, option)| TelnetSequence::negotiate(verb, option).to_bytes())
        .collect();
        self.deliver(id, &greeting);
    }

    fn check_liveness(&mut self) {
        let now = Instant::now();
        let interval = self.config.server.liveness_interval();
        let due: Vec<ClientId> = self
            .clients
            .values_mut()
            .filter(|client| client.liveness_due(now, interval))
            .map(|client| {
                client.mark_checked(now);
                client.id()
            })
            .collect();

        for id in due {
            self.deliver(id, &[0]);
        }
    }

    fn check_for_messages(&mut self) {
        let ids: Vec<ClientId> = self.clients.keys().copied().collect();
        for id in ids {
            self.read_from(id);
        }
    }

    fn read_from(&mut self, id: ClientId) {
        let players = self.clients.len();
        let Some(client) = self.clients.get_mut(&id) else {
            return;
        };

        let received = match client.read_chunk(&mut self.read_buf) {
            ReadOutcome::Idle => return,
            ReadOutcome::Closed => {
                debug!(%id, "peer closed connection");
                self.handle_disconnect(id);
                return;
            }
            ReadOutcome::Failed(e) => {
                warn!(%id, error = %e, "read failed");
                self.handle_disconnect(id);
                return;
            }
            ReadOutcome::Data(n) => {
                trace!(%id, bytes = ?&self.read_buf[..n], "read");
                let status = ServerStatus {
                    players,
                    uptime: self.started.elapsed(),
                    name: &self.config.mssp.name,
                    extra: &self.config.mssp.extra,
                };
                client.receive(&self.read_buf[..n], &status)
            }
        };

        for line in &received.lines {
            if let Some(event) = Event::command(id, line) {
                self.events.push(event);
            }
        }
        if !received.replies.is_empty() {
            self.deliver(id, &received.replies);
        }
    }

    fn flush_output(&mut self) {
        let failed: Vec<(ClientId, io::Error)> = self
            .clients
            .iter_mut()
            .filter(|(_, client)| client.has_pending_output())
            .filter_map(|(id, client)| client.flush().err().map(|e| (*id, e)))
            .collect();

        for (id, e) in failed {
            warn!(%id, error = %e, "flush failed");
            self.handle_disconnect(id);
        }
    }

    /// Remove a client; only an actual removal produces an event
    fn handle_disconnect(&mut self, id: ClientId) {
        if let Some(client) = self.clients.remove(&id) {
            client.close();
            info!(%id, addr = %client.addr(), "client disconnected");
            self.events.push(Event::Disconnected(id));
        }
    }

    /// Send bytes, reporting why they could not be sent
    ///
    /// A transport failure also removes the client.
    pub fn try_raw_send(&mut self, id: ClientId, bytes: &[u8]) -> Result<(), SendError> {
        let client = self.clients.get_mut(&id).ok_or(SendError::NotFound(id))?;
        if let Err(e) = client.send(bytes) {
            warn!(%id, error = %e, "send failed");
            self.handle_disconnect(id);
            return Err(SendError::Transport(e));
        }
        Ok(())
    }

    fn deliver(&mut self, id: ClientId, bytes: &[u8]) {
        if let Err(SendError::NotFound(id)) = self.try_raw_send(id, bytes) {
            trace!(%id, "send to unknown client ignored");
        }
    }

    pub fn events(&self) -> &[Event] {
        self.events.visible()
    }

    pub fn new_players(&self) -> Vec<ClientId> {
        self.events.new_players()
    }

    pub fn disconnected_players(&self) -> Vec<ClientId> {
        self.events.disconnected_players()
    }

    /// `(id, verb, argument)` for every command received during the last tick
    pub fn commands(&self) -> Vec<(ClientId, String, String)> {
        self.events.commands()
    }

    pub fn player_count(&self) -> usize {
        self.clients.len()
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn is_connected(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn remote_addr(&self, id: ClientId) -> Option<SocketAddr> {
        self.clients.get(&id).map(Connection::addr)
    }

    pub fn client_info(&self, id: ClientId) -> Option<ClientInfo> {
        self.clients.get(&id).map(Connection::info)
    }

    pub fn set_color(&mut self, id: ClientId, enabled: bool) {
        if let Some(client) = self.clients.get_mut(&id) {
            client.session_mut().set_color_enabled(enabled);
        }
    }

    /// Format and send a message, honoring the client's color setting
    pub fn send_message(&mut self, id: ClientId, text: &str, options: &MessageOptions) {
        let Some(client) = self.clients.get(&id) else {
            trace!(%id, "message to unknown client ignored");
            return;
        };
        let message = format::format_message(
            text,
            options,
            client.session().color_enabled(),
            self.config.client.wrap_width,
        );
        self.deliver(id, message.as_bytes());
    }

    pub fn send_text(&mut self, id: ClientId, text: &str) {
        self.send_message(id, text, &MessageOptions::default());
    }

    /// Send an already formatted GMCP line such as `Core.Ping`
    pub fn gmcp_message(&mut self, id: ClientId, message: &str) {
        self.deliver(id, &gmcp::encode(message));
    }

    /// Send `package` with `payload` serialized as its JSON body
    pub fn send_gmcp<T>(&mut self, id: ClientId, package: &str, payload: &T) -> serde_json::Result<()>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_string(payload)?;
        self.gmcp_message(id, &gmcp::format_message(package, &json));
        Ok(())
    }

    pub fn mxp_secure(&mut self, id: ClientId, text: &str, code: u32) {
        let line = mxp::secure_line(text, code, format::DEFAULT_LINE_ENDING);
        self.deliver(id, line.as_bytes());
    }

    /// Describe a room over whichever of GMCP and MXP the client enabled
    pub fn send_room(&mut self, id: ClientId, room: &RoomInfo) {
        let Some(client) = self.clients.get(&id) else {
            return;
        };
        let capabilities = client.session().capabilities();

        if capabilities.gmcp_enabled {
            if let Err(e) = self.send_gmcp(id, "Room.Info", room) {
                warn!(%id, error = %e, "could not encode Room.Info");
            }
        }
        if capabilities.mxp_enabled {
            self.mxp_secure(id, &room.name, mxp::ROOM_NAME_LINE);
        }
    }

    /// Send items as clickable MXP links, or a plain list without MXP
    pub fn send_list(&mut self, id: ClientId, items: &[impl AsRef<str>], command: &str) {
        let Some(client) = self.clients.get(&id) else {
            return;
        };

        if client.session().capabilities().mxp_enabled {
            let links = format::mxp_item_links(items, command);
            self.mxp_secure(id, &links, mxp::SECURE_LINE);
        } else {
            let plain: Vec<&str> = items.iter().map(|item| item.as_ref()).collect();
            self.send_text(id, &plain.join(", "));
        }
    }

    pub fn raw_send(&mut self, id: ClientId, bytes: &[u8]) {
        self.deliver(id, bytes);
    }

    /// Ask the client to echo locally (`true`) or to let the server echo
    pub fn remote_echo(&mut self, id: ClientId, enabled: bool) {
        let Some(client) = self.clients.get_mut(&id) else {
            return;
        };
        client.session_mut().set_echo_suppressed(!enabled);
        self.deliver(id, &echo::remote_echo(enabled));
    }

    /// Close a client's socket. A second call for the same id does nothing.
    pub fn disconnect_player(&mut self, id: ClientId) {
        self.handle_disconnect(id);
    }

    /// Close every client socket and the listener
    pub fn shutdown(self) {
        info!(clients = self.clients.len(), "shutting down");
        for client in self.clients.values() {
            client.close();
        }
    }
}

/// Best effort notice to a client that cannot be admitted
fn reject(mut stream: TcpStream) {
    let _ = stream.write_all(SERVER_FULL);
    let _ = stream.shutdown(std::net::Shutdown::Both);
}

/// Fixed-rate loop around [`MudServer::update`]
#[derive(Debug, Clone, Copy)]
pub struct TickDriver {
    interval: Duration,
}

impl TickDriver {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.tick_interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Update the server, then hand it to `tick`, until `tick` breaks
    pub fn run<F>(&self, server: &mut MudServer, mut tick: F)
    where
        F: FnMut(&mut MudServer) -> ControlFlow<()>,
    {
        loop {
            server.update();
            if tick(server).is_break() {
                break;
            }
            if !self.interval.is_zero() {
                thread::sleep(self.interval);
            }
        }
    }
}
