//! # WeeMUD
//!
//! A small poll-driven Telnet server core for MUD games.
//!
//! The game loop owns a [`MudServer`] and calls [`MudServer::update`] once per
//! tick. Each update accepts new clients, reads their input and negotiates the
//! MUD protocols (MSSP, MXP, GMCP, NAWS). The events it produced stay visible
//! until the next update:
//!
//! ```no_run
//! use weemud::{MudConfig, MudServer, TickDriver};
//! use std::ops::ControlFlow;
//!
//! # fn main() -> weemud::MudResult<()> {
//! let config = MudConfig::default();
//! let mut server = MudServer::bind(&config)?;
//! TickDriver::from_config(&config.server).run(&mut server, |server| {
//!     for id in server.new_players() {
//!         server.send_text(id, "Welcome!");
//!     }
//!     for (id, verb, argument) in server.commands() {
//!         server.send_text(id, &format!("You {verb} {argument}"));
//!     }
//!     ControlFlow::Continue(())
//! });
//! # Ok(())
//! # }
//! ```

pub mod color;
pub mod config;
pub mod connection;
pub mod errors;
pub mod events;
pub mod format;
pub mod server;

pub use config::MudConfig;
pub use connection::{Capabilities, ClientInfo};
pub use errors::{ConfigError, MudError, MudResult, SendError};
pub use events::{ClientId, Event};
pub use format::{MessageOptions, RoomInfo};
pub use server::{MudServer, TickDriver};
