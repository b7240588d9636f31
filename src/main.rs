use std::collections::BTreeMap;
use std::ops::ControlFlow;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use weemud::{ClientId, MessageOptions, MudConfig, MudResult, MudServer, RoomInfo, TickDriver};

const CONFIG_FILE: &str = "weemud.toml";

fn main() -> MudResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let config = match MudConfig::load_from_file(CONFIG_FILE) {
        Ok(config) => {
            info!("Configuration loaded from {CONFIG_FILE}");
            config
        }
        Err(e) => {
            error!("Config error: {e}. Using defaults.");
            MudConfig::default()
        }
    };

    let mut server = MudServer::bind(&config)?;
    info!(
        name = %config.mssp.name,
        max_connections = config.server.max_connections,
        "Server starting on {}",
        server.local_addr()?
    );
    info!(
        "Connect with: telnet {} {}",
        config.server.bind_address, config.server.port
    );

    let mut lobby = Lobby::default();
    TickDriver::from_config(&config.server).run(&mut server, |server| lobby.tick(server));

    server.shutdown();
    Ok(())
}

/// A single shared room where everyone can chat
#[derive(Default)]
struct Lobby {
    names: BTreeMap<ClientId, String>,
}

impl Lobby {
    fn tick(&mut self, server: &mut MudServer) -> ControlFlow<()> {
        for id in server.new_players() {
            let name = format!("guest{id}");
            server.send_text(
                id,
                &format!("Welcome to %bold WeeMUD%reset, {name}! Type '%cyan help%reset' for commands."),
            );
            self.broadcast(server, &format!("{name} arrives."));
            self.names.insert(id, name);
        }

        for id in server.disconnected_players() {
            if let Some(name) = self.names.remove(&id) {
                self.broadcast(server, &format!("{name} leaves."));
            }
        }

        for (id, verb, argument) in server.commands() {
            if self.command(server, id, &verb, &argument).is_break() {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn command(
        &mut self,
        server: &mut MudServer,
        id: ClientId,
        verb: &str,
        argument: &str,
    ) -> ControlFlow<()> {
        let Some(name) = self.names.get(&id).cloned() else {
            return ControlFlow::Continue(());
        };

        match verb {
            "say" => self.broadcast(server, &format!("%yellow {name} says: {argument}")),
            "name" if !argument.is_empty() => {
                let new_name = argument.split_whitespace().next().unwrap_or(argument);
                self.broadcast(server, &format!("{name} is now known as {new_name}."));
                self.names.insert(id, new_name.to_string());
            }
            "who" => {
                let names: Vec<&str> = self.names.values().map(String::as_str).collect();
                server.send_list(id, &names, "look");
            }
            "look" => {
                server.send_room(id, &lobby_room());
                server.send_text(id, "You stand in a small, warm lobby.");
            }
            "color" => match argument {
                "on" => server.set_color(id, true),
                "off" => server.set_color(id, false),
                _ => server.send_text(id, "Usage: color on|off"),
            },
            "quit" => {
                server.send_message(id, "Goodbye!", &MessageOptions::new().color("bold"));
                server.disconnect_player(id);
            }
            "shutdown" => {
                info!(%id, "shutdown requested");
                return ControlFlow::Break(());
            }
            "help" => server.send_text(
                id,
                "Commands: say <text>, name <new name>, who, look, color on|off, quit",
            ),
            _ => server.send_message(
                id,
                &format!("Unknown command '{verb}'"),
                &MessageOptions::new().color("red"),
            ),
        }
        ControlFlow::Continue(())
    }

    fn broadcast(&self, server: &mut MudServer, text: &str) {
        for &id in self.names.keys() {
            server.send_text(id, text);
        }
    }
}

fn lobby_room() -> RoomInfo {
    RoomInfo {
        num: 1,
        name: "Lobby".to_string(),
        zone: "weemud".to_string(),
        terrain: "indoors".to_string(),
        details: String::new(),
        exits: serde_json::json!({}),
        coords: serde_json::json!([0, 0, 0]),
    }
}
