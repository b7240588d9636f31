use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::ops::ControlFlow;
use std::thread;
use std::time::Duration;

use telnet_framing::MsspStatus;
use weemud::config::MudConfig;
use weemud::errors::SendError;
use weemud::events::ClientId;
use weemud::format::MessageOptions;
use weemud::server::{MudServer, TickDriver};

/// `WILL MSSP, WILL GMCP, WILL MXP, DO NAWS`
const GREETING: [u8; 12] = [255, 251, 70, 255, 251, 201, 255, 251, 91, 255, 253, 31];

fn quiet_config() -> MudConfig {
    let mut config = MudConfig::default();
    config.server.liveness_interval_secs = 3600;
    config
}

fn start(config: &MudConfig) -> MudServer {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    MudServer::from_listener(listener, config).unwrap()
}

fn connect(server: &MudServer) -> TcpStream {
    let stream = TcpStream::connect(server.local_addr().unwrap()).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    stream
}

/// Update until `done` holds; false if it never did
fn tick_until(server: &mut MudServer, mut done: impl FnMut(&MudServer) -> bool) -> bool {
    for _ in 0..400 {
        server.update();
        if done(server) {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

/// Give in-flight bytes time to arrive and be processed
fn settle(server: &mut MudServer) {
    for _ in 0..20 {
        server.update();
        thread::sleep(Duration::from_millis(5));
    }
}

fn read_n(stream: &mut TcpStream, n: usize) -> Vec<u8> {
    let mut buf = vec![0; n];
    stream.read_exact(&mut buf).unwrap();
    buf
}

fn read_until(stream: &mut TcpStream, terminator: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    let mut byte = [0u8; 1];
    while !data.ends_with(terminator) {
        stream.read_exact(&mut byte).unwrap();
        data.push(byte[0]);
    }
    data
}

/// Connect a client and wait for the server to report it
fn join(server: &mut MudServer) -> (ClientId, TcpStream) {
    let mut stream = connect(server);
    let mut joined = None;
    assert!(tick_until(server, |s| {
        joined = s.new_players().first().copied();
        joined.is_some()
    }));
    assert_eq!(read_n(&mut stream, GREETING.len()), GREETING);
    (joined.unwrap(), stream)
}

#[test]
fn test_new_connection_reported_for_one_tick() {
    let mut server = start(&quiet_config());
    let _client = connect(&server);

    assert!(tick_until(&mut server, |s| !s.new_players().is_empty()));
    assert_eq!(server.new_players(), vec![ClientId::new(0)]);
    assert_eq!(server.player_count(), 1);
    assert!(server.is_connected(ClientId::new(0)));

    server.update();
    assert!(server.new_players().is_empty());
    assert!(server.events().is_empty());
}

#[test]
fn test_client_receives_option_offers() {
    let mut server = start(&quiet_config());
    let (id, _client) = join(&mut server);
    assert_eq!(id, ClientId::new(0));

    let info = server.client_info(id).unwrap();
    assert_eq!((info.height, info.width), (30, 100));
    assert!(info.color_enabled);
    assert_eq!(server.remote_addr(id), Some(info.addr));
}

#[test]
fn test_typed_line_becomes_command() {
    let mut server = start(&quiet_config());
    let (id, mut client) = join(&mut server);

    client.write_all(b"Say Hello World\r\n").unwrap();
    assert!(tick_until(&mut server, |s| !s.commands().is_empty()));
    assert_eq!(
        server.commands(),
        vec![(id, "say".to_string(), "Hello World".to_string())]
    );

    server.update();
    assert!(server.commands().is_empty());
}

#[test]
fn test_every_line_in_a_read_is_a_command() {
    let mut server = start(&quiet_config());
    let (id, mut client) = join(&mut server);

    client.write_all(b"north\r\n\r\nget lamp\r\n").unwrap();
    let mut seen = Vec::new();
    assert!(tick_until(&mut server, |s| {
        seen.extend(s.commands());
        seen.len() >= 2
    }));
    assert_eq!(
        seen,
        vec![
            (id, "north".to_string(), String::new()),
            (id, "get".to_string(), "lamp".to_string()),
        ]
    );
}

#[test]
fn test_line_split_across_writes() {
    let mut server = start(&quiet_config());
    let (id, mut client) = join(&mut server);

    client.write_all(b"look ar").unwrap();
    settle(&mut server);
    client.write_all(b"ound\r\n").unwrap();

    let mut seen = Vec::new();
    assert!(tick_until(&mut server, |s| {
        seen.extend(s.commands());
        !seen.is_empty()
    }));
    assert_eq!(seen, vec![(id, "look".to_string(), "around".to_string())]);
}

#[test]
fn test_dropped_client_is_reported() {
    let mut server = start(&quiet_config());
    let (id, client) = join(&mut server);

    drop(client);
    assert!(tick_until(&mut server, |s| !s.disconnected_players().is_empty()));
    assert_eq!(server.disconnected_players(), vec![id]);
    assert!(!server.is_connected(id));
    assert_eq!(server.player_count(), 0);
}

#[test]
fn test_disconnect_player_is_idempotent() {
    let mut server = start(&quiet_config());
    let (id, mut client) = join(&mut server);

    server.disconnect_player(id);
    server.disconnect_player(id);
    server.update();
    assert_eq!(server.disconnected_players(), vec![id]);

    server.update();
    assert!(server.disconnected_players().is_empty());

    // the socket was closed from our side
    let mut buf = [0u8; 16];
    assert_eq!(client.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_repeated_send_failures_disconnect_once() {
    let mut server = start(&quiet_config());
    let (id, client) = join(&mut server);
    drop(client);

    // The first writes can still land in the socket buffer; keep sending
    // until the closed peer is noticed.
    let mut first_error = None;
    for _ in 0..400 {
        if let Err(e) = server.try_raw_send(id, b"ping\r\n") {
            first_error = Some(e);
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert!(matches!(first_error, Some(SendError::Transport(_))));
    assert!(!server.is_connected(id));

    for _ in 0..3 {
        assert!(matches!(
            server.try_raw_send(id, b"ping\r\n"),
            Err(SendError::NotFound(missing)) if missing == id
        ));
    }
    server.raw_send(id, b"ping\r\n");

    server.update();
    assert_eq!(server.disconnected_players(), vec![id]);
    server.update();
    assert!(server.disconnected_players().is_empty());
}

#[test]
fn test_send_to_departed_client_is_a_no_op() {
    let mut server = start(&quiet_config());
    let (gone, _first) = join(&mut server);
    let (stay, mut second) = join(&mut server);

    server.disconnect_player(gone);
    server.send_text(gone, "anyone there?");
    server.send_text(stay, "still here");
    server.update();

    assert_eq!(server.disconnected_players(), vec![gone]);
    assert!(server.is_connected(stay));
    assert_eq!(read_until(&mut second, b"\r\n"), b"still here\r\n".to_vec());
}

#[test]
fn test_mssp_request_over_the_wire() {
    let mut server = start(&quiet_config());
    let (_id, mut client) = join(&mut server);

    client.write_all(&[255, 253, 70]).unwrap();
    settle(&mut server);

    assert_eq!(read_n(&mut client, 3), vec![255, 250, 70]);
    let mut body = read_until(&mut client, &[255, 240]);
    body.truncate(body.len() - 2);

    let status = MsspStatus::decode(&body).unwrap();
    assert_eq!(status.get("PLAYERS"), Some("1"));
    assert!(status.get("UPTIME").unwrap().parse::<u64>().is_ok());
    assert_eq!(status.get("NAME"), Some("WeeMud"));
}

#[test]
fn test_window_size_over_the_wire() {
    let mut server = start(&quiet_config());
    let (id, mut client) = join(&mut server);

    client
        .write_all(&[255, 250, 31, 0, 80, 0, 24, 255, 240])
        .unwrap();
    assert!(tick_until(&mut server, |s| {
        s.client_info(id).is_some_and(|info| info.capabilities.window_size_reported)
    }));

    let info = server.client_info(id).unwrap();
    assert_eq!((info.width, info.height), (80, 24));
}

#[test]
fn test_mxp_agreement_enables_mxp() {
    let mut server = start(&quiet_config());
    let (id, mut client) = join(&mut server);

    client.write_all(&[255, 253, 91]).unwrap();
    assert!(tick_until(&mut server, |s| {
        s.client_info(id).is_some_and(|info| info.capabilities.mxp_enabled)
    }));
    assert_eq!(read_n(&mut client, 5), vec![255, 250, 91, 255, 240]);

    server.send_list(id, &["lantern", "2 rusty swords."], "get");
    let line = read_until(&mut client, b"\r\n");
    assert_eq!(
        String::from_utf8(line).unwrap(),
        "\x1b[1z<send \"get lantern\">lantern</send>, \
         <send \"get rusty swords\">2 rusty swords.</send>\x1b[3z\r\n"
    );
}

#[test]
fn test_liveness_probe_sends_nul() {
    let mut config = quiet_config();
    config.server.liveness_interval_secs = 0;
    let mut server = start(&config);
    let (_id, mut client) = join(&mut server);

    settle(&mut server);
    assert_eq!(read_n(&mut client, 1), vec![0]);
}

#[test]
fn test_color_disabled_message() {
    let mut server = start(&quiet_config());
    let (id, mut client) = join(&mut server);

    server.set_color(id, false);
    server.send_message(
        id,
        "Welcome %bold Bob%reset!",
        &MessageOptions::new().color("red"),
    );
    assert_eq!(read_n(&mut client, 14), b"Welcome Bob!\r\n");
}

#[test]
fn test_remote_echo_toggle() {
    let mut server = start(&quiet_config());
    let (id, mut client) = join(&mut server);

    server.remote_echo(id, false);
    assert_eq!(read_n(&mut client, 3), vec![255, 251, 1]);
    assert!(server.client_info(id).unwrap().capabilities.echo_suppressed);

    server.remote_echo(id, true);
    assert_eq!(read_n(&mut client, 3), vec![255, 252, 1]);
    assert!(!server.client_info(id).unwrap().capabilities.echo_suppressed);
}

#[test]
fn test_full_server_turns_clients_away() {
    let mut config = quiet_config();
    config.server.max_connections = 1;
    let mut server = start(&config);
    let (_id, _first) = join(&mut server);

    let mut second = connect(&server);
    settle(&mut server);

    let mut notice = String::new();
    second.read_to_string(&mut notice).unwrap();
    assert!(notice.starts_with("Sorry"));
    assert_eq!(server.player_count(), 1);
}

#[test]
fn test_shutdown_closes_clients() {
    let mut server = start(&quiet_config());
    let (_id, mut client) = join(&mut server);

    server.shutdown();
    let mut buf = [0u8; 16];
    assert_eq!(client.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_tick_driver_runs_a_game_loop() {
    let mut server = start(&quiet_config());
    let mut client = connect(&server);
    client.write_all(b"quit\r\n").unwrap();

    let mut greeted = Vec::new();
    let mut ticks = 0;
    TickDriver::new(Duration::from_millis(1)).run(&mut server, |server| {
        ticks += 1;
        for id in server.new_players() {
            server.send_text(id, "Hello");
            greeted.push(id);
        }
        for (id, verb, _) in server.commands() {
            if verb == "quit" {
                server.disconnect_player(id);
                return ControlFlow::Break(());
            }
        }
        if ticks > 2000 {
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });

    assert_eq!(greeted, vec![ClientId::new(0)]);
    assert!(!server.is_connected(ClientId::new(0)));
}
