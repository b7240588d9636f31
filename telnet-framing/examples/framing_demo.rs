//! # Framing Demo
//!
//! Feeds a few typical client byte streams through a `FramingParser` and
//! shows the frames a MUD server would act on.
//! Run with: `cargo run -p telnet-framing --example framing_demo`

use telnet_framing::options::{mssp, mxp};
use telnet_framing::{Frame, FramingParser, MsspStatus};

fn show(label: &str, parser: &mut FramingParser, input: &[u8]) {
    println!("{label}");
    println!("   Input: {input:?}");
    let frames = parser.parse(input);
    if frames.is_empty() {
        println!("   (no complete frame, {} bytes pending)", parser.pending_line().len());
    }
    for frame in frames {
        match frame {
            Frame::Line(line) => println!("   Line: {:?}", line.trim()),
            Frame::Negotiation { verb, option } => println!("   Negotiation: {verb:?} {option}"),
            Frame::WindowSize(size) => println!("   Window size: {size}"),
            Frame::Subnegotiation { option, data } => {
                println!("   Sub-negotiation {option}: {} bytes", data.len())
            }
        }
    }
    println!();
}

fn main() {
    println!("=== Telnet Framing Demo ===\n");
    let mut parser = FramingParser::new();

    show("1. A plain command:", &mut parser, b"look\r\n");

    show("2. A line typed over two reads, first half:", &mut parser, b"get la");
    show("   ...second half:", &mut parser, b"mp\r\n");

    show("3. Backspace corrects a typo:", &mut parser, b"norht\x08\x08th\r\n");

    show(
        "4. Client agrees to MXP and reports its window:",
        &mut parser,
        &[255, 253, 91, 255, 250, 31, 0, 80, 0, 24, 255, 240],
    );

    println!("5. Replies a server would send:");
    println!("   MXP enable: {:?}", mxp::enable_sequence());
    let status = MsspStatus::new()
        .with("PLAYERS", 3)
        .with("UPTIME", 42)
        .with("NAME", "WeeMud");
    println!("   MSSP status: {:?}", status.to_bytes());
    println!("   (MSSP_VAR = {}, MSSP_VAL = {})", mssp::MSSP_VAR, mssp::MSSP_VAL);
}
