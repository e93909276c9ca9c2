//! Shared helpers for the mqpp command-line tools.

use std::fmt::{self, Write};

use mqpp_packets::{ControlPacket, Packet};

/// Initialize logging with the given verbosity.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    fmt().with_env_filter(filter).init();
}

/// One-line summary of a packet: its type followed by its fields.
pub fn describe(packet: &ControlPacket) -> String {
    let mut line = packet.packet_type().to_string();
    // Writing into a String cannot fail.
    let _ = write_fields(&mut line, packet);
    line
}

fn write_fields(line: &mut String, packet: &ControlPacket) -> fmt::Result {
    use ControlPacket::*;

    match packet {
        Connect(p) => {
            write!(
                line,
                " protocol={}/{} client_id={:?} clean_session={} keep_alive={}",
                p.protocol_name(),
                p.protocol_level(),
                p.client_id(),
                p.clean_session(),
                p.keep_alive()
            )?;
            if let Some(topic) = p.will_topic() {
                write!(
                    line,
                    " will_topic={:?} will_qos={} will_retain={}",
                    topic,
                    u8::from(p.will_qos()),
                    p.will_retain()
                )?;
            }
            if let Some(username) = p.username() {
                write!(line, " username={:?}", username)?;
            }
        }
        Connack(p) => write!(
            line,
            " session_present={} return_code=\"{}\"",
            p.session_present(),
            p.return_code()
        )?,
        Publish(p) => write!(
            line,
            " topic={:?} qos={} dup={} retain={} id={} payload={} bytes",
            p.topic_name(),
            u8::from(p.qos()),
            p.dup(),
            p.retain(),
            p.packet_identifier(),
            p.payload().len()
        )?,
        Puback(p) => write!(line, " id={}", p.packet_identifier())?,
        Pubrec(p) => write!(line, " id={}", p.packet_identifier())?,
        Pubrel(p) => write!(line, " id={}", p.packet_identifier())?,
        Pubcomp(p) => write!(line, " id={}", p.packet_identifier())?,
        Unsuback(p) => write!(line, " id={}", p.packet_identifier())?,
        Subscribe(p) => {
            write!(line, " id={}", p.packet_identifier())?;
            for s in p.subscriptions() {
                write!(line, " {:?}@{}", s.topic_filter, u8::from(s.requested_qos))?;
            }
        }
        Suback(p) => {
            write!(line, " id={}", p.packet_identifier())?;
            for code in p.return_codes() {
                write!(line, " [{}]", code)?;
            }
        }
        Unsubscribe(p) => {
            write!(line, " id={}", p.packet_identifier())?;
            for filter in p.topic_filters() {
                write!(line, " {:?}", filter)?;
            }
        }
        Pingreq(_) | Pingresp(_) | Disconnect(_) => {}
    }

    Ok(())
}

/// Lowercase hex of `bytes`, space separated.
pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
