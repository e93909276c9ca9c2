//! MQTT dump tool - print the packets of a captured MQTT byte stream.

use std::path::PathBuf;

use clap::Parser;
use mqpp_cli::{describe, hex, init_logging};
use mqpp_packets::{codec::FrameCodec, ControlPacket};
use tokio::io::AsyncRead;
use tokio_stream::StreamExt;
use tokio_util::codec::FramedRead;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "mqpp-dump")]
#[command(about = "Decode a captured MQTT 3.1.1 byte stream, one packet per line")]
#[command(version)]
struct Args {
    /// File holding the raw stream (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Also print the bytes of each packet in hex
    #[arg(short = 'x', long)]
    hex: bool,

    /// Skip packets that fail to decode instead of stopping
    #[arg(short = 'k', long)]
    keep_going: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

async fn dump<R>(reader: R, args: &Args) -> mqpp_core::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut frames = FramedRead::new(reader, FrameCodec);
    let mut count = 0;

    while let Some(frame) = frames.next().await {
        let frame = frame?;

        match ControlPacket::decode(frame.clone()) {
            Ok(packet) => {
                count += 1;
                println!("{}", describe(&packet));
            }
            Err(e) if args.keep_going => {
                warn!("skipping {} byte packet: {}", frame.len(), e);
            }
            Err(e) => return Err(e),
        }

        if args.hex {
            println!("  {}", hex(&frame));
        }
    }

    Ok(count)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let count = match &args.input {
        Some(path) => dump(tokio::fs::File::open(path).await?, &args).await?,
        None => dump(tokio::io::stdin(), &args).await?,
    };

    eprintln!("{} packets", count);

    Ok(())
}
