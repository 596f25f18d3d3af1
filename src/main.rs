//! bluffbar server binary.
//!
//! Runs the HTTP server hosting live game rooms.
//! Supports WebSocket connections for real-time play.

use clap::Parser;

#[derive(Parser)]
#[command(about = "Host bluffing card game rooms over WebSocket")]
struct Args {
    /// Address to bind the HTTP/WebSocket listener to.
    #[arg(long, default_value = "127.0.0.1:3001")]
    bind: String,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    bluffbar::log();
    bluffbar::halt();
    let args = Args::parse();
    bluffbar::hosting::Server::run(&args.bind).await
}
