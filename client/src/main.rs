use clap::Parser;
use client::bot::{Bot, BotConfig};
use log::info;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, env = "SERVER_ADDR", default_value = "127.0.0.1:23532")]
    server: SocketAddr,

    /// Game name sent with the connect request
    #[arg(short = 'g', long, env = "GAME_NAME", default_value = "default")]
    game_name: String,

    /// Chance per frame that the bot fires at the nearest enemy
    #[arg(short = 'f', long, default_value_t = 0.2)]
    fire_chance: f64,

    /// Delay after death before reconnecting, in milliseconds
    #[arg(short = 'r', long, default_value_t = 1000)]
    reconnect_delay: u64,

    /// Seed for reproducible bot behaviour
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = BotConfig {
        game_name: args.game_name,
        fire_chance: args.fire_chance,
        reconnect_delay: Duration::from_millis(args.reconnect_delay),
        seed: args.seed,
        ..BotConfig::default()
    };

    let mut bot = Bot::connect(args.server, config).await?;

    tokio::select! {
        result = bot.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
