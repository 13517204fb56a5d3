use clap::Parser;
use log::info;
use server::network::Server;
use shared::{GameConfig, DEFAULT_PORT, TICK_RATE};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, env = "SERVER_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Tick rate (simulation steps per second)
    #[arg(short, long, env = "TICK_RATE", default_value_t = TICK_RATE)]
    tick_rate: u32,

    /// Decoded packets buffered between the receiver and the game loop
    #[arg(long, env = "INBOUND_CAPACITY", default_value_t = 1024)]
    inbound_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = GameConfig::with_tick_rate(args.tick_rate);
    let address = format!("{}:{}", args.host, args.port);

    info!(
        "Starting server on {} ({} Hz, {}x{} arena)",
        address, config.tick_rate, config.world_width, config.world_height
    );

    let server = Server::bind(&address, config, args.inbound_capacity).await?;

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
