use crate::game::{ClientGameState, Status};
use crate::input::InputManager;
use crate::network::{ClientConn, NetworkError};
use log::{debug, info, warn};
use shared::{Packet, MAX_PACKET_SIZE};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::time::{interval, MissedTickBehavior};

/// How long to wait for a `ConnectAck` before asking again
const CONNECT_RETRY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub game_name: String,
    pub fire_chance: f64,
    pub reconnect_delay: Duration,
    pub frame_interval: Duration,
    pub seed: Option<u64>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            game_name: "default".to_string(),
            fire_chance: 0.2,
            reconnect_delay: Duration::from_secs(1),
            frame_interval: Duration::from_millis(16),
            seed: None,
        }
    }
}

pub struct Bot {
    conn: ClientConn,
    state: ClientGameState,
    input: InputManager,
    config: BotConfig,
    requested_at: Instant,
    died_at: Option<Instant>,
}

impl Bot {
    /// Opens a socket to `server_addr` and sends the initial connect request.
    pub async fn connect(server_addr: SocketAddr, config: BotConfig) -> Result<Self, NetworkError> {
        let conn = ClientConn::connect(server_addr).await?;
        let mut state = ClientGameState::new();

        info!("Connecting to {} (game '{}')", server_addr, config.game_name);
        conn.send(&state.connect_request(&config.game_name)).await?;

        Ok(Self {
            conn,
            state,
            input: InputManager::new(config.fire_chance, config.seed),
            config,
            requested_at: Instant::now(),
            died_at: None,
        })
    }

    pub fn state(&self) -> &ClientGameState {
        &self.state
    }

    pub async fn run(&mut self) -> Result<(), NetworkError> {
        let mut frames = interval(self.config.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut buffer = vec![0u8; MAX_PACKET_SIZE];

        loop {
            tokio::select! {
                result = self.conn.recv(&mut buffer) => match result {
                    Ok(packet) => self.handle_packet(packet, Instant::now()),
                    Err(NetworkError::Protocol(e)) => debug!("Dropping malformed packet: {}", e),
                    Err(e) => return Err(e),
                },

                tick = frames.tick() => {
                    if let Err(e) = self.frame(tick.into_std()).await {
                        warn!("Error sending to server: {}", e);
                    }
                },
            }
        }
    }

    pub fn handle_packet(&mut self, packet: Packet, now: Instant) {
        if !self.state.apply_packet(packet) {
            return;
        }

        if let Status::Dead(id) = self.state.status() {
            if self.died_at.is_none() {
                info!(
                    "Player {} died, reconnecting in {:?}",
                    id, self.config.reconnect_delay
                );
                self.died_at = Some(now);
            }
        }
    }

    /// Runs one frame: sends input while alive, reconnects after death, and
    /// repeats an unanswered connect request.
    pub async fn frame(&mut self, now: Instant) -> Result<(), NetworkError> {
        match self.state.status() {
            Status::Alive(id) => {
                let controls = self
                    .input
                    .update(self.state.my_position(), &self.state.enemy_positions());
                self.conn.send(&controls.into_packet(id)).await?;
            }
            Status::Dead(_) => {
                let due = self
                    .died_at
                    .map_or(true, |at| now.duration_since(at) >= self.config.reconnect_delay);
                if due {
                    if let Some(request) = self.state.reconnect_request() {
                        self.conn.send(&request).await?;
                        self.died_at = None;
                        self.requested_at = now;
                    }
                }
            }
            Status::Connecting => {
                if now.duration_since(self.requested_at) >= CONNECT_RETRY {
                    debug!("No answer from server, connecting again");
                    let request = self.state.connect_request(&self.config.game_name);
                    self.conn.send(&request).await?;
                    self.requested_at = now;
                }
            }
        }
        Ok(())
    }
}
