//! Client-side view of the arena
//!
//! Tracks which player this client controls, whether it is alive, and the most
//! recent world snapshot. Snapshots can arrive out of order over UDP, so any
//! snapshot whose tick is not newer than the last applied one is discarded.

use log::{debug, info};
use shared::{BulletSnapshot, Packet, PlayerSnapshot, Vector2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Waiting for a `ConnectAck`
    Connecting,
    /// Controlling the given player
    Alive(u32),
    /// The given player was killed; a reconnect may be requested
    Dead(u32),
}

pub struct ClientGameState {
    status: Status,
    /// Most recent player of ours the server killed
    last_dead: Option<u32>,
    last_tick: Option<u32>,
    players: Vec<PlayerSnapshot>,
    bullets: Vec<BulletSnapshot>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            status: Status::Connecting,
            last_dead: None,
            last_tick: None,
            players: Vec::new(),
            bullets: Vec::new(),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Id of the player this client controls or last controlled.
    pub fn player_id(&self) -> Option<u32> {
        match self.status {
            Status::Alive(id) | Status::Dead(id) => Some(id),
            Status::Connecting => None,
        }
    }

    pub fn last_tick(&self) -> Option<u32> {
        self.last_tick
    }

    pub fn players(&self) -> &[PlayerSnapshot] {
        &self.players
    }

    pub fn bullets(&self) -> &[BulletSnapshot] {
        &self.bullets
    }

    /// Builds a fresh `ConnectRequest` and waits for its acknowledgement.
    pub fn connect_request(&mut self, game_name: &str) -> Packet {
        self.status = Status::Connecting;
        Packet::ConnectRequest {
            game_name: game_name.to_string(),
        }
    }

    /// Builds a `ReconnectRequest` for the dead player, if there is one.
    pub fn reconnect_request(&mut self) -> Option<Packet> {
        match self.status {
            Status::Dead(old_player_id) => {
                self.status = Status::Connecting;
                Some(Packet::ReconnectRequest { old_player_id })
            }
            _ => None,
        }
    }

    /// Applies a packet from the server. Returns true if the local state changed.
    pub fn apply_packet(&mut self, packet: Packet) -> bool {
        match packet {
            Packet::ConnectAck { player_id } => {
                // Duplicate, or a late ack for a player that has since died
                if self.status == Status::Alive(player_id) || self.last_dead == Some(player_id) {
                    return false;
                }
                info!("Connected as player {}", player_id);
                self.status = Status::Alive(player_id);
                true
            }
            Packet::DeathNote { player_id } => {
                if self.status != Status::Alive(player_id) {
                    return false;
                }
                info!("Player {} was killed", player_id);
                self.status = Status::Dead(player_id);
                self.last_dead = Some(player_id);
                true
            }
            Packet::WorldState {
                tick,
                players,
                bullets,
            } => self.apply_snapshot(tick, players, bullets),
            other => {
                debug!("Ignoring client-bound {} packet", other.kind());
                false
            }
        }
    }

    /// Replaces the local world if `tick` is newer than the last applied snapshot.
    pub fn apply_snapshot(
        &mut self,
        tick: u32,
        players: Vec<PlayerSnapshot>,
        bullets: Vec<BulletSnapshot>,
    ) -> bool {
        if matches!(self.last_tick, Some(last) if tick <= last) {
            return false;
        }

        self.last_tick = Some(tick);
        self.players = players;
        self.bullets = bullets;
        true
    }

    fn own_snapshot(&self) -> Option<&PlayerSnapshot> {
        let id = self.player_id()?;
        self.players.iter().find(|player| player.id == id)
    }

    pub fn my_health(&self) -> Option<f32> {
        self.own_snapshot().map(|player| player.health)
    }

    pub fn my_position(&self) -> Option<Vector2> {
        self.own_snapshot().map(|player| player.pos)
    }

    /// Positions of every player other than our own.
    pub fn enemy_positions(&self) -> Vec<Vector2> {
        let own = self.player_id();
        self.players
            .iter()
            .filter(|player| Some(player.id) != own)
            .map(|player| player.pos)
            .collect()
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}
