//! Wire protocol: one `Packet` per UDP datagram, encoded with bincode.

use crate::geom::Vector2;
use bincode::Options;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest payload a single UDP datagram can carry.
pub const MAX_PACKET_SIZE: usize = 65_507;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    // Client -> server
    ConnectRequest {
        game_name: String,
    },
    ReconnectRequest {
        old_player_id: u32,
    },
    PlayerInput {
        player_id: u32,
        actions: Vec<Action>,
    },

    // Server -> client
    ConnectAck {
        player_id: u32,
    },
    DeathNote {
        player_id: u32,
    },
    WorldState {
        tick: u32,
        players: Vec<PlayerSnapshot>,
        bullets: Vec<BulletSnapshot>,
    },
}

impl Packet {
    /// Short name of the variant, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Packet::ConnectRequest { .. } => "ConnectRequest",
            Packet::ReconnectRequest { .. } => "ReconnectRequest",
            Packet::PlayerInput { .. } => "PlayerInput",
            Packet::ConnectAck { .. } => "ConnectAck",
            Packet::DeathNote { .. } => "DeathNote",
            Packet::WorldState { .. } => "WorldState",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

/// A single thing a player wants to do during one tick.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum Action {
    Move { dir: MoveDir },
    Shoot { target: Vector2 },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub id: u32,
    pub pos: Vector2,
    pub health: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BulletSnapshot {
    pub owner_id: u32,
    pub pos: Vector2,
    pub size: f32,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode packet: {0}")]
    Encode(#[source] bincode::Error),
    #[error("failed to decode packet: {0}")]
    Decode(#[source] bincode::Error),
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_PACKET_SIZE as u64)
        .reject_trailing_bytes()
}

pub fn encode(packet: &Packet) -> Result<Vec<u8>, ProtocolError> {
    codec().serialize(packet).map_err(ProtocolError::Encode)
}

/// Decodes exactly one packet; truncated, unknown or padded payloads are rejected.
pub fn decode(bytes: &[u8]) -> Result<Packet, ProtocolError> {
    codec().deserialize(bytes).map_err(ProtocolError::Decode)
}
