//! Types and rules shared by the arena server and its clients:
//! geometry, hit-box sizing, gameplay constants and the wire protocol.

pub mod geom;
pub mod hitbox;
pub mod protocol;

use std::time::Duration;

pub use geom::{Direction, Vector2};
pub use hitbox::{bullet_radius, player_radius};
pub use protocol::{
    decode, encode, Action, BulletSnapshot, MoveDir, Packet, PlayerSnapshot, ProtocolError,
    MAX_PACKET_SIZE,
};

pub const DEFAULT_PORT: u16 = 23532;

pub const WORLD_WIDTH: f32 = 1020.0;
pub const WORLD_HEIGHT: f32 = 680.0;

pub const BULLET_SPEED: f32 = 1800.0;
pub const PLAYER_SPEED: f32 = 1100.0;

pub const BULLET_TTL: Duration = Duration::from_millis(1500);
pub const BULLET_COOLDOWN: Duration = Duration::from_millis(180);

// Players and bullets shrink as the player loses health
pub const INITIAL_PLAYER_HEALTH: f32 = 20.0;
pub const INITIAL_PLAYER_SIZE: f32 = 48.0;
pub const PLAYER_SHRINK_STEP: f32 = 1.0;
pub const INITIAL_BULLET_SIZE: f32 = 20.0;
pub const BULLET_SHRINK_STEP: f32 = 0.5;

pub const TICK_RATE: u32 = 60;
pub const SPAWN_POINT: Vector2 = Vector2::new(500.0, 500.0);

/// Tunable gameplay parameters. `Default` yields the constants above.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub world_width: f32,
    pub world_height: f32,
    pub player_speed: f32,
    pub bullet_speed: f32,
    pub bullet_ttl: Duration,
    pub bullet_cooldown: Duration,
    pub initial_player_health: f32,
    pub initial_player_size: f32,
    pub player_shrink_step: f32,
    pub initial_bullet_size: f32,
    pub bullet_shrink_step: f32,
    pub tick_rate: u32,
    pub spawn_point: Vector2,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            player_speed: PLAYER_SPEED,
            bullet_speed: BULLET_SPEED,
            bullet_ttl: BULLET_TTL,
            bullet_cooldown: BULLET_COOLDOWN,
            initial_player_health: INITIAL_PLAYER_HEALTH,
            initial_player_size: INITIAL_PLAYER_SIZE,
            player_shrink_step: PLAYER_SHRINK_STEP,
            initial_bullet_size: INITIAL_BULLET_SIZE,
            bullet_shrink_step: BULLET_SHRINK_STEP,
            tick_rate: TICK_RATE,
            spawn_point: SPAWN_POINT,
        }
    }
}

impl GameConfig {
    /// Returns the default configuration running at `tick_rate` ticks per second.
    pub fn with_tick_rate(tick_rate: u32) -> Self {
        Self {
            tick_rate: tick_rate.max(1),
            ..Self::default()
        }
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }

    /// Distance a player covers along one axis in a single tick.
    pub fn player_step(&self) -> f32 {
        self.player_speed / self.tick_rate.max(1) as f32
    }

    /// Distance a bullet covers in a single tick.
    pub fn bullet_step(&self) -> f32 {
        self.bullet_speed / self.tick_rate.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_default_config_matches_constants() {
        let config = GameConfig::default();
        assert_eq!(config.tick_rate, TICK_RATE);
        assert_eq!(config.world_width, WORLD_WIDTH);
        assert_eq!(config.bullet_ttl, Duration::from_millis(1500));
        assert_eq!(config.spawn_point, SPAWN_POINT);
    }

    #[test]
    fn test_per_tick_steps() {
        let config = GameConfig::default();
        assert_approx_eq!(config.player_step(), 1100.0 / 60.0);
        assert_approx_eq!(config.bullet_step(), 30.0);
        assert_eq!(config.tick_duration(), Duration::from_nanos(16_666_666));
    }

    #[test]
    fn test_zero_tick_rate_is_clamped() {
        let config = GameConfig::with_tick_rate(0);
        assert_eq!(config.tick_rate, 1);
        assert_eq!(config.tick_duration(), Duration::from_secs(1));
    }
}
