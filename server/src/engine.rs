//! Fixed-rate simulation step
//!
//! `Engine` owns the world, the session table and the per-tick input buffer.
//! It never touches a socket: every call returns the packets that should go
//! out, leaving delivery to the network tasks.
//!
//! Each `step` runs, in order:
//! 1. bullet advance and expiry
//! 2. buffered input application (movement, then shooting)
//! 3. bullet/player collisions and deaths
//! 4. tick advance
//! 5. snapshot broadcast and death notices
//! 6. input buffer reset

use crate::network::GameMessage;
use crate::session::Sessions;
use crate::world::World;
use log::{debug, info, warn};
use shared::{bullet_radius, player_radius, Action, GameConfig, MoveDir, Packet, Vector2};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

/// Hits register slightly inside the touching distance of the two circles
pub const HIT_FORGIVENESS: f32 = 0.9;
pub const BULLET_DAMAGE: f32 = 1.0;

pub struct Engine {
    world: World,
    sessions: Sessions,
    /// Latest input per player since the previous tick
    inputs: HashMap<u32, Vec<Action>>,
}

impl Engine {
    pub fn new(config: GameConfig) -> Self {
        Self {
            world: World::new(config),
            sessions: Sessions::new(),
            inputs: HashMap::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        self.world.config()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Reacts to a decoded packet, returning the unicast reply if there is one.
    pub fn handle_packet(
        &mut self,
        packet: Packet,
        addr: SocketAddr,
        now: Instant,
    ) -> Option<GameMessage> {
        let reply = match packet {
            Packet::ConnectRequest { game_name } => Some(self.sessions.connect(
                &mut self.world,
                addr,
                &game_name,
                now,
            )),
            Packet::ReconnectRequest { old_player_id } => {
                self.sessions
                    .reconnect(&mut self.world, addr, old_player_id, now)
            }
            Packet::PlayerInput { player_id, actions } => {
                self.buffer_input(player_id, actions);
                None
            }
            other => {
                warn!("Unexpected {} packet from {}", other.kind(), addr);
                None
            }
        };

        reply.map(|packet| GameMessage::SendPacket { packet, addr })
    }

    /// Stores a player's input for the next tick, replacing any earlier one.
    pub fn buffer_input(&mut self, player_id: u32, actions: Vec<Action>) {
        self.inputs.insert(player_id, actions);
    }

    pub fn pending_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Runs one simulation tick at time `now` and returns the packets to send.
    pub fn step(&mut self, now: Instant) -> Vec<GameMessage> {
        self.advance_bullets(now);
        self.apply_inputs(now);
        let dead = self.resolve_collisions();
        self.world.advance_tick();

        let mut outgoing = Vec::with_capacity(1 + dead.len());
        outgoing.push(GameMessage::BroadcastPacket {
            packet: self.world.snapshot(),
            addrs: self.world.live_addresses(),
        });

        for player_id in dead {
            if let Some(addr) = self.world.remove_address(player_id) {
                info!("Player {} died", player_id);
                outgoing.push(GameMessage::SendPacket {
                    packet: Packet::DeathNote { player_id },
                    addr,
                });
                self.sessions.retire(player_id, addr, now);
            }
        }

        self.inputs.clear();
        outgoing
    }

    fn advance_bullets(&mut self, now: Instant) {
        let config = self.world.config();
        let step = config.bullet_step();
        let ttl = config.bullet_ttl;
        let (width, height) = (config.world_width, config.world_height);

        let expired: Vec<u64> = self
            .world
            .bullets_mut()
            .filter_map(|(id, bullet)| {
                bullet.pos = bullet.pos.add(&bullet.direction.scalar_mult(step));

                let too_old = now.saturating_duration_since(bullet.born_at) > ttl;
                let outside = !bullet.pos.inside_bounds(width, height, bullet.size);
                (too_old || outside).then_some(*id)
            })
            .collect();

        for id in expired {
            self.world.remove_bullet(id);
        }
    }

    fn apply_inputs(&mut self, now: Instant) {
        let mut inputs: Vec<(u32, Vec<Action>)> = self.inputs.drain().collect();
        inputs.sort_by_key(|(player_id, _)| *player_id);

        for (player_id, actions) in inputs {
            if !self.world.has_player(player_id) {
                debug!("Dropping input for unknown player {}", player_id);
                continue;
            }

            let mut moves = MoveFlags::default();
            let mut targets = Vec::new();
            for action in actions {
                match action {
                    Action::Move { dir } => moves.set(dir),
                    Action::Shoot { target } => targets.push(target),
                }
            }

            let delta = moves.delta(self.world.config().player_step());
            self.world.move_player(player_id, delta);

            for target in targets {
                self.try_shoot(player_id, target, now);
            }
        }
    }

    /// Fires a bullet if the player's cooldown has elapsed.
    fn try_shoot(&mut self, player_id: u32, target: Vector2, now: Instant) -> Option<u64> {
        let cooldown = self.world.config().bullet_cooldown;
        let ready = self
            .world
            .player(player_id)
            .map(|player| player.since_last_bullet(now) > cooldown)?;

        if !ready {
            return None;
        }

        self.world.start_bullet_cooldown(player_id, now);
        self.world.add_bullet(player_id, target, now)
    }

    /// Applies bullet hits and returns the ids of players that died this tick.
    fn resolve_collisions(&mut self) -> Vec<u32> {
        let mut dead = Vec::new();

        for player_id in self.world.player_ids() {
            for bullet_id in self.world.bullet_ids() {
                let (Some(player), Some(bullet)) =
                    (self.world.player(player_id), self.world.bullet(bullet_id))
                else {
                    continue;
                };

                if bullet.owner_id == player_id {
                    continue;
                }

                let config = self.world.config();
                let reach = (player_radius(config, player.health())
                    + bullet_radius(config, player.health()))
                    * HIT_FORGIVENESS;

                if player.pos.dist_to(&bullet.pos) >= reach {
                    continue;
                }

                self.world.remove_bullet(bullet_id);
                let health = self
                    .world
                    .apply_damage(player_id, BULLET_DAMAGE)
                    .unwrap_or(0.0);

                if health <= 0.0 {
                    self.world.remove_player(player_id);
                    dead.push(player_id);
                    break;
                }
            }
        }

        dead
    }
}

/// Directions held during one tick. Opposite directions cancel out.
#[derive(Debug, Default, Clone, Copy)]
struct MoveFlags {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

impl MoveFlags {
    fn set(&mut self, dir: MoveDir) {
        match dir {
            MoveDir::Left => self.left = true,
            MoveDir::Right => self.right = true,
            MoveDir::Up => self.up = true,
            MoveDir::Down => self.down = true,
        }
    }

    /// Per-tick displacement for a player covering `step` per axis.
    fn delta(&self, step: f32) -> Vector2 {
        let axis = |negative: bool, positive: bool| match (negative, positive) {
            (true, false) => -step,
            (false, true) => step,
            _ => 0.0,
        };

        let dx = axis(self.left, self.right);
        let dy = axis(self.up, self.down);

        if dx != 0.0 && dy != 0.0 {
            Vector2::new(dx, dy).scale(std::f32::consts::FRAC_1_SQRT_2)
        } else {
            Vector2::new(dx, dy)
        }
    }
}
