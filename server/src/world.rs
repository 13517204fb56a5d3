//! Authoritative world state owned by the tick loop
//!
//! The world holds every live player and bullet, the address each player is
//! reachable at, and the tick counter. It is mutated from exactly one task, so
//! none of its operations lock.
//!
//! Player ids and bullet ids come from counters owned by the world and are never
//! reused within a process. A player's address binding is removed separately from
//! the player itself so that a death notice can still be routed after removal.

use shared::{
    bullet_radius, player_radius, BulletSnapshot, Direction, GameConfig, Packet, PlayerSnapshot,
    Vector2,
};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A live avatar in the arena
#[derive(Debug, Clone)]
pub struct PlayerState {
    /// Durable identity, allocated by the world
    pub id: u32,
    /// Address the player was bound to when it spawned
    pub addr: SocketAddr,
    /// Centre of the player's circle
    pub pos: Vector2,
    /// Last time a bullet was fired; starts at spawn time
    pub last_bullet_fired_at: Instant,
    health: f32,
}

impl PlayerState {
    /// Current health. Only ever decreases during a player's lifetime.
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Time elapsed since the last bullet was fired, zero if `now` is earlier.
    pub fn since_last_bullet(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_bullet_fired_at)
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            pos: self.pos,
            health: self.health,
        }
    }
}

/// A projectile in flight. Its owner may have died since it was fired.
#[derive(Debug, Clone)]
pub struct BulletState {
    pub owner_id: u32,
    pub born_at: Instant,
    pub pos: Vector2,
    pub direction: Direction,
    /// Radius frozen from the owner's health at fire time
    pub size: f32,
}

impl BulletState {
    fn snapshot(&self) -> BulletSnapshot {
        BulletSnapshot {
            owner_id: self.owner_id,
            pos: self.pos,
            size: self.size,
        }
    }
}

#[derive(Debug)]
pub struct World {
    config: GameConfig,
    players: BTreeMap<u32, PlayerState>,
    bullets: BTreeMap<u64, BulletState>,
    addresses: BTreeMap<u32, SocketAddr>,
    next_player_id: u32,
    next_bullet_id: u64,
    tick: u32,
}

impl World {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            players: BTreeMap::new(),
            bullets: BTreeMap::new(),
            addresses: BTreeMap::new(),
            next_player_id: 1,
            next_bullet_id: 0,
            tick: 0,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Increments the tick counter and returns the new value.
    pub fn advance_tick(&mut self) -> u32 {
        self.tick = self.tick.wrapping_add(1);
        self.tick
    }

    /// Spawns a player with full health and binds it to `addr`.
    pub fn add_player(&mut self, pos: Vector2, addr: SocketAddr, now: Instant) -> PlayerState {
        let id = self.next_player_id;
        self.next_player_id += 1;

        let player = PlayerState {
            id,
            addr,
            pos,
            last_bullet_fired_at: now,
            health: self.config.initial_player_health,
        };

        let previous = self.players.insert(id, player.clone());
        assert!(previous.is_none(), "player id {} allocated twice", id);
        self.addresses.insert(id, addr);

        player
    }

    /// Drops the player but keeps its address binding.
    pub fn remove_player(&mut self, id: u32) -> Option<PlayerState> {
        self.players.remove(&id)
    }

    pub fn remove_address(&mut self, id: u32) -> Option<SocketAddr> {
        self.addresses.remove(&id)
    }

    pub fn has_player(&self, id: u32) -> bool {
        self.players.contains_key(&id)
    }

    pub fn player(&self, id: u32) -> Option<&PlayerState> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: u32) -> Option<&mut PlayerState> {
        self.players.get_mut(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    pub fn player_ids(&self) -> Vec<u32> {
        self.players.keys().copied().collect()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn address_of(&self, id: u32) -> Option<SocketAddr> {
        self.addresses.get(&id).copied()
    }

    /// Finds the player id currently bound to `addr`.
    pub fn player_at(&self, addr: SocketAddr) -> Option<u32> {
        self.addresses
            .iter()
            .find(|(_, bound)| **bound == addr)
            .map(|(id, _)| *id)
    }

    /// Addresses of every live player, the broadcast audience of a snapshot.
    pub fn live_addresses(&self) -> Vec<SocketAddr> {
        self.addresses
            .iter()
            .filter(|(id, _)| self.players.contains_key(id))
            .map(|(_, addr)| *addr)
            .collect()
    }

    /// Moves a player by `delta`, keeping its whole circle inside the arena.
    pub fn move_player(&mut self, id: u32, delta: Vector2) {
        let (width, height) = (self.config.world_width, self.config.world_height);

        if let Some(player) = self.players.get_mut(&id) {
            let radius = player_radius(&self.config, player.health);
            player.pos = player
                .pos
                .add(&delta)
                .limited(radius, radius, width - radius, height - radius);
        }
    }

    /// Subtracts `amount` from a player's health and returns what is left.
    ///
    /// The player is not removed when health drops to zero; the caller decides
    /// what a death means for this tick.
    pub fn apply_damage(&mut self, id: u32, amount: f32) -> Option<f32> {
        let player = self.players.get_mut(&id)?;
        player.health -= amount.max(0.0);
        Some(player.health)
    }

    pub fn start_bullet_cooldown(&mut self, id: u32, now: Instant) {
        if let Some(player) = self.players.get_mut(&id) {
            player.last_bullet_fired_at = now;
        }
    }

    /// Fires a bullet from the owner's position towards `target`.
    pub fn add_bullet(&mut self, owner_id: u32, target: Vector2, now: Instant) -> Option<u64> {
        let owner = self.players.get(&owner_id)?;

        let bullet = BulletState {
            owner_id,
            born_at: now,
            pos: owner.pos,
            direction: target.sub(&owner.pos).direction(),
            size: bullet_radius(&self.config, owner.health),
        };

        let id = self.next_bullet_id;
        self.next_bullet_id += 1;
        self.bullets.insert(id, bullet);

        Some(id)
    }

    pub fn remove_bullet(&mut self, id: u64) -> Option<BulletState> {
        self.bullets.remove(&id)
    }

    pub fn bullet(&self, id: u64) -> Option<&BulletState> {
        self.bullets.get(&id)
    }

    pub fn bullets(&self) -> impl Iterator<Item = (&u64, &BulletState)> {
        self.bullets.iter()
    }

    pub fn bullet_ids(&self) -> Vec<u64> {
        self.bullets.keys().copied().collect()
    }

    pub fn bullet_count(&self) -> usize {
        self.bullets.len()
    }

    pub(crate) fn bullets_mut(&mut self) -> impl Iterator<Item = (&u64, &mut BulletState)> {
        self.bullets.iter_mut()
    }

    /// Builds the `WorldState` packet for the current tick.
    pub fn snapshot(&self) -> Packet {
        Packet::WorldState {
            tick: self.tick,
            players: self.players.values().map(PlayerState::snapshot).collect(),
            bullets: self.bullets.values().map(BulletState::snapshot).collect(),
        }
    }
}
