//! Connect / reconnect handling: how a UDP address becomes a player identity
//!
//! An address is either unknown, bound to a live player, or holds a retired
//! binding left behind by a player that died. Reconnecting is only honoured
//! from the address the old player was bound to, and always yields a brand new
//! player id. Rejected requests get no reply at all.

use crate::world::World;
use log::{debug, info};
use shared::Packet;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// How long a dead player's binding can still be used to reconnect
pub const RETIRED_BINDING_TTL: Duration = Duration::from_secs(60);
/// Upper bound on retired bindings kept at once; the oldest goes first
pub const MAX_RETIRED_BINDINGS: usize = 4096;

#[derive(Debug, Clone, Copy)]
struct RetiredBinding {
    addr: SocketAddr,
    died_at: Instant,
}

impl RetiredBinding {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.died_at) > RETIRED_BINDING_TTL
    }
}

/// Session bookkeeping that outlives individual players
#[derive(Debug, Default)]
pub struct Sessions {
    /// Dead player id -> address it was last bound to
    retired: HashMap<u32, RetiredBinding>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a `ConnectRequest`.
    ///
    /// An address that is already bound gets its existing id back, so a lost
    /// acknowledgement can be recovered by asking again.
    pub fn connect(
        &mut self,
        world: &mut World,
        addr: SocketAddr,
        game_name: &str,
        now: Instant,
    ) -> Packet {
        if let Some(player_id) = world.player_at(addr) {
            if world.has_player(player_id) {
                debug!("Re-acknowledging player {} for {}", player_id, addr);
                return Packet::ConnectAck { player_id };
            }
        }

        // A fresh identity supersedes whatever this address left behind
        self.retired.retain(|_, retired| retired.addr != addr);

        let spawn = world.config().spawn_point;
        let player = world.add_player(spawn, addr, now);
        info!(
            "Player {} joined game '{}' from {}",
            player.id, game_name, addr
        );

        Packet::ConnectAck {
            player_id: player.id,
        }
    }

    /// Handles a `ReconnectRequest`, returning the reply if the request is honoured.
    pub fn reconnect(
        &mut self,
        world: &mut World,
        addr: SocketAddr,
        old_player_id: u32,
        now: Instant,
    ) -> Option<Packet> {
        let on_file = world
            .address_of(old_player_id)
            .or_else(|| {
                self.retired
                    .get(&old_player_id)
                    .filter(|retired| !retired.is_expired(now))
                    .map(|retired| retired.addr)
            });

        match on_file {
            Some(bound) if bound == addr => {}
            Some(bound) => {
                debug!(
                    "Ignoring reconnect for player {} from {} (bound to {})",
                    old_player_id, addr, bound
                );
                return None;
            }
            None => {
                debug!(
                    "Ignoring reconnect for unknown player {} from {}",
                    old_player_id, addr
                );
                return None;
            }
        }

        if let Some(current) = world.player_at(addr) {
            if current != old_player_id && world.has_player(current) {
                debug!(
                    "Ignoring reconnect for player {}: {} already plays as {}",
                    old_player_id, addr, current
                );
                return None;
            }
        }

        world.remove_player(old_player_id);
        world.remove_address(old_player_id);
        self.retired.remove(&old_player_id);

        let spawn = world.config().spawn_point;
        let player = world.add_player(spawn, addr, now);
        info!(
            "Player {} reconnected from {} as player {}",
            old_player_id, addr, player.id
        );

        Some(Packet::ConnectAck {
            player_id: player.id,
        })
    }

    /// Remembers the last binding of a player that has just died, dropping
    /// bindings that have expired or exceed the size bound.
    pub fn retire(&mut self, player_id: u32, addr: SocketAddr, now: Instant) {
        self.retired
            .retain(|_, retired| retired.addr != addr && !retired.is_expired(now));

        while self.retired.len() >= MAX_RETIRED_BINDINGS {
            let oldest = self
                .retired
                .iter()
                .min_by_key(|(id, retired)| (retired.died_at, **id))
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    self.retired.remove(&id);
                }
                None => break,
            }
        }

        self.retired.insert(player_id, RetiredBinding { addr, died_at: now });
    }

    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::GameConfig;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    fn ack_id(packet: Packet) -> u32 {
        match packet {
            Packet::ConnectAck { player_id } => player_id,
            other => panic!("Expected ConnectAck, got {:?}", other),
        }
    }

    /// Mirrors what the tick loop does when a player dies.
    fn kill(world: &mut World, sessions: &mut Sessions, id: u32, now: Instant) {
        world.remove_player(id);
        let addr = world.remove_address(id).unwrap();
        sessions.retire(id, addr, now);
    }

    fn addr_with_port(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_connect_spawns_player() {
        let mut world = World::new(GameConfig::default());
        let mut sessions = Sessions::new();

        let id = ack_id(sessions.connect(&mut world, test_addr(), "default", Instant::now()));
        let player = world.player(id).unwrap();

        assert_eq!(player.pos, world.config().spawn_point);
        assert_eq!(player.health(), 20.0);
        assert_eq!(world.address_of(id), Some(test_addr()));
    }

    #[test]
    fn test_repeated_connect_reacknowledges() {
        let mut world = World::new(GameConfig::default());
        let mut sessions = Sessions::new();
        let now = Instant::now();

        let first = ack_id(sessions.connect(&mut world, test_addr(), "default", now));
        let second = ack_id(sessions.connect(&mut world, test_addr(), "default", now));

        assert_eq!(first, second);
        assert_eq!(world.player_count(), 1);
    }

    #[test]
    fn test_reconnect_live_player() {
        let mut world = World::new(GameConfig::default());
        let mut sessions = Sessions::new();
        let now = Instant::now();
        let old = ack_id(sessions.connect(&mut world, test_addr(), "default", now));

        let new = ack_id(
            sessions
                .reconnect(&mut world, test_addr(), old, now)
                .unwrap(),
        );

        assert_ne!(old, new);
        assert!(!world.has_player(old));
        assert_eq!(world.address_of(old), None);
        assert_eq!(world.address_of(new), Some(test_addr()));
        assert_eq!(world.player_count(), 1);
    }

    #[test]
    fn test_reconnect_after_death() {
        let mut world = World::new(GameConfig::default());
        let mut sessions = Sessions::new();
        let now = Instant::now();
        let old = ack_id(sessions.connect(&mut world, test_addr(), "default", now));
        kill(&mut world, &mut sessions, old, now);

        let reply = sessions.reconnect(&mut world, test_addr(), old, now);

        let new = ack_id(reply.unwrap());
        assert_ne!(old, new);
        assert_eq!(sessions.retired_count(), 0);
    }

    #[test]
    fn test_reconnect_from_foreign_address_ignored() {
        let mut world = World::new(GameConfig::default());
        let mut sessions = Sessions::new();
        let now = Instant::now();
        let old = ack_id(sessions.connect(&mut world, test_addr(), "default", now));
        kill(&mut world, &mut sessions, old, now);

        assert!(sessions
            .reconnect(&mut world, test_addr2(), old, now)
            .is_none());
        assert_eq!(world.player_count(), 0);
        // The rightful owner can still use it
        assert!(sessions
            .reconnect(&mut world, test_addr(), old, now)
            .is_some());
    }

    #[test]
    fn test_reconnect_unknown_player_ignored() {
        let mut world = World::new(GameConfig::default());
        let mut sessions = Sessions::new();

        assert!(sessions
            .reconnect(&mut world, test_addr(), 77, Instant::now())
            .is_none());
        assert_eq!(world.player_count(), 0);
    }

    #[test]
    fn test_reconnect_replay_ignored() {
        let mut world = World::new(GameConfig::default());
        let mut sessions = Sessions::new();
        let now = Instant::now();
        let old = ack_id(sessions.connect(&mut world, test_addr(), "default", now));
        kill(&mut world, &mut sessions, old, now);

        assert!(sessions.reconnect(&mut world, test_addr(), old, now).is_some());
        assert!(sessions.reconnect(&mut world, test_addr(), old, now).is_none());
        assert_eq!(world.player_count(), 1);
    }

    #[test]
    fn test_reconnect_while_playing_as_someone_else_ignored() {
        let mut world = World::new(GameConfig::default());
        let mut sessions = Sessions::new();
        let now = Instant::now();
        let old = ack_id(sessions.connect(&mut world, test_addr(), "default", now));
        kill(&mut world, &mut sessions, old, now);
        let fresh = ack_id(sessions.connect(&mut world, test_addr(), "default", now));

        assert_ne!(old, fresh);
        assert!(sessions.reconnect(&mut world, test_addr(), old, now).is_none());
        assert!(world.has_player(fresh));
        assert_eq!(world.player_count(), 1);
    }

    #[test]
    fn test_retire_keeps_latest_death_per_address() {
        let mut sessions = Sessions::new();
        let now = Instant::now();
        sessions.retire(1, test_addr(), now);
        sessions.retire(2, test_addr(), now);
        sessions.retire(3, test_addr2(), now);

        assert_eq!(sessions.retired_count(), 2);
    }

    #[test]
    fn test_expired_retired_binding_pruned() {
        let mut world = World::new(GameConfig::default());
        let mut sessions = Sessions::new();
        let t0 = Instant::now();
        let old = ack_id(sessions.connect(&mut world, test_addr(), "default", t0));
        kill(&mut world, &mut sessions, old, t0);

        let later = t0 + RETIRED_BINDING_TTL + Duration::from_secs(1);
        assert!(sessions.reconnect(&mut world, test_addr(), old, later).is_none());
        assert_eq!(world.player_count(), 0);

        sessions.retire(99, test_addr2(), later);
        assert_eq!(sessions.retired_count(), 1);
    }

    #[test]
    fn test_retired_bindings_bounded_across_many_deaths() {
        let mut world = World::new(GameConfig::default());
        let mut sessions = Sessions::new();
        let t0 = Instant::now();

        for i in 0..5000u32 {
            let now = t0 + Duration::from_millis(i as u64);
            let addr = addr_with_port(10_000 + i as u16);
            let id = ack_id(sessions.connect(&mut world, addr, "default", now));
            kill(&mut world, &mut sessions, id, now);
        }

        assert_eq!(world.player_count(), 0);
        assert_eq!(sessions.retired_count(), MAX_RETIRED_BINDINGS);

        // The oldest deaths were evicted, the newest can still reconnect
        let newest = t0 + Duration::from_millis(4999);
        assert!(sessions
            .reconnect(&mut world, addr_with_port(10_000), 1, newest)
            .is_none());
        assert!(sessions
            .reconnect(&mut world, addr_with_port(10_000 + 4999), 5000, newest)
            .is_some());
    }
}
