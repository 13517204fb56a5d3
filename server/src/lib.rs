//! # Arena Server Library
//!
//! Authoritative server for a real-time arena shooter. Clients steer circular
//! avatars and fire bullets; the server alone decides positions, health and
//! bullet lifetimes, and broadcasts a snapshot of the whole world every tick.
//!
//! ## Architecture Design
//!
//! ### Single Owner of the World
//! Two activities run concurrently: a receive task that decodes datagrams, and
//! the game loop. They talk only through a bounded channel of decoded packets.
//! The game loop is the sole reader of that channel and the sole mutator of the
//! world, so no state is shared between tasks and nothing needs a lock.
//!
//! ### Fire-and-Forget Output
//! The game loop never awaits a socket. Replies and snapshots are queued to a
//! sender task, so a slow or failing send cannot delay the next tick.
//!
//! ### Identity vs. Address
//! A player id is the durable identity; the UDP address is a rebindable
//! attribute. Reconnecting always produces a new id, and is only honoured from
//! the address the old player was bound to.
//!
//! ## Module Organization
//!
//! ### World Module (`world`)
//! Player and bullet registries, address bindings, id counters and the tick.
//!
//! ### Session Module (`session`)
//! Connect and reconnect handling, including bindings left by dead players.
//!
//! ### Engine Module (`engine`)
//! The per-tick simulation: bullets, movement, shooting, collisions, snapshots.
//!
//! ### Network Module (`network`)
//! UDP socket tasks and the game loop that drives the engine.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use shared::GameConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind("0.0.0.0:23532", GameConfig::default(), 1024).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod network;
pub mod session;
pub mod world;
