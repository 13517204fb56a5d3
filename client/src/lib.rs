//! # Arena Client Library
//!
//! Headless client for the arena shooter. It tracks the player this client
//! controls, keeps the newest world snapshot the server has sent, and turns
//! held controls into input packets. Rendering is left to whatever embeds it;
//! the bundled binary drives a bot instead.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Connection status (`Connecting`, `Alive`, `Dead`) and snapshot bookkeeping.
//! Out-of-order snapshots are dropped by tick.
//!
//! ### Input Module (`input`)
//! Held controls, their translation into protocol actions, and a randomised
//! input source for bots and load tests.
//!
//! ### Network Module (`network`)
//! A UDP socket fixed to one server address.
//!
//! ### Bot Module (`bot`)
//! Frame loop that plays, dies, and reconnects without a human.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::bot::{Bot, BotConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut bot = Bot::connect("127.0.0.1:23532".parse()?, BotConfig::default()).await?;
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod game;
pub mod input;
pub mod network;
