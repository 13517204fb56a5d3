//! Server network layer handling UDP communications and game loop coordination

use crate::engine::Engine;
use log::{debug, error, info, warn};
use shared::{decode, encode, GameConfig, Packet, MAX_PACKET_SIZE};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

/// Decoded packet handed from the receive task to the game loop
#[derive(Debug)]
pub struct ServerMessage {
    pub packet: Packet,
    pub addr: SocketAddr,
}

/// Messages sent from game loop to network tasks
#[derive(Debug, Clone, PartialEq)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        addrs: Vec<SocketAddr>,
    },
}

/// Main server coordinating networking and game simulation
pub struct Server {
    socket: Arc<UdpSocket>,
    engine: Engine,
    inbound_capacity: usize,
}

impl Server {
    /// Binds the listening socket. Failure here is the only fatal transport error.
    pub async fn bind(addr: &str, config: GameConfig, inbound_capacity: usize) -> io::Result<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        Ok(Server {
            socket,
            engine: Engine::new(config),
            inbound_capacity: inbound_capacity.max(1),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self, server_tx: mpsc::Sender<ServerMessage>) {
        let socket = Arc::clone(&self.socket);

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_PACKET_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        let packet = match decode(&buffer[..len]) {
                            Ok(packet) => packet,
                            Err(e) => {
                                warn!("Dropping packet from {}: {}", addr, e);
                                continue;
                            }
                        };

                        if enqueue(&server_tx, ServerMessage { packet, addr }) == Enqueue::Closed {
                            debug!("Game loop gone, stopping receiver");
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    fn spawn_network_sender(&self, mut game_rx: mpsc::UnboundedReceiver<GameMessage>) {
        let socket = Arc::clone(&self.socket);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Some(data) = encode_logged(&packet) {
                            if let Err(e) = socket.send_to(&data, addr).await {
                                error!("Failed to send {} to {}: {}", packet.kind(), addr, e);
                            }
                        }
                    }
                    GameMessage::BroadcastPacket { packet, addrs } => {
                        let Some(data) = encode_logged(&packet) else {
                            continue;
                        };

                        for addr in addrs {
                            if let Err(e) = socket.send_to(&data, addr).await {
                                error!("Failed to send {} to {}: {}", packet.kind(), addr, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Main server loop coordinating all operations. Runs until the receive task stops.
    pub async fn run(mut self) {
        let (server_tx, mut server_rx) = mpsc::channel(self.inbound_capacity);
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        self.spawn_network_receiver(server_tx);
        self.spawn_network_sender(game_rx);

        let tick_rate = self.engine.config().tick_rate.max(1);
        let mut tick_interval = interval(self.engine.config().tick_duration());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Server started at {} ticks per second", tick_rate);

        loop {
            tokio::select! {
                message = server_rx.recv() => {
                    let Some(ServerMessage { packet, addr }) = message else {
                        info!("Server shutting down");
                        break;
                    };

                    if let Some(reply) = self.engine.handle_packet(packet, addr, Instant::now()) {
                        dispatch(&game_tx, reply);
                    }
                },

                instant = tick_interval.tick() => {
                    for message in self.engine.step(instant.into_std()) {
                        dispatch(&game_tx, message);
                    }

                    let world = self.engine.world();
                    if world.tick() % tick_rate == 0 && world.player_count() > 0 {
                        debug!(
                            "Tick {}: {} players, {} bullets",
                            world.tick(),
                            world.player_count(),
                            world.bullet_count()
                        );
                    }
                },
            }
        }
    }
}

/// Outcome of handing a decoded packet to the game loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Enqueue {
    Queued,
    Dropped,
    Closed,
}

/// Queues without waiting. A full queue drops the newest message.
fn enqueue(server_tx: &mpsc::Sender<ServerMessage>, message: ServerMessage) -> Enqueue {
    match server_tx.try_send(message) {
        Ok(()) => Enqueue::Queued,
        Err(mpsc::error::TrySendError::Full(message)) => {
            warn!(
                "Inbound queue full, dropping {} from {}",
                message.packet.kind(),
                message.addr
            );
            Enqueue::Dropped
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Enqueue::Closed,
    }
}

fn dispatch(game_tx: &mpsc::UnboundedSender<GameMessage>, message: GameMessage) {
    if let Err(e) = game_tx.send(message) {
        error!("Failed to queue outgoing packet: {}", e);
    }
}

fn encode_logged(packet: &Packet) -> Option<Vec<u8>> {
    match encode(packet) {
        Ok(data) => Some(data),
        Err(e) => {
            error!("Failed to encode {}: {}", packet.kind(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_game_message_send_packet() {
        let packet = Packet::ConnectAck { player_id: 123 };
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)), 9090);

        let msg = GameMessage::SendPacket {
            packet: packet.clone(),
            addr,
        };

        match msg {
            GameMessage::SendPacket { packet: p, addr: a } => {
                assert_eq!(a, addr);
                assert_eq!(p, packet);
            }
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_enqueue_drops_newest_when_full() {
        let (tx, mut rx) = mpsc::channel::<ServerMessage>(1);
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);

        let first = ServerMessage {
            packet: Packet::ConnectRequest {
                game_name: "first".to_string(),
            },
            addr,
        };
        let second = ServerMessage {
            packet: Packet::ReconnectRequest { old_player_id: 1 },
            addr,
        };

        assert_eq!(enqueue(&tx, first), Enqueue::Queued);
        assert_eq!(enqueue(&tx, second), Enqueue::Dropped);

        match rx.try_recv().unwrap().packet {
            Packet::ConnectRequest { game_name } => assert_eq!(game_name, "first"),
            other => panic!("Unexpected packet {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_enqueue_reports_closed_loop() {
        let (tx, rx) = mpsc::channel::<ServerMessage>(1);
        drop(rx);

        let message = ServerMessage {
            packet: Packet::ReconnectRequest { old_player_id: 1 },
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
        };
        assert_eq!(enqueue(&tx, message), Enqueue::Closed);
    }

    #[tokio::test]
    async fn test_receiver_survives_inbound_flood() {
        let server = Server::bind("127.0.0.1:0", GameConfig::default(), 1)
            .await
            .unwrap();
        let server_addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let noise = encode(&Packet::PlayerInput {
            player_id: 42,
            actions: vec![],
        })
        .unwrap();
        for _ in 0..500 {
            tokio_test::assert_ok!(socket.send_to(&noise, server_addr).await);
        }

        // Requests may themselves be dropped while the queue is full, so retry
        let request = encode(&Packet::ConnectRequest {
            game_name: "default".to_string(),
        })
        .unwrap();
        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        let mut acked = None;
        for _ in 0..20 {
            tokio_test::assert_ok!(socket.send_to(&request, server_addr).await);
            let reply =
                tokio::time::timeout(Duration::from_millis(200), socket.recv_from(&mut buf)).await;
            if let Ok(Ok((len, _))) = reply {
                if let Ok(Packet::ConnectAck { player_id }) = decode(&buf[..len]) {
                    acked = Some(player_id);
                    break;
                }
            }
        }

        assert_eq!(acked, Some(1));
    }

    #[tokio::test]
    async fn test_zero_tick_rate_does_not_stop_loop() {
        let config = GameConfig {
            tick_rate: 0,
            ..GameConfig::default()
        };
        let server = Server::bind("127.0.0.1:0", config, 16).await.unwrap();
        let server_addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let request = encode(&Packet::ConnectRequest {
            game_name: "default".to_string(),
        })
        .unwrap();
        tokio_test::assert_ok!(socket.send_to(&request, server_addr).await);

        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        let snapshot = tokio::time::timeout(Duration::from_secs(3), async {
            loop {
                let (len, _) = socket.recv_from(&mut buf).await.unwrap();
                if let Ok(packet @ Packet::WorldState { .. }) = decode(&buf[..len]) {
                    return packet;
                }
            }
        })
        .await
        .expect("tick loop stopped");

        match snapshot {
            Packet::WorldState { players, .. } => assert_eq!(players.len(), 1),
            other => panic!("Expected world state, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let server = Server::bind("127.0.0.1:0", GameConfig::default(), 16)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();

        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_connect_over_udp() {
        let server = Server::bind("127.0.0.1:0", GameConfig::default(), 16)
            .await
            .unwrap();
        let server_addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let request = encode(&Packet::ConnectRequest {
            game_name: "default".to_string(),
        })
        .unwrap();
        tokio_test::assert_ok!(socket.send_to(&request, server_addr).await);

        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        let (len, from) = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
            .await
            .expect("no reply from server")
            .unwrap();

        assert_eq!(from, server_addr);
        // The acknowledgement is queued before any snapshot that includes us
        match decode(&buf[..len]).unwrap() {
            Packet::ConnectAck { player_id } => assert_eq!(player_id, 1),
            other => panic!("Expected ConnectAck, got {:?}", other),
        }
    }
}
