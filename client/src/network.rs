//! Client transport: a UDP socket talking to one fixed server

use shared::{decode, encode, Packet, ProtocolError};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::UdpSocket;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

pub struct ClientConn {
    socket: UdpSocket,
    server_addr: SocketAddr,
}

impl ClientConn {
    /// Binds an ephemeral local port and fixes `server_addr` as the only peer.
    pub async fn connect(server_addr: SocketAddr) -> Result<Self, NetworkError> {
        let local = if server_addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(server_addr).await?;

        Ok(ClientConn {
            socket,
            server_addr,
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        Ok(self.socket.local_addr()?)
    }

    pub async fn send(&self, packet: &Packet) -> Result<(), NetworkError> {
        let data = encode(packet)?;
        self.socket.send(&data).await?;
        Ok(())
    }

    /// Waits for the next datagram from the server and decodes it.
    pub async fn recv(&self, buffer: &mut [u8]) -> Result<Packet, NetworkError> {
        let len = self.socket.recv(buffer).await?;
        Ok(decode(&buffer[..len])?)
    }
}
