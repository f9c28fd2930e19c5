//! Trait abstraction for datagram socket operations to enable testing

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;

/// Trait for datagram socket I/O operations
#[async_trait]
pub trait DatagramIo: Send {
    /// Send one datagram to `target`, returning the number of bytes sent
    async fn send_to(&mut self, data: &[u8], target: SocketAddr) -> io::Result<usize>;

    /// Receive one datagram into `buf`
    async fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// Address the socket is bound to
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

/// Wrapper around tokio::net::UdpSocket that implements DatagramIo
pub struct TokioUdpSocket {
    socket: tokio::net::UdpSocket,
}

impl TokioUdpSocket {
    pub fn new(socket: tokio::net::UdpSocket) -> Self {
        Self { socket }
    }

    /// Bind a UDP socket to `addr`
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        Ok(Self::new(tokio::net::UdpSocket::bind(addr).await?))
    }
}

#[async_trait]
impl DatagramIo for TokioUdpSocket {
    async fn send_to(&mut self, data: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(data, target).await
    }

    async fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
