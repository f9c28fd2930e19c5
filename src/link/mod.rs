//! # Control Link Module
//!
//! Owns the UDP socket and the two fixed peers (lander and dashboard).
//!
//! This module handles:
//! - Binding the local datagram socket
//! - Best-effort sends to the lander and the dashboard (no retry)
//! - Bounded-wait receives from the lander
//! - Counting sent, received and failed datagrams

pub mod socket_trait;

use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::LinkConfig;
use crate::error::{ConsoleError, Result};
use socket_trait::{DatagramIo, TokioUdpSocket};

/// Datagram counters for one link
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub lander_sent: u64,
    pub dashboard_sent: u64,
    pub received: u64,
    pub send_failures: u64,
    pub recv_failures: u64,
    pub timeouts: u64,
}

/// Datagram link to the lander and the dashboard
pub struct ControlLink<S: DatagramIo> {
    socket: S,
    lander: SocketAddr,
    dashboard: SocketAddr,
    recv_timeout: Duration,
    stats: LinkStats,
}

impl<S: DatagramIo> std::fmt::Debug for ControlLink<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlLink")
            .field("lander", &self.lander)
            .field("dashboard", &self.dashboard)
            .field("recv_timeout", &self.recv_timeout)
            .finish_non_exhaustive()
    }
}

impl ControlLink<TokioUdpSocket> {
    /// Bind the console socket and resolve both peers from configuration
    ///
    /// # Errors
    ///
    /// Returns error if an address does not parse or the bind fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lander_console::config::Config;
    /// use lander_console::link::ControlLink;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let config = Config::default();
    ///     let link = ControlLink::bind(&config.link).await?;
    ///     println!("lander is on {}", link.lander());
    ///     Ok(())
    /// }
    /// ```
    pub async fn bind(config: &LinkConfig) -> Result<Self> {
        let bind_addr = config.bind_addr()?;
        let socket = TokioUdpSocket::bind(bind_addr).await?;
        info!("Console socket bound to {}", socket.local_addr()?);

        Ok(Self::new(
            socket,
            config.lander_addr()?,
            config.dashboard_addr()?,
            Duration::from_millis(config.recv_timeout_ms),
        ))
    }
}

impl<S: DatagramIo> ControlLink<S> {
    pub fn new(socket: S, lander: SocketAddr, dashboard: SocketAddr, recv_timeout: Duration) -> Self {
        Self {
            socket,
            lander,
            dashboard,
            recv_timeout,
            stats: LinkStats::default(),
        }
    }

    /// Send one datagram to the lander
    pub async fn send_lander(&mut self, data: &[u8]) -> Result<()> {
        let target = self.lander;
        self.send_to(data, target).await?;
        self.stats.lander_sent += 1;
        Ok(())
    }

    /// Send one datagram to the dashboard
    pub async fn send_dash(&mut self, data: &[u8]) -> Result<()> {
        let target = self.dashboard;
        self.send_to(data, target).await?;
        self.stats.dashboard_sent += 1;
        Ok(())
    }

    /// Receive one lander datagram into `buf`, waiting at most the configured timeout
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of bytes received
    ///
    /// # Errors
    ///
    /// - `Timeout` if nothing arrived in time
    /// - `Transport` if the receive failed or the datagram filled `buf`
    ///   (and may have been truncated)
    pub async fn recv_lander(&mut self, buf: &mut [u8]) -> Result<usize> {
        let wait = self.recv_timeout;
        match self.recv_within(buf, wait).await {
            Some(received) => received,
            None => {
                self.stats.timeouts += 1;
                Err(ConsoleError::Timeout(wait))
            }
        }
    }

    /// Receive a lander datagram only if one is already queued
    ///
    /// Returns `Ok(None)` without waiting when the socket is empty; that is
    /// not counted as a timeout.
    pub async fn try_recv_lander(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        self.recv_within(buf, Duration::ZERO).await.transpose()
    }

    /// `None` when nothing arrived within `wait`
    async fn recv_within(&mut self, buf: &mut [u8], wait: Duration) -> Option<Result<usize>> {
        let capacity = buf.len();

        let (len, from) = match timeout(wait, self.socket.recv_from(buf)).await {
            Err(_) => return None,
            Ok(Err(e)) => {
                self.stats.recv_failures += 1;
                return Some(Err(ConsoleError::Transport(format!("Failed to receive: {}", e))));
            }
            Ok(Ok(received)) => received,
        };

        if len >= capacity {
            self.stats.recv_failures += 1;
            return Some(Err(ConsoleError::Transport(format!(
                "Datagram from {} filled the {}-byte buffer",
                from, capacity
            ))));
        }

        if from != self.lander {
            debug!("Telemetry from unexpected peer {} (lander is {})", from, self.lander);
        }

        self.stats.received += 1;
        debug!("Received {} bytes from {}", len, from);
        Some(Ok(len))
    }

    async fn send_to(&mut self, data: &[u8], target: SocketAddr) -> Result<()> {
        match self.socket.send_to(data, target).await {
            Ok(sent) if sent == data.len() => Ok(()),
            Ok(sent) => {
                self.stats.send_failures += 1;
                Err(ConsoleError::Transport(format!(
                    "Short send to {}: {} of {} bytes",
                    target,
                    sent,
                    data.len()
                )))
            }
            Err(e) => {
                self.stats.send_failures += 1;
                Err(ConsoleError::Transport(format!("Failed to send to {}: {}", target, e)))
            }
        }
    }

    pub fn lander(&self) -> SocketAddr {
        self.lander
    }

    pub fn dashboard(&self) -> SocketAddr {
        self.dashboard
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socket_trait::mocks::MockSocket;
    use std::io;
    use tokio_test::{assert_err, assert_ok};

    const LANDER: ([u8; 4], u16) = ([127, 0, 0, 1], 65200);
    const DASH: ([u8; 4], u16) = ([127, 0, 0, 1], 65300);

    fn mock_link() -> (ControlLink<MockSocket>, MockSocket) {
        let socket = MockSocket::new(SocketAddr::from(LANDER));
        let link = ControlLink::new(
            socket.clone(),
            SocketAddr::from(LANDER),
            SocketAddr::from(DASH),
            Duration::from_millis(5),
        );
        (link, socket)
    }

    #[tokio::test]
    async fn test_send_lander_targets_lander() {
        let (mut link, socket) = mock_link();
        assert_ok!(link.send_lander(b"command:!\nthrottle:10").await);

        assert_eq!(socket.sent_to(SocketAddr::from(LANDER)), vec!["command:!\nthrottle:10"]);
        assert!(socket.sent_to(SocketAddr::from(DASH)).is_empty());
        assert_eq!(link.stats().lander_sent, 1);
    }

    #[tokio::test]
    async fn test_send_dash_targets_dashboard() {
        let (mut link, socket) = mock_link();
        assert_ok!(link.send_dash(b"fuel:80\n").await);

        assert_eq!(socket.sent_to(SocketAddr::from(DASH)), vec!["fuel:80\n"]);
        assert_eq!(link.stats().dashboard_sent, 1);
    }

    #[tokio::test]
    async fn test_send_error_is_transport_error() {
        let (mut link, socket) = mock_link();
        socket.set_send_error(io::ErrorKind::ConnectionRefused);

        match link.send_lander(b"x").await {
            Err(ConsoleError::Transport(msg)) => assert!(msg.contains("Failed to send")),
            other => panic!("Expected Transport error, got: {:?}", other),
        }
        assert_eq!(link.stats().send_failures, 1);
        assert_eq!(link.stats().lander_sent, 0);
    }

    #[tokio::test]
    async fn test_short_send_is_transport_error() {
        let (mut link, socket) = mock_link();
        socket.set_short_send(true);

        match link.send_dash(b"altitude:1\n").await {
            Err(ConsoleError::Transport(msg)) => assert!(msg.contains("Short send")),
            other => panic!("Expected Transport error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_recv_lander_returns_length() {
        let (mut link, socket) = mock_link();
        socket.push_reply(b"altitude:45\n");

        let mut buf = [0u8; 64];
        let len = assert_ok!(link.recv_lander(&mut buf).await);
        assert_eq!(&buf[..len], b"altitude:45\n");
        assert_eq!(link.stats().received, 1);
    }

    #[tokio::test]
    async fn test_recv_lander_times_out() {
        let (mut link, _socket) = mock_link();

        let mut buf = [0u8; 64];
        match link.recv_lander(&mut buf).await {
            Err(ConsoleError::Timeout(d)) => assert_eq!(d, Duration::from_millis(5)),
            other => panic!("Expected Timeout, got: {:?}", other),
        }
        assert_eq!(link.stats().timeouts, 1);
    }

    #[tokio::test]
    async fn test_recv_error_is_transport_error() {
        let (mut link, socket) = mock_link();
        socket.set_recv_error(io::ErrorKind::ConnectionReset);

        let mut buf = [0u8; 64];
        assert_err!(link.recv_lander(&mut buf).await);
        assert_eq!(link.stats().recv_failures, 1);
    }

    #[tokio::test]
    async fn test_recv_full_buffer_is_rejected() {
        let (mut link, socket) = mock_link();
        socket.push_reply(b"altitude:123456789");

        let mut buf = [0u8; 8];
        match link.recv_lander(&mut buf).await {
            Err(ConsoleError::Transport(msg)) => assert!(msg.contains("filled")),
            other => panic!("Expected Transport error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_try_recv_returns_queued_datagram() {
        let (mut link, socket) = mock_link();
        socket.push_reply(b"fuel:70\n");

        let mut buf = [0u8; 64];
        let len = assert_ok!(link.try_recv_lander(&mut buf).await);
        assert_eq!(len, Some(8));
        assert_eq!(&buf[..8], b"fuel:70\n");
        assert_eq!(link.stats().received, 1);
    }

    #[tokio::test]
    async fn test_try_recv_on_empty_socket_does_not_wait() {
        let (mut link, _socket) = mock_link();

        let mut buf = [0u8; 64];
        assert_eq!(assert_ok!(link.try_recv_lander(&mut buf).await), None);
        assert_eq!(link.stats().timeouts, 0);
    }

    #[tokio::test]
    async fn test_bind_with_invalid_address_fails() {
        let config = LinkConfig {
            lander_addr: "not-an-address".to_string(),
            ..LinkConfig::default()
        };
        match ControlLink::bind(&config).await {
            Err(ConsoleError::InvalidEndpoint(msg)) => assert!(msg.contains("not-an-address")),
            other => panic!("Expected InvalidEndpoint, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_real_udp_round_trip() {
        let lander = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let dashboard = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let config = LinkConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            lander_addr: lander.local_addr().unwrap().to_string(),
            dashboard_addr: dashboard.local_addr().unwrap().to_string(),
            recv_timeout_ms: 500,
            ..LinkConfig::default()
        };
        let mut link = ControlLink::bind(&config).await.unwrap();
        let console_addr = link.local_addr().unwrap();

        link.send_lander(b"command:!\nthrottle:42").await.unwrap();
        let mut buf = [0u8; 512];
        let (len, from) = lander.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"command:!\nthrottle:42");
        assert_eq!(from, console_addr);

        lander.send_to(b"fuel:80\n", console_addr).await.unwrap();
        let len = link.recv_lander(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"fuel:80\n");

        link.send_dash(b"Vx:2.5\n").await.unwrap();
        let (len, _) = dashboard.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"Vx:2.5\n");
    }
}
