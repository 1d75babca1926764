/// UDP client for the ban server
use crate::{
    ban_query::{decode::parse_reply, BanQuery, BanStatus},
    codec::{self, Rid},
    config::BanServerConfig,
    error::{CheckError, CheckResult},
    metrics,
};
use async_trait::async_trait;
use rand::Rng;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

/// Largest reply datagram we read
pub const MAX_REPLY_SIZE: usize = 1024;

/// Ban server client
///
/// Every query binds its own ephemeral socket; the socket lives only for the
/// duration of the call and is closed on every exit path when it drops.
#[derive(Debug, Clone)]
pub struct UdpBanClient {
    host: String,
    port: u16,
    timeout: Duration,
}

impl UdpBanClient {
    /// Create a new client from configuration
    pub fn new(config: &BanServerConfig) -> Self {
        Self::with_endpoint(config.host.clone(), config.port, config.timeout())
    }

    pub fn with_endpoint(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Resolve, send one request and wait for one reply
    async fn exchange(&self, rid: &Rid) -> CheckResult<BanStatus> {
        let addr = self.resolve_endpoint().await?;

        let local: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await.map_err(network_error)?;
        socket.connect(addr).await.map_err(network_error)?;

        let request = build_request(rid);
        socket.send(&request).await.map_err(network_error)?;

        let mut buf = [0u8; MAX_REPLY_SIZE];
        let len = socket.recv(&mut buf).await.map_err(network_error)?;

        debug!("Ban server replied to rid {} with {} bytes", rid, len);

        Ok(parse_reply(&buf[..len]))
    }

    async fn resolve_endpoint(&self) -> CheckResult<SocketAddr> {
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(network_error)?
            .next()
            .ok_or_else(|| {
                CheckError::Network(format!("no address found for {}:{}", self.host, self.port))
            })
    }
}

#[async_trait]
impl BanQuery for UdpBanClient {
    async fn query(&self, rid: &Rid) -> CheckResult<BanStatus> {
        let started = Instant::now();

        let result = match timeout(self.timeout, self.exchange(rid)).await {
            Ok(result) => result,
            Err(_) => Err(CheckError::Timeout),
        };

        let outcome = match &result {
            Ok(BanStatus::NotBanned) => "not_banned",
            Ok(BanStatus::Banned { .. }) => "banned",
            Err(CheckError::Timeout) => "timeout",
            Err(_) => "error",
        };
        metrics::record_ban_query(outcome, started.elapsed().as_secs_f64());

        result
    }
}

/// Build a request datagram: 4 random header bytes followed by the ASCII token
pub fn build_request(rid: &Rid) -> Vec<u8> {
    let header: [u8; 4] = rand::thread_rng().gen();
    let token = codec::encode(rid);

    let mut request = Vec::with_capacity(header.len() + token.len());
    request.extend_from_slice(&header);
    request.extend_from_slice(token.as_bytes());
    request
}

fn network_error(e: std::io::Error) -> CheckError {
    CheckError::Network(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fake_server(reply_tail: &'static [u8]) -> (SocketAddr, tokio::task::JoinHandle<Vec<u8>>) {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            let request = buf[..len].to_vec();

            let mut reply = request[..4].to_vec();
            reply.extend_from_slice(reply_tail);
            server.send_to(&reply, peer).await.unwrap();
            request
        });

        (addr, handle)
    }

    #[test]
    fn test_build_request_layout() {
        let rid = Rid::from(12345);
        let request = build_request(&rid);
        assert_eq!(request.len(), 4 + codec::TOKEN_LEN);
        assert_eq!(&request[4..], codec::encode(&rid).as_bytes());
    }

    #[tokio::test]
    async fn test_query_not_banned() {
        let (addr, server) = fake_server(b"").await;
        let client = UdpBanClient::with_endpoint("127.0.0.1", addr.port(), Duration::from_secs(2));

        let status = client.query(&Rid::from(12345)).await.unwrap();
        assert_eq!(status, BanStatus::NotBanned);

        let request = server.await.unwrap();
        assert_eq!(&request[4..], b"4ef52a17b33d8f5f048585c3ee1e9a16");
    }

    #[tokio::test]
    async fn test_query_banned_with_reason() {
        let (addr, server) = fake_server(b" Cheating \n").await;
        let client = UdpBanClient::with_endpoint("127.0.0.1", addr.port(), Duration::from_secs(2));

        let status = client.query(&Rid::from(76561198000000000)).await.unwrap();
        assert_eq!(status.reason(), "Cheating");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_query_times_out() {
        // Bound but silent
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = silent.local_addr().unwrap().port();
        let client = UdpBanClient::with_endpoint("127.0.0.1", port, Duration::from_millis(100));

        for _ in 0..5 {
            let err = client.query(&Rid::from(1)).await.unwrap_err();
            assert!(matches!(err, CheckError::Timeout));
        }
    }

    #[cfg(target_os = "linux")]
    fn open_fd_count() -> usize {
        std::fs::read_dir("/proc/self/fd").unwrap().count()
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_repeated_timeouts_release_sockets() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = silent.local_addr().unwrap().port();
        let client = UdpBanClient::with_endpoint("127.0.0.1", port, Duration::from_millis(5));

        let before = open_fd_count();
        for _ in 0..200 {
            let err = client.query(&Rid::from(1)).await.unwrap_err();
            assert!(matches!(err, CheckError::Timeout));
        }
        let after = open_fd_count();

        // Other tests share the process, so allow some unrelated churn
        assert!(
            after < before + 50,
            "fd count grew from {} to {} over 200 timed out queries",
            before,
            after
        );
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_network_error() {
        let client = UdpBanClient::with_endpoint("host.invalid", 61455, Duration::from_secs(5));
        match client.query(&Rid::from(1)).await {
            Err(CheckError::Network(_)) | Err(CheckError::Timeout) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
