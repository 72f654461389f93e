//! Loopback TCP transport.
//!
//! Maps a channel address onto `host:port`, ignoring the context id. Lets
//! the whole chain run on one machine without hypervisor sockets.

use std::net::{IpAddr, SocketAddr};

use enclave_core::defaults::LOOPBACK_CID;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpListener, TcpStream};

use crate::error::TransportError;
use crate::{BoxFuture, ChannelAddr, ChannelListener, ChannelTransport};

/// TCP transport bound to a single host.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    host: IpAddr,
}

impl TcpTransport {
    pub fn new(host: IpAddr) -> Self {
        Self { host }
    }

    /// Parse `host` as an IP address.
    pub fn from_host(host: &str) -> Result<Self, TransportError> {
        let host = host
            .trim()
            .parse()
            .map_err(|_| TransportError::Config(format!("invalid tcp host {host:?}")))?;
        Ok(Self::new(host))
    }

    /// Transport on 127.0.0.1.
    pub fn loopback() -> Self {
        Self::new(IpAddr::from([127, 0, 0, 1]))
    }

    fn socket_addr(&self, addr: ChannelAddr) -> Result<SocketAddr, TransportError> {
        let port = u16::try_from(addr.port)
            .map_err(|_| TransportError::Config(format!("port {} out of tcp range", addr.port)))?;
        Ok(SocketAddr::new(self.host, port))
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::loopback()
    }
}

/// Create a TCP listener with custom backlog.
fn create_listener(addr: SocketAddr, backlog: u32) -> Result<TcpListener, TransportError> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket =
        Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(TransportError::Socket)?;
    socket.set_reuse_address(true).map_err(TransportError::Socket)?;
    socket.set_nonblocking(true).map_err(TransportError::Socket)?;
    socket.bind(&addr.into()).map_err(TransportError::Bind)?;
    socket
        .listen(i32::try_from(backlog).unwrap_or(i32::MAX))
        .map_err(TransportError::Listen)?;
    let listener = TcpListener::from_std(std::net::TcpListener::from(socket))?;
    Ok(listener)
}

fn channel_addr(addr: SocketAddr) -> ChannelAddr {
    ChannelAddr::new(LOOPBACK_CID, u32::from(addr.port()))
}

impl ChannelTransport for TcpTransport {
    type Stream = TcpStream;
    type Listener = TcpChannelListener;

    fn bind(&self, addr: ChannelAddr, backlog: u32) -> Result<Self::Listener, TransportError> {
        let listener = create_listener(self.socket_addr(addr)?, backlog)?;
        Ok(TcpChannelListener { listener })
    }

    fn connect(&self, addr: ChannelAddr) -> BoxFuture<'_, Result<Self::Stream, TransportError>> {
        Box::pin(async move {
            let tcp = TcpStream::connect(self.socket_addr(addr)?).await?;
            tcp.set_nodelay(true)?;
            Ok(tcp)
        })
    }
}

/// Listening side of [`TcpTransport`].
#[derive(Debug)]
pub struct TcpChannelListener {
    listener: TcpListener,
}

impl ChannelListener for TcpChannelListener {
    type Stream = TcpStream;

    fn accept(&mut self) -> BoxFuture<'_, Result<(Self::Stream, ChannelAddr), TransportError>> {
        Box::pin(async move {
            let (stream, peer) = self.listener.accept().await?;
            Ok((stream, channel_addr(peer)))
        })
    }

    fn local_addr(&self) -> Result<ChannelAddr, TransportError> {
        Ok(channel_addr(self.listener.local_addr()?))
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[tokio::test]
    async fn bind_accept_connect() {
        let transport = TcpTransport::loopback();
        let mut listener = transport.bind(ChannelAddr::new(3, 0), 16).unwrap();
        let local = listener.local_addr().unwrap();
        assert_eq!(local.cid, LOOPBACK_CID);
        assert_ne!(local.port, 0);

        let server = tokio::spawn(async move {
            let (mut stream, _peer) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).await.unwrap();
            buf
        });

        let mut client = transport.connect(local).await.unwrap();
        client.write_all(b"ping").await.unwrap();
        assert_eq!(&server.await.unwrap(), b"ping");
    }

    #[tokio::test]
    async fn bind_held_port_fails() {
        let holder = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = u32::from(holder.local_addr().unwrap().port());
        let transport = TcpTransport::loopback();
        let err = transport.bind(ChannelAddr::new(2, port), 16).unwrap_err();
        assert!(err.is_bind_contention(), "got {err:?}");
    }

    #[test]
    fn rejects_out_of_range_port() {
        let transport = TcpTransport::loopback();
        assert!(matches!(
            transport.socket_addr(ChannelAddr::new(2, 70_000)),
            Err(TransportError::Config(_))
        ));
    }

    #[test]
    fn host_parsing() {
        assert!(TcpTransport::from_host("127.0.0.1").is_ok());
        assert!(TcpTransport::from_host("::1").is_ok());
        assert!(TcpTransport::from_host("localhost").is_err());
    }
}
