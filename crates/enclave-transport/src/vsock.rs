//! AF_VSOCK transport.
//!
//! The listening socket is built with socket2 like the tcp one, so the
//! configured backlog applies and socket, bind and listen failures stay
//! distinct. The bound socket is then handed to `tokio-vsock`.

use std::os::fd::{FromRawFd, IntoRawFd};

use socket2::{Domain, SockAddr, Socket, Type};
use tokio_vsock::{VsockAddr, VsockListener, VsockStream};
use tracing::debug;

use crate::error::TransportError;
use crate::{BoxFuture, ChannelAddr, ChannelListener, ChannelTransport};

/// Hypervisor socket transport.
#[derive(Debug, Clone, Default)]
pub struct VsockTransport;

fn vsock_addr(addr: ChannelAddr) -> VsockAddr {
    VsockAddr::new(addr.cid, addr.port)
}

fn channel_addr(addr: VsockAddr) -> ChannelAddr {
    ChannelAddr::new(addr.cid(), addr.port())
}

/// Create a vsock listener with custom backlog.
fn create_listener(addr: ChannelAddr, backlog: u32) -> Result<VsockListener, TransportError> {
    let socket = Socket::new(Domain::VSOCK, Type::STREAM, None).map_err(TransportError::Socket)?;
    socket.set_nonblocking(true).map_err(TransportError::Socket)?;
    socket
        .bind(&SockAddr::vsock(addr.cid, addr.port))
        .map_err(TransportError::Bind)?;
    socket
        .listen(i32::try_from(backlog).unwrap_or(i32::MAX))
        .map_err(TransportError::Listen)?;
    // SAFETY: `into_raw_fd` gives up ownership, so the listener is the only owner.
    Ok(unsafe { VsockListener::from_raw_fd(socket.into_raw_fd()) })
}

impl ChannelTransport for VsockTransport {
    type Stream = VsockStream;
    type Listener = VsockChannelListener;

    fn bind(&self, addr: ChannelAddr, backlog: u32) -> Result<Self::Listener, TransportError> {
        debug!(%addr, backlog, "binding vsock listener");
        let listener = create_listener(addr, backlog)?;
        Ok(VsockChannelListener { listener, addr })
    }

    fn connect(&self, addr: ChannelAddr) -> BoxFuture<'_, Result<Self::Stream, TransportError>> {
        Box::pin(async move { Ok(VsockStream::connect(vsock_addr(addr)).await?) })
    }
}

/// Listening side of [`VsockTransport`].
pub struct VsockChannelListener {
    listener: VsockListener,
    addr: ChannelAddr,
}

impl ChannelListener for VsockChannelListener {
    type Stream = VsockStream;

    fn accept(&mut self) -> BoxFuture<'_, Result<(Self::Stream, ChannelAddr), TransportError>> {
        Box::pin(async move {
            let (stream, peer) = self.listener.accept().await?;
            Ok((stream, channel_addr(peer)))
        })
    }

    fn local_addr(&self) -> Result<ChannelAddr, TransportError> {
        Ok(self.addr)
    }
}
