use std::io;
use std::net::SocketAddr;

use log::debug;
use tokio::net::{ToSocketAddrs, UdpSocket};

use crate::transport::{Datagram, PacketTransport, TransportError};

/// Taken from RFC 7252 section 4.6: without any knowledge of the path MTU, messages should fit
/// in a 1152 byte payload plus headers.
const DEFAULT_MTU_SIZE: u32 = 1152;

/// Default CoAP transport as originally defined in RFC 7252.  The socket is bound once through
/// the tokio reactor and afterwards only ever polled with the non-blocking `try_*` calls, so
/// [`crate::CoapServer::process`] never awaits.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
    mtu: u32,
    recv_buf: Vec<u8>,
}

impl UdpTransport {
    pub async fn bind<A: ToSocketAddrs>(addresses: A) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addresses).await?;
        Self::from_socket(socket)
    }

    /// Wrap an already bound socket, e.g. one configured by the host with custom socket
    /// options.
    pub fn from_socket(socket: UdpSocket) -> Result<Self, TransportError> {
        let local_addr = socket.local_addr()?;
        debug!("CoAP transport bound to {local_addr}");
        Ok(Self {
            socket,
            local_addr,
            mtu: DEFAULT_MTU_SIZE,
            recv_buf: vec![0u8; DEFAULT_MTU_SIZE as usize],
        })
    }

    /// Manually set the largest datagram that will be accepted.  Anything larger is truncated
    /// by the socket and will most likely fail to decode.
    pub fn set_mtu(mut self, mtu: u32) -> Self {
        self.mtu = mtu;
        self.recv_buf = vec![0u8; mtu as usize];
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl PacketTransport for UdpTransport {
    type Endpoint = SocketAddr;

    fn send(&mut self, peer: &SocketAddr, datagram: &[u8]) -> Result<(), TransportError> {
        let sent = self.socket.try_send_to(datagram, *peer)?;
        if sent != datagram.len() {
            return Err(TransportError::Unspecified(format!(
                "short send to {peer}: {sent} of {} bytes",
                datagram.len()
            )));
        }
        Ok(())
    }

    fn try_receive(&mut self) -> Result<Option<Datagram<SocketAddr>>, TransportError> {
        match self.socket.try_recv_from(&mut self.recv_buf) {
            Ok((n, peer)) => Ok(Some((self.recv_buf[..n].to_vec(), peer))),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn mtu(&self) -> Option<u32> {
        Some(self.mtu)
    }
}
