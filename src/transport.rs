use std::fmt::Debug;
use std::io;

use thiserror::Error;

/// Generalization of the underlying packet transport.  UDP over Wi-Fi is the usual variant, but
/// anything that can move whole datagrams to and from an addressable peer qualifies (see
/// [`crate::loopback::LoopbackTransport`] for an in-memory one).
///
/// Unlike a socket API, neither method may block: the server is driven cooperatively from the
/// host's control loop and a stalled transport would stall the entire device.
pub trait PacketTransport {
    type Endpoint: Debug + Clone + PartialEq;

    /// Transmit a single datagram, best-effort.  There is no delivery guarantee and no retry;
    /// callers are free to drop the datagram on error and move on.
    fn send(&mut self, peer: &Self::Endpoint, datagram: &[u8]) -> Result<(), TransportError>;

    /// Return the next pending inbound datagram along with its sender, or `None` if nothing is
    /// currently available.
    fn try_receive(&mut self) -> Result<Option<Datagram<Self::Endpoint>>, TransportError>;

    /// Largest datagram the link can carry, if known.
    fn mtu(&self) -> Option<u32> {
        None
    }
}

/// Raw datagram bytes paired with the remote peer that sent them (or should receive them).
pub type Datagram<Endpoint> = (Vec<u8>, Endpoint);

pub type BoxedPacketTransport<Endpoint> = Box<dyn PacketTransport<Endpoint = Endpoint>>;

impl<T: PacketTransport + ?Sized> PacketTransport for Box<T> {
    type Endpoint = T::Endpoint;

    fn send(&mut self, peer: &Self::Endpoint, datagram: &[u8]) -> Result<(), TransportError> {
        (**self).send(peer, datagram)
    }

    fn try_receive(&mut self) -> Result<Option<Datagram<Self::Endpoint>>, TransportError> {
        (**self).try_receive()
    }

    fn mtu(&self) -> Option<u32> {
        (**self).mtu()
    }
}

/// Errors indicating a range of transport-related issues such as a full send buffer or a closed
/// socket.  None of these are fatal to the server, which logs them and carries on with the next
/// cycle.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("transport closed")]
    Closed,

    #[error("unspecified: {0}")]
    Unspecified(String),
}
