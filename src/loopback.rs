//! In-memory transport useful for tests and host-side simulations.  The server side is a
//! [`LoopbackTransport`]; the remote side is played by a [`LoopbackClient`] sharing the same
//! queues.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::rc::Rc;

use crate::transport::{Datagram, PacketTransport, TransportError};

#[derive(Debug)]
struct Queues<Endpoint> {
    inbound: VecDeque<Datagram<Endpoint>>,
    outbound: VecDeque<Datagram<Endpoint>>,
    fail_sends: bool,
    closed: bool,
}

/// Server-facing half of the loopback pair.
#[derive(Debug)]
pub struct LoopbackTransport<Endpoint> {
    queues: Rc<RefCell<Queues<Endpoint>>>,
    mtu: Option<u32>,
}

/// Client-facing half of the loopback pair: injects datagrams towards the server and collects
/// whatever the server sends back.
#[derive(Debug, Clone)]
pub struct LoopbackClient<Endpoint> {
    queues: Rc<RefCell<Queues<Endpoint>>>,
}

impl<Endpoint> LoopbackTransport<Endpoint> {
    pub fn new() -> (Self, LoopbackClient<Endpoint>) {
        let queues = Rc::new(RefCell::new(Queues {
            inbound: VecDeque::new(),
            outbound: VecDeque::new(),
            fail_sends: false,
            closed: false,
        }));
        let client = LoopbackClient {
            queues: queues.clone(),
        };
        (Self { queues, mtu: None }, client)
    }

    pub fn set_mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }
}

impl<Endpoint: Debug + Clone + PartialEq> PacketTransport for LoopbackTransport<Endpoint> {
    type Endpoint = Endpoint;

    fn send(&mut self, peer: &Endpoint, datagram: &[u8]) -> Result<(), TransportError> {
        let mut queues = self.queues.borrow_mut();
        if queues.closed {
            return Err(TransportError::Closed);
        }
        if queues.fail_sends {
            return Err(TransportError::Unspecified("send buffer full".to_string()));
        }
        queues.outbound.push_back((datagram.to_vec(), peer.clone()));
        Ok(())
    }

    fn try_receive(&mut self) -> Result<Option<Datagram<Endpoint>>, TransportError> {
        let mut queues = self.queues.borrow_mut();
        match queues.inbound.pop_front() {
            Some(datagram) => Ok(Some(datagram)),
            None if queues.closed => Err(TransportError::Closed),
            None => Ok(None),
        }
    }

    fn mtu(&self) -> Option<u32> {
        self.mtu
    }
}

impl<Endpoint> LoopbackClient<Endpoint> {
    /// Queue a datagram as though `from` had sent it to the server.
    pub fn send(&self, from: Endpoint, datagram: impl Into<Vec<u8>>) {
        self.queues.borrow_mut().inbound.push_back((datagram.into(), from));
    }

    /// Pop the oldest datagram the server has sent.
    pub fn recv(&self) -> Option<Datagram<Endpoint>> {
        self.queues.borrow_mut().outbound.pop_front()
    }

    /// Number of inbound datagrams the server has not yet picked up.
    pub fn pending_inbound(&self) -> usize {
        self.queues.borrow().inbound.len()
    }

    /// Make every subsequent server send fail, simulating a full send buffer.
    pub fn fail_sends(&self, fail: bool) {
        self.queues.borrow_mut().fail_sends = fail;
    }

    /// Close the link; both directions report [`TransportError::Closed`] afterwards.
    pub fn close(&self) {
        self.queues.borrow_mut().closed = true;
    }
}
