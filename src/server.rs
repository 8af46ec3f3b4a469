use std::fmt::Debug;

use coap_lite::{ContentFormat, MessageType, ResponseType};
use log::{debug, error, trace, warn};
use rand::Rng;
use thiserror::Error;

use crate::app::core_handler::{CoreRequestHandler, WELL_KNOWN_CORE};
use crate::app::observe::RegistrationEvent;
use crate::app::{ConfigError, EndpointRegistry, Method, Request, Resource, Status};
use crate::codec::{self, EncodeError, Inbound, Outbound, ReplyTo};
use crate::transport::{BoxedPacketTransport, PacketTransport, TransportError};

/// Lifecycle of a [`CoapServer`].  Resources may be registered until the server is running;
/// requests are only dispatched once it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// No packet provider has been supplied yet.
    Unconfigured,
    /// A packet provider is in place, but [`CoapServer::start`] has not been called.
    Configured,
    Running,
}

/// What a single call to [`CoapServer::process`] ended up doing.
#[derive(Debug, Clone, Copy)]
pub enum ProcessOutcome {
    /// Nothing was pending, or the server is not running.
    Idle,
    /// A response with the given code was sent.
    Responded(ResponseType),
    /// A ping was answered with a Reset.
    Reset,
    /// The datagram was consumed without a reply (Reset, Acknowledgement, stray response).
    Ignored,
    /// The datagram could not be decoded well enough to reply to, or the reply could not be
    /// encoded.
    Dropped,
    /// A reply was produced but the transport refused it.
    SendFailed,
}

/// Primary server API to register resources, attach a transport, and cooperatively drive
/// request dispatch from the host's control loop.
///
/// The server never blocks and never spawns: each [`CoapServer::process`] call handles at most
/// one inbound datagram, running the matching handler inline and sending at most one reply.
pub struct CoapServer<Endpoint> {
    state: ServerState,
    transport: Option<BoxedPacketTransport<Endpoint>>,
    registry: EndpointRegistry<Endpoint>,
    discoverable: bool,
    discovery: Option<CoreRequestHandler>,
    next_message_id: u16,
}

impl<Endpoint: Debug + Clone + PartialEq + 'static> Default for CoapServer<Endpoint> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Endpoint: Debug + Clone + PartialEq + 'static> CoapServer<Endpoint> {
    pub fn new() -> Self {
        Self {
            state: ServerState::Unconfigured,
            transport: None,
            registry: EndpointRegistry::new(),
            discoverable: true,
            discovery: None,
            next_message_id: rand::thread_rng().gen(),
        }
    }

    /// Supply the packet provider the server will poll for requests and reply through.  May be
    /// called again to swap providers; the server keeps its current state.
    pub fn set_packet_provider<T>(&mut self, transport: T)
    where
        T: PacketTransport<Endpoint = Endpoint> + 'static,
    {
        debug!("Packet provider set (mtu: {:?})", transport.mtu());
        self.transport = Some(Box::new(transport));
        if self.state == ServerState::Unconfigured {
            self.state = ServerState::Configured;
        }
    }

    /// Register a new named resource.  The returned reference is used to attach method handlers
    /// in place.
    pub fn create_endpoint(
        &mut self,
        name: &str,
        content_format: ContentFormat,
        observable: bool,
    ) -> Result<&mut Resource<Endpoint>, ConfigError> {
        if self.state == ServerState::Running {
            return Err(ConfigError::RegistryFrozen);
        }
        let resource = self.registry.create(name, content_format, observable)?;
        debug!("Registered endpoint /{name}");
        Ok(resource)
    }

    /// Do not answer `GET /.well-known/core`.  Only takes effect if called before
    /// [`CoapServer::start`].
    pub fn disable_discovery(&mut self) -> &mut Self {
        self.discoverable = false;
        self
    }

    /// Begin dispatching.  Fails if no packet provider has been supplied; calling it again on a
    /// running server has no effect.
    pub fn start(&mut self) -> Result<(), ConfigError> {
        match self.state {
            ServerState::Unconfigured => Err(ConfigError::NoTransport),
            ServerState::Running => Ok(()),
            ServerState::Configured => {
                if self.discoverable {
                    self.discovery = Some(CoreRequestHandler::from_registry(&self.registry));
                }
                self.state = ServerState::Running;
                debug!(
                    "Server running with {} endpoint(s), discovery {}",
                    self.registry.len(),
                    if self.discoverable { "on" } else { "off" }
                );
                Ok(())
            }
        }
    }

    /// Handle at most one pending datagram.  Returns immediately when the server is not running
    /// or nothing is pending.  Transport and codec failures are logged and never escape.
    pub fn process(&mut self) -> ProcessOutcome {
        if self.state != ServerState::Running {
            return ProcessOutcome::Idle;
        }
        let transport = match self.transport.as_mut() {
            Some(transport) => transport,
            None => return ProcessOutcome::Idle,
        };
        let (datagram, peer) = match transport.try_receive() {
            Ok(Some(datagram)) => datagram,
            Ok(None) => return ProcessOutcome::Idle,
            Err(e) => {
                warn!("Error receiving from packet provider: {e}");
                return ProcessOutcome::Idle;
            }
        };
        trace!("Incoming datagram from {peer:?}: {} bytes", datagram.len());

        match codec::decode(&datagram, peer.clone()) {
            Ok(Inbound::Request(request)) => self.handle_request(request),
            Ok(Inbound::Empty {
                message_type,
                message_id,
            }) => self.handle_empty(&peer, message_type, message_id),
            Ok(Inbound::Response { message_id, .. }) => {
                debug!("Ignoring response message {message_id} from {peer:?}");
                ProcessOutcome::Ignored
            }
            Err(e) => match &e.reply_to {
                Some(reply_to) => {
                    warn!("Malformed request from {peer:?}: {e}");
                    self.respond(&peer, reply_to, &e.status(), None, None)
                }
                None => {
                    warn!("Dropping datagram from {peer:?}: {e}");
                    ProcessOutcome::Dropped
                }
            },
        }
    }

    /// Push the current representation of an observable resource to its observer, if it has
    /// one.  Returns whether a notification was sent.
    ///
    /// The resource's GET handler produces the notification body.  A non-success status ends the
    /// observation after being delivered.
    pub fn notify(&mut self, name: &str) -> Result<bool, NotifyError> {
        if self.state != ServerState::Running {
            return Ok(false);
        }
        let message_id = self.allocate_message_id();
        let resource = self
            .registry
            .find_mut(name)
            .ok_or_else(|| NotifyError::UnknownEndpoint(name.to_string()))?;
        let observe_handler = resource
            .observe_handler
            .as_mut()
            .ok_or_else(|| NotifyError::NotObservable(name.to_string()))?;
        let subscription = match observe_handler.next_notification(message_id) {
            Some(subscription) => subscription,
            None => return Ok(false),
        };

        let request = Request {
            method: Method::Get,
            path: name.to_string(),
            payload: Vec::new(),
            message_id,
            message_type: MessageType::NonConfirmable,
            token: subscription.token.clone(),
            content_format: None,
            queries: Vec::new(),
            observe: None,
            peer: subscription.peer.clone(),
        };
        let status = resource.handle(&request);
        let observe = if status.is_success() {
            Some(u32::from(subscription.sequence))
        } else {
            if let Some(observe_handler) = resource.observe_handler.as_mut() {
                observe_handler.clear();
            }
            None
        };
        let content_format = resource.content_format();

        let bytes = codec::encode_response(
            &status,
            &Outbound {
                message_type: MessageType::NonConfirmable,
                message_id,
                token: &subscription.token,
                content_format: Some(content_format),
                observe,
            },
        )?;
        let transport = self.transport.as_mut().ok_or(TransportError::Closed)?;
        trace!("Notifying {:?} of /{name}", subscription.peer);
        transport.send(&subscription.peer, &bytes)?;
        Ok(true)
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ServerState::Running
    }

    pub fn registry(&self) -> &EndpointRegistry<Endpoint> {
        &self.registry
    }

    pub fn endpoint(&self, name: &str) -> Option<&Resource<Endpoint>> {
        self.registry.find(name)
    }

    fn handle_request(&mut self, request: Request<Endpoint>) -> ProcessOutcome {
        debug!(
            "Received from [{:?}]: {} /{}",
            request.peer(),
            request.method(),
            request.path()
        );
        let reply_to = ReplyTo {
            message_id: request.message_id(),
            message_type: request.message_type(),
            token: request.token().to_vec(),
        };

        if request.path() == WELL_KNOWN_CORE {
            let discovered = self
                .discovery
                .as_ref()
                .map(|core| (core.handle(&request), core.content_format()));
            if let Some((status, content_format)) = discovered {
                return self.respond(request.peer(), &reply_to, &status, Some(content_format), None);
            }
        }

        let (status, content_format, observe) = match self.registry.find_mut(request.path()) {
            Some(resource) => {
                let status = resource.handle(&request);
                let observe = resource
                    .observe_handler
                    .as_mut()
                    .map(|observe| observe.maybe_process_registration(&request, &status));
                let observe = match observe {
                    Some(RegistrationEvent::Registered(sequence)) => Some(u32::from(sequence)),
                    _ => None,
                };
                (status, Some(resource.content_format()), observe)
            }
            None => (Status::not_found(), None, None),
        };
        self.respond(request.peer(), &reply_to, &status, content_format, observe)
    }

    fn handle_empty(
        &mut self,
        peer: &Endpoint,
        message_type: MessageType,
        message_id: u16,
    ) -> ProcessOutcome {
        match message_type {
            MessageType::Confirmable => {
                trace!("Ping from {peer:?}");
                match codec::encode_empty(MessageType::Reset, message_id) {
                    Ok(bytes) if self.send(peer, &bytes) => ProcessOutcome::Reset,
                    Ok(_) => ProcessOutcome::SendFailed,
                    Err(e) => {
                        error!("{e}");
                        ProcessOutcome::Dropped
                    }
                }
            }
            MessageType::Reset => {
                for resource in self.registry.iter_mut() {
                    if let Some(observe) = resource.observe_handler.as_mut() {
                        if observe.cancel_by_reset(peer, message_id) {
                            debug!("Observation of /{} cancelled by {peer:?}", resource.name());
                        }
                    }
                }
                ProcessOutcome::Ignored
            }
            _ => ProcessOutcome::Ignored,
        }
    }

    fn respond(
        &mut self,
        peer: &Endpoint,
        reply_to: &ReplyTo,
        status: &Status,
        content_format: Option<ContentFormat>,
        observe: Option<u32>,
    ) -> ProcessOutcome {
        let (message_type, message_id) = reply_to.response_header(self.allocate_message_id());
        let outbound = Outbound {
            message_type,
            message_id,
            token: &reply_to.token,
            content_format,
            observe,
        };
        let bytes = match codec::encode_response(status, &outbound) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Unable to reply to {peer:?}: {e}");
                return ProcessOutcome::Dropped;
            }
        };
        if self.send(peer, &bytes) {
            ProcessOutcome::Responded(status.code())
        } else {
            ProcessOutcome::SendFailed
        }
    }

    fn send(&mut self, peer: &Endpoint, bytes: &[u8]) -> bool {
        let transport = match self.transport.as_mut() {
            Some(transport) => transport,
            None => return false,
        };
        trace!("Outgoing datagram to {peer:?}: {} bytes", bytes.len());
        match transport.send(peer, bytes) {
            Ok(()) => true,
            Err(e) => {
                error!("Error sending to {peer:?}: {e}");
                false
            }
        }
    }

    fn allocate_message_id(&mut self) -> u16 {
        let message_id = self.next_message_id;
        self.next_message_id = message_id.wrapping_add(1);
        message_id
    }
}

/// Failure to deliver an observe notification.  Neither the server nor the subscription is
/// affected beyond the single notification.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("no endpoint named {0}")]
    UnknownEndpoint(String),

    #[error("endpoint {0} is not observable")]
    NotObservable(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
