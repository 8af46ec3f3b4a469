use coap_lite::{ContentFormat, MessageType};

use crate::app::{Method, OptionValueQuery};

/// Decoded inbound request as seen by a resource handler.  Created fresh for every datagram
/// and dropped as soon as the response has been sent.
#[derive(Debug, Clone)]
pub struct Request<Endpoint> {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) payload: Vec<u8>,
    pub(crate) message_id: u16,
    pub(crate) message_type: MessageType,
    pub(crate) token: Vec<u8>,
    pub(crate) content_format: Option<ContentFormat>,
    pub(crate) queries: Vec<OptionValueQuery>,
    pub(crate) observe: Option<u32>,
    pub(crate) peer: Endpoint,
}

impl<Endpoint> Request<Endpoint> {
    pub fn method(&self) -> Method {
        self.method
    }

    /// Uri-Path segments joined by `/`.  Resources only ever match single-segment paths.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn message_id(&self) -> u16 {
        self.message_id
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn token(&self) -> &[u8] {
        &self.token
    }

    /// Content-Format declared by the client, if any and if recognized.  It is never checked
    /// against the resource's own format; handlers decide what they accept.
    pub fn content_format(&self) -> Option<ContentFormat> {
        self.content_format
    }

    /// Uri-Query options in arrival order.
    pub fn queries(&self) -> &[OptionValueQuery] {
        &self.queries
    }

    /// Value of the Observe option: 0 to register, 1 to deregister.
    pub fn observe(&self) -> Option<u32> {
        self.observe
    }

    pub fn peer(&self) -> &Endpoint {
        &self.peer
    }

    /// Payload interpreted as UTF-8, for the common text/plain case.
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}
