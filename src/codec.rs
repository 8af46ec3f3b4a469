//! Mapping between raw datagrams and the structured [`Request`]/[`Status`] values.
//!
//! Requests are parsed by [`coap_lite::Packet::from_bytes`].  The fixed four-byte header is
//! peeked first so that a request whose token or options are malformed can still be addressed:
//! the message ID and token are salvaged into a [`ReplyTo`] and the server answers 4.00 instead
//! of staying silent.  Outbound messages are serialized with coap-lite as well.

use coap_lite::error::MessageError;
use coap_lite::option_value::OptionValueString;
use coap_lite::{CoapOption, ContentFormat, MessageClass, MessageType, Packet};
use thiserror::Error;

use crate::app::{Method, OptionValueQuery, Request, Status};

const COAP_VERSION: u8 = 1;
const HEADER_LENGTH: usize = 4;
const MAX_TOKEN_LENGTH: u8 = 8;

/// Everything needed to address a response back to the sender of a request.
#[derive(Debug, Clone)]
pub struct ReplyTo {
    pub message_id: u16,
    pub message_type: MessageType,
    pub token: Vec<u8>,
}

impl ReplyTo {
    /// Header fields for the response: Confirmable requests get a piggybacked Acknowledgement
    /// echoing their message ID, Non-confirmable ones a Non-confirmable response carrying
    /// `fresh_message_id`.
    pub fn response_header(&self, fresh_message_id: u16) -> (MessageType, u16) {
        match self.message_type {
            MessageType::Confirmable => (MessageType::Acknowledgement, self.message_id),
            _ => (MessageType::NonConfirmable, fresh_message_id),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    #[error("datagram shorter than the CoAP header")]
    TruncatedHeader,

    #[error("unsupported CoAP version {0}")]
    UnsupportedVersion(u8),

    #[error("reserved message code {0:#04x}")]
    ReservedCode(u8),

    #[error("empty message carrying token or options")]
    MalformedEmpty,

    #[error("request code inside an acknowledgement or reset")]
    RequestNotConfirmableOrNon,

    #[error("token length {0} exceeds 8")]
    InvalidTokenLength(u8),

    #[error("token cut short")]
    TruncatedToken,

    #[error("option header or value runs past the end of the datagram")]
    TruncatedOption,

    #[error("reserved option nibble")]
    ReservedOptionNibble,

    #[error("option {0} is not valid UTF-8")]
    InvalidUtf8(u16),

    #[error("option {0} is not a valid unsigned integer")]
    InvalidUint(u16),

    #[error("unsupported method code {0:#04x}")]
    UnsupportedMethod(u8),

    #[error("unrecognized critical option {0}")]
    UnrecognizedCriticalOption(u16),
}

/// Decode failure, along with the address to reply to when the header was recoverable.
#[derive(Error, Debug, Clone)]
#[error("{kind}")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub reply_to: Option<ReplyTo>,
}

impl DecodeError {
    fn unaddressable(kind: DecodeErrorKind) -> Self {
        Self {
            kind,
            reply_to: None,
        }
    }

    /// Status to answer with when the error is addressable.
    pub fn status(&self) -> Status {
        match self.kind {
            DecodeErrorKind::UnsupportedMethod(_) => Status::method_not_allowed(),
            DecodeErrorKind::UnrecognizedCriticalOption(_) => Status::bad_option(),
            _ => Status::bad_request(),
        }
    }
}

#[derive(Error, Debug)]
#[error("unable to encode message: {0:?}")]
pub struct EncodeError(pub MessageError);

impl From<MessageError> for EncodeError {
    fn from(e: MessageError) -> Self {
        Self(e)
    }
}

/// Result of decoding a well-formed datagram.
#[derive(Debug, Clone)]
pub enum Inbound<Endpoint> {
    Request(Request<Endpoint>),
    /// Code 0.00: a CoAP ping when Confirmable, or an ACK/RST for something we sent.
    Empty {
        message_type: MessageType,
        message_id: u16,
    },
    /// Any response code; the server never issues requests so these are stray.
    Response {
        message_type: MessageType,
        message_id: u16,
    },
}

/// The fixed header, read without trusting anything past the first four bytes.
#[derive(Debug, Clone, Copy)]
struct RawHeader {
    version: u8,
    message_type: MessageType,
    token_length: u8,
    code: u8,
    message_id: u16,
}

impl RawHeader {
    fn peek(datagram: &[u8]) -> Option<Self> {
        let header = datagram.get(..HEADER_LENGTH)?;
        let message_type = match (header[0] >> 4) & 0x03 {
            0 => MessageType::Confirmable,
            1 => MessageType::NonConfirmable,
            2 => MessageType::Acknowledgement,
            _ => MessageType::Reset,
        };
        Some(Self {
            version: header[0] >> 6,
            message_type,
            token_length: header[0] & 0x0f,
            code: header[1],
            message_id: u16::from_be_bytes([header[2], header[3]]),
        })
    }

    fn code_class(&self) -> u8 {
        self.code >> 5
    }

    /// Address for an error response, with whatever token bytes actually arrived.
    fn reply_to(&self, datagram: &[u8]) -> ReplyTo {
        let token_end = HEADER_LENGTH + usize::from(self.token_length);
        let token = match datagram.get(HEADER_LENGTH..token_end) {
            Some(token) if self.token_length <= MAX_TOKEN_LENGTH => token.to_vec(),
            _ => Vec::new(),
        };
        ReplyTo {
            message_id: self.message_id,
            message_type: self.message_type,
            token,
        }
    }

    fn parse_error_kind(&self, e: MessageError) -> DecodeErrorKind {
        match e {
            MessageError::InvalidTokenLength if self.token_length > MAX_TOKEN_LENGTH => {
                DecodeErrorKind::InvalidTokenLength(self.token_length)
            }
            MessageError::InvalidTokenLength => DecodeErrorKind::TruncatedToken,
            MessageError::InvalidOptionDelta => DecodeErrorKind::ReservedOptionNibble,
            MessageError::InvalidOptionLength => DecodeErrorKind::TruncatedOption,
            MessageError::InvalidHeader | MessageError::InvalidPacketLength => {
                DecodeErrorKind::TruncatedHeader
            }
        }
    }
}

pub fn decode<Endpoint>(datagram: &[u8], peer: Endpoint) -> Result<Inbound<Endpoint>, DecodeError> {
    let raw = RawHeader::peek(datagram)
        .ok_or_else(|| DecodeError::unaddressable(DecodeErrorKind::TruncatedHeader))?;
    if raw.version != COAP_VERSION {
        return Err(DecodeError::unaddressable(
            DecodeErrorKind::UnsupportedVersion(raw.version),
        ));
    }

    match raw.code_class() {
        0 if raw.code == 0 => {
            if datagram.len() != HEADER_LENGTH {
                return Err(DecodeError::unaddressable(DecodeErrorKind::MalformedEmpty));
            }
            return Ok(Inbound::Empty {
                message_type: raw.message_type,
                message_id: raw.message_id,
            });
        }
        0 => {}
        2..=5 => {
            return Ok(Inbound::Response {
                message_type: raw.message_type,
                message_id: raw.message_id,
            })
        }
        _ => {
            return Err(DecodeError::unaddressable(DecodeErrorKind::ReservedCode(
                raw.code,
            )))
        }
    }

    if !matches!(
        raw.message_type,
        MessageType::Confirmable | MessageType::NonConfirmable
    ) {
        return Err(DecodeError::unaddressable(
            DecodeErrorKind::RequestNotConfirmableOrNon,
        ));
    }

    let packet = Packet::from_bytes(datagram).map_err(|e| DecodeError {
        kind: raw.parse_error_kind(e),
        reply_to: Some(raw.reply_to(datagram)),
    })?;
    let reply_to = ReplyTo {
        message_id: packet.header.message_id,
        message_type: packet.header.get_type(),
        token: packet.get_token().to_vec(),
    };
    let fail = |kind: DecodeErrorKind| DecodeError {
        kind,
        reply_to: Some(reply_to.clone()),
    };

    let method = match packet.header.code {
        MessageClass::Request(request_type) => Method::try_from(request_type).ok(),
        _ => None,
    }
    .ok_or_else(|| fail(DecodeErrorKind::UnsupportedMethod(raw.code)))?;

    for (&number, _) in packet.options() {
        match CoapOption::from(number) {
            CoapOption::UriPath
            | CoapOption::UriQuery
            | CoapOption::ContentFormat
            | CoapOption::Observe
            | CoapOption::UriHost
            | CoapOption::UriPort
            | CoapOption::Accept => {}
            _ if number & 1 == 1 => {
                return Err(fail(DecodeErrorKind::UnrecognizedCriticalOption(number)))
            }
            _ => {}
        }
    }

    let path = packet
        .get_options_as::<OptionValueString>(CoapOption::UriPath)
        .unwrap_or_default()
        .into_iter()
        .map(|segment| segment.map(|s| s.0))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| fail(DecodeErrorKind::InvalidUtf8(CoapOption::UriPath.into())))?
        .join("/");
    let queries = packet
        .get_options_as::<OptionValueQuery>(CoapOption::UriQuery)
        .unwrap_or_default()
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| fail(DecodeErrorKind::InvalidUtf8(CoapOption::UriQuery.into())))?;
    let observe = packet
        .get_observe_value()
        .transpose()
        .map_err(|_| fail(DecodeErrorKind::InvalidUint(CoapOption::Observe.into())))?;
    let content_format = packet.get_content_format();

    Ok(Inbound::Request(Request {
        method,
        path,
        payload: packet.payload,
        message_id: reply_to.message_id,
        message_type: reply_to.message_type,
        token: reply_to.token,
        content_format,
        queries,
        observe,
        peer,
    }))
}

/// Header and option fields of an outbound response.
#[derive(Debug, Clone)]
pub struct Outbound<'a> {
    pub message_type: MessageType,
    pub message_id: u16,
    pub token: &'a [u8],
    pub content_format: Option<ContentFormat>,
    pub observe: Option<u32>,
}

/// Serialize `status` into a response datagram.  The Content-Format option is only attached
/// when there is a body for it to describe.
pub fn encode_response(status: &Status, outbound: &Outbound<'_>) -> Result<Vec<u8>, EncodeError> {
    let mut packet = Packet::new();
    packet.header.set_version(COAP_VERSION);
    packet.header.set_type(outbound.message_type);
    packet.header.code = MessageClass::Response(status.code());
    packet.header.message_id = outbound.message_id;
    packet.set_token(outbound.token.to_vec());
    if let Some(sequence) = outbound.observe {
        packet.set_observe_value(sequence);
    }
    if !status.body().is_empty() {
        if let Some(content_format) = outbound.content_format {
            packet.set_content_format(content_format);
        }
        packet.payload = status.body().to_vec();
    }
    Ok(packet.to_bytes()?)
}

/// Serialize an empty (code 0.00) message, used to answer pings with a Reset.
pub fn encode_empty(message_type: MessageType, message_id: u16) -> Result<Vec<u8>, EncodeError> {
    let mut packet = Packet::new();
    packet.header.set_version(COAP_VERSION);
    packet.header.set_type(message_type);
    packet.header.code = MessageClass::Empty;
    packet.header.message_id = message_id;
    Ok(packet.to_bytes()?)
}
