//! Minimal, poll-driven CoAP resource server for constrained devices.
//!
//! The host registers named resources with per-method handlers, supplies a packet provider,
//! and then calls [`CoapServer::process`] from its own control loop.  Each call handles at most
//! one pending datagram and never blocks.
//!
//! # Examples
//! ```no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use coap_lite::ContentFormat;
//! use coap_thing_server::app::Status;
//! use coap_thing_server::{CoapServer, UdpTransport};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let led_on = Rc::new(RefCell::new(false));
//!
//!     let mut server = CoapServer::new();
//!     let state = led_on.clone();
//!     server
//!         .create_endpoint("LED", ContentFormat::TextPlain, true)?
//!         .on_get(move |_request| Status::ok(if *state.borrow() { "On" } else { "Off" }));
//!     server.set_packet_provider(UdpTransport::bind("0.0.0.0:5683").await?);
//!     server.start()?;
//!
//!     let mut interval = tokio::time::interval(std::time::Duration::from_millis(10));
//!     loop {
//!         interval.tick().await;
//!         server.process();
//!     }
//! }
//! ```
//!
//! See `demos/led_server.rs` for a complete host program.

pub use loopback::{LoopbackClient, LoopbackTransport};
pub use server::{CoapServer, NotifyError, ProcessOutcome, ServerState};
pub use transport::{PacketTransport, TransportError};
pub use udp::UdpTransport;

pub mod app;
pub mod codec;
pub mod loopback;
pub mod server;
pub mod transport;
pub mod udp;
