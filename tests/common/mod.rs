#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use coap_lite::{CoapOption, ContentFormat, MessageClass, MessageType, Packet, RequestType};
use coap_thing_server::app::{Request, Status};
use coap_thing_server::{CoapServer, LoopbackClient, LoopbackTransport};

pub const PEER: &str = "10.0.0.2:5683";

pub fn peer() -> String {
    PEER.to_string()
}

#[derive(Debug, Default)]
pub struct Device {
    pub led_on: bool,
    pub post_calls: usize,
}

/// Build and start a device modelled on the demo host: `LED` (observable, GET and POST)
/// plus a GET-only `temp`.
pub fn led_device() -> (CoapServer<String>, LoopbackClient<String>, Rc<RefCell<Device>>) {
    let device = Rc::new(RefCell::new(Device::default()));
    let (transport, client) = LoopbackTransport::new();
    let mut server = CoapServer::new();

    let for_get = device.clone();
    let for_post = device.clone();
    server
        .create_endpoint("LED", ContentFormat::TextPlain, true)
        .unwrap()
        .on_get(move |_| Status::ok(if for_get.borrow().led_on { "On" } else { "Off" }))
        .on_post(move |request: &Request<String>| {
            let mut device = for_post.borrow_mut();
            device.post_calls += 1;
            match request.payload() {
                b"On" => device.led_on = true,
                b"Off" => device.led_on = false,
                _ => return Status::bad_request(),
            }
            Status::created("ok merci")
        });
    server
        .create_endpoint("temp", ContentFormat::TextPlain, false)
        .unwrap()
        .on_get(|_| Status::ok("21.50"));

    server.set_packet_provider(transport);
    server.start().unwrap();
    (server, client, device)
}

pub fn request(method: RequestType, path: &str, payload: &[u8]) -> Packet {
    let mut packet = Packet::new();
    packet.header.set_type(MessageType::Confirmable);
    packet.header.code = MessageClass::Request(method);
    packet.header.message_id = 0x4d2;
    packet.set_token(vec![0xca, 0xfe]);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        packet.add_option(CoapOption::UriPath, segment.as_bytes().to_vec());
    }
    packet.payload = payload.to_vec();
    packet
}

/// Send `packet` from [`PEER`], run one server cycle, and parse the reply if there was one.
pub fn exchange(
    server: &mut CoapServer<String>,
    client: &LoopbackClient<String>,
    packet: &Packet,
) -> Option<Packet> {
    client.send(peer(), packet.to_bytes().unwrap());
    server.process();
    recv(client)
}

pub fn recv(client: &LoopbackClient<String>) -> Option<Packet> {
    let (bytes, to) = client.recv()?;
    assert_eq!(to, PEER);
    Some(Packet::from_bytes(&bytes).unwrap())
}
