use std::net::SocketAddr;
use std::time::Duration;

use coap_lite::{CoapOption, ContentFormat, MessageClass, MessageType, Packet, RequestType, ResponseType};
use tokio::net::UdpSocket;
use tokio::time;

use coap_thing_server::app::Status;
use coap_thing_server::{CoapServer, PacketTransport, ProcessOutcome, UdpTransport};

async fn start_server() -> (CoapServer<SocketAddr>, SocketAddr) {
    let transport = UdpTransport::bind("127.0.0.1:0").await.unwrap();
    let addr = transport.local_addr();
    assert_eq!(transport.mtu(), Some(1152));

    let mut server = CoapServer::new();
    server
        .create_endpoint("LED", ContentFormat::TextPlain, true)
        .unwrap()
        .on_get(|_| Status::ok("Off"))
        .on_post(|request| match request.payload() {
            b"On" | b"Off" => Status::created("ok merci"),
            _ => Status::bad_request(),
        });
    server.set_packet_provider(transport);
    server.start().unwrap();
    (server, addr)
}

/// Drive the server like a host loop would until it handles something.
async fn poll_until_handled(server: &mut CoapServer<SocketAddr>) -> ProcessOutcome {
    for _ in 0..500 {
        match server.process() {
            ProcessOutcome::Idle => time::sleep(Duration::from_millis(2)).await,
            outcome => return outcome,
        }
    }
    panic!("server never saw the datagram");
}

async fn roundtrip(
    server: &mut CoapServer<SocketAddr>,
    client: &UdpSocket,
    server_addr: SocketAddr,
    packet: &Packet,
) -> Packet {
    client
        .send_to(&packet.to_bytes().unwrap(), server_addr)
        .await
        .unwrap();
    poll_until_handled(server).await;

    let mut buf = [0u8; 1152];
    let (n, from) = time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
        .await
        .expect("no reply")
        .unwrap();
    assert_eq!(from, server_addr);
    Packet::from_bytes(&buf[..n]).unwrap()
}

fn request(method: RequestType, path: &str, payload: &[u8], message_id: u16) -> Packet {
    let mut packet = Packet::new();
    packet.header.set_type(MessageType::Confirmable);
    packet.header.code = MessageClass::Request(method);
    packet.header.message_id = message_id;
    packet.set_token(vec![1, 2, 3, 4]);
    packet.add_option(CoapOption::UriPath, path.as_bytes().to_vec());
    packet.payload = payload.to_vec();
    packet
}

#[tokio::test]
async fn serves_requests_over_localhost() {
    let (mut server, server_addr) = start_server().await;
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let reply = roundtrip(
        &mut server,
        &client,
        server_addr,
        &request(RequestType::Get, "LED", b"", 100),
    )
    .await;
    assert_eq!(reply.header.code, MessageClass::Response(ResponseType::Content));
    assert_eq!(reply.header.get_type(), MessageType::Acknowledgement);
    assert_eq!(reply.header.message_id, 100);
    assert_eq!(reply.get_token(), &[1, 2, 3, 4]);
    assert_eq!(reply.payload, b"Off");

    let reply = roundtrip(
        &mut server,
        &client,
        server_addr,
        &request(RequestType::Post, "LED", b"On", 101),
    )
    .await;
    assert_eq!(reply.header.code, MessageClass::Response(ResponseType::Created));
    assert_eq!(reply.payload, b"ok merci");

    let reply = roundtrip(
        &mut server,
        &client,
        server_addr,
        &request(RequestType::Get, "nothing", b"", 102),
    )
    .await;
    assert_eq!(reply.header.code, MessageClass::Response(ResponseType::NotFound));
}

#[tokio::test]
async fn idle_socket_does_not_block() {
    let (mut server, _) = start_server().await;
    for _ in 0..10 {
        assert!(matches!(server.process(), ProcessOutcome::Idle));
    }
}
