use std::cell::RefCell;
use std::env;
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use coap_lite::ContentFormat;
use log::{info, warn};
use tokio::time;

use coap_thing_server::app::{Request, Status};
use coap_thing_server::{CoapServer, UdpTransport};

const DEFAULT_BIND: &str = "0.0.0.0:5683";
const DEFAULT_POLL_MS: u64 = 10;
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Simulated device: a single LED plus a temperature reading and a counter that advances once a
/// second.
#[derive(Debug, Default)]
struct DeviceState {
    led_on: bool,
    temperature: f32,
    temp_var: f32,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let bind = env::var("COAP_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let poll_ms = match env::var("COAP_POLL_MS") {
        Ok(value) => value
            .parse::<u64>()
            .with_context(|| format!("COAP_POLL_MS is not a number: {value}"))?,
        Err(_) => DEFAULT_POLL_MS,
    };

    let state = Rc::new(RefCell::new(DeviceState {
        temperature: 21.5,
        ..Default::default()
    }));

    let mut server = build_server(state.clone())?;
    let transport = UdpTransport::bind(&bind)
        .await
        .with_context(|| format!("unable to bind {bind}"))?;
    info!("Listening on {}", transport.local_addr());
    server.set_packet_provider(transport);
    server.start()?;

    let mut poll = time::interval(Duration::from_millis(poll_ms.max(1)));
    let mut tick = time::interval(TICK_INTERVAL);
    let mut last_led = state.borrow().led_on;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = poll.tick() => {
                server.process();
                let led_on = state.borrow().led_on;
                if led_on != last_led {
                    last_led = led_on;
                    if let Err(e) = server.notify("LED") {
                        warn!("Unable to notify LED observer: {e}");
                    }
                }
            }
            _ = tick.tick() => {
                state.borrow_mut().temp_var += 1.0;
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}

fn build_server(state: Rc<RefCell<DeviceState>>) -> anyhow::Result<CoapServer<SocketAddr>> {
    let mut server = CoapServer::new();

    let state_for_get = state.clone();
    let state_for_post = state.clone();
    server
        .create_endpoint("LED", ContentFormat::TextPlain, true)?
        .on_get(move |_| handle_get_led(&state_for_get.borrow()))
        .on_post(move |request| handle_post_led(request, &mut state_for_post.borrow_mut()));

    let state_for_temp = state.clone();
    server
        .create_endpoint("temp", ContentFormat::TextPlain, false)?
        .on_get(move |_| Status::ok(format!("{:.2}", state_for_temp.borrow().temperature)));

    server
        .create_endpoint("tempVar", ContentFormat::TextPlain, false)?
        .on_get(move |_| Status::ok(format!("{:.2}", state.borrow().temp_var)));

    Ok(server)
}

fn handle_get_led(state: &DeviceState) -> Status {
    Status::ok(if state.led_on { "On" } else { "Off" })
}

fn handle_post_led(request: &Request<SocketAddr>, state: &mut DeviceState) -> Status {
    match request.payload() {
        b"On" => state.led_on = true,
        b"Off" => state.led_on = false,
        other => {
            warn!("Rejecting LED command {:?}", String::from_utf8_lossy(other));
            return Status::bad_request();
        }
    }
    info!("LED is now {}", if state.led_on { "on" } else { "off" });
    Status::created("ok merci")
}
