//! Minimal interactive demo: connect to a control server, log lifecycle
//! events, and run a command on the first peer that shows up.
//!
//! ```text
//! cargo run --example session -- 127.0.0.1:1999 shared-secret
//! ```

use std::time::Duration;

use termlink::{Client, ClientEvent};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "termlink=debug".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:1999".to_string());
    let secret = args.next().unwrap_or_default();

    let client = Client::builder()
        .server_addr(&addr)
        .secret(&secret)
        .print_sink(|text| println!("[server] {text}"))
        .request_timeout(Duration::from_secs(10))
        .connect();

    let mut events = client.subscribe();
    while let Ok(event) = events.recv().await {
        match event {
            ClientEvent::Established(info) => {
                println!("connected to {}", info.remote_addr);
            }
            ClientEvent::Closed => println!("connection closed"),
            ClientEvent::StateChanged(state) => println!("state: {state:?}"),
            ClientEvent::RosterChanged(peers) => {
                println!("{} peers online", peers.len());
                if let Some(proxy) = client.sessions().into_iter().next() {
                    match proxy.execute("uptime").await {
                        Ok(output) => print!("{} says: {output}", proxy.peer_id()),
                        Err(e) => eprintln!("command failed: {e}"),
                    }
                }
            }
        }
    }
}
