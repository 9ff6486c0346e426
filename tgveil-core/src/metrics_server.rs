//! Optional loopback Prometheus scrape endpoint (§10.3).
//!
//! Runs on its own OS thread, entirely separate from the single-threaded
//! intercept loop (§5) — it only ever reads [`Stats`] snapshots, it never
//! competes with the loop for packets.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use crate::stats::Stats;

/// Serve a `/metrics` Prometheus text-exposition snapshot on `127.0.0.1:port`
/// until the process exits. Blocking; intended to be run on a dedicated
/// thread spawned by the binary crate.
pub fn serve(port: u16, stats: Arc<Stats>) {
    let listener = match TcpListener::bind(("127.0.0.1", port)) {
        Ok(l) => l,
        Err(e) => {
            tracing::warn!(%e, port, "failed to bind metrics listener, metrics disabled");
            return;
        }
    };

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => handle_connection(stream, &stats),
            Err(e) => tracing::debug!(%e, "metrics listener accept error"),
        }
    }
}

fn handle_connection(mut stream: TcpStream, stats: &Stats) {
    let mut request = [0u8; 512];
    let _ = stream.read(&mut request);

    let body = stats.snapshot().to_prometheus();
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}
