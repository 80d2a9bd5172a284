//! Protocol-upgrade passthrough.
//!
//! # Responsibilities
//! - Join the client-side and upstream-side upgrade handshakes
//! - Copy bytes in both directions until either side closes
//!
//! # Design Decisions
//! - Byte-level tunnelling: the gateway never inspects frames, so any
//!   upgraded protocol (WebSocket, HMR sockets) passes transparently
//! - Tunnel errors are logged and end the tunnel; the connection close is
//!   the client-visible signal

use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;

/// Drive a bidirectional byte tunnel between an upgraded client connection
/// and an upgraded upstream connection. Runs detached; the 101 response has
/// already been returned when this starts.
pub fn spawn_tunnel(client_upgrade: OnUpgrade, upstream_upgrade: OnUpgrade) {
    tokio::spawn(async move {
        let (client_io, upstream_io) = match tokio::try_join!(client_upgrade, upstream_upgrade) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "protocol upgrade handshake failed");
                return;
            }
        };

        let mut client_io = TokioIo::new(client_io);
        let mut upstream_io = TokioIo::new(upstream_io);

        match tokio::io::copy_bidirectional(&mut client_io, &mut upstream_io).await {
            Ok((to_upstream, to_client)) => {
                tracing::debug!(to_upstream, to_client, "upgrade tunnel closed");
            }
            Err(e) => {
                tracing::debug!(error = %e, "upgrade tunnel ended with error");
            }
        }
    });
}
