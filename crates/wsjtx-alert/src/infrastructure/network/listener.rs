//! UDP receive loop for WSJT-X datagrams.
//!
//! WSJT-X sends one complete message per UDP datagram to its configured
//! "UDP Server".  The listener binds that address and, for each datagram:
//!
//! 1. Hands the bytes to the [`DatagramProcessor`].
//! 2. Logs and drops datagrams that fail the envelope policy or do not decode.
//!    The next datagram is processed normally; nothing carries over.
//! 3. Sends any encoded REPLY back to the datagram's source address.
//!
//! # Shutdown
//!
//! [`run_listener`] races every receive against a caller-supplied shutdown
//! future (ctrl-c in the binary, a oneshot in tests) and returns the loop's
//! [`ListenerStats`] once it resolves.

use std::future::Future;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn};

use crate::application::process_datagram::{DatagramProcessor, Outcome, ProcessError};

/// Receive buffer size; larger than any datagram WSJT-X emits.
pub const MAX_DATAGRAM_SIZE: usize = 10240;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The UDP socket could not be bound.
    #[error("failed to bind UDP socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Counters accumulated over the lifetime of one [`run_listener`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub received: u64,
    pub decoded: u64,
    pub skipped: u64,
    /// Datagrams dropped for a foreign envelope.
    pub rejected: u64,
    /// Datagrams dropped because they failed to decode.
    pub malformed: u64,
    pub alerts: u64,
    pub replies: u64,
}

/// Binds a UDP socket on `addr`.
///
/// # Errors
///
/// Returns [`ListenerError::BindFailed`] if the socket cannot be bound.
pub async fn bind_listener(addr: SocketAddr) -> Result<UdpSocket, ListenerError> {
    let socket = UdpSocket::bind(addr)
        .await
        .map_err(|source| ListenerError::BindFailed { addr, source })?;
    if let Ok(local) = socket.local_addr() {
        info!("listening for WSJT-X datagrams on UDP {local}");
    }
    Ok(socket)
}

/// Receives datagrams until `shutdown` resolves.
///
/// Receive errors are logged and the loop continues; a UDP socket reports
/// transient errors (e.g. ICMP port unreachable after a reply) through
/// `recv_from`.
pub async fn run_listener<F>(
    socket: UdpSocket,
    processor: DatagramProcessor,
    shutdown: F,
) -> ListenerStats
where
    F: Future<Output = ()>,
{
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let mut stats = ListenerStats::default();
    tokio::pin!(shutdown);

    loop {
        let (len, src) = tokio::select! {
            _ = &mut shutdown => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok(pair) => pair,
                Err(e) => {
                    error!("UDP recv error: {e}");
                    continue;
                }
            },
        };

        stats.received += 1;
        handle_datagram(&socket, &processor, &buf[..len], src, &mut stats).await;
    }

    info!(
        received = stats.received,
        decoded = stats.decoded,
        alerts = stats.alerts,
        "listener stopped"
    );
    stats
}

async fn handle_datagram(
    socket: &UdpSocket,
    processor: &DatagramProcessor,
    datagram: &[u8],
    src: SocketAddr,
    stats: &mut ListenerStats,
) {
    match processor.process(datagram) {
        Ok(Outcome::Decoded {
            decode,
            matches,
            reply,
        }) => {
            stats.decoded += 1;
            stats.alerts += matches.len() as u64;
            debug!(
                "decode from {src}: {} {:+} dB {}",
                decode.time, decode.snr, decode.message
            );
            if let Some(bytes) = reply {
                match socket.send_to(&bytes, src).await {
                    Ok(_) => {
                        stats.replies += 1;
                        info!("sent reply to {src} for \"{}\"", decode.message);
                    }
                    Err(e) => warn!("failed to send reply to {src}: {e}"),
                }
            }
        }
        Ok(Outcome::Skipped { message_type }) => {
            stats.skipped += 1;
            debug!("skipping message type {message_type} from {src}");
        }
        Err(e @ ProcessError::EnvelopeMismatch { .. }) => {
            stats.rejected += 1;
            info!("ignoring datagram from {src}: {e}");
        }
        Err(e @ ProcessError::Decode(_)) => {
            stats.malformed += 1;
            warn!("dropping datagram from {src}: {e}");
        }
    }
}
