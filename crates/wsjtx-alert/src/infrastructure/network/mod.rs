//! Network infrastructure: the UDP receive loop.
//!
//! - **`listener`** – Binds the configured UDP address, hands each datagram to
//!   the `DatagramProcessor` and sends any reply back to the datagram's source.

pub mod listener;
