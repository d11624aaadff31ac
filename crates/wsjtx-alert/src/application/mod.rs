//! Application layer use cases for the alert listener.
//!
//! Use cases here orchestrate the codec and the domain rules, depend on traits
//! rather than concrete infrastructure, and perform no socket, file or
//! terminal I/O themselves.
//!
//! # Sub-modules
//!
//! - **`process_datagram`** – Decodes one received datagram, applies the
//!   envelope policy, evaluates the prefix rules and drives the alert sink.
//!   Also builds the REPLY datagram when replying on a match is enabled.

pub mod process_datagram;
