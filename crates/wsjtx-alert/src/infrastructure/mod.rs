//! Infrastructure layer for the alert listener.
//!
//! Contains OS-facing adapters: the UDP socket loop, configuration file
//! storage and the audible alert.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `wsjtx_core`, but MUST NOT be imported by the `application` or `domain`
//! layers.

pub mod alert;
pub mod network;
pub mod storage;
