//! Domain rules for the alert application.
//!
//! Pure business logic with no sockets, files or terminal access.  Given the
//! free text of a decode and a set of prefixes, decide whether the operator
//! should be alerted.  Everything here can be tested without any setup.

/// Callsign / gridsquare prefix matching.
///
/// See [`rules::evaluate`] for the entry point.
pub mod rules;
