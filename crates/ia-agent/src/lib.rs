//! Infrastructure request agent: library crate.
//!
//! Wires the request-understanding core (`ia-intent`) to the provisioning
//! capabilities (`ia-provision`) through the [`router::RequestRouter`]
//! state machine. Re-exported so the binary and `ia-e2e-tests` share it.

pub mod config;
pub mod registry;
pub mod router;
