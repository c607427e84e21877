//! Remote control core: pairing, link routing and command synchronization.
//!
//! Nothing in this module touches a radio. Every operation is a synchronous
//! step on [`state::RemoteState`] that returns the effects it needs.

pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod pairing;
pub mod registry;
pub mod router;
pub mod settings;
pub mod state;
pub mod telemetry;
