//! Bluetooth Module
//!
//! Couples the remote core to a GATT server radio.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     RemoteService                        │
//! │  (event context + foreground context over RemoteState)   │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!              ┌────────┴────────┐
//!              │                 │
//!              ▼                 ▼
//!       ┌────────────┐    ┌────────────┐
//!       │ Transport  │    │  Protocol  │
//!       │            │    │            │
//!       │ - notify   │    │ - UUIDs    │
//!       │ - scan     │    │ - Commands │
//!       │ - advertise│    │ - Beacons  │
//!       └────────────┘    └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - GATT layout, command payloads and advertisement shapes
//! - [`transport`] - Radio operations the service drives
//! - [`service`] - Main service coordinator

pub mod protocol;
pub mod service;
pub mod transport;

pub use service::{ActionRequest, RemoteService, ServiceConfig};
pub use transport::{LoggingTransport, Transport};
