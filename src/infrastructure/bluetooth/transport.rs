//! Transport collaborator
//!
//! The GATT server side of the radio. Calls are made from the event context
//! and must return promptly; a real implementation queues work on its own
//! stack rather than blocking.

use crate::domain::models::ConnectionId;
use crate::infrastructure::bluetooth::protocol::Advertisement;
use anyhow::Result;
use tracing::info;

pub trait Transport: Send + Sync {
    /// Notify `payload` to every connected link
    fn notify_all(&self, payload: &[u8]) -> Result<()>;

    /// Notify `payload` to one link
    fn notify_one(&self, connection: ConnectionId, payload: &[u8]) -> Result<()>;

    /// Tear down one link, leaving the others alone
    fn disconnect(&self, connection: ConnectionId) -> Result<()>;

    /// Continuous discovery of nearby peripherals
    fn start_scan(&self) -> Result<()>;

    fn stop_scan(&self) -> Result<()>;

    /// Replace the advertisement and start broadcasting it
    fn advertise(&self, advertisement: &Advertisement) -> Result<()>;

    /// Resume broadcasting the current advertisement
    fn restart_advertising(&self) -> Result<()>;
}

/// Dry-run transport: logs every radio operation and succeeds.
///
/// Pair it with injected radio events to exercise the core without hardware.
#[derive(Debug, Default)]
pub struct LoggingTransport;

impl Transport for LoggingTransport {
    fn notify_all(&self, payload: &[u8]) -> Result<()> {
        info!("TX (Broadcast): {:02X?}", payload);
        Ok(())
    }

    fn notify_one(&self, connection: ConnectionId, payload: &[u8]) -> Result<()> {
        info!("TX (Unicast {}): {:02X?}", connection, payload);
        Ok(())
    }

    fn disconnect(&self, connection: ConnectionId) -> Result<()> {
        info!("Dropping link {}", connection);
        Ok(())
    }

    fn start_scan(&self) -> Result<()> {
        info!("Scan started");
        Ok(())
    }

    fn stop_scan(&self) -> Result<()> {
        info!("Scan stopped");
        Ok(())
    }

    fn advertise(&self, advertisement: &Advertisement) -> Result<()> {
        match &advertisement.manufacturer_data {
            Some(data) => info!(
                "Advertising {:?} with manufacturer data {:02X?}",
                advertisement.local_name, data
            ),
            None => info!(
                "Advertising {:?} with service {}",
                advertisement.local_name, advertisement.service_uuid
            ),
        }
        Ok(())
    }

    fn restart_advertising(&self) -> Result<()> {
        info!("Advertising restarted for multi-connection support");
        Ok(())
    }
}
