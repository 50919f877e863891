//! Device and endpoint capabilities supplied by the host stack.
//!
//! The bridge owns the real implementations (radio, transport, retries,
//! timeouts). This crate only calls into them.

use super::{Cluster, Payload};
use crate::error::ZigbeeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Numeric endpoint identifier within a device.
pub type EndpointId = u8;

/// Reporting thresholds for one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingConfig {
    pub attribute: String,
    /// Seconds
    pub minimum_report_interval: u16,
    /// Seconds
    pub maximum_report_interval: u16,
    pub reportable_change: u32,
}

/// An addressable endpoint of a remote device (or of the coordinator).
///
/// Every method suspends until the device or transport confirms completion.
#[async_trait]
pub trait Endpoint: Send + Sync {
    fn id(&self) -> EndpointId;

    /// Create a bind on this endpoint routing `cluster` reports to `target`.
    async fn bind(&self, cluster: Cluster, target: &dyn Endpoint) -> Result<(), ZigbeeError>;

    async fn configure_reporting(
        &self,
        cluster: Cluster,
        items: &[ReportingConfig],
    ) -> Result<(), ZigbeeError>;

    /// Read attributes. The values arrive later as a `readResponse` message;
    /// the returned payload is whatever the stack answered synchronously.
    async fn read(&self, cluster: Cluster, attributes: &[&str]) -> Result<Payload, ZigbeeError>;

    async fn write(&self, cluster: Cluster, attributes: Payload) -> Result<(), ZigbeeError>;

    async fn command(
        &self,
        cluster: Cluster,
        command: &str,
        payload: Payload,
    ) -> Result<(), ZigbeeError>;
}

/// A joined physical device.
pub trait Device: Send + Sync {
    fn ieee_address(&self) -> &str;

    fn endpoint(&self, id: EndpointId) -> Option<&dyn Endpoint>;
}
