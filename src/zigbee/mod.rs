//! Zigbee-side data types and the capabilities this crate consumes.

mod cluster;
mod endpoint;
mod message;
pub mod recording;

pub use cluster::{Cluster, MessageType, attr};
pub use endpoint::{Device, Endpoint, EndpointId, ReportingConfig};
pub use message::{Message, Payload};
pub use recording::{Call, RecordingDevice, RecordingEndpoint};
