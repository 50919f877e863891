use crate::zigbee::{Cluster, EndpointId};
use thiserror::Error as ThisError;

/// Failure reported by an endpoint implementation (network stack, transport).
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ZigbeeError {
    #[error("Bind of {cluster} on endpoint {endpoint} failed: {reason}")]
    BindFailed {
        endpoint: EndpointId,
        cluster: Cluster,
        reason: String,
    },

    #[error("Configure reporting of {cluster} on endpoint {endpoint} failed: {reason}")]
    ConfigureReportingFailed {
        endpoint: EndpointId,
        cluster: Cluster,
        reason: String,
    },

    #[error("Read of {cluster} on endpoint {endpoint} failed: {reason}")]
    ReadFailed {
        endpoint: EndpointId,
        cluster: Cluster,
        reason: String,
    },

    #[error("Write of {cluster} on endpoint {endpoint} failed: {reason}")]
    WriteFailed {
        endpoint: EndpointId,
        cluster: Cluster,
        reason: String,
    },

    #[error("Command {command} on {cluster} endpoint {endpoint} failed: {reason}")]
    CommandFailed {
        endpoint: EndpointId,
        cluster: Cluster,
        command: String,
        reason: String,
    },
}

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("Device has no endpoint {0}")]
    MissingEndpoint(EndpointId),

    #[error("No converter handles key: {0}")]
    UnsupportedKey(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Zigbee(#[from] ZigbeeError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
