//! In-memory device that records every call made against it.
//!
//! Used by the `plan` command for dry runs and by tests. A failure can be
//! injected at a given call index to exercise abort paths; the failing call
//! is still recorded.

use super::{Cluster, Device, Endpoint, EndpointId, Payload, ReportingConfig};
use crate::error::ZigbeeError;
use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// One request issued to a recording endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Call {
    Bind {
        endpoint: EndpointId,
        cluster: Cluster,
        target: EndpointId,
    },
    ConfigureReporting {
        endpoint: EndpointId,
        cluster: Cluster,
        items: Vec<ReportingConfig>,
    },
    Read {
        endpoint: EndpointId,
        cluster: Cluster,
        attributes: Vec<String>,
    },
    Write {
        endpoint: EndpointId,
        cluster: Cluster,
        attributes: Payload,
    },
    Command {
        endpoint: EndpointId,
        cluster: Cluster,
        command: String,
        payload: Payload,
    },
}

impl Call {
    pub fn endpoint(&self) -> EndpointId {
        match self {
            Call::Bind { endpoint, .. }
            | Call::ConfigureReporting { endpoint, .. }
            | Call::Read { endpoint, .. }
            | Call::Write { endpoint, .. }
            | Call::Command { endpoint, .. } => *endpoint,
        }
    }

    pub fn cluster(&self) -> Cluster {
        match self {
            Call::Bind { cluster, .. }
            | Call::ConfigureReporting { cluster, .. }
            | Call::Read { cluster, .. }
            | Call::Write { cluster, .. }
            | Call::Command { cluster, .. } => *cluster,
        }
    }

    fn failure(&self) -> ZigbeeError {
        let reason = "injected failure".to_string();
        match self.clone() {
            Call::Bind {
                endpoint, cluster, ..
            } => ZigbeeError::BindFailed {
                endpoint,
                cluster,
                reason,
            },
            Call::ConfigureReporting {
                endpoint, cluster, ..
            } => ZigbeeError::ConfigureReportingFailed {
                endpoint,
                cluster,
                reason,
            },
            Call::Read {
                endpoint, cluster, ..
            } => ZigbeeError::ReadFailed {
                endpoint,
                cluster,
                reason,
            },
            Call::Write {
                endpoint, cluster, ..
            } => ZigbeeError::WriteFailed {
                endpoint,
                cluster,
                reason,
            },
            Call::Command {
                endpoint,
                cluster,
                command,
                ..
            } => ZigbeeError::CommandFailed {
                endpoint,
                cluster,
                command,
                reason,
            },
        }
    }
}

#[derive(Default)]
struct Journal {
    calls: Mutex<Vec<Call>>,
    fail_at: Mutex<Option<usize>>,
}

impl Journal {
    fn record(&self, call: Call) -> Result<(), ZigbeeError> {
        let mut calls = self.calls.lock();
        let index = calls.len();
        debug!("[Recording] #{} {:?}", index, call);
        let result = match *self.fail_at.lock() {
            Some(n) if n == index => Err(call.failure()),
            _ => Ok(()),
        };
        calls.push(call);
        result
    }
}

/// Endpoint that appends every request to a shared journal.
pub struct RecordingEndpoint {
    id: EndpointId,
    journal: Arc<Journal>,
}

impl RecordingEndpoint {
    /// Stand-alone endpoint, typically used as the coordinator bind target.
    pub fn coordinator() -> Self {
        Self {
            id: 1,
            journal: Arc::new(Journal::default()),
        }
    }

    /// Calls made on this endpoint's journal.
    pub fn calls(&self) -> Vec<Call> {
        self.journal.calls.lock().clone()
    }
}

#[async_trait]
impl Endpoint for RecordingEndpoint {
    fn id(&self) -> EndpointId {
        self.id
    }

    async fn bind(&self, cluster: Cluster, target: &dyn Endpoint) -> Result<(), ZigbeeError> {
        self.journal.record(Call::Bind {
            endpoint: self.id,
            cluster,
            target: target.id(),
        })
    }

    async fn configure_reporting(
        &self,
        cluster: Cluster,
        items: &[ReportingConfig],
    ) -> Result<(), ZigbeeError> {
        self.journal.record(Call::ConfigureReporting {
            endpoint: self.id,
            cluster,
            items: items.to_vec(),
        })
    }

    async fn read(&self, cluster: Cluster, attributes: &[&str]) -> Result<Payload, ZigbeeError> {
        self.journal.record(Call::Read {
            endpoint: self.id,
            cluster,
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        })?;
        Ok(Payload::new())
    }

    async fn write(&self, cluster: Cluster, attributes: Payload) -> Result<(), ZigbeeError> {
        self.journal.record(Call::Write {
            endpoint: self.id,
            cluster,
            attributes,
        })
    }

    async fn command(
        &self,
        cluster: Cluster,
        command: &str,
        payload: Payload,
    ) -> Result<(), ZigbeeError> {
        self.journal.record(Call::Command {
            endpoint: self.id,
            cluster,
            command: command.to_string(),
            payload,
        })
    }
}

/// Device whose endpoints share one journal, so call order across endpoints
/// is preserved.
pub struct RecordingDevice {
    ieee_address: String,
    endpoints: Vec<RecordingEndpoint>,
    journal: Arc<Journal>,
}

impl RecordingDevice {
    pub fn new(ieee_address: impl Into<String>, endpoint_ids: &[EndpointId]) -> Self {
        let journal = Arc::new(Journal::default());
        let endpoints = endpoint_ids
            .iter()
            .map(|&id| RecordingEndpoint {
                id,
                journal: journal.clone(),
            })
            .collect();
        Self {
            ieee_address: ieee_address.into(),
            endpoints,
            journal,
        }
    }

    /// Make the call with the given zero-based index fail.
    pub fn fail_at(self, index: usize) -> Self {
        *self.journal.fail_at.lock() = Some(index);
        self
    }

    /// Remove any injected failure.
    pub fn heal(&self) {
        *self.journal.fail_at.lock() = None;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.journal.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.journal.calls.lock().clear();
    }
}

impl Device for RecordingDevice {
    fn ieee_address(&self) -> &str {
        &self.ieee_address
    }

    fn endpoint(&self, id: EndpointId) -> Option<&dyn Endpoint> {
        self.endpoints
            .iter()
            .find(|ep| ep.id == id)
            .map(|ep| ep as &dyn Endpoint)
    }
}
