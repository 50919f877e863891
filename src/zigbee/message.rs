//! Decoded ZCL messages as handed over by the host stack.

use super::{Cluster, EndpointId, MessageType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property name to value mapping produced by converters and published as
/// device state.
pub type Payload = Map<String, Value>;

/// A decoded attribute report or read response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Cluster the frame belongs to
    pub cluster: Cluster,

    /// Frame kind
    #[serde(rename = "type")]
    pub msg_type: MessageType,

    /// Source endpoint on the device
    pub endpoint: EndpointId,

    /// Attribute name to value
    #[serde(default)]
    pub data: Payload,
}

impl Message {
    /// Numeric attribute value, if present.
    pub fn number(&self, attribute: &str) -> Option<f64> {
        self.data.get(attribute).and_then(Value::as_f64)
    }
}

#[cfg(test)]
impl Message {
    /// Attribute report built from a JSON object literal.
    pub(crate) fn report(cluster: Cluster, endpoint: EndpointId, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Payload::new(),
        };
        Self {
            cluster,
            msg_type: MessageType::AttributeReport,
            endpoint,
            data,
        }
    }

    pub(crate) fn has(&self, attribute: &str) -> bool {
        self.data.contains_key(attribute)
    }
}
