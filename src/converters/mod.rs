//! Converter interfaces between Zigbee messages and device state.
//!
//! - [`FromZigbee`] turns an incoming attribute report into state properties.
//! - [`ToZigbee`] turns a requested state change into endpoint requests.
//!
//! Both are object safe so a device definition can hold an ordered,
//! heterogeneous list of them.

mod endpoint_suffix;
pub mod from_zigbee;
pub mod to_zigbee;

pub use endpoint_suffix::{WithEndpointSuffix, suffix_keys};

use crate::config::{ConverterOptions, PropertyOptions};
use crate::devices::Meta;
use crate::error::{BridgeError, Result};
use crate::zigbee::{Cluster, Endpoint, Message, MessageType, Payload};
use async_trait::async_trait;
use serde_json::Value;

/// Message types handled by report converters.
pub const REPORT_TYPES: &[MessageType] =
    &[MessageType::AttributeReport, MessageType::ReadResponse];

/// Everything a report converter may look at.
pub struct ConvertContext<'a> {
    /// Metadata of the definition the converter belongs to
    pub meta: &'a Meta,
    pub message: &'a Message,
    /// Emits an out-of-band state update
    pub publish: &'a (dyn Fn(Payload) + Sync),
    pub options: &'a ConverterOptions,
    /// Last published state of the device
    pub state: &'a Payload,
}

/// Extracts semantic properties from an incoming message.
pub trait FromZigbee: Send + Sync {
    fn name(&self) -> &'static str;

    fn cluster(&self) -> Cluster;

    fn message_types(&self) -> &[MessageType];

    fn matches(&self, cluster: Cluster, msg_type: MessageType) -> bool {
        self.cluster() == cluster && self.message_types().contains(&msg_type)
    }

    /// `None` means there is nothing new to publish.
    fn convert(&self, ctx: &ConvertContext<'_>) -> Option<Payload>;
}

/// Applies a controller's state change to the device.
#[async_trait]
pub trait ToZigbee: Send + Sync {
    fn name(&self) -> &'static str;

    /// State keys this converter accepts.
    fn keys(&self) -> &[&'static str];

    /// Returns the state to publish once the device accepted the change.
    async fn convert_set(
        &self,
        endpoint: &dyn Endpoint,
        key: &str,
        value: &Value,
    ) -> Result<Option<Payload>>;

    async fn convert_get(&self, _endpoint: &dyn Endpoint, key: &str) -> Result<()> {
        Err(BridgeError::UnsupportedKey(key.to_string()))
    }
}

/// Round to `precision` decimal places.
pub fn precision_round(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Add the configured offset, then round.
pub fn calibrate_and_round(value: f64, options: &PropertyOptions, default_precision: u32) -> f64 {
    let calibrated = value + options.calibration.unwrap_or(0.0);
    precision_round(calibrated, options.precision.unwrap_or(default_precision))
}

/// JSON number that stays an integer when the value has no fraction.
pub fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}
