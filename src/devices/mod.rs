//! Device definitions: which converters apply to a device model and how the
//! device is configured after joining.

pub mod diyruz;

use crate::config::ConverterOptions;
use crate::converters::{ConvertContext, FromZigbee, ToZigbee, WithEndpointSuffix, suffix_keys};
use crate::error::{BridgeError, Result};
use crate::zigbee::{Device, Endpoint, EndpointId, Message, Payload};
use async_trait::async_trait;
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

/// Endpoint used for commands that do not name one.
pub const DEFAULT_ENDPOINT: EndpointId = 1;

/// Descriptive attributes. No behavior depends on them except `zigbee_model`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    /// Model identifiers reported by the device's basic cluster
    pub zigbee_model: Vec<String>,
    pub model: String,
    pub vendor: String,
    pub description: String,
    /// Free-text capability summary
    pub supports: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Meta {
    /// Bumped whenever the configure routine changes, forcing devices that
    /// were configured with an older key to be configured again
    pub configure_key: u32,
    /// Report keys are suffixed with the source endpoint id
    pub multi_endpoint: bool,
    pub battery: BatteryMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatteryMeta {
    /// Firmware reports 0..100 instead of the ZCL 0..200
    pub dont_divide_percentage: bool,
}

/// Bind and reporting setup run once per device instance.
///
/// Implementations must be idempotent and must issue their requests
/// sequentially, stopping at the first failure.
#[async_trait]
pub trait Configure: Send + Sync {
    async fn configure(&self, device: &dyn Device, coordinator: &dyn Endpoint) -> Result<()>;
}

/// A device model's converters, metadata and configure routine.
pub struct Definition {
    pub info: DeviceInfo,
    pub meta: Meta,
    from_zigbee: Vec<Box<dyn FromZigbee>>,
    to_zigbee: Vec<Box<dyn ToZigbee>>,
    configure: Option<Box<dyn Configure>>,
}

/// Serializable view of a definition.
#[derive(Debug, Serialize)]
pub struct DefinitionSummary<'a> {
    #[serde(flatten)]
    pub info: &'a DeviceInfo,
    pub from_zigbee: Vec<&'static str>,
    pub to_zigbee: Vec<&'static str>,
    pub meta: &'a Meta,
    pub configurable: bool,
}

impl Definition {
    pub fn new(info: DeviceInfo, meta: Meta) -> Self {
        Self {
            info,
            meta,
            from_zigbee: Vec::new(),
            to_zigbee: Vec::new(),
            configure: None,
        }
    }

    /// Append a report converter. On multi-endpoint definitions it is wrapped
    /// so its keys carry the source endpoint.
    pub fn with_from_zigbee<C: FromZigbee + 'static>(mut self, converter: C) -> Self {
        let converter: Box<dyn FromZigbee> = if self.meta.multi_endpoint {
            Box::new(WithEndpointSuffix::new(converter))
        } else {
            Box::new(converter)
        };
        self.from_zigbee.push(converter);
        self
    }

    pub fn with_to_zigbee<C: ToZigbee + 'static>(mut self, converter: C) -> Self {
        self.to_zigbee.push(Box::new(converter));
        self
    }

    pub fn with_configure<C: Configure + 'static>(mut self, configure: C) -> Self {
        self.configure = Some(Box::new(configure));
        self
    }

    pub fn from_zigbee(&self) -> &[Box<dyn FromZigbee>] {
        &self.from_zigbee
    }

    pub fn to_zigbee(&self) -> &[Box<dyn ToZigbee>] {
        &self.to_zigbee
    }

    pub fn matches_model(&self, zigbee_model: &str) -> bool {
        self.info.zigbee_model.iter().any(|m| m == zigbee_model)
    }

    pub fn summary(&self) -> DefinitionSummary<'_> {
        DefinitionSummary {
            info: &self.info,
            from_zigbee: self.from_zigbee.iter().map(|c| c.name()).collect(),
            to_zigbee: self.to_zigbee.iter().map(|c| c.name()).collect(),
            meta: &self.meta,
            configurable: self.configure.is_some(),
        }
    }

    /// Run every report converter triggered by `message`, in list order, and
    /// merge their results.
    ///
    /// When several converters produce the same key the one listed last wins.
    /// An empty result means there is nothing new to publish.
    pub fn convert_message(
        &self,
        message: &Message,
        options: &ConverterOptions,
        state: &Payload,
        publish: &(dyn Fn(Payload) + Sync),
    ) -> Payload {
        let ctx = ConvertContext {
            meta: &self.meta,
            message,
            publish,
            options,
            state,
        };

        let mut merged = Payload::new();
        for converter in self
            .from_zigbee
            .iter()
            .filter(|c| c.matches(message.cluster, message.msg_type))
        {
            if let Some(payload) = converter.convert(&ctx) {
                debug!(
                    "[Convert] {} on {}/{} produced {:?}",
                    converter.name(),
                    message.cluster,
                    message.endpoint,
                    payload
                );
                merged.extend(payload);
            }
        }
        merged
    }

    /// Apply a state change requested by a controller.
    ///
    /// On multi-endpoint definitions `key_<n>` targets endpoint `n` and the
    /// returned state keys carry the same suffix.
    pub async fn set(
        &self,
        device: &dyn Device,
        key: &str,
        value: &Value,
    ) -> Result<Option<Payload>> {
        let (base, endpoint_id) = self.split_endpoint(key);
        let converter = self.to_zigbee_for(base)?;
        let id = endpoint_id.unwrap_or(DEFAULT_ENDPOINT);
        let endpoint = device.endpoint(id).ok_or(BridgeError::MissingEndpoint(id))?;

        info!(
            "[Command] {} set {} on endpoint {}",
            device.ieee_address(),
            base,
            endpoint.id()
        );
        let state = converter.convert_set(endpoint, base, value).await?;
        Ok(match endpoint_id {
            Some(id) => state.map(|s| suffix_keys(s, id)),
            None => state,
        })
    }

    /// Ask the device to report the current value of `key`.
    pub async fn get(&self, device: &dyn Device, key: &str) -> Result<()> {
        let (base, endpoint_id) = self.split_endpoint(key);
        let converter = self.to_zigbee_for(base)?;
        let id = endpoint_id.unwrap_or(DEFAULT_ENDPOINT);
        let endpoint = device.endpoint(id).ok_or(BridgeError::MissingEndpoint(id))?;
        converter.convert_get(endpoint, base).await
    }

    fn to_zigbee_for(&self, key: &str) -> Result<&dyn ToZigbee> {
        self.to_zigbee
            .iter()
            .find(|c| c.keys().contains(&key))
            .map(|c| &**c)
            .ok_or_else(|| BridgeError::UnsupportedKey(key.to_string()))
    }

    fn split_endpoint<'k>(&self, key: &'k str) -> (&'k str, Option<EndpointId>) {
        if self.meta.multi_endpoint
            && let Some((base, suffix)) = key.rsplit_once('_')
            && let Ok(id) = suffix.parse::<EndpointId>()
        {
            return (base, Some(id));
        }
        (key, None)
    }

    /// True when a device configured with `stored_key` must be configured again.
    pub fn needs_configure(&self, stored_key: Option<u32>) -> bool {
        self.configure.is_some() && stored_key != Some(self.meta.configure_key)
    }

    /// Run the configure routine unconditionally.
    pub async fn configure(&self, device: &dyn Device, coordinator: &dyn Endpoint) -> Result<()> {
        match &self.configure {
            Some(routine) => routine.configure(device, coordinator).await,
            None => Ok(()),
        }
    }

    /// Run the configure routine if `stored_key` is stale.
    ///
    /// Returns the key to persist for the device after a successful run, or
    /// `None` when nothing ran. On failure the stored key must stay as it was
    /// so the next reconnect retries.
    pub async fn configure_if_stale(
        &self,
        device: &dyn Device,
        coordinator: &dyn Endpoint,
        stored_key: Option<u32>,
    ) -> Result<Option<u32>> {
        if !self.needs_configure(stored_key) {
            debug!(
                "[Configure] {} already configured with key {:?}",
                device.ieee_address(),
                stored_key
            );
            return Ok(None);
        }

        info!(
            "[Configure] Configuring {} ({}), stored key {:?}, current key {}",
            device.ieee_address(),
            self.info.model,
            stored_key,
            self.meta.configure_key
        );
        self.configure(device, coordinator).await?;
        info!("[Configure] {} configured", device.ieee_address());
        Ok(Some(self.meta.configure_key))
    }
}

/// All built-in definitions, built on first use.
pub fn definitions() -> &'static [Definition] {
    static DEFINITIONS: OnceLock<Vec<Definition>> = OnceLock::new();
    DEFINITIONS.get_or_init(|| vec![diyruz::motion_definition()])
}

/// Definition matching a model identifier reported by a device.
pub fn find_by_zigbee_model(zigbee_model: &str) -> Option<&'static Definition> {
    definitions().iter().find(|d| d.matches_model(zigbee_model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::from_zigbee::Temperature;
    use crate::converters::{REPORT_TYPES, to_zigbee::OccupancyTimeout};
    use crate::zigbee::{Call, Cluster, MessageType, RecordingDevice};
    use serde_json::json;

    /// Reports a constant temperature for any temperature message.
    struct Constant(f64);

    impl FromZigbee for Constant {
        fn name(&self) -> &'static str {
            "constant"
        }

        fn cluster(&self) -> Cluster {
            Cluster::MsTemperatureMeasurement
        }

        fn message_types(&self) -> &[MessageType] {
            REPORT_TYPES
        }

        fn convert(&self, _ctx: &ConvertContext<'_>) -> Option<Payload> {
            let mut payload = Payload::new();
            payload.insert("temperature".into(), json!(self.0));
            Some(payload)
        }
    }

    fn info() -> DeviceInfo {
        DeviceInfo {
            zigbee_model: vec!["TEST".into()],
            model: "TEST".into(),
            vendor: "Test".into(),
            description: "test device".into(),
            supports: "temperature".into(),
        }
    }

    fn convert(definition: &Definition, message: &Message) -> Payload {
        definition.convert_message(
            message,
            &ConverterOptions::default(),
            &Payload::new(),
            &|_: Payload| {},
        )
    }

    #[test]
    fn test_last_converter_in_list_wins() {
        let definition = Definition::new(info(), Meta::default())
            .with_from_zigbee(Temperature)
            .with_from_zigbee(Constant(99.5));
        let msg = Message::report(
            Cluster::MsTemperatureMeasurement,
            1,
            json!({"measuredValue": 2000}),
        );
        assert_eq!(convert(&definition, &msg)["temperature"], json!(99.5));

        let reversed = Definition::new(info(), Meta::default())
            .with_from_zigbee(Constant(99.5))
            .with_from_zigbee(Temperature);
        assert_eq!(convert(&reversed, &msg)["temperature"], json!(20));
    }

    #[test]
    fn test_unmatched_message_yields_nothing() {
        let definition = Definition::new(info(), Meta::default()).with_from_zigbee(Temperature);
        let msg = Message::report(Cluster::GenOnOff, 1, json!({"onOff": 1}));
        assert!(convert(&definition, &msg).is_empty());
    }

    #[test]
    fn test_multi_endpoint_wraps_converters() {
        let meta = Meta {
            multi_endpoint: true,
            ..Default::default()
        };
        let definition = Definition::new(info(), meta).with_from_zigbee(Temperature);
        let msg = Message::report(
            Cluster::MsTemperatureMeasurement,
            2,
            json!({"measuredValue": 2100}),
        );
        let payload = convert(&definition, &msg);
        assert_eq!(payload.len(), 1);
        assert_eq!(payload["temperature_2"], json!(21));
    }

    #[tokio::test]
    async fn test_set_routes_by_endpoint_suffix() {
        let meta = Meta {
            multi_endpoint: true,
            ..Default::default()
        };
        let definition = Definition::new(info(), meta).with_to_zigbee(OccupancyTimeout);
        let device = RecordingDevice::new("0x01", &[1, 3]);

        let state = definition
            .set(&device, "occupancy_timeout_3", &json!(30))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state["occupancy_timeout_3"], json!(30));

        let state = definition
            .set(&device, "occupancy_timeout", &json!(45))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state["occupancy_timeout"], json!(45));

        let endpoints: Vec<_> = device.calls().iter().map(Call::endpoint).collect();
        assert_eq!(endpoints, vec![3, DEFAULT_ENDPOINT]);
    }

    #[tokio::test]
    async fn test_set_errors() {
        let meta = Meta {
            multi_endpoint: true,
            ..Default::default()
        };
        let definition = Definition::new(info(), meta).with_to_zigbee(OccupancyTimeout);
        let device = RecordingDevice::new("0x01", &[1]);

        let err = definition.set(&device, "brightness", &json!(1)).await.unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedKey(_)));

        let err = definition
            .set(&device, "occupancy_timeout_7", &json!(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::MissingEndpoint(7)));
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_needs_configure_without_routine() {
        let definition = Definition::new(info(), Meta::default());
        assert!(!definition.needs_configure(None));
        assert!(!definition.summary().configurable);
    }
}
