//! Command converters for settings a controller may change.

use super::ToZigbee;
use crate::error::{BridgeError, Result};
use crate::zigbee::{Cluster, Endpoint, Payload, attr};
use async_trait::async_trait;
use log::info;
use serde_json::{Value, json};

/// Delay before the occupancy sensor falls back to unoccupied.
pub struct OccupancyTimeout;

impl OccupancyTimeout {
    /// Accepts a number or a numeric string, in seconds.
    fn seconds(key: &str, value: &Value) -> Result<u16> {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let invalid = |reason: &str| BridgeError::InvalidValue {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        let seconds = number.ok_or_else(|| invalid("expected a number of seconds"))?;
        if seconds.fract() != 0.0 || !(0.0..=f64::from(u16::MAX)).contains(&seconds) {
            return Err(invalid("expected a whole number between 0 and 65535"));
        }
        Ok(seconds as u16)
    }
}

#[async_trait]
impl ToZigbee for OccupancyTimeout {
    fn name(&self) -> &'static str {
        "occupancy_timeout"
    }

    fn keys(&self) -> &[&'static str] {
        &["occupancy_timeout"]
    }

    async fn convert_set(
        &self,
        endpoint: &dyn Endpoint,
        key: &str,
        value: &Value,
    ) -> Result<Option<Payload>> {
        let seconds = Self::seconds(key, value)?;

        let mut attributes = Payload::new();
        attributes.insert(attr::PIR_O_TO_U_DELAY.to_string(), json!(seconds));
        endpoint
            .write(Cluster::MsOccupancySensing, attributes)
            .await?;

        let mut state = Payload::new();
        state.insert("occupancy_timeout".to_string(), json!(seconds));
        Ok(Some(state))
    }

    async fn convert_get(&self, endpoint: &dyn Endpoint, _key: &str) -> Result<()> {
        endpoint
            .read(Cluster::MsOccupancySensing, &[attr::PIR_O_TO_U_DELAY])
            .await?;
        Ok(())
    }
}

/// Restores the device to factory defaults. The device leaves the network.
pub struct FactoryReset;

#[async_trait]
impl ToZigbee for FactoryReset {
    fn name(&self) -> &'static str {
        "factory_reset"
    }

    fn keys(&self) -> &[&'static str] {
        &["reset"]
    }

    async fn convert_set(
        &self,
        endpoint: &dyn Endpoint,
        _key: &str,
        _value: &Value,
    ) -> Result<Option<Payload>> {
        info!("[Command] Factory reset requested on endpoint {}", endpoint.id());
        endpoint
            .command(Cluster::GenBasic, "resetFactDefault", Payload::new())
            .await?;
        Ok(None)
    }
}
