//! DIYRuZ devices.
//!
//! DIYRuZ_Motion is a DIY motion sensor with environment measurements,
//! <http://modkam.ru/?p=1700>. Endpoint layout:
//! - 1: battery, temperature, humidity, pressure, illuminance
//! - 2: contact input (reported through `genOnOff`)
//! - 3: PIR occupancy

use super::{Configure, Definition, DeviceInfo, Meta};
use crate::converters::from_zigbee::{
    Battery, DiyruzContact, Humidity, Illuminance, Occupancy, Pressure, Temperature,
};
use crate::converters::to_zigbee::{FactoryReset, OccupancyTimeout};
use crate::converters::{ConvertContext, FromZigbee, REPORT_TYPES};
use crate::error::{BridgeError, Result};
use crate::zigbee::{
    Cluster, Device, Endpoint, EndpointId, MessageType, Payload, ReportingConfig, attr,
};
use async_trait::async_trait;
use log::{debug, info};

pub const ZIGBEE_MODEL: &str = "DIYRuZ_Motion";

/// Bumped when the bind/reporting setup below changes.
pub const CONFIGURE_KEY: u32 = 1;

/// Reporting policy shared by every attribute. Changing it requires bumping
/// `CONFIGURE_KEY`.
pub const REPORT_MIN_INTERVAL: u16 = 0;
pub const REPORT_MAX_INTERVAL: u16 = 3600;
/// 0 reports on any change
pub const REPORTABLE_CHANGE: u32 = 0;

pub const ENVIRONMENT_ENDPOINT: EndpointId = 1;
pub const CONTACT_ENDPOINT: EndpointId = 2;
pub const OCCUPANCY_ENDPOINT: EndpointId = 3;

/// Clusters on the environment endpoint reporting a single `measuredValue`.
const MEASUREMENT_CLUSTERS: [Cluster; 4] = [
    Cluster::MsTemperatureMeasurement,
    Cluster::MsRelativeHumidity,
    Cluster::MsPressureMeasurement,
    Cluster::MsIlluminanceMeasurement,
];

/// `occupancySensorType` → `occupancy_sensor_type`, passed through as reported.
pub struct OccupancySensorType;

impl FromZigbee for OccupancySensorType {
    fn name(&self) -> &'static str {
        "occupancy_sensor_type"
    }

    fn cluster(&self) -> Cluster {
        Cluster::MsOccupancySensing
    }

    fn message_types(&self) -> &[MessageType] {
        REPORT_TYPES
    }

    fn convert(&self, ctx: &ConvertContext<'_>) -> Option<Payload> {
        let value = ctx.message.data.get(attr::OCCUPANCY_SENSOR_TYPE)?;
        let mut payload = Payload::new();
        payload.insert("occupancy_sensor_type".to_string(), value.clone());
        Some(payload)
    }
}

/// Binds every reporting cluster to the coordinator, then sets up reporting.
///
/// Requests go out one at a time; the first failure aborts the rest.
pub struct ConfigureMotion;

fn report(attribute: &str) -> ReportingConfig {
    ReportingConfig {
        attribute: attribute.to_string(),
        minimum_report_interval: REPORT_MIN_INTERVAL,
        maximum_report_interval: REPORT_MAX_INTERVAL,
        reportable_change: REPORTABLE_CHANGE,
    }
}

fn resolve(device: &dyn Device, id: EndpointId) -> Result<&dyn Endpoint> {
    device.endpoint(id).ok_or(BridgeError::MissingEndpoint(id))
}

async fn bind(endpoint: &dyn Endpoint, target: &dyn Endpoint, clusters: &[Cluster]) -> Result<()> {
    for &cluster in clusters {
        debug!(
            "[Configure] Binding {} (0x{:04x}) on endpoint {} to {}",
            cluster,
            cluster.id(),
            endpoint.id(),
            target.id()
        );
        endpoint.bind(cluster, target).await?;
    }
    Ok(())
}

#[async_trait]
impl Configure for ConfigureMotion {
    async fn configure(&self, device: &dyn Device, coordinator: &dyn Endpoint) -> Result<()> {
        let environment = resolve(device, ENVIRONMENT_ENDPOINT)?;
        let contact = resolve(device, CONTACT_ENDPOINT)?;
        let occupancy = resolve(device, OCCUPANCY_ENDPOINT)?;

        let mut environment_clusters = vec![Cluster::GenPowerCfg];
        environment_clusters.extend(MEASUREMENT_CLUSTERS);
        bind(environment, coordinator, &environment_clusters).await?;
        bind(contact, coordinator, &[Cluster::GenOnOff]).await?;
        bind(occupancy, coordinator, &[Cluster::MsOccupancySensing]).await?;

        environment
            .configure_reporting(
                Cluster::GenPowerCfg,
                &[
                    report(attr::BATTERY_VOLTAGE),
                    report(attr::BATTERY_PERCENTAGE_REMAINING),
                ],
            )
            .await?;

        let measured = [report(attr::MEASURED_VALUE)];
        for cluster in MEASUREMENT_CLUSTERS {
            environment.configure_reporting(cluster, &measured).await?;
        }

        contact
            .configure_reporting(Cluster::GenOnOff, &[report(attr::ON_OFF)])
            .await?;
        occupancy
            .configure_reporting(Cluster::MsOccupancySensing, &[report(attr::OCCUPANCY)])
            .await?;

        info!(
            "[Configure] {} binds and reporting set up (max interval {}s)",
            device.ieee_address(),
            REPORT_MAX_INTERVAL
        );
        Ok(())
    }
}

pub fn motion_definition() -> Definition {
    let info = DeviceInfo {
        zigbee_model: vec![ZIGBEE_MODEL.to_string()],
        model: "DIYRuZ_Motion".to_string(),
        vendor: "DIYRuZ".to_string(),
        description: "[Motion sensor](http://modkam.ru/?p=1700)".to_string(),
        supports: "temperature, humidity, illuminance, contact, pressure, battery, occupancy"
            .to_string(),
    };
    let meta = Meta {
        configure_key: CONFIGURE_KEY,
        multi_endpoint: true,
        ..Default::default()
    };

    Definition::new(info, meta)
        .with_from_zigbee(Temperature)
        .with_from_zigbee(Humidity)
        .with_from_zigbee(Illuminance)
        .with_from_zigbee(Pressure)
        .with_from_zigbee(Battery)
        .with_from_zigbee(DiyruzContact)
        .with_from_zigbee(Occupancy)
        .with_from_zigbee(OccupancySensorType)
        .with_to_zigbee(OccupancyTimeout)
        .with_to_zigbee(FactoryReset)
        .with_configure(ConfigureMotion)
}
