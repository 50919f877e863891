//! Zigbee Cluster Library names used by this device.
//!
//! Cluster names follow the zigbee-herdsman naming (`genPowerCfg`,
//! `msTemperatureMeasurement`, ...) so that messages and configuration
//! produced by the bridge can be deserialized directly.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// ZCL clusters referenced by the device definition.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
#[repr(u16)]
pub enum Cluster {
    #[serde(rename = "genBasic")]
    #[strum(serialize = "genBasic")]
    GenBasic = 0x0000,

    #[serde(rename = "genPowerCfg")]
    #[strum(serialize = "genPowerCfg")]
    GenPowerCfg = 0x0001,

    #[serde(rename = "genOnOff")]
    #[strum(serialize = "genOnOff")]
    GenOnOff = 0x0006,

    #[serde(rename = "msIlluminanceMeasurement")]
    #[strum(serialize = "msIlluminanceMeasurement")]
    MsIlluminanceMeasurement = 0x0400,

    #[serde(rename = "msTemperatureMeasurement")]
    #[strum(serialize = "msTemperatureMeasurement")]
    MsTemperatureMeasurement = 0x0402,

    #[serde(rename = "msPressureMeasurement")]
    #[strum(serialize = "msPressureMeasurement")]
    MsPressureMeasurement = 0x0403,

    #[serde(rename = "msRelativeHumidity")]
    #[strum(serialize = "msRelativeHumidity")]
    MsRelativeHumidity = 0x0405,

    #[serde(rename = "msOccupancySensing")]
    #[strum(serialize = "msOccupancySensing")]
    MsOccupancySensing = 0x0406,
}

impl Cluster {
    /// Numeric ZCL cluster id.
    pub fn id(self) -> u16 {
        self as u16
    }
}

/// Kind of ZCL frame a message was decoded from.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MessageType {
    /// Unsolicited report triggered by a reporting configuration
    AttributeReport,
    /// Answer to a read attributes request
    ReadResponse,
    /// Frame the host stack could not decode
    Raw,
}

/// Attribute names as they appear in message data.
pub mod attr {
    pub const MEASURED_VALUE: &str = "measuredValue";
    pub const SCALED_VALUE: &str = "scaledValue";
    pub const BATTERY_VOLTAGE: &str = "batteryVoltage";
    pub const BATTERY_PERCENTAGE_REMAINING: &str = "batteryPercentageRemaining";
    pub const BATTERY_ALARM_STATE: &str = "batteryAlarmState";
    pub const ON_OFF: &str = "onOff";
    pub const OCCUPANCY: &str = "occupancy";
    pub const OCCUPANCY_SENSOR_TYPE: &str = "occupancySensorType";
    pub const PIR_O_TO_U_DELAY: &str = "pirOToUDelay";
}
