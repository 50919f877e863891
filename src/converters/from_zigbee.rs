//! Standard report converters for measurement and general clusters.
//!
//! Measurement clusters report fixed-point integers: temperature and humidity
//! in hundredths, pressure in hPa (or tenths of kPa as `scaledValue`),
//! illuminance as `10000 * log10(lux) + 1`.

use super::{ConvertContext, FromZigbee, REPORT_TYPES, calibrate_and_round, number_value};
use crate::zigbee::{Cluster, MessageType, Payload, attr};
use serde_json::Value;

fn single(key: &str, value: Value) -> Payload {
    let mut payload = Payload::new();
    payload.insert(key.to_string(), value);
    payload
}

/// `msTemperatureMeasurement` → `temperature` in °C.
pub struct Temperature;

impl FromZigbee for Temperature {
    fn name(&self) -> &'static str {
        "temperature"
    }

    fn cluster(&self) -> Cluster {
        Cluster::MsTemperatureMeasurement
    }

    fn message_types(&self) -> &[MessageType] {
        REPORT_TYPES
    }

    fn convert(&self, ctx: &ConvertContext<'_>) -> Option<Payload> {
        let raw = ctx.message.number(attr::MEASURED_VALUE)?;
        let celsius = calibrate_and_round(raw / 100.0, &ctx.options.temperature, 2);
        Some(single("temperature", number_value(celsius)))
    }
}

/// `msRelativeHumidity` → `humidity` in %.
///
/// Values outside 0..=100 after calibration are dropped.
pub struct Humidity;

impl FromZigbee for Humidity {
    fn name(&self) -> &'static str {
        "humidity"
    }

    fn cluster(&self) -> Cluster {
        Cluster::MsRelativeHumidity
    }

    fn message_types(&self) -> &[MessageType] {
        REPORT_TYPES
    }

    fn convert(&self, ctx: &ConvertContext<'_>) -> Option<Payload> {
        let raw = ctx.message.number(attr::MEASURED_VALUE)?;
        let percent = calibrate_and_round(raw / 100.0, &ctx.options.humidity, 2);
        (0.0..=100.0)
            .contains(&percent)
            .then(|| single("humidity", number_value(percent)))
    }
}

/// `msIlluminanceMeasurement` → raw `illuminance` and `illuminance_lux`.
///
/// Calibration is a percentage applied to both values.
pub struct Illuminance;

impl FromZigbee for Illuminance {
    fn name(&self) -> &'static str {
        "illuminance"
    }

    fn cluster(&self) -> Cluster {
        Cluster::MsIlluminanceMeasurement
    }

    fn message_types(&self) -> &[MessageType] {
        REPORT_TYPES
    }

    fn convert(&self, ctx: &ConvertContext<'_>) -> Option<Payload> {
        let raw = ctx.message.number(attr::MEASURED_VALUE)?;
        let options = &ctx.options.illuminance;
        let factor = 1.0 + options.calibration.unwrap_or(0.0) / 100.0;
        let precision = options.precision.unwrap_or(0);
        let round = |v: f64| number_value(super::precision_round(v * factor, precision));

        let lux = 10f64.powf((raw - 1.0) / 10000.0);
        let mut payload = single("illuminance", round(raw));
        payload.insert("illuminance_lux".to_string(), round(lux));
        Some(payload)
    }
}

/// `msPressureMeasurement` → `pressure` in hPa.
pub struct Pressure;

impl FromZigbee for Pressure {
    fn name(&self) -> &'static str {
        "pressure"
    }

    fn cluster(&self) -> Cluster {
        Cluster::MsPressureMeasurement
    }

    fn message_types(&self) -> &[MessageType] {
        REPORT_TYPES
    }

    fn convert(&self, ctx: &ConvertContext<'_>) -> Option<Payload> {
        let hpa = match ctx.message.number(attr::SCALED_VALUE) {
            Some(scaled) => scaled / 10.0,
            None => ctx.message.number(attr::MEASURED_VALUE)?,
        };
        let hpa = calibrate_and_round(hpa, &ctx.options.pressure, 1);
        Some(single("pressure", number_value(hpa)))
    }
}

/// `genPowerCfg` → `battery` (%), `voltage` (mV) and `battery_low`.
pub struct Battery;

impl Battery {
    /// Alarm bits 0-3 of each of the three battery sources.
    const ALARM_MASKS: [u64; 3] = [0xF, 0xF << 10, 0xF << 20];
}

impl FromZigbee for Battery {
    fn name(&self) -> &'static str {
        "battery"
    }

    fn cluster(&self) -> Cluster {
        Cluster::GenPowerCfg
    }

    fn message_types(&self) -> &[MessageType] {
        REPORT_TYPES
    }

    fn convert(&self, ctx: &ConvertContext<'_>) -> Option<Payload> {
        let mut payload = Payload::new();

        if let Some(remaining) = ctx.message.number(attr::BATTERY_PERCENTAGE_REMAINING) {
            // ZCL reports half-percent units; some firmwares report plain percent
            let percent = if ctx.meta.battery.dont_divide_percentage {
                remaining
            } else {
                remaining / 2.0
            };
            payload.insert(
                "battery".to_string(),
                number_value(super::precision_round(percent, 2)),
            );
        }

        if let Some(voltage) = ctx.message.number(attr::BATTERY_VOLTAGE) {
            // 100 mV units
            payload.insert("voltage".to_string(), number_value(voltage * 100.0));
        }

        if let Some(state) = ctx
            .message
            .data
            .get(attr::BATTERY_ALARM_STATE)
            .and_then(Value::as_u64)
        {
            let low = Self::ALARM_MASKS.iter().any(|mask| state & mask != 0);
            payload.insert("battery_low".to_string(), Value::Bool(low));
        }

        (!payload.is_empty()).then_some(payload)
    }
}

/// `genOnOff` on the contact endpoint → `contact`.
pub struct DiyruzContact;

impl FromZigbee for DiyruzContact {
    fn name(&self) -> &'static str {
        "diyruz_contact"
    }

    fn cluster(&self) -> Cluster {
        Cluster::GenOnOff
    }

    fn message_types(&self) -> &[MessageType] {
        REPORT_TYPES
    }

    fn convert(&self, ctx: &ConvertContext<'_>) -> Option<Payload> {
        let contact = match ctx.message.data.get(attr::ON_OFF)? {
            Value::Bool(on) => *on,
            other => other.as_f64()? != 0.0,
        };
        Some(single("contact", Value::Bool(contact)))
    }
}

/// `msOccupancySensing` → `occupancy` for sensors that report both motion
/// start and stop. Only bit 0 (occupied) of the bitmap is significant.
pub struct Occupancy;

impl FromZigbee for Occupancy {
    fn name(&self) -> &'static str {
        "occupancy"
    }

    fn cluster(&self) -> Cluster {
        Cluster::MsOccupancySensing
    }

    fn message_types(&self) -> &[MessageType] {
        REPORT_TYPES
    }

    fn convert(&self, ctx: &ConvertContext<'_>) -> Option<Payload> {
        let bitmap = ctx.message.data.get(attr::OCCUPANCY)?.as_u64()?;
        Some(single("occupancy", Value::Bool(bitmap & 0x01 != 0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConverterOptions, PropertyOptions};
    use crate::devices::Meta;
    use crate::zigbee::Message;
    use serde_json::json;

    fn convert_with(
        converter: &dyn FromZigbee,
        message: &Message,
        meta: &Meta,
        options: &ConverterOptions,
    ) -> Option<Payload> {
        let state = Payload::new();
        let publish = |_: Payload| {};
        converter.convert(&ConvertContext {
            meta,
            message,
            publish: &publish,
            options,
            state: &state,
        })
    }

    fn convert(converter: &dyn FromZigbee, message: &Message) -> Option<Payload> {
        convert_with(converter, message, &Meta::default(), &ConverterOptions::default())
    }

    #[test]
    fn test_temperature_scaling_and_options() {
        let msg = Message::report(
            Cluster::MsTemperatureMeasurement,
            1,
            json!({"measuredValue": 2156}),
        );
        assert_eq!(
            convert(&Temperature, &msg).unwrap()["temperature"],
            json!(21.56)
        );

        let options = ConverterOptions {
            temperature: PropertyOptions {
                precision: Some(1),
                calibration: Some(-1.5),
            },
            ..Default::default()
        };
        let payload = convert_with(&Temperature, &msg, &Meta::default(), &options).unwrap();
        assert_eq!(payload["temperature"], json!(20.1));
    }

    #[test]
    fn test_temperature_without_value() {
        let msg = Message::report(
            Cluster::MsTemperatureMeasurement,
            1,
            json!({"tolerance": 10}),
        );
        assert_eq!(convert(&Temperature, &msg), None);
    }

    #[test]
    fn test_humidity_drops_out_of_range_values() {
        let msg = Message::report(
            Cluster::MsRelativeHumidity,
            1,
            json!({"measuredValue": 4550}),
        );
        assert_eq!(convert(&Humidity, &msg).unwrap()["humidity"], json!(45.5));

        let msg = Message::report(
            Cluster::MsRelativeHumidity,
            1,
            json!({"measuredValue": 10400}),
        );
        assert_eq!(convert(&Humidity, &msg), None);
    }

    #[test]
    fn test_illuminance_reports_raw_and_lux() {
        let msg = Message::report(
            Cluster::MsIlluminanceMeasurement,
            1,
            json!({"measuredValue": 30001}),
        );
        let payload = convert(&Illuminance, &msg).unwrap();
        assert_eq!(payload["illuminance"], json!(30001));
        assert_eq!(payload["illuminance_lux"], json!(1000));

        let options = ConverterOptions {
            illuminance: PropertyOptions {
                precision: None,
                calibration: Some(10.0),
            },
            ..Default::default()
        };
        let payload = convert_with(&Illuminance, &msg, &Meta::default(), &options).unwrap();
        assert_eq!(payload["illuminance_lux"], json!(1100));
    }

    #[test]
    fn test_pressure_prefers_scaled_value() {
        let msg = Message::report(
            Cluster::MsPressureMeasurement,
            1,
            json!({"measuredValue": 1013, "scaledValue": 10132}),
        );
        assert_eq!(convert(&Pressure, &msg).unwrap()["pressure"], json!(1013.2));

        let msg = Message::report(
            Cluster::MsPressureMeasurement,
            1,
            json!({"measuredValue": 998}),
        );
        assert_eq!(convert(&Pressure, &msg).unwrap()["pressure"], json!(998));
    }

    #[test]
    fn test_battery_percentage_and_voltage() {
        let msg = Message::report(
            Cluster::GenPowerCfg,
            1,
            json!({"batteryPercentageRemaining": 171, "batteryVoltage": 29}),
        );
        let payload = convert(&Battery, &msg).unwrap();
        assert_eq!(payload["battery"], json!(85.5));
        assert_eq!(payload["voltage"], json!(2900));
        assert!(!payload.contains_key("battery_low"));

        let mut meta = Meta::default();
        meta.battery.dont_divide_percentage = true;
        let payload = convert_with(&Battery, &msg, &meta, &ConverterOptions::default()).unwrap();
        assert_eq!(payload["battery"], json!(171));
    }

    #[test]
    fn test_battery_alarm_bit_groups() {
        let cases = [
            (0u64, false),
            (0x2, true),
            (0x1 << 11, true),
            (0x8 << 20, true),
            (0x10, false),
        ];
        for (state, low) in cases {
            let msg = Message::report(Cluster::GenPowerCfg, 1, json!({"batteryAlarmState": state}));
            let payload = convert(&Battery, &msg).unwrap();
            assert_eq!(payload["battery_low"], json!(low), "alarm state {state:#x}");
        }
    }

    #[test]
    fn test_battery_without_known_attributes() {
        let msg = Message::report(Cluster::GenPowerCfg, 1, json!({"mainsVoltage": 230}));
        assert_eq!(convert(&Battery, &msg), None);
    }

    #[test]
    fn test_contact_from_on_off() {
        let closed = Message::report(Cluster::GenOnOff, 2, json!({"onOff": 1}));
        let open = Message::report(Cluster::GenOnOff, 2, json!({"onOff": 0}));
        let boolean = Message::report(Cluster::GenOnOff, 2, json!({"onOff": true}));
        assert_eq!(
            convert(&DiyruzContact, &closed).unwrap()["contact"],
            json!(true)
        );
        assert_eq!(
            convert(&DiyruzContact, &open).unwrap()["contact"],
            json!(false)
        );
        assert_eq!(
            convert(&DiyruzContact, &boolean).unwrap()["contact"],
            json!(true)
        );
    }

    #[test]
    fn test_occupancy_bit_zero() {
        let occupied = Message::report(Cluster::MsOccupancySensing, 3, json!({"occupancy": 1}));
        let vacant = Message::report(Cluster::MsOccupancySensing, 3, json!({"occupancy": 0}));
        let sensor_type_only = Message::report(
            Cluster::MsOccupancySensing,
            3,
            json!({"occupancySensorType": 0}),
        );
        assert_eq!(
            convert(&Occupancy, &occupied).unwrap()["occupancy"],
            json!(true)
        );
        assert_eq!(
            convert(&Occupancy, &vacant).unwrap()["occupancy"],
            json!(false)
        );
        assert_eq!(convert(&Occupancy, &sensor_type_only), None);

        // Reserved bits do not affect the occupied flag
        for (bits, occupied) in [(3, true), (2, false), (0xfe, false)] {
            let msg = Message::report(Cluster::MsOccupancySensing, 3, json!({"occupancy": bits}));
            assert_eq!(
                convert(&Occupancy, &msg).unwrap()["occupancy"],
                json!(occupied)
            );
        }
    }

    #[test]
    fn test_triggers() {
        assert!(Occupancy.matches(Cluster::MsOccupancySensing, MessageType::ReadResponse));
        assert!(!Occupancy.matches(Cluster::MsOccupancySensing, MessageType::Raw));
        assert!(!Battery.matches(Cluster::GenOnOff, MessageType::AttributeReport));
    }
}
