use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub options: ConverterOptions,
}

/// Per-quantity rounding and calibration applied by the report converters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterOptions {
    pub temperature: PropertyOptions,
    pub humidity: PropertyOptions,
    pub pressure: PropertyOptions,
    pub illuminance: PropertyOptions,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyOptions {
    /// Decimal places kept; each converter has its own default
    pub precision: Option<u32>,
    /// Offset added to the value (a percentage for illuminance)
    pub calibration: Option<f64>,
}

impl Config {
    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Defaults overridden by environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides looked up through `lookup`.
    ///
    /// Unparsable values are rejected rather than ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let quantities = [
            ("TEMPERATURE", &mut self.options.temperature),
            ("HUMIDITY", &mut self.options.humidity),
            ("PRESSURE", &mut self.options.pressure),
            ("ILLUMINANCE", &mut self.options.illuminance),
        ];
        for (prefix, options) in quantities {
            if let Some(value) = parse_var(&lookup, &format!("{prefix}_PRECISION"))? {
                options.precision = Some(value);
            }
            if let Some(value) = parse_var(&lookup, &format!("{prefix}_CALIBRATION"))? {
                options.calibration = Some(value);
            }
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| BridgeError::InvalidConfig(format!("{key}={raw} is not a valid value"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(lookup(&[
                ("TEMPERATURE_PRECISION", "1"),
                ("TEMPERATURE_CALIBRATION", "-0.5"),
                ("ILLUMINANCE_CALIBRATION", "10"),
            ]))
            .unwrap();

        assert_eq!(config.options.temperature.precision, Some(1));
        assert_eq!(config.options.temperature.calibration, Some(-0.5));
        assert_eq!(config.options.illuminance.calibration, Some(10.0));
        assert_eq!(config.options.humidity, PropertyOptions::default());
    }

    #[test]
    fn test_env_rejects_garbage() {
        let mut config = Config::default();
        let err = config
            .apply_env(lookup(&[("HUMIDITY_PRECISION", "two")]))
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidConfig(_)));
    }

    #[test]
    fn test_reporting_intervals_are_not_configurable() {
        let mut config = Config::default();
        config
            .apply_env(lookup(&[
                ("REPORTING_MIN_INTERVAL", "10"),
                ("REPORTING_MAX_INTERVAL", "600"),
                ("REPORTING_CHANGE", "5"),
            ]))
            .unwrap();
        assert_eq!(config, Config::default());

        let config: Config =
            serde_json::from_str(r#"{"reporting":{"max_interval":600}}"#).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"options":{"pressure":{"precision":0}}}"#).unwrap();
        assert_eq!(config.options.pressure.precision, Some(0));
        assert_eq!(config.options.pressure.calibration, None);
        assert_eq!(config.options.temperature, PropertyOptions::default());
    }
}
