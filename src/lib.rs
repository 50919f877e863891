//! DIYRuZ_Motion device support library.
//!
//! This library provides the converters, device definition and configure
//! routine the Zigbee bridge uses for the DIYRuZ_Motion sensor.

pub mod config;
pub mod converters;
pub mod devices;
pub mod error;
pub mod zigbee;
