//! Sensor drivers.

pub mod temperature;

pub use temperature::TemperatureSensor;
