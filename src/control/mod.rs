//! Temperature → LED output shaping.

pub mod intensity;

pub use intensity::intensity;
