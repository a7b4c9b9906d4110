//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                 |
//! |------------|--------------------|-----------------------------|
//! | `hardware` | SensorPort         | ESP32 ADC (TMP36)           |
//! |            | ActuatorPort       | ESP32 LEDC PWM (RGB LED)    |
//! | `log_sink` | EventSink          | Serial log output           |
//! |            | DisplaySink        | Serial log (16×2 frame)     |
//! | `nvs`      | ConfigPort         | NVS / in-memory store       |
//! |            | PersistentStore    | 15-byte settings image      |
//! | `serial`   | ByteSource         | UART0 receive buffer        |
//! | `time`     | -                  | ESP32 system timer          |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod serial;
pub mod time;
