//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                    |
//! |------------|--------------------|--------------------------------|
//! | `log_sink` | EventSink          | Serial log output              |
//! | `nvs`      | PreferencePort     | NVS / in-memory store          |
//! |            | ConfigPort         |                                |
//! | `reading`  | VoltageSource      | Lock-free cell fed by an       |
//! |            | TemperatureSource  | acquisition task               |

pub mod log_sink;
pub mod nvs;
pub mod reading;
