//! Core types for telemetry data representation.
//!
//! The type system maps directly to iRacing SDK structures:
//! - [`VariableType`] maps to iRacing's `irsdk_VarType` enum with size information
//! - [`VariableDescriptor`] and [`DescriptorTable`] describe where each variable lives in a row
//! - [`Value`] is the closed set of decoded scalar and array values
//! - [`VarData`] provides type-safe parsing straight from row bytes
//! - [`BitField`] handles iRacing's bitfield variables with flag operations
//! - [`Snapshot`] is the immutable decoded view of one buffer row
//!
//! ## Usage Example
//!
//! ```rust
//! use paddock::types::{DescriptorTable, VarData, VariableDescriptor, VariableType};
//!
//! let mut table = DescriptorTable::new(4);
//! table.insert(VariableDescriptor {
//!     name: "RPM".to_string(),
//!     description: "Engine rpm".to_string(),
//!     unit: "revs/min".to_string(),
//!     data_type: VariableType::Float32,
//!     offset: 0,
//!     count: 1,
//!     count_as_time: false,
//! });
//!
//! let row = 4500.0f32.to_le_bytes();
//! let rpm = f32::from_bytes(&row, table.get("RPM").unwrap()).unwrap();
//! assert_eq!(rpm, 4500.0);
//! ```

mod bitfield;
mod descriptor;
mod snapshot;
pub mod time;
mod update_rate;
mod value;
mod var_data;
mod variable_type;

pub use bitfield::BitField;
pub use descriptor::{DescriptorTable, VariableDescriptor};
pub use snapshot::Snapshot;
pub use time::{format_lap_time, format_lap_time_f32, seconds_to_duration};
pub use update_rate::UpdateRate;
pub use value::Value;
pub use var_data::VarData;
pub use variable_type::VariableType;
