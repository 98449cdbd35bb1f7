//! Live iRacing shared memory on Windows
//!
//! [`SharedMemory`] maps the simulator's region read-only and opens its data-valid
//! event. It implements [`ByteSource`](crate::ByteSource) and
//! [`DataSignal`](crate::DataSignal), so it plugs straight into
//! [`Telemetry`](crate::Telemetry).
//!
//! ```rust,ignore
//! use paddock::{Telemetry, windows::SharedMemory};
//! use std::time::Duration;
//!
//! let mut telemetry = Telemetry::new(SharedMemory::open()?);
//! if let Some(snapshot) = telemetry.wait_for_data(Duration::from_millis(100))? {
//!     println!("RPM: {}", snapshot.value::<f32>("RPM")?);
//! }
//! ```

mod shared_memory;

pub use shared_memory::SharedMemory;
