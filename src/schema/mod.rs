//! Binary layout of the shared region
//!
//! - [`header`]: the fixed 112-byte header and its rotating buffer directory
//! - [`variables`]: the 144-byte variable descriptor records
//!
//! Everything here decodes from a [`ByteSource`](crate::ByteSource) and is
//! platform-independent.

pub mod header;
pub mod variables;

pub use header::{HEADER_SIZE, Header, HeaderVersion, VarBuf};
pub use variables::{VAR_HEADER_SIZE, parse_descriptor_table, read_descriptor_table};
