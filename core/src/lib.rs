//! Pulse-parameter codec for the NeXtRAD Timing Control Unit.
//!
//! The crate turns an authored header file into the byte image written to the
//! TCU's memory-mapped registers, and decodes readback for verification. It
//! performs no device I/O; sessions live in the controller.

pub mod codec;
pub mod hdl;
pub mod header;
pub mod params;
pub mod prelude;
pub mod telemetry;

pub use codec::{build_registers, decode_registers, verify, Mismatch, Readback, RegisterImage};
pub use params::{Pulse, TcuParameters};
pub use prelude::{CodecError, CodecResult, Endianness, HeaderError};
