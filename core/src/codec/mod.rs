//! Conversion between authored parameters and the TCU register image.
//!
//! Durations are quantized to clock ticks with truncation, each value is laid
//! into a fixed-width word, and the pulse list becomes a block of 10-byte
//! slots. Decoding and verification run the same quantization in reverse so
//! readback is compared tick for tick.

pub mod pulse_block;
pub mod quantize;
pub mod registers;
pub mod status;
pub mod verify;
pub mod word;

pub use pulse_block::{slots, split_slot, PulseTicks, PULSE_SLOT_BYTES};
pub use quantize::{ticks, ticks_to_us};
pub use registers::{build_registers, decode_registers, Readback, Register, RegisterImage};
pub use status::{decode_status, TcuStatus};
pub use verify::{verify, verify_image, Mismatch};
pub use word::{decode, encode, RegisterWord};
