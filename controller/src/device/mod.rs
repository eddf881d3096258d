//! Seam between the workflow and the board running the TCU gateware.
//!
//! The RHINO is reached over SSH in production; that transport lives outside
//! this crate. The sessions here either keep registers in memory or log the
//! board shell commands a real session would issue.

pub mod dry_run;
pub mod emulated;
pub mod session;

pub use dry_run::DryRun;
pub use emulated::EmulatedTcu;
pub use session::DeviceSession;
