//! Session configuration and host-application signal surfaces.

/// Validated session descriptor and its builder.
pub mod descriptor;
/// Session lifecycle signals consumed by the host application.
pub mod sink;

pub use descriptor::*;
pub use sink::*;
