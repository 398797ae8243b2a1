//! Commander X16 peripheral layer.
//!
//! The pieces around the CPU that talk to the outside world: two 6522 VIAs
//! carrying the PS/2 keyboard and mouse, I2C and SNES controller lines, a
//! memory image with banked RAM, and KERNAL LOAD/SAVE hypercalls that read
//! and write PRG files in a host directory.
//!
//! Time is counted in CPU cycles. The owner ticks [`X16`]; the PS/2 ports
//! catch up lazily whenever the CPU touches their VIA port.

pub mod config;
pub mod hypercall;
pub mod i2c;
pub mod joystick;
pub mod listing;
pub mod memory;
pub mod via;
pub mod video;
mod x16;

pub use config::{ConfigError, X16Config};
pub use hypercall::{CpuRegisters, HypercallError, Hypercalls, KernalSymbols, LoadRequest};
pub use i2c::{I2cDevice, I2cPort};
pub use joystick::{Joysticks, SnesButtons};
pub use memory::X16Memory;
pub use via::{Via1, Via2, ViaPort};
pub use video::{RecordingVideoPort, VideoPort};
pub use x16::{VIA1_BASE, VIA2_BASE, X16};
