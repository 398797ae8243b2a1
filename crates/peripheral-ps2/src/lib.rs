//! PS/2 keyboard and mouse emulation at the wire level.
//!
//! Each PS/2 port is an open-drain DATA/CLK pair shared between the host
//! (a VIA port) and the device. The device clocks bytes out as 11-bit
//! frames: start bit, 8 data bits LSB first, odd parity, stop bit. Each
//! half of a bit cell lasts [`HOLD`] bus cycles.
//!
//! The host inhibits communication by holding CLK low while releasing
//! DATA. An in-flight byte is then abandoned and retransmitted from the
//! start bit once the host releases the bus.

mod keyboard;
mod mouse;
mod port;
mod queue;

pub use keyboard::{Ps2Scancode, key_event, scancode_sequence};
pub use mouse::Ps2Mouse;
pub use port::{CLK_MASK, DATA_MASK, HOLD, HOST_IDLE, Ps2Port, QUEUE_CAPACITY, State, frame_for};
pub use queue::ByteQueue;
