//! Core traits and types shared by the peripheral crates.
//!
//! Everything is timed in bus cycles of the emulated machine. Components
//! are driven by their owner, never by a scheduler of their own, and may be
//! advanced in bursts of any size.

mod bus;
mod observable;
mod tickable;
mod ticks;

pub use bus::Bus;
pub use observable::{Observable, Value};
pub use tickable::Tickable;
pub use ticks::Ticks;
