//! Scan code set 2 encoding for the keyboard port.

use crate::port::Ps2Port;

const EXTENDED_PREFIX: u8 = 0xE0;
const BREAK_PREFIX: u8 = 0xF0;

/// A set 2 scan code. Extended keys (cursor block, right Ctrl/Alt, ...)
/// are sent with an `E0` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ps2Scancode {
    pub code: u8,
    pub extended: bool,
}

impl Ps2Scancode {
    #[must_use]
    pub const fn new(code: u8) -> Self {
        Self {
            code,
            extended: false,
        }
    }

    #[must_use]
    pub const fn extended(code: u8) -> Self {
        Self {
            code,
            extended: true,
        }
    }
}

/// Bytes sent for a key transition: make is `[E0] code`, break is
/// `[E0] F0 code`.
#[must_use]
pub fn scancode_sequence(scancode: Ps2Scancode, pressed: bool) -> Vec<u8> {
    let mut seq = Vec::with_capacity(3);
    if scancode.extended {
        seq.push(EXTENDED_PREFIX);
    }
    if !pressed {
        seq.push(BREAK_PREFIX);
    }
    seq.push(scancode.code);
    seq
}

/// Queue a key transition on the keyboard port.
pub fn key_event(port: &mut Ps2Port, scancode: Ps2Scancode, pressed: bool) {
    for byte in scancode_sequence(scancode, pressed) {
        port.enqueue(byte);
    }
}
