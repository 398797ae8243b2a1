//! Relative pointer packetizer for the mouse port.
//!
//! Standard 3-byte PS/2 movement packet:
//!
//! | Byte | Bits                                              |
//! |------|---------------------------------------------------|
//! | 0    | 7: Y overflow, 6: X overflow, 5: Y sign, 4: X sign, 3: always 1, 2: middle, 1: right, 0: left |
//! | 1    | X movement (low 8 bits of 9-bit two's complement) |
//! | 2    | Y movement (low 8 bits of 9-bit two's complement) |
//!
//! Overflow bits are never set: large motion is split over several packets
//! instead.

use emu_core::{Observable, Value};

use crate::port::Ps2Port;

const PACKET_LEN: usize = 3;
const MIN_DELTA: i32 = -256;
const MAX_DELTA: i32 = 255;
const BUTTON_MASK: u8 = 0x07;

/// Accumulated host mouse state waiting to be sent.
#[derive(Debug, Clone, Default)]
pub struct Ps2Mouse {
    /// Pressed buttons, bit 0 = left.
    buttons: u8,
    /// Horizontal motion not yet sent.
    diff_x: i32,
    /// Vertical motion not yet sent.
    diff_y: i32,
}

impl Ps2Mouse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate relative motion.
    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.diff_x = self.diff_x.saturating_add(dx);
        self.diff_y = self.diff_y.saturating_add(dy);
    }

    /// Press button `num` (0 = left, 1 = right, 2 = middle).
    pub fn button_down(&mut self, num: u8) {
        if num < 8 {
            self.buttons |= 1 << num;
        }
    }

    /// Release button `num`.
    pub fn button_up(&mut self, num: u8) {
        if num < 8 {
            self.buttons &= !(1 << num);
        }
    }

    #[must_use]
    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    /// Motion not yet sent.
    #[must_use]
    pub fn pending(&self) -> (i32, i32) {
        (self.diff_x, self.diff_y)
    }

    /// Mouse register window. No registers are implemented; reads float high.
    #[must_use]
    pub fn read(&self, _reg: u8) -> u8 {
        0xFF
    }

    /// Emit movement packets into the mouse port queue.
    ///
    /// Each packet carries at most `[-256, 255]` per axis. Sending repeats
    /// only while both axes still have residual motion, so motion left on a
    /// single axis stays pending until the next call.
    ///
    /// Returns `false` if the queue had no room for a packet.
    pub fn send_state(&mut self, port: &mut Ps2Port) -> bool {
        loop {
            let send_x = self.diff_x.clamp(MIN_DELTA, MAX_DELTA);
            let send_y = self.diff_y.clamp(MIN_DELTA, MAX_DELTA);

            if port.queue_remaining() < PACKET_LEN {
                tracing::trace!(
                    pending_x = self.diff_x,
                    pending_y = self.diff_y,
                    "mouse queue full, packet deferred"
                );
                return false;
            }
            port.enqueue(self.status_byte(send_x, send_y));
            port.enqueue(send_x as u8);
            port.enqueue(send_y as u8);

            self.diff_x -= send_x;
            self.diff_y -= send_y;

            if self.diff_x == 0 || self.diff_y == 0 {
                return true;
            }
        }
    }

    fn status_byte(&self, x: i32, y: i32) -> u8 {
        let y_sign = ((y >> 8) & 1) as u8;
        let x_sign = ((x >> 8) & 1) as u8;
        (y_sign << 5) | (x_sign << 4) | 0x08 | (self.buttons & BUTTON_MASK)
    }
}

impl Observable for Ps2Mouse {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "buttons" => Some(self.buttons.into()),
            "pending_x" => Some(self.diff_x.into()),
            "pending_y" => Some(self.diff_y.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["buttons", "pending_x", "pending_y"]
    }
}
