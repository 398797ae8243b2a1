//! SNES-protocol game controllers on VIA#1 port A.
//!
//! All four controllers share LATCH (PA2) and CLK (PA3); each has its own
//! DATA line, controller 0 on PA7 down to controller 3 on PA4. While LATCH
//! is high the pads capture their buttons; each rising CLK edge then shifts
//! the next button onto DATA. DATA is active low.

/// PA2: latch for all controllers.
pub const JOY_LATCH_MASK: u8 = 0x04;
/// PA3: clock for all controllers.
pub const JOY_CLK_MASK: u8 = 0x08;

pub const CONTROLLERS: usize = 4;

/// Button state of one pad, 1 = pressed, in shift order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnesButtons(pub u16);

impl SnesButtons {
    pub const B: u16 = 1 << 0;
    pub const Y: u16 = 1 << 1;
    pub const SELECT: u16 = 1 << 2;
    pub const START: u16 = 1 << 3;
    pub const UP: u16 = 1 << 4;
    pub const DOWN: u16 = 1 << 5;
    pub const LEFT: u16 = 1 << 6;
    pub const RIGHT: u16 = 1 << 7;
    pub const A: u16 = 1 << 8;
    pub const X: u16 = 1 << 9;
    pub const L: u16 = 1 << 10;
    pub const R: u16 = 1 << 11;
}

pub struct Joysticks {
    /// Button state per slot; `None` when nothing is plugged in.
    pads: [Option<SnesButtons>; CONTROLLERS],
    /// Active-low shift registers, next bit in bit 0.
    shift: [u16; CONTROLLERS],
    /// Shared LATCH line (PA2).
    latch: bool,
    /// Shared CLK line (PA3), kept for edge detection.
    clock: bool,
}

impl Joysticks {
    /// No controllers connected.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pads: [None; CONTROLLERS],
            shift: [0xFFFF; CONTROLLERS],
            latch: false,
            clock: false,
        }
    }

    pub fn connect(&mut self, slot: usize) {
        if slot < CONTROLLERS {
            self.pads[slot] = Some(SnesButtons::default());
            self.reload_if_latched();
        }
    }

    pub fn disconnect(&mut self, slot: usize) {
        if slot < CONTROLLERS {
            self.pads[slot] = None;
            self.shift[slot] = 0xFFFF;
        }
    }

    /// Set the buttons of a connected pad.
    pub fn set_buttons(&mut self, slot: usize, buttons: SnesButtons) {
        if let Some(pad) = self.pads.get_mut(slot).and_then(Option::as_mut) {
            *pad = buttons;
            self.reload_if_latched();
        }
    }

    pub fn set_latch(&mut self, high: bool) {
        self.latch = high;
        self.reload_if_latched();
    }

    pub fn set_clock(&mut self, high: bool) {
        let rising = high && !self.clock;
        self.clock = high;
        if rising && !self.latch {
            for shift in &mut self.shift {
                // Past the last button the pad reports "released".
                *shift = (*shift >> 1) | 0x8000;
            }
        }
    }

    /// DATA lines as seen on PA4-PA7. Other bits are zero.
    #[must_use]
    pub fn data(&self) -> u8 {
        let mut data = 0;
        for (slot, pad) in self.pads.iter().enumerate() {
            let bit = match pad {
                Some(_) => (self.shift[slot] & 1) as u8,
                None => 1,
            };
            data |= bit << (7 - slot);
        }
        data
    }

    fn reload_if_latched(&mut self) {
        if !self.latch {
            return;
        }
        for (slot, pad) in self.pads.iter().enumerate() {
            self.shift[slot] = pad.map_or(0xFFFF, |b| !b.0);
        }
    }
}

impl Default for Joysticks {
    fn default() -> Self {
        Self::new()
    }
}
