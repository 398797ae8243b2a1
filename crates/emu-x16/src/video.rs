//! Video chip write port used by LOAD into VRAM.
//!
//! | Reg | Name      | Description                               |
//! |-----|-----------|-------------------------------------------|
//! | 0   | ADDR_L    | VRAM address bits 0-7                     |
//! | 1   | ADDR_H    | VRAM address bits 8-15                    |
//! | 2   | ADDR_BANK | bit 0-3: address bits 16+, bit 4-7: increment |
//! | 3   | DATA      | Write byte at address, then auto-increment |

pub const ADDR_L: u8 = 0;
pub const ADDR_H: u8 = 1;
pub const ADDR_BANK: u8 = 2;
pub const DATA: u8 = 3;

/// Increment-by-one in the `ADDR_BANK` register.
pub const INCREMENT_1: u8 = 0x10;

/// The video chip's register interface.
pub trait VideoPort {
    fn write(&mut self, reg: u8, value: u8);
}

/// Keeps every register write in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingVideoPort {
    pub writes: Vec<(u8, u8)>,
}

impl RecordingVideoPort {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written to the DATA register.
    #[must_use]
    pub fn data_bytes(&self) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|(reg, _)| *reg == DATA)
            .map(|&(_, value)| value)
            .collect()
    }
}

impl VideoPort for RecordingVideoPort {
    fn write(&mut self, reg: u8, value: u8) {
        self.writes.push((reg, value));
    }
}
