//! X16 memory image.
//!
//! | Range         | Contents                                  |
//! |---------------|-------------------------------------------|
//! | $0000-$9EFF   | Fixed RAM                                 |
//! | $9F00-$9FFF   | I/O hole (VIAs, video, ...)               |
//! | $A000-$BFFF   | Banked RAM window, 8 KiB per bank          |
//! | $C000-$FFFF   | ROM (never written)                       |
//!
//! The bank-select register picks which 8 KiB bank appears in the window.

use emu_core::Bus;

/// First address of the I/O hole; fixed RAM ends here.
pub const FIXED_RAM_END: u16 = 0x9F00;
/// First address of the banked RAM window.
pub const BANK_WINDOW_START: u16 = 0xA000;
/// First address of ROM; the banked window ends here.
pub const ROM_START: u16 = 0xC000;
/// Bytes per RAM bank.
pub const BANK_SIZE: usize = 0x2000;
/// ROM image size.
pub const ROM_SIZE: usize = 0x4000;
/// Largest supported bank count (2 MiB of banked RAM).
pub const MAX_RAM_BANKS: usize = 256;

/// Fixed RAM, banked RAM and ROM.
pub struct X16Memory {
    fixed: Box<[u8; FIXED_RAM_END as usize]>,
    banked: Vec<u8>,
    rom: Box<[u8; ROM_SIZE]>,
    ram_banks: usize,
    ram_bank: u8,
}

impl X16Memory {
    /// Create a memory image with `ram_banks` banks of 8 KiB.
    ///
    /// # Panics
    ///
    /// Panics if `ram_banks` is zero or above [`MAX_RAM_BANKS`].
    #[must_use]
    pub fn new(ram_banks: usize) -> Self {
        assert!(
            (1..=MAX_RAM_BANKS).contains(&ram_banks),
            "RAM bank count must be 1-256"
        );
        Self {
            fixed: Box::new([0; FIXED_RAM_END as usize]),
            banked: vec![0; ram_banks * BANK_SIZE],
            rom: Box::new([0xFF; ROM_SIZE]),
            ram_banks,
            ram_bank: 0,
        }
    }

    #[must_use]
    pub fn ram_banks(&self) -> usize {
        self.ram_banks
    }

    /// Bank currently visible in the window.
    #[must_use]
    pub fn ram_bank(&self) -> u8 {
        self.ram_bank
    }

    /// Select a bank. Wraps modulo the configured bank count.
    pub fn set_ram_bank(&mut self, bank: u8) {
        self.ram_bank = (usize::from(bank) % self.ram_banks) as u8;
    }

    /// Fixed RAM `$0000-$9EFF`.
    #[must_use]
    pub fn fixed_ram(&self) -> &[u8] {
        &self.fixed[..]
    }

    pub fn fixed_ram_mut(&mut self) -> &mut [u8] {
        &mut self.fixed[..]
    }

    /// One 8 KiB bank, independent of the bank register.
    #[must_use]
    pub fn bank(&self, bank: u8) -> &[u8] {
        let start = (usize::from(bank) % self.ram_banks) * BANK_SIZE;
        &self.banked[start..start + BANK_SIZE]
    }

    pub fn bank_mut(&mut self, bank: u8) -> &mut [u8] {
        let start = (usize::from(bank) % self.ram_banks) * BANK_SIZE;
        &mut self.banked[start..start + BANK_SIZE]
    }

    /// The bank visible in the window.
    pub fn current_bank_mut(&mut self) -> &mut [u8] {
        self.bank_mut(self.ram_bank)
    }

    /// Copy a ROM image in at `$C000`. Extra bytes are ignored.
    pub fn load_rom(&mut self, image: &[u8]) {
        let len = image.len().min(ROM_SIZE);
        self.rom[..len].copy_from_slice(&image[..len]);
    }
}

impl Bus for X16Memory {
    fn read(&mut self, address: u16) -> u8 {
        match address {
            0x0000..FIXED_RAM_END => self.fixed[address as usize],
            // I/O is decoded by the machine before it reaches memory.
            FIXED_RAM_END..BANK_WINDOW_START => 0xFF,
            BANK_WINDOW_START..ROM_START => {
                let offset = usize::from(self.ram_bank) * BANK_SIZE
                    + usize::from(address - BANK_WINDOW_START);
                self.banked[offset]
            }
            ROM_START..=0xFFFF => self.rom[usize::from(address - ROM_START)],
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            0x0000..FIXED_RAM_END => self.fixed[address as usize] = value,
            BANK_WINDOW_START..ROM_START => {
                let offset = usize::from(self.ram_bank) * BANK_SIZE
                    + usize::from(address - BANK_WINDOW_START);
                self.banked[offset] = value;
            }
            // I/O hole and ROM
            _ => {}
        }
    }
}
