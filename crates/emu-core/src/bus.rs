//! CPU-visible address space.

/// A 16-bit CPU-visible address space.
///
/// Implementors apply their own decoding (bank windows, I/O holes, ROM
/// write protection). Firmware traps use this view when they need to see
/// memory the way the CPU does.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Read a little-endian word. The high byte address wraps at `$FFFF`.
    fn read_word(&mut self, address: u16) -> u16 {
        let lo = self.read(address);
        let hi = self.read(address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }
}
