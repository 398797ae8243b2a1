//! I2C expansion lines on VIA#1.
//!
//! DATA is PB2; CLK is CB2, driven through the peripheral control register.
//! Both lines are open drain. The host side is what the VIA drives, the
//! device side is whatever an attached device (SMC, RTC, ...) pulls.

/// PB2 carries I2C DATA.
pub const I2C_DATA_MASK: u8 = 0x04;

/// A device on the I2C lines.
pub trait I2cDevice {
    /// Observe the host-driven lines. Returns `true` if the device leaves
    /// DATA released, `false` if it pulls DATA low.
    fn clock(&mut self, clk: bool, data: bool) -> bool;
}

/// Line state of the I2C expansion bus.
pub struct I2cPort {
    /// DATA as driven by the host (true = released).
    data_in: bool,
    /// CLK as driven by the host (true = released).
    clk_in: bool,
    /// DATA as driven by the device (true = released).
    data_out: bool,
    /// Device answering on the bus, if any.
    device: Option<Box<dyn I2cDevice>>,
}

impl I2cPort {
    /// Both lines released, nothing attached.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data_in: true,
            clk_in: true,
            data_out: true,
            device: None,
        }
    }

    pub fn attach(&mut self, device: Box<dyn I2cDevice>) {
        self.device = Some(device);
    }

    pub fn detach(&mut self) -> Option<Box<dyn I2cDevice>> {
        self.data_out = true;
        self.device.take()
    }

    /// Let the attached device see the current host lines.
    pub fn step(&mut self) {
        if let Some(device) = self.device.as_mut() {
            self.data_out = device.clock(self.clk_in, self.data_in);
        }
    }

    pub fn set_data_in(&mut self, released: bool) {
        self.data_in = released;
    }

    pub fn set_clock_in(&mut self, released: bool) {
        self.clk_in = released;
    }

    #[must_use]
    pub fn clock_in(&self) -> bool {
        self.clk_in
    }

    #[must_use]
    pub fn data_in(&self) -> bool {
        self.data_in
    }

    /// Device side of DATA.
    #[must_use]
    pub fn data_out(&self) -> bool {
        self.data_out
    }

    /// Device side of DATA positioned on PB2.
    #[must_use]
    pub fn data_out_mask(&self) -> u8 {
        if self.data_out { I2C_DATA_MASK } else { 0 }
    }

    /// Wire-AND of both sides of DATA.
    #[must_use]
    pub fn data_line(&self) -> bool {
        self.data_in && self.data_out
    }
}

impl Default for I2cPort {
    fn default() -> Self {
        Self::new()
    }
}
