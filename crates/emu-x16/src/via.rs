//! The two 6522 VIAs of the X16.
//!
//! Only the port wiring is modelled: PS/2, I2C and joystick lines on VIA#1,
//! a plain register file for VIA#2. Timers are not emulated; their counter
//! bytes read back as random values, which is what `RND(0)` relies on.
//!
//! # VIA#1 pins
//!
//! | Pin     | Signal                    |
//! |---------|---------------------------|
//! | PA0/PA1 | PS/2 keyboard DATA / CLK  |
//! | PA2/PA3 | Joystick LATCH / CLK      |
//! | PA4-PA7 | Joystick DATA 3..0        |
//! | PB0/PB1 | PS/2 mouse DATA / CLK     |
//! | PB2     | I2C DATA                  |
//! | CB2     | I2C CLK (via PCR)         |

use emu_core::{Observable, Tickable, Ticks, Value};
use peripheral_ps2::{Ps2Mouse, Ps2Port, Ps2Scancode};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::i2c::I2cPort;
use crate::joystick::{JOY_CLK_MASK, JOY_LATCH_MASK, Joysticks};

pub const REG_ORB: u8 = 0x00;
pub const REG_ORA: u8 = 0x01;
pub const REG_DDRB: u8 = 0x02;
pub const REG_DDRA: u8 = 0x03;
pub const REG_PCR: u8 = 0x0C;

/// PS/2 port wired to port A.
pub const KEYBOARD_PORT: usize = 0;
/// PS/2 port wired to port B.
pub const MOUSE_PORT: usize = 1;

const PS2_LINES: u8 = 0x03;
const I2C_DATA: u8 = 0x04;
const PCR_CB2_LOW: u8 = 0b110;
const PCR_CB2_HIGH: u8 = 0b111;

/// Register interface shared by both VIAs. `reg` is masked to 4 bits.
pub trait ViaPort {
    fn read(&mut self, reg: u8) -> u8;
    fn write(&mut self, reg: u8, value: u8);
}

/// VIA#1: PS/2, I2C and joystick lines.
pub struct Via1 {
    /// Last value written to each register.
    registers: [u8; 16],
    /// Keyboard (port A) and mouse (port B) transports.
    ps2: [Ps2Port; 2],
    /// Cycle each PS/2 port was last brought up to date.
    ps2_synced: [Ticks; 2],
    /// Cycles elapsed since reset.
    clock: Ticks,
    /// Motion and buttons waiting for the mouse port.
    mouse: Ps2Mouse,
    /// I2C DATA on PB2, CLK on CB2.
    i2c: I2cPort,
    /// SNES controllers on PA2-PA7.
    joysticks: Joysticks,
    /// Source for the timer counter bytes.
    rng: StdRng,
}

impl Via1 {
    /// `seed` fixes the timer-byte sequence; `None` seeds from entropy.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            registers: [0; 16],
            ps2: [Ps2Port::new(), Ps2Port::new()],
            ps2_synced: [Ticks::ZERO; 2],
            clock: Ticks::ZERO,
            mouse: Ps2Mouse::new(),
            i2c: I2cPort::new(),
            joysticks: Joysticks::new(),
            rng,
        }
    }

    /// Cycles elapsed since reset.
    #[must_use]
    pub fn clock(&self) -> Ticks {
        self.clock
    }

    /// Bring a PS/2 port up to the current cycle.
    fn sync_port(&mut self, index: usize) {
        let elapsed = self.clock.since(self.ps2_synced[index]);
        self.ps2[index].advance(elapsed.get());
        self.ps2_synced[index] = self.clock;
    }

    /// A PS/2 port, synchronised to the current cycle.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not 0 or 1.
    pub fn ps2_port(&mut self, index: usize) -> &Ps2Port {
        self.sync_port(index);
        &self.ps2[index]
    }

    /// A PS/2 port, synchronised to the current cycle.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not 0 or 1.
    pub fn ps2_port_mut(&mut self, index: usize) -> &mut Ps2Port {
        self.sync_port(index);
        &mut self.ps2[index]
    }

    pub fn mouse_mut(&mut self) -> &mut Ps2Mouse {
        &mut self.mouse
    }

    pub fn joysticks_mut(&mut self) -> &mut Joysticks {
        &mut self.joysticks
    }

    pub fn i2c_mut(&mut self) -> &mut I2cPort {
        &mut self.i2c
    }

    /// Queue a key press or release on the keyboard port.
    pub fn key_event(&mut self, scancode: Ps2Scancode, pressed: bool) {
        self.sync_port(KEYBOARD_PORT);
        peripheral_ps2::key_event(&mut self.ps2[KEYBOARD_PORT], scancode, pressed);
    }

    pub fn mouse_move(&mut self, dx: i32, dy: i32) {
        self.mouse.move_by(dx, dy);
    }

    pub fn mouse_button(&mut self, num: u8, pressed: bool) {
        if pressed {
            self.mouse.button_down(num);
        } else {
            self.mouse.button_up(num);
        }
    }

    /// Send pending mouse motion and buttons. Returns `false` if the mouse
    /// port had no room for a packet.
    pub fn mouse_send_state(&mut self) -> bool {
        self.sync_port(MOUSE_PORT);
        self.mouse.send_state(&mut self.ps2[MOUSE_PORT])
    }

    fn port_a_lines(&self) -> u8 {
        self.registers[usize::from(REG_ORA)] | !self.registers[usize::from(REG_DDRA)]
    }

    fn port_b_lines(&self) -> u8 {
        self.registers[usize::from(REG_ORB)] | !self.registers[usize::from(REG_DDRB)]
    }
}

impl ViaPort for Via1 {
    fn read(&mut self, reg: u8) -> u8 {
        let reg = reg & 0x0F;
        match reg {
            REG_ORB => {
                self.sync_port(MOUSE_PORT);
                self.i2c.step();
                let lines = self.ps2[MOUSE_PORT].output() | self.i2c.data_out_mask();
                !self.registers[usize::from(REG_DDRB)] & lines
            }
            REG_ORA => {
                self.sync_port(KEYBOARD_PORT);
                let ps2 = !self.registers[usize::from(REG_DDRA)]
                    & self.ps2[KEYBOARD_PORT].output();
                ps2 | self.joysticks.data()
            }
            // Timer counter bytes
            0x04 | 0x05 | 0x08 | 0x09 => self.rng.next_u32() as u8,
            _ => self.registers[usize::from(reg)],
        }
    }

    fn write(&mut self, reg: u8, value: u8) {
        let reg = reg & 0x0F;
        self.registers[usize::from(reg)] = value;
        match reg {
            REG_ORB | REG_DDRB => {
                self.sync_port(MOUSE_PORT);
                let pb = self.port_b_lines();
                self.ps2[MOUSE_PORT].set_host_input(pb & PS2_LINES);
                self.i2c.set_data_in(pb & I2C_DATA != 0);
                self.i2c.step();
            }
            REG_ORA | REG_DDRA => {
                self.sync_port(KEYBOARD_PORT);
                let pa = self.port_a_lines();
                self.ps2[KEYBOARD_PORT].set_host_input(pa & PS2_LINES);
                let ora = self.registers[usize::from(REG_ORA)];
                self.joysticks.set_latch(ora & JOY_LATCH_MASK != 0);
                self.joysticks.set_clock(ora & JOY_CLK_MASK != 0);
            }
            REG_PCR => {
                match value >> 5 {
                    PCR_CB2_LOW => self.i2c.set_clock_in(false),
                    PCR_CB2_HIGH => self.i2c.set_clock_in(true),
                    _ => {}
                }
                self.i2c.step();
            }
            _ => {}
        }
    }
}

impl Tickable for Via1 {
    fn tick(&mut self) {
        self.clock += Ticks::new(1);
    }

    fn tick_n(&mut self, count: Ticks) {
        self.clock += count;
    }
}

const VIA1_PATHS: &[&str] = &[
    "clock",
    "ps2.0.state",
    "ps2.0.queue_len",
    "ps2.1.state",
    "ps2.1.queue_len",
    "mouse.buttons",
    "mouse.pending_x",
    "mouse.pending_y",
    "i2c.clk",
    "i2c.data",
    "reg.0",
    "reg.1",
    "reg.2",
    "reg.3",
    "reg.4",
    "reg.5",
    "reg.6",
    "reg.7",
    "reg.8",
    "reg.9",
    "reg.10",
    "reg.11",
    "reg.12",
    "reg.13",
    "reg.14",
    "reg.15",
];

impl Observable for Via1 {
    /// Port paths report the state as of the last synchronisation.
    fn query(&self, path: &str) -> Option<Value> {
        if path == "clock" {
            return Some(self.clock.get().into());
        }
        if let Some(rest) = path.strip_prefix("ps2.") {
            let (index, field) = rest.split_once('.')?;
            let port = match index {
                "0" => &self.ps2[KEYBOARD_PORT],
                "1" => &self.ps2[MOUSE_PORT],
                _ => return None,
            };
            return port.query(field);
        }
        if let Some(field) = path.strip_prefix("mouse.") {
            return self.mouse.query(field);
        }
        match path {
            "i2c.clk" => return Some(self.i2c.clock_in().into()),
            "i2c.data" => return Some(self.i2c.data_line().into()),
            _ => {}
        }
        if let Some(index) = path.strip_prefix("reg.") {
            let index: usize = index.parse().ok()?;
            return self.registers.get(index).map(|&r| r.into());
        }
        None
    }

    fn query_paths(&self) -> &'static [&'static str] {
        VIA1_PATHS
    }
}

/// VIA#2: user port, nothing attached.
#[derive(Debug, Clone, Default)]
pub struct Via2 {
    registers: [u8; 16],
}

impl Via2 {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ViaPort for Via2 {
    fn read(&mut self, reg: u8) -> u8 {
        self.registers[usize::from(reg & 0x0F)]
    }

    fn write(&mut self, reg: u8, value: u8) {
        self.registers[usize::from(reg & 0x0F)] = value;
    }
}
