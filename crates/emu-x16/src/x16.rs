//! Top-level X16 peripheral system.
//!
//! Owns the memory image, both VIAs and the hypercall engine, and decodes
//! CPU bus accesses between them. The CPU and video chip live outside;
//! the owner ticks this system and calls [`X16::load`] / [`X16::save`] when
//! the CPU reaches the KERNAL trap addresses.

use emu_core::{Bus, Tickable, Ticks};

use crate::config::{ConfigError, X16Config};
use crate::hypercall::{CpuRegisters, Hypercalls};
use crate::memory::X16Memory;
use crate::via::{Via1, Via2, ViaPort};
use crate::video::VideoPort;

/// VIA#1 register window.
pub const VIA1_BASE: u16 = 0x9F60;
/// VIA#2 register window.
pub const VIA2_BASE: u16 = 0x9F70;

pub struct X16 {
    config: X16Config,
    memory: X16Memory,
    via1: Via1,
    via2: Via2,
    hypercalls: Hypercalls,
}

impl X16 {
    pub fn new(config: X16Config) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::debug!(
            ram_banks = config.ram_banks,
            path = %config.hypercall_path.display(),
            "X16 peripherals created"
        );
        Ok(Self {
            memory: X16Memory::new(config.ram_banks),
            via1: Via1::new(config.rng_seed),
            via2: Via2::new(),
            hypercalls: Hypercalls::new(config.hypercall_path.clone(), config.symbols),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &X16Config {
        &self.config
    }

    #[must_use]
    pub fn memory(&self) -> &X16Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut X16Memory {
        &mut self.memory
    }

    pub fn via1_mut(&mut self) -> &mut Via1 {
        &mut self.via1
    }

    pub fn via2_mut(&mut self) -> &mut Via2 {
        &mut self.via2
    }

    #[must_use]
    pub fn hypercalls(&self) -> &Hypercalls {
        &self.hypercalls
    }

    /// KERNAL LOAD trap.
    pub fn load<V: VideoPort>(&mut self, video: &mut V, regs: &mut CpuRegisters) {
        self.hypercalls.load(&mut self.memory, video, regs);
    }

    /// KERNAL SAVE trap.
    pub fn save(&mut self, regs: &mut CpuRegisters) {
        self.hypercalls.save(&mut self.memory, regs);
    }
}

impl Bus for X16 {
    fn read(&mut self, address: u16) -> u8 {
        match address {
            VIA1_BASE..VIA2_BASE => self.via1.read((address - VIA1_BASE) as u8),
            VIA2_BASE..0x9F80 => self.via2.read((address - VIA2_BASE) as u8),
            _ => self.memory.read(address),
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            VIA1_BASE..VIA2_BASE => self.via1.write((address - VIA1_BASE) as u8, value),
            VIA2_BASE..0x9F80 => self.via2.write((address - VIA2_BASE) as u8, value),
            _ => self.memory.write(address, value),
        }
    }
}

impl Tickable for X16 {
    fn tick(&mut self) {
        self.via1.tick();
    }

    fn tick_n(&mut self, count: Ticks) {
        self.via1.tick_n(count);
    }
}
