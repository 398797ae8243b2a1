//! X16 configuration: RAM size, hypercall directory and KERNAL symbols.

use std::path::PathBuf;

use thiserror::Error;

use crate::hypercall::KernalSymbols;
use crate::memory::MAX_RAM_BANKS;

const BANK_KB: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("banked RAM must be a multiple of 8 KiB between 8 and 2048, got {0}")]
    InvalidRamSize(usize),
    #[error("hypercall directory {} does not exist", .0.display())]
    MissingHypercallPath(PathBuf),
}

/// Configuration for constructing an [`X16`](crate::X16).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct X16Config {
    /// Directory LOAD and SAVE operate in.
    pub hypercall_path: PathBuf,
    /// Number of 8 KiB banks behind `$A000-$BFFF`.
    pub ram_banks: usize,
    /// Zero-page addresses of the KERNAL variables.
    pub symbols: KernalSymbols,
    /// Fixed seed for the VIA timer bytes. `None` seeds from entropy.
    pub rng_seed: Option<u64>,
}

impl Default for X16Config {
    fn default() -> Self {
        Self {
            hypercall_path: PathBuf::from("."),
            ram_banks: 64,
            symbols: KernalSymbols::default(),
            rng_seed: None,
        }
    }
}

impl X16Config {
    /// Set banked RAM size in KiB.
    pub fn with_ram_kb(mut self, kb: usize) -> Result<Self, ConfigError> {
        if kb == 0 || kb % BANK_KB != 0 || kb / BANK_KB > MAX_RAM_BANKS {
            return Err(ConfigError::InvalidRamSize(kb));
        }
        self.ram_banks = kb / BANK_KB;
        Ok(self)
    }

    #[must_use]
    pub fn with_hypercall_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.hypercall_path = path.into();
        self
    }

    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Check the settings before building a machine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ram_banks == 0 || self.ram_banks > MAX_RAM_BANKS {
            return Err(ConfigError::InvalidRamSize(self.ram_banks * BANK_KB));
        }
        if !self.hypercall_path.is_dir() {
            return Err(ConfigError::MissingHypercallPath(
                self.hypercall_path.clone(),
            ));
        }
        Ok(())
    }
}
