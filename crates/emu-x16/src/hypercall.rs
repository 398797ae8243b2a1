//! KERNAL LOAD/SAVE hypercalls.
//!
//! When the CPU reaches the KERNAL's LOAD or SAVE entry point the machine
//! traps and performs the file operation on the host, inside a single
//! sandbox directory. Parameters come from CPU registers and the KERNAL's
//! zero-page variables; results go back the same way:
//!
//! | Result        | A | STATUS | Carry |
//! |---------------|---|--------|-------|
//! | Success       | 0 | 0      | clear |
//! | Not found     | 4 | 4      | set   |
//! | SAVE end<start| 0 | (kept) | set   |
//!
//! Files use the PRG layout: a 2-byte little-endian load address, then data.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use emu_core::Bus;
use thiserror::Error;

use crate::listing;
use crate::memory::{BANK_SIZE, BANK_WINDOW_START, FIXED_RAM_END, ROM_START, X16Memory};
use crate::video::{self, VideoPort};

/// KERNAL "file not found" status.
pub const STATUS_FILE_NOT_FOUND: u8 = 4;

/// Processor status carry flag.
pub const FLAG_CARRY: u8 = 0x01;

const VRAM_CHUNK: usize = 2048;

#[derive(Debug, Error)]
pub enum HypercallError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("filename {0:?} is outside the hypercall directory")]
    InvalidName(String),
    #[error("end address ${end:04X} is below start address ${start:04X}")]
    InvalidRange { start: u16, end: u16 },
    #[error("directory listing needs {needed} bytes, only {capacity} available")]
    ListingOverflow { needed: usize, capacity: usize },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HypercallError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Zero-page addresses of the KERNAL variables the hypercalls use. These
/// depend on the ROM build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KernalSymbols {
    /// I/O status byte.
    pub status: u16,
    /// Filename length.
    pub fnlen: u16,
    /// Secondary address.
    pub sa: u16,
    /// Filename pointer (two bytes).
    pub fnadr: u16,
}

impl Default for KernalSymbols {
    fn default() -> Self {
        Self {
            status: 0x90,
            fnlen: 0xB7,
            sa: 0xB9,
            fnadr: 0xBB,
        }
    }
}

/// The registers a hypercall reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuRegisters {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    /// Processor status; only carry is touched.
    pub p: u8,
}

impl CpuRegisters {
    /// X/Y as a 16-bit address (X = low byte).
    #[must_use]
    pub fn xy(&self) -> u16 {
        u16::from_le_bytes([self.x, self.y])
    }

    pub fn set_xy(&mut self, value: u16) {
        [self.x, self.y] = value.to_le_bytes();
    }

    #[must_use]
    pub fn carry(&self) -> bool {
        self.p & FLAG_CARRY != 0
    }

    pub fn set_carry(&mut self, on: bool) {
        if on {
            self.p |= FLAG_CARRY;
        } else {
            self.p &= !FLAG_CARRY;
        }
    }
}

/// LOAD parameters besides the filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    /// KERNAL secondary address; zero means "use `override_address`".
    pub secondary: u8,
    /// Accumulator on entry: 0 = RAM, 2+ = VRAM bank `a - 2`.
    pub mode: u8,
    /// X/Y on entry.
    pub override_address: u16,
}

/// LOAD/SAVE against a sandbox directory.
#[derive(Debug, Clone)]
pub struct Hypercalls {
    root: PathBuf,
    symbols: KernalSymbols,
}

impl Hypercalls {
    pub fn new(root: impl Into<PathBuf>, symbols: KernalSymbols) -> Self {
        Self {
            root: root.into(),
            symbols,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn symbols(&self) -> KernalSymbols {
        self.symbols
    }

    /// The KERNAL's current filename: `fnlen` bytes at the pointer stored at
    /// `fnadr`, stopping early at a NUL.
    pub fn filename(&self, mem: &mut X16Memory) -> Vec<u8> {
        let ptr = mem.read_word(self.symbols.fnadr);
        let len = mem.read(self.symbols.fnlen);
        (0..u16::from(len))
            .map(|i| mem.read(ptr.wrapping_add(i)))
            .take_while(|&b| b != 0)
            .collect()
    }

    /// Map a KERNAL filename to a host path inside the sandbox.
    pub fn resolve(&self, name: &[u8]) -> Result<PathBuf, HypercallError> {
        let name = String::from_utf8_lossy(name).into_owned();
        if name.is_empty() {
            return Err(HypercallError::NotFound(self.root.clone()));
        }
        let mut path = self.root.clone();
        for component in Path::new(&name).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(HypercallError::InvalidName(name));
                }
            }
        }
        Ok(path)
    }

    /// Write the `$` listing of the sandbox into fixed RAM at `target`.
    /// Returns the end address.
    pub fn directory_listing(
        &self,
        mem: &mut X16Memory,
        target: u16,
    ) -> Result<u16, HypercallError> {
        let entries =
            listing::read_entries(&self.root).map_err(|e| HypercallError::io(&self.root, e))?;
        let dir_name = self.listing_title();
        let capacity = usize::from(FIXED_RAM_END.saturating_sub(target));
        let bytes = listing::build_listing(dir_name.as_bytes(), &entries, capacity)?;

        let start = usize::from(target);
        mem.fixed_ram_mut()[start..start + bytes.len()].copy_from_slice(&bytes);
        tracing::debug!(
            entries = entries.len(),
            len = bytes.len(),
            "directory listing at ${target:04X}"
        );
        Ok(target.wrapping_add(bytes.len() as u16))
    }

    /// Name of the sandbox directory itself, so a root of `.` shows the
    /// directory it stands for.
    fn listing_title(&self) -> String {
        let absolute = fs::canonicalize(&self.root)
            .or_else(|_| std::env::current_dir().map(|cwd| cwd.join(&self.root)))
            .unwrap_or_else(|_| self.root.clone());
        absolute.file_name().map_or_else(
            || absolute.to_string_lossy().into_owned(),
            |n| n.to_string_lossy().into_owned(),
        )
    }

    /// Load a PRG file. Returns the end address (start plus the bytes
    /// transferred by the final chunk).
    pub fn load_file<V: VideoPort>(
        &self,
        mem: &mut X16Memory,
        video: &mut V,
        name: &[u8],
        request: LoadRequest,
    ) -> Result<u16, HypercallError> {
        let path = self.resolve(name)?;
        let mut file = File::open(&path).map_err(|_| HypercallError::NotFound(path.clone()))?;
        let metadata = file.metadata().map_err(|e| HypercallError::io(&path, e))?;
        if !metadata.is_file() {
            return Err(HypercallError::NotFound(path));
        }
        let read_failed = |e| HypercallError::io(&path, e);

        let mut header = [0u8; 2];
        read_fill(&mut file, &mut header).map_err(read_failed)?;
        let mut start = if request.secondary == 0 {
            request.override_address
        } else {
            u16::from_le_bytes(header)
        };

        let transferred = if request.mode > 1 {
            let [lo, hi] = start.to_le_bytes();
            video.write(video::ADDR_L, lo);
            video.write(video::ADDR_H, hi);
            video.write(
                video::ADDR_BANK,
                (request.mode.wrapping_sub(2) & 0x0F) | video::INCREMENT_1,
            );
            let mut buf = [0u8; VRAM_CHUNK];
            let mut total = 0usize;
            loop {
                let n = read_fill(&mut file, &mut buf).map_err(read_failed)?;
                if n == 0 {
                    break;
                }
                for &byte in &buf[..n] {
                    video.write(video::DATA, byte);
                }
                total += n;
            }
            total
        } else if start < FIXED_RAM_END {
            read_fill(&mut file, &mut mem.fixed_ram_mut()[usize::from(start)..])
                .map_err(read_failed)?
        } else if start < BANK_WINDOW_START {
            // I/O area: nothing is written.
            0
        } else if start < ROM_START {
            loop {
                let offset = usize::from(start - BANK_WINDOW_START);
                let len = BANK_SIZE - offset;
                let n = read_fill(&mut file, &mut mem.current_bank_mut()[offset..])
                    .map_err(read_failed)?;
                if n < len {
                    break n;
                }
                start = BANK_WINDOW_START;
                mem.set_ram_bank(mem.ram_bank().wrapping_add(1));
            }
        } else {
            // ROM: nothing is written.
            0
        };

        let end = start.wrapping_add(transferred as u16);
        tracing::debug!(
            file = %path.display(),
            bank = mem.ram_bank(),
            "LOAD ${start:04X}-${end:04X}"
        );
        Ok(end)
    }

    /// Save `[start, end)` as a PRG file.
    pub fn save_file(
        &self,
        mem: &mut X16Memory,
        name: &[u8],
        start: u16,
        end: u16,
    ) -> Result<(), HypercallError> {
        if end < start {
            return Err(HypercallError::InvalidRange { start, end });
        }
        let path = self.resolve(name)?;

        let mut image = Vec::with_capacity(2 + usize::from(end - start));
        image.extend_from_slice(&start.to_le_bytes());
        image.extend((start..end).map(|addr| mem.read(addr)));

        let mut file = File::create(&path).map_err(|e| HypercallError::io(&path, e))?;
        file.write_all(&image)
            .map_err(|e| HypercallError::io(&path, e))?;
        tracing::debug!(file = %path.display(), "SAVE ${start:04X}-${end:04X}");
        Ok(())
    }

    /// KERNAL LOAD trap. Filename and secondary address come from zero page,
    /// mode from A, override address from X/Y.
    pub fn load<V: VideoPort>(&self, mem: &mut X16Memory, video: &mut V, regs: &mut CpuRegisters) {
        let name = self.filename(mem);
        let override_address = regs.xy();

        let result = if name.first() == Some(&b'$') {
            self.directory_listing(mem, override_address)
        } else {
            let request = LoadRequest {
                secondary: mem.read(self.symbols.sa),
                mode: regs.a,
                override_address,
            };
            self.load_file(mem, video, &name, request)
        };

        match result {
            Ok(end) => {
                regs.set_xy(end);
                self.succeed(mem, regs);
            }
            Err(err) => self.fail(mem, regs, &err),
        }
    }

    /// KERNAL SAVE trap. A holds the zero-page address of the start pointer,
    /// X/Y the end address.
    pub fn save(&self, mem: &mut X16Memory, regs: &mut CpuRegisters) {
        let name = self.filename(mem);
        let start = mem.read_word(u16::from(regs.a));
        let end = regs.xy();

        match self.save_file(mem, &name, start, end) {
            Ok(()) => self.succeed(mem, regs),
            Err(err) => self.fail(mem, regs, &err),
        }
    }

    fn succeed(&self, mem: &mut X16Memory, regs: &mut CpuRegisters) {
        regs.set_carry(false);
        regs.a = 0;
        mem.write(self.symbols.status, 0);
    }

    fn fail(&self, mem: &mut X16Memory, regs: &mut CpuRegisters, err: &HypercallError) {
        regs.set_carry(true);
        match err {
            HypercallError::InvalidRange { .. } => {
                tracing::debug!("{err}");
                regs.a = 0;
            }
            _ => {
                tracing::warn!("{err}");
                regs.a = STATUS_FILE_NOT_FOUND;
                mem.write(self.symbols.status, STATUS_FILE_NOT_FOUND);
            }
        }
    }
}

/// Read until `buf` is full or the reader ends. Returns the bytes read.
fn read_fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hypercalls() -> Hypercalls {
        Hypercalls::new("/nonexistent", KernalSymbols::default())
    }

    #[test]
    fn xy_is_little_endian() {
        let mut regs = CpuRegisters {
            x: 0x01,
            y: 0x08,
            ..CpuRegisters::default()
        };
        assert_eq!(regs.xy(), 0x0801);
        regs.set_xy(0xA123);
        assert_eq!((regs.x, regs.y), (0x23, 0xA1));
    }

    #[test]
    fn carry_flag_only_touches_bit0() {
        let mut regs = CpuRegisters {
            p: 0x30,
            ..CpuRegisters::default()
        };
        regs.set_carry(true);
        assert_eq!(regs.p, 0x31);
        assert!(regs.carry());
        regs.set_carry(false);
        assert_eq!(regs.p, 0x30);
    }

    #[test]
    fn filename_bounded_by_length_and_nul() {
        let h = hypercalls();
        let mut mem = X16Memory::new(1);
        let sym = KernalSymbols::default();
        for (i, &b) in b"HELLO\0JUNK".iter().enumerate() {
            mem.write(0x0200 + i as u16, b);
        }
        mem.write(sym.fnadr, 0x00);
        mem.write(sym.fnadr + 1, 0x02);

        mem.write(sym.fnlen, 3);
        assert_eq!(h.filename(&mut mem), b"HEL");
        mem.write(sym.fnlen, 10);
        assert_eq!(h.filename(&mut mem), b"HELLO");
    }

    #[test]
    fn resolve_stays_in_sandbox() {
        let h = hypercalls();
        assert_eq!(
            h.resolve(b"GAME.PRG").expect("plain name"),
            PathBuf::from("/nonexistent/GAME.PRG")
        );
        assert_eq!(
            h.resolve(b"SUB/./A").expect("subdirectory"),
            PathBuf::from("/nonexistent/SUB/A")
        );
        assert!(matches!(h.resolve(b"../ESCAPE"), Err(HypercallError::InvalidName(_))));
        assert!(matches!(h.resolve(b"/etc/passwd"), Err(HypercallError::InvalidName(_))));
        assert!(matches!(h.resolve(b""), Err(HypercallError::NotFound(_))));
    }

    #[test]
    fn read_fill_stops_at_eof() {
        let mut src: &[u8] = &[1, 2, 3];
        let mut buf = [0u8; 8];
        assert_eq!(read_fill(&mut src, &mut buf).expect("slice read"), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device gone"))
        }
    }

    #[test]
    fn read_fill_reports_host_errors() {
        let mut buf = [0u8; 2];
        assert!(read_fill(&mut FailingReader, &mut buf).is_err());
    }

    #[test]
    fn missing_file_sets_not_found() {
        let h = hypercalls();
        let mut mem = X16Memory::new(1);
        let mut video = video::RecordingVideoPort::new();
        let sym = h.symbols();
        mem.write(0x0300, b'X');
        mem.write(sym.fnadr, 0x00);
        mem.write(sym.fnadr + 1, 0x03);
        mem.write(sym.fnlen, 1);

        let mut regs = CpuRegisters {
            x: 0x01,
            y: 0x08,
            ..CpuRegisters::default()
        };
        h.load(&mut mem, &mut video, &mut regs);
        assert!(regs.carry());
        assert_eq!(regs.a, STATUS_FILE_NOT_FOUND);
        assert_eq!(mem.read(sym.status), STATUS_FILE_NOT_FOUND);
        assert_eq!(regs.xy(), 0x0801, "X/Y untouched on failure");
        assert!(video.writes.is_empty());
    }
}
