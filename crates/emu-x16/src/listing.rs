//! `LOAD "$"` directory listing.
//!
//! The listing is a tokenised BASIC program placed straight into RAM (no
//! load address), so `LIST` prints it as a disk catalog:
//!
//! ```text
//! 0 "HYPERDIR        " 00 PC
//! 2    "GAME.PRG"         PRG
//! 65535 BLOCKS FREE.
//! ```
//!
//! Each line is `link(2) line-number(2) text... 00`. The link words are
//! placeholders (`01 01`); BASIC relinks the program after loading. The
//! block count of an entry is its line number. The program ends with a
//! zero link.

use std::fs;
use std::io;
use std::path::Path;

use crate::hypercall::HypercallError;

const LINK_PLACEHOLDER: [u8; 2] = [0x01, 0x01];
const REVERSE_ON: u8 = 0x12;
const NAME_WIDTH: usize = 16;
const BLOCK_SIZE: u64 = 256;
const BLOCKS_FREE: u16 = 0xFFFF;

/// One file in the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: Vec<u8>,
    pub size: u64,
}

/// 256-byte blocks needed for `size` bytes, capped at 65535.
#[must_use]
pub fn blocks(size: u64) -> u16 {
    size.div_ceil(BLOCK_SIZE).min(u64::from(u16::MAX)) as u16
}

/// Bounds-checked output buffer with a fixed capacity.
pub struct ListingWriter {
    buf: Vec<u8>,
    capacity: usize,
}

impl ListingWriter {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::new(),
            capacity,
        }
    }

    /// Append `bytes`, or fail without writing anything if they don't fit.
    pub fn push(&mut self, bytes: &[u8]) -> Result<(), HypercallError> {
        if bytes.len() > self.remaining() {
            return Err(HypercallError::ListingOverflow {
                needed: self.buf.len() + bytes.len(),
                capacity: self.capacity,
            });
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

fn push_padded(line: &mut Vec<u8>, text: &[u8]) {
    let len = text.len().min(NAME_WIDTH);
    line.extend_from_slice(&text[..len]);
    line.extend(std::iter::repeat_n(b' ', NAME_WIDTH - len));
}

/// Title line: reverse-video quoted directory name and the disk ID.
#[must_use]
pub fn header_line(dir_name: &[u8]) -> Vec<u8> {
    let mut line = Vec::with_capacity(32);
    line.extend_from_slice(&LINK_PLACEHOLDER);
    line.extend_from_slice(&[0x00, 0x00]);
    line.push(REVERSE_ON);
    line.push(b'"');
    push_padded(&mut line, dir_name);
    line.extend_from_slice(b"\" 00 PC");
    line.push(0);
    line
}

/// One file line: block count as line number, right-justified quoted name
/// and the `PRG` type.
#[must_use]
pub fn entry_line(entry: &DirEntry) -> Vec<u8> {
    let count = blocks(entry.size);
    let mut line = Vec::with_capacity(32);
    line.extend_from_slice(&LINK_PLACEHOLDER);
    line.extend_from_slice(&count.to_le_bytes());
    let pad = match count {
        0..=9 => 3,
        10..=99 => 2,
        100..=999 => 1,
        _ => 0,
    };
    line.extend(std::iter::repeat_n(b' ', pad));
    let len = entry.name.len().min(NAME_WIDTH);
    line.push(b'"');
    line.extend_from_slice(&entry.name[..len]);
    line.push(b'"');
    line.extend(std::iter::repeat_n(b' ', NAME_WIDTH - len));
    line.extend_from_slice(b" PRG");
    line.push(0);
    line
}

/// `65535 BLOCKS FREE.` followed by the end-of-program link.
#[must_use]
pub fn footer() -> Vec<u8> {
    let mut line = Vec::with_capacity(20);
    line.extend_from_slice(&LINK_PLACEHOLDER);
    line.extend_from_slice(&BLOCKS_FREE.to_le_bytes());
    line.extend_from_slice(b"BLOCKS FREE.");
    line.push(0);
    line.extend_from_slice(&[0x00, 0x00]);
    line
}

/// Build a listing of at most `capacity` bytes.
///
/// Entries that would crowd out the footer are left off. Fails only when
/// header and footer alone do not fit.
pub fn build_listing(
    dir_name: &[u8],
    entries: &[DirEntry],
    capacity: usize,
) -> Result<Vec<u8>, HypercallError> {
    let footer = footer();
    let header = header_line(dir_name);
    if header.len() + footer.len() > capacity {
        return Err(HypercallError::ListingOverflow {
            needed: header.len() + footer.len(),
            capacity,
        });
    }

    let mut writer = ListingWriter::with_capacity(capacity);
    writer.push(&header)?;
    for (shown, entry) in entries.iter().enumerate() {
        let line = entry_line(entry);
        if line.len() + footer.len() > writer.remaining() {
            tracing::debug!(
                shown,
                total = entries.len(),
                "directory listing truncated to fit memory"
            );
            break;
        }
        writer.push(&line)?;
    }
    writer.push(&footer)?;
    Ok(writer.into_bytes())
}

/// Files in `dir`, sorted by name. Entries whose metadata cannot be read
/// are listed with size zero.
pub fn read_entries(dir: &Path) -> io::Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    for item in fs::read_dir(dir)? {
        let item = item?;
        let size = item.metadata().map(|m| m.len()).unwrap_or(0);
        let name = item.file_name().to_string_lossy().into_owned().into_bytes();
        entries.push(DirEntry { name, size });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
