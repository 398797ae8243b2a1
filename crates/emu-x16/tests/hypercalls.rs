//! LOAD/SAVE against a real directory.

use std::fs;
use std::path::Path;

use emu_core::Bus;
use emu_x16::hypercall::STATUS_FILE_NOT_FOUND;
use emu_x16::listing::{self, DirEntry};
use emu_x16::video;
use emu_x16::{
    CpuRegisters, Hypercalls, KernalSymbols, RecordingVideoPort, X16, X16Config, X16Memory,
};
use tempfile::TempDir;

const NAME_BUF: u16 = 0x0200;

struct Rig {
    dir: TempDir,
    hypercalls: Hypercalls,
    mem: X16Memory,
    video: RecordingVideoPort,
    sym: KernalSymbols,
}

impl Rig {
    fn new(ram_banks: usize) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let sym = KernalSymbols::default();
        let mut mem = X16Memory::new(ram_banks);
        mem.write(sym.status, 0x42);
        Self {
            hypercalls: Hypercalls::new(dir.path(), sym),
            dir,
            mem,
            video: RecordingVideoPort::new(),
            sym,
        }
    }

    fn put_file(&self, name: &str, bytes: &[u8]) {
        fs::write(self.dir.path().join(name), bytes).expect("write test file");
    }

    fn set_name(&mut self, name: &[u8], secondary: u8) {
        for (i, &b) in name.iter().enumerate() {
            self.mem.write(NAME_BUF + i as u16, b);
        }
        let [lo, hi] = NAME_BUF.to_le_bytes();
        self.mem.write(self.sym.fnadr, lo);
        self.mem.write(self.sym.fnadr + 1, hi);
        self.mem.write(self.sym.fnlen, name.len() as u8);
        self.mem.write(self.sym.sa, secondary);
    }

    fn load(&mut self, mode: u8, xy: u16) -> CpuRegisters {
        let mut regs = CpuRegisters {
            a: mode,
            ..CpuRegisters::default()
        };
        regs.set_xy(xy);
        self.hypercalls.load(&mut self.mem, &mut self.video, &mut regs);
        regs
    }

    fn save(&mut self, start: u16, end: u16) -> CpuRegisters {
        let [lo, hi] = start.to_le_bytes();
        self.mem.write(0x00FB, lo);
        self.mem.write(0x00FC, hi);
        let mut regs = CpuRegisters {
            a: 0xFB,
            ..CpuRegisters::default()
        };
        regs.set_xy(end);
        self.hypercalls.save(&mut self.mem, &mut regs);
        regs
    }

    fn status(&mut self) -> u8 {
        self.mem.read(self.sym.status)
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }
}

fn prg(load_address: u16, data: &[u8]) -> Vec<u8> {
    let mut bytes = load_address.to_le_bytes().to_vec();
    bytes.extend_from_slice(data);
    bytes
}

fn assert_ok(rig: &mut Rig, regs: &CpuRegisters) {
    assert!(!regs.carry(), "carry set");
    assert_eq!(regs.a, 0);
    assert_eq!(rig.status(), 0);
}

fn assert_not_found(rig: &mut Rig, regs: &CpuRegisters) {
    assert!(regs.carry(), "carry clear");
    assert_eq!(regs.a, STATUS_FILE_NOT_FOUND);
    assert_eq!(rig.status(), STATUS_FILE_NOT_FOUND);
}

fn dir_name(path: &Path) -> Vec<u8> {
    path.file_name()
        .expect("tempdir has a name")
        .to_string_lossy()
        .into_owned()
        .into_bytes()
}

#[test]
fn directory_listing_in_memory() {
    let mut rig = Rig::new(1);
    rig.put_file("VERYLONGNAME1234567", &[0; 10]);
    rig.put_file("A", &[0; 300]);
    rig.set_name(b"$", 1);

    let regs = rig.load(0, 0x0801);
    assert_ok(&mut rig, &regs);

    let mut expected = listing::header_line(&dir_name(rig.dir.path()));
    expected.extend(listing::entry_line(&DirEntry {
        name: b"A".to_vec(),
        size: 300,
    }));
    expected.extend(listing::entry_line(&DirEntry {
        name: b"VERYLONGNAME1234567".to_vec(),
        size: 10,
    }));
    expected.extend(listing::footer());

    let end = 0x0801 + expected.len();
    assert_eq!(&rig.mem.fixed_ram()[0x0801..end], &expected[..]);
    assert_eq!(usize::from(regs.xy()), end);
    // "A" is 300 bytes: two blocks
    assert_eq!(&rig.mem.fixed_ram()[0x0801 + 32..0x0801 + 34], &[2, 0]);
}

#[test]
fn listing_title_names_the_directory_not_dot() {
    let sym = KernalSymbols::default();
    let mut mem = X16Memory::new(1);
    let hypercalls = Hypercalls::new(".", sym);
    hypercalls
        .directory_listing(&mut mem, 0x0801)
        .expect("current directory lists");

    let cwd = std::env::current_dir().expect("cwd");
    let expected = listing::header_line(&dir_name(&cwd));
    assert_eq!(&mem.fixed_ram()[0x0801..0x0801 + expected.len()], &expected[..]);
}

#[test]
fn listing_title_resolves_parent_components() {
    let rig = Rig::new(1);
    fs::create_dir(rig.path("SUB")).expect("mkdir");
    let mut mem = X16Memory::new(1);
    let hypercalls = Hypercalls::new(rig.dir.path().join("SUB").join(".."), rig.sym);
    hypercalls
        .directory_listing(&mut mem, 0x0801)
        .expect("lists");

    let expected = listing::header_line(&dir_name(rig.dir.path()));
    assert_eq!(&mem.fixed_ram()[0x0801..0x0801 + expected.len()], &expected[..]);
}

#[test]
fn listing_too_close_to_io_is_not_found() {
    let mut rig = Rig::new(1);
    rig.put_file("A", &[0; 10]);
    rig.set_name(b"$", 1);
    let before = rig.mem.fixed_ram()[0x0400..0x9F00].to_vec();

    let regs = rig.load(0, 0x9EF0);
    assert_not_found(&mut rig, &regs);
    assert_eq!(regs.xy(), 0x9EF0);
    assert_eq!(&rig.mem.fixed_ram()[0x0400..0x9F00], &before[..]);
}

#[test]
fn load_into_fixed_ram() {
    let mut rig = Rig::new(1);
    rig.put_file("GAME", &prg(0x0801, &[1, 2, 3]));
    rig.set_name(b"GAME", 1);

    let regs = rig.load(0, 0x1000);
    assert_ok(&mut rig, &regs);
    assert_eq!(regs.xy(), 0x0804);
    assert_eq!(&rig.mem.fixed_ram()[0x0801..0x0804], &[1, 2, 3]);
    assert_eq!(rig.mem.read(0x1000), 0);
}

#[test]
fn secondary_zero_uses_xy() {
    let mut rig = Rig::new(1);
    rig.put_file("GAME", &prg(0x0801, &[1, 2, 3]));
    rig.set_name(b"GAME", 0);

    let regs = rig.load(0, 0x1000);
    assert_ok(&mut rig, &regs);
    assert_eq!(regs.xy(), 0x1003);
    assert_eq!(&rig.mem.fixed_ram()[0x1000..0x1003], &[1, 2, 3]);
    assert_eq!(rig.mem.read(0x0801), 0);
}

#[test]
fn fixed_ram_load_stops_at_io() {
    let mut rig = Rig::new(2);
    rig.put_file("LONG", &prg(0x9E00, &[7; 0x200]));
    rig.set_name(b"LONG", 1);

    let regs = rig.load(0, 0);
    assert_ok(&mut rig, &regs);
    assert_eq!(regs.xy(), 0x9F00);
    assert!(rig.mem.fixed_ram()[0x9E00..].iter().all(|&b| b == 7));
    assert_eq!(rig.mem.fixed_ram().len(), 0x9F00);
    assert_eq!(rig.mem.read(0x9F00), 0xFF);
    assert_eq!(rig.mem.ram_bank(), 0);
    assert!(rig.mem.bank(0).iter().all(|&b| b == 0));
    assert!(rig.mem.bank(1).iter().all(|&b| b == 0));
}

#[test]
fn loading_a_directory_is_not_found() {
    let mut rig = Rig::new(1);
    fs::create_dir(rig.path("SUBDIR")).expect("mkdir");
    rig.set_name(b"SUBDIR", 1);

    let regs = rig.load(0, 0x0801);
    assert_not_found(&mut rig, &regs);
    assert_eq!(regs.xy(), 0x0801);
    assert_eq!(rig.mem.read(0x0000), 0);
}

#[test]
fn banked_load_wraps_to_next_bank() {
    let mut rig = Rig::new(4);
    rig.mem.set_ram_bank(3);
    rig.put_file("BANKED", &prg(0xBFFE, &[9, 8, 7, 6]));
    rig.set_name(b"BANKED", 1);

    let regs = rig.load(0, 0);
    assert_ok(&mut rig, &regs);
    assert_eq!(&rig.mem.bank(3)[0x1FFE..], &[9, 8]);
    // Bank 3 was the last one; the next is bank 0
    assert_eq!(rig.mem.ram_bank(), 0);
    assert_eq!(&rig.mem.bank(0)[..2], &[7, 6]);
    assert_eq!(regs.xy(), 0xA002);
}

#[test]
fn banked_load_within_one_bank() {
    let mut rig = Rig::new(4);
    rig.mem.set_ram_bank(1);
    rig.put_file("SMALL", &prg(0xA100, &[5; 16]));
    rig.set_name(b"SMALL", 1);

    let regs = rig.load(0, 0);
    assert_ok(&mut rig, &regs);
    assert_eq!(rig.mem.ram_bank(), 1);
    assert_eq!(&rig.mem.bank(1)[0x100..0x110], &[5; 16]);
    assert_eq!(regs.xy(), 0xA110);
}

#[test]
fn load_into_video_memory() {
    let mut rig = Rig::new(1);
    rig.put_file("TILES", &prg(0x1234, &[0xAA, 0xBB]));
    rig.set_name(b"TILES", 1);

    let regs = rig.load(3, 0);
    assert_ok(&mut rig, &regs);
    assert_eq!(
        rig.video.writes,
        vec![
            (video::ADDR_L, 0x34),
            (video::ADDR_H, 0x12),
            (video::ADDR_BANK, 0x11),
            (video::DATA, 0xAA),
            (video::DATA, 0xBB),
        ]
    );
    assert_eq!(regs.xy(), 0x1236);
    assert_eq!(rig.mem.read(0x1234), 0, "RAM untouched");
}

#[test]
fn load_into_io_or_rom_transfers_nothing() {
    let mut rig = Rig::new(1);
    rig.put_file("IO", &prg(0x9F10, &[1, 2]));
    rig.put_file("ROM", &prg(0xC000, &[1, 2]));

    rig.set_name(b"IO", 1);
    let regs = rig.load(0, 0);
    assert_ok(&mut rig, &regs);
    assert_eq!(regs.xy(), 0x9F10);

    rig.set_name(b"ROM", 1);
    let regs = rig.load(0, 0);
    assert_ok(&mut rig, &regs);
    assert_eq!(regs.xy(), 0xC000);
    assert_eq!(rig.mem.read(0xC000), 0xFF);
}

#[test]
fn missing_file_reports_not_found() {
    let mut rig = Rig::new(1);
    rig.set_name(b"NOPE", 1);
    let before = rig.mem.fixed_ram()[0x0400..0x9F00].to_vec();

    let regs = rig.load(0, 0x0801);
    assert_not_found(&mut rig, &regs);
    assert_eq!(regs.xy(), 0x0801);
    assert_eq!(&rig.mem.fixed_ram()[0x0400..0x9F00], &before[..]);
}

#[test]
fn names_cannot_escape_the_directory() {
    let mut rig = Rig::new(1);
    rig.set_name(b"../ESCAPE", 1);
    let regs = rig.load(0, 0x0801);
    assert_not_found(&mut rig, &regs);

    rig.set_name(b"../ESCAPE", 1);
    let regs = rig.save(0x0801, 0x0810);
    assert_not_found(&mut rig, &regs);
    assert!(!rig.dir.path().parent().expect("parent").join("ESCAPE").exists());
}

#[test]
fn save_empty_range_writes_header_only() {
    let mut rig = Rig::new(1);
    rig.set_name(b"EMPTY", 1);
    let regs = rig.save(0x0801, 0x0801);
    assert_ok(&mut rig, &regs);
    assert_eq!(fs::read(rig.path("EMPTY")).expect("saved"), vec![0x01, 0x08]);
}

#[test]
fn save_reversed_range_creates_nothing() {
    let mut rig = Rig::new(1);
    rig.set_name(b"BAD", 1);
    let regs = rig.save(0x0801, 0x0800);
    assert!(regs.carry());
    assert_eq!(regs.a, 0);
    assert_eq!(rig.status(), 0x42, "STATUS untouched");
    assert!(!rig.path("BAD").exists());
}

#[test]
fn save_then_load_round_trip() {
    let mut rig = Rig::new(1);
    let data: Vec<u8> = (0..16).map(|i| i * 7).collect();
    for (i, &b) in data.iter().enumerate() {
        rig.mem.write(0x2000 + i as u16, b);
    }
    rig.set_name(b"RT", 1);
    let regs = rig.save(0x2000, 0x2010);
    assert_ok(&mut rig, &regs);
    assert_eq!(fs::read(rig.path("RT")).expect("saved"), prg(0x2000, &data));

    for i in 0..16 {
        rig.mem.write(0x2000 + i, 0);
    }
    let regs = rig.load(0, 0);
    assert_ok(&mut rig, &regs);
    assert_eq!(regs.xy(), 0x2010);
    assert_eq!(&rig.mem.fixed_ram()[0x2000..0x2010], &data[..]);
}

#[test]
fn machine_forwards_hypercalls() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("HELLO"), prg(0x0801, &[0xEA])).expect("write");
    let mut x16 =
        X16::new(X16Config::default().with_hypercall_path(dir.path())).expect("valid config");
    let sym = x16.hypercalls().symbols();

    for (i, &b) in b"HELLO".iter().enumerate() {
        x16.write(NAME_BUF + i as u16, b);
    }
    x16.write(sym.fnadr, 0x00);
    x16.write(sym.fnadr + 1, 0x02);
    x16.write(sym.fnlen, 5);
    x16.write(sym.sa, 1);

    let mut video = RecordingVideoPort::new();
    let mut regs = CpuRegisters::default();
    x16.load(&mut video, &mut regs);
    assert!(!regs.carry());
    assert_eq!(x16.read(0x0801), 0xEA);

    regs.a = 0xFB;
    x16.write(0x00FB, 0x01);
    x16.write(0x00FC, 0x08);
    regs.set_xy(0x0802);
    x16.write(sym.fnlen, 4);
    x16.save(&mut regs);
    assert!(!regs.carry());
    assert_eq!(
        fs::read(dir.path().join("HELL")).expect("saved"),
        vec![0x01, 0x08, 0xEA]
    );
}
