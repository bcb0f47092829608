#![allow(dead_code)]

//! Mock CPU / memory / disk collaborators for exercising the dispatcher.

use mpm2_console::ConsoleRegistry;
use mpm2_platform::{Cpu, DiskServices, GuestMemory, RegPair};
use mpm2_xios::{Xios, XiosConfig};

/// Return address planted on the guest stack before each trapped call.
pub const RET_ADDR: u16 = 0x8042;

pub struct TestCpu {
    pairs: [u16; 4],
    sp: u16,
    pc: u16,
    /// Last value passed to `set_interrupts_enabled`, if any.
    pub interrupts_enabled: Option<bool>,
}

impl TestCpu {
    pub fn new() -> Self {
        Self {
            pairs: [0; 4],
            sp: 0xD000,
            pc: 0,
            interrupts_enabled: None,
        }
    }

    pub fn set_d(&mut self, value: u8) {
        let de = self.pair(RegPair::De);
        self.set_pair(RegPair::De, (u16::from(value) << 8) | (de & 0x00FF));
    }

    pub fn set_c(&mut self, value: u8) {
        let bc = self.pair(RegPair::Bc);
        self.set_pair(RegPair::Bc, (bc & 0xFF00) | u16::from(value));
    }

    pub fn set_bc(&mut self, value: u16) {
        self.set_pair(RegPair::Bc, value);
    }

    pub fn set_de(&mut self, value: u16) {
        self.set_pair(RegPair::De, value);
    }
}

impl Cpu for TestCpu {
    fn pc(&self) -> u16 {
        self.pc
    }
    fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }
    fn sp(&self) -> u16 {
        self.sp
    }
    fn set_sp(&mut self, sp: u16) {
        self.sp = sp;
    }

    fn pair(&self, pair: RegPair) -> u16 {
        self.pairs[pair_index(pair)]
    }

    fn set_pair(&mut self, pair: RegPair, value: u16) {
        self.pairs[pair_index(pair)] = value;
    }

    fn set_interrupts_enabled(&mut self, enabled: bool) {
        self.interrupts_enabled = Some(enabled);
    }
}

fn pair_index(pair: RegPair) -> usize {
    match pair {
        RegPair::Af => 0,
        RegPair::Bc => 1,
        RegPair::De => 2,
        RegPair::Hl => 3,
    }
}

pub struct TestMemory {
    pub bytes: Vec<u8>,
    pub selected_banks: Vec<u8>,
}

impl TestMemory {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; 0x1_0000],
            selected_banks: Vec::new(),
        }
    }
}

impl GuestMemory for TestMemory {
    fn load(&self, addr: u16) -> u8 {
        self.bytes[usize::from(addr)]
    }
    fn store(&mut self, addr: u16, value: u8) {
        self.bytes[usize::from(addr)] = value;
    }
    fn select_bank(&mut self, bank: u8) {
        self.selected_banks.push(bank);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOp {
    Read,
    Write,
}

/// Parameters the engine saw at transfer time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub op: TransferOp,
    pub track: u16,
    pub sector: u16,
    pub dma: u16,
}

pub struct TestDisk {
    pub drive_count: u8,
    pub selected: Vec<u8>,
    pub track: u16,
    pub sector: u16,
    pub dma: u16,
    pub read_status: u8,
    pub write_status: u8,
    pub transfers: Vec<Transfer>,
}

impl TestDisk {
    pub fn new() -> Self {
        Self {
            drive_count: 4,
            selected: Vec::new(),
            track: 0xAAAA,
            sector: 0xAAAA,
            dma: 0xAAAA,
            read_status: 0,
            write_status: 0,
            transfers: Vec::new(),
        }
    }
}

impl DiskServices for TestDisk {
    fn select(&mut self, disk: u8) -> bool {
        if disk >= self.drive_count {
            return false;
        }
        self.selected.push(disk);
        true
    }
    fn set_track(&mut self, track: u16) {
        self.track = track;
    }
    fn set_sector(&mut self, sector: u16) {
        self.sector = sector;
    }
    fn set_dma(&mut self, dma: u16) {
        self.dma = dma;
    }
    fn read(&mut self, _mem: &mut dyn GuestMemory) -> u8 {
        self.transfers.push(Transfer {
            op: TransferOp::Read,
            track: self.track,
            sector: self.sector,
            dma: self.dma,
        });
        self.read_status
    }
    fn write(&mut self, _mem: &mut dyn GuestMemory) -> u8 {
        self.transfers.push(Transfer {
            op: TransferOp::Write,
            track: self.track,
            sector: self.sector,
            dma: self.dma,
        });
        self.write_status
    }
}

pub struct Fixture {
    pub xios: Xios,
    pub cpu: TestCpu,
    pub mem: TestMemory,
    pub disk: TestDisk,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_registry(ConsoleRegistry::default())
    }

    pub fn with_registry(registry: ConsoleRegistry) -> Self {
        Self::with_config(XiosConfig::default(), registry)
    }

    pub fn with_config(cfg: XiosConfig, registry: ConsoleRegistry) -> Self {
        let xios = Xios::new(cfg, registry).expect("test config is valid");
        Self {
            xios,
            cpu: TestCpu::new(),
            mem: TestMemory::new(),
            disk: TestDisk::new(),
        }
    }

    /// Plant `RET_ADDR` on the guest stack, point PC at `addr`, and run the
    /// dispatcher's main hook.
    pub fn trap(&mut self, addr: u16) -> bool {
        let sp = self.cpu.sp().wrapping_sub(2);
        let [lo, hi] = RET_ADDR.to_le_bytes();
        self.mem.bytes[usize::from(sp)] = lo;
        self.mem.bytes[usize::from(sp.wrapping_add(1))] = hi;
        self.cpu.set_sp(sp);
        self.cpu.set_pc(addr);
        self.xios.handle(&mut self.cpu, &mut self.mem, &mut self.disk)
    }

    /// Assert the synthetic return happened: SP back where it started, PC at
    /// the planted return address.
    pub fn assert_returned(&self, sp_before_call: u16) {
        assert_eq!(self.cpu.sp(), sp_before_call);
        assert_eq!(self.cpu.pc(), RET_ADDR);
    }

    /// Move everything the guest wrote to console `index` back into its
    /// input queue (the loopback transport used by end-to-end tests).
    pub fn loopback(&mut self, index: u8) {
        let con = self.xios.consoles().get(index).expect("console exists");
        while let Some(byte) = con.output().try_read() {
            assert!(con.input().try_write(byte));
        }
    }
}
