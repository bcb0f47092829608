use std::sync::Arc;

use mpm2_console::ConsoleRegistry;
use mpm2_platform::{Cpu, DiskServices, GuestMemory};
use tracing::trace;

use crate::clock::ClockFlags;
use crate::entry::EntryPoint;
use crate::{XiosConfig, XiosConfigError, DPH_STRIDE, DPH_TABLE_OFFSET, EOF_CHAR};

/// Each entry-point table occupies one 256-byte guest window.
const TABLE_WINDOW: u16 = 0x100;

/// Guest "device ready" / "device not ready" status bytes.
const READY: u8 = 0xFF;
const NOT_READY: u8 = 0x00;

/// Poll-device map: index 0 is the printer, 1-4 are console outputs 0-3,
/// 5-8 are console inputs 0-3.
const POLL_FIRST_CON_OUT: u8 = 1;
const POLL_FIRST_CON_IN: u8 = 5;
const POLL_LAST_CON_IN: u8 = 8;

fn window_offset(base: u16, pc: u16) -> Option<u16> {
    pc.checked_sub(base).filter(|offset| *offset < TABLE_WINDOW)
}

/// The XIOS trap dispatcher.
///
/// One instance exists per emulation session. It owns the console registry
/// and the latched disk-call state; the CPU, guest memory and disk engine
/// are borrowed per call so the embedding emulator keeps ownership of them.
pub struct Xios {
    cfg: XiosConfig,
    current_disk: u8,
    current_track: u16,
    current_sector: u16,
    dma_addr: u16,
    clock: Arc<ClockFlags>,
    consoles: ConsoleRegistry,
}

impl Xios {
    pub fn new(cfg: XiosConfig, consoles: ConsoleRegistry) -> Result<Self, XiosConfigError> {
        for base in [cfg.xios_base, cfg.ldr_bios_base] {
            if u32::from(base) + u32::from(TABLE_WINDOW) > 0x1_0000 {
                return Err(XiosConfigError::WindowWraps { base });
            }
        }
        if window_offset(cfg.xios_base, cfg.ldr_bios_base).is_some()
            || window_offset(cfg.ldr_bios_base, cfg.xios_base).is_some()
        {
            return Err(XiosConfigError::OverlappingWindows {
                xios: cfg.xios_base,
                ldr: cfg.ldr_bios_base,
            });
        }
        if window_offset(cfg.xios_base, cfg.ldr_bdos_entry).is_some()
            || window_offset(cfg.ldr_bios_base, cfg.ldr_bdos_entry).is_some()
        {
            return Err(XiosConfigError::BdosEntryInWindow {
                entry: cfg.ldr_bdos_entry,
            });
        }

        Ok(Self {
            cfg,
            current_disk: 0,
            current_track: 0,
            current_sector: 0,
            // CP/M's default record buffer.
            dma_addr: 0x0080,
            clock: Arc::new(ClockFlags::new()),
            consoles,
        })
    }

    /// Clock/preemption flags, for sharing with the host timer context.
    pub fn clock(&self) -> &Arc<ClockFlags> {
        &self.clock
    }

    /// Console set, for handing queue handles to host transports.
    pub fn consoles(&self) -> &ConsoleRegistry {
        &self.consoles
    }

    pub fn current_disk(&self) -> u8 {
        self.current_disk
    }

    pub fn current_track(&self) -> u16 {
        self.current_track
    }

    pub fn current_sector(&self) -> u16 {
        self.current_sector
    }

    pub fn dma_addr(&self) -> u16 {
        self.dma_addr
    }

    pub(crate) fn set_current_disk(&mut self, disk: u8) {
        self.current_disk = disk;
    }

    pub(crate) fn set_dma_addr(&mut self, dma: u16) {
        self.dma_addr = dma;
    }

    /// Whether `pc` is a recognized entry-point trap.
    ///
    /// True iff `pc` lands on a 3-aligned slot within either table's window,
    /// up to that table's last slot (IDLE for the full XIOS, SECTRAN for the
    /// LDRBIOS). The loader's BDOS entry is deliberately not part of this
    /// check; it is a separate single-address trap (see [`Xios::handle`]).
    pub fn is_trap(&self, pc: u16) -> bool {
        if let Some(offset) = window_offset(self.cfg.xios_base, pc) {
            return offset <= EntryPoint::LAST.offset() && offset % 3 == 0;
        }
        if let Some(offset) = window_offset(self.cfg.ldr_bios_base, pc) {
            return offset <= EntryPoint::LAST_BOOTSTRAP.offset() && offset % 3 == 0;
        }
        false
    }

    /// Main hook for the CPU loop, called with the PC of the instruction
    /// about to execute. Returns true iff the call was fully serviced here
    /// (CPU state now reflects the completed subroutine call); false means
    /// the CPU should fetch and execute normally.
    pub fn handle(
        &mut self,
        cpu: &mut dyn Cpu,
        mem: &mut dyn GuestMemory,
        disk: &mut dyn DiskServices,
    ) -> bool {
        if cpu.pc() == self.cfg.ldr_bdos_entry {
            self.bdos_call(cpu, mem, disk);
            return true;
        }
        self.dispatch(cpu, mem, disk)
    }

    /// Entry-point table dispatch. False leaves all state untouched.
    pub fn dispatch(
        &mut self,
        cpu: &mut dyn Cpu,
        mem: &mut dyn GuestMemory,
        disk: &mut dyn DiskServices,
    ) -> bool {
        let pc = cpu.pc();
        let (offset, bootstrap) = match window_offset(self.cfg.xios_base, pc) {
            Some(offset) => (offset, false),
            None => match window_offset(self.cfg.ldr_bios_base, pc) {
                Some(offset) => (offset, true),
                None => return false,
            },
        };

        let last = if bootstrap {
            EntryPoint::LAST_BOOTSTRAP
        } else {
            EntryPoint::LAST
        };
        if offset > last.offset() {
            return false;
        }
        let Some(entry) = EntryPoint::from_offset(offset) else {
            return false;
        };

        // The LDRBIOS carries its own DPH/DPB tables, distinct from the full
        // XIOS's; only the loader's native code knows which to return, so its
        // SELDSK runs on the Z80 instead of being trapped.
        if bootstrap && entry == EntryPoint::SelDsk {
            return false;
        }

        trace!(pc, ?entry, bootstrap, "xios trap");

        match entry {
            // Cold and warm boot are reserved for a proper restart sequence.
            EntryPoint::Boot | EntryPoint::Wboot => {}
            EntryPoint::ConSt => self.con_status(cpu),
            EntryPoint::ConIn => self.con_in(cpu),
            EntryPoint::ConOut => self.con_out(cpu, bootstrap),
            // No list or punch device is attached.
            EntryPoint::List | EntryPoint::Punch => {}
            EntryPoint::Reader => cpu.set_a(EOF_CHAR),
            EntryPoint::Home => self.current_track = 0,
            EntryPoint::SelDsk => self.sel_dsk(cpu, disk),
            EntryPoint::SetTrk => self.current_track = cpu.bc(),
            EntryPoint::SetSec => self.current_sector = cpu.bc(),
            EntryPoint::SetDma => self.dma_addr = cpu.bc(),
            EntryPoint::Read => self.disk_read(cpu, mem, disk),
            EntryPoint::Write => self.disk_write(cpu, mem, disk),
            EntryPoint::ListSt => cpu.set_a(READY),
            // No translation table; logical and physical sectors coincide.
            EntryPoint::SecTran => {
                let logical = cpu.bc();
                cpu.set_hl(logical);
            }
            EntryPoint::SelMemory => self.sel_memory(cpu, mem),
            EntryPoint::PollDevice => self.poll_device(cpu),
            EntryPoint::StartClock => self.clock.set_tick_enabled(true),
            EntryPoint::StopClock => self.clock.set_tick_enabled(false),
            EntryPoint::ExitRegion => {
                if !self.clock.preempted() {
                    cpu.set_interrupts_enabled(true);
                }
            }
            EntryPoint::MaxConsole => cpu.set_a(self.consoles.max_consoles()),
            EntryPoint::SystemInit => self.system_init(),
            // Nothing runnable; a polled guest just calls back in.
            EntryPoint::Idle => {}
        }

        self.ret(cpu, mem);
        true
    }

    /// The synthetic subroutine return every handled trap ends with: pop the
    /// little-endian return address at SP, advance SP by 2, jump to it.
    pub(crate) fn ret(&self, cpu: &mut dyn Cpu, mem: &mut dyn GuestMemory) {
        let sp = cpu.sp();
        let ret_addr = mem.load_word(sp);
        cpu.set_sp(sp.wrapping_add(2));
        cpu.set_pc(ret_addr);
    }

    // D = console number.
    fn con_status(&mut self, cpu: &mut dyn Cpu) {
        let status = match self.consoles.get(cpu.d()) {
            Some(con) => con.status(),
            None => NOT_READY,
        };
        cpu.set_a(status);
    }

    // D = console number; A = character, EOF if absent or idle. Never blocks:
    // a polled guest retries on its own schedule.
    fn con_in(&mut self, cpu: &mut dyn Cpu) {
        let ch = self
            .consoles
            .get(cpu.d())
            .and_then(|con| con.read_char())
            .unwrap_or(EOF_CHAR);
        cpu.set_a(ch);
    }

    // C = character. During the bootstrap phase only console 0 exists and D
    // is not reliably set, so a trap below the full table forces console 0.
    fn con_out(&mut self, cpu: &mut dyn Cpu, bootstrap: bool) {
        let console = if bootstrap { 0 } else { cpu.d() };
        let ch = cpu.c();
        if let Some(con) = self.consoles.get(console) {
            // A full output queue drops the byte; trap dispatch must not stall.
            let _ = con.write_char(ch);
        }
    }

    // C = disk number. HL = DPH address, or 0x0000 for a rejected drive
    // (in which case the latched disk is left alone).
    fn sel_dsk(&mut self, cpu: &mut dyn Cpu, disk: &mut dyn DiskServices) {
        let requested = cpu.c();
        if !disk.select(requested) {
            cpu.set_hl(0x0000);
            return;
        }
        self.current_disk = requested;
        let dph = self
            .cfg
            .xios_base
            .wrapping_add(DPH_TABLE_OFFSET)
            .wrapping_add(u16::from(requested) * DPH_STRIDE);
        cpu.set_hl(dph);
    }

    fn disk_read(
        &mut self,
        cpu: &mut dyn Cpu,
        mem: &mut dyn GuestMemory,
        disk: &mut dyn DiskServices,
    ) {
        self.stage_transfer(disk);
        let status = disk.read(mem);
        cpu.set_a(status);
    }

    fn disk_write(
        &mut self,
        cpu: &mut dyn Cpu,
        mem: &mut dyn GuestMemory,
        disk: &mut dyn DiskServices,
    ) {
        self.stage_transfer(disk);
        let status = disk.write(mem);
        cpu.set_a(status);
    }

    // Push the latched track/sector/DMA into the engine. Last write wins per
    // field, whatever order the guest issued the setters in.
    fn stage_transfer(&self, disk: &mut dyn DiskServices) {
        disk.set_track(self.current_track);
        disk.set_sector(self.current_sector);
        disk.set_dma(self.dma_addr);
    }

    // BC = address of a memory descriptor: base(1), size(1), attrib(1),
    // bank(1). Only the bank byte matters to the switch itself.
    fn sel_memory(&mut self, cpu: &mut dyn Cpu, mem: &mut dyn GuestMemory) {
        let desc_addr = cpu.bc();
        let bank = mem.load(desc_addr.wrapping_add(3));
        mem.select_bank(bank);
    }

    // C = device number per the poll map.
    fn poll_device(&mut self, cpu: &mut dyn Cpu) {
        let device = cpu.c();
        let status = if device == 0 {
            // Printer: no physical device, report ready.
            READY
        } else if (POLL_FIRST_CON_OUT..POLL_FIRST_CON_IN).contains(&device) {
            // Console output never back-pressures the guest.
            READY
        } else if (POLL_FIRST_CON_IN..=POLL_LAST_CON_IN).contains(&device) {
            let console = device - POLL_FIRST_CON_IN;
            match self.consoles.get(console) {
                Some(con) => con.status(),
                None => NOT_READY,
            }
        } else {
            NOT_READY
        };
        cpu.set_a(status);
    }

    // C = breakpoint RST number, DE = breakpoint handler, HL = XIOS direct
    // jump table. Interrupt-vector installation in each bank is not wired up
    // yet; the console set is (re)established as on real init.
    fn system_init(&mut self) {
        self.consoles.init();
    }
}
