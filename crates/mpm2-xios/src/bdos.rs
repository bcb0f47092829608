//! Minimal BDOS emulation for the boot phase.
//!
//! MPMLDR links against its own internal BDOS at a fixed entry address and
//! uses only a handful of CP/M 2.2 functions; trapping that one address and
//! emulating them here is enough to carry the loader until the full system
//! is up. Dispatch is keyed on the function number in register C, not on a
//! table offset.

use mpm2_platform::{Cpu, DiskServices, GuestMemory};
use tracing::trace;

use crate::dispatch::Xios;
use crate::EOF_CHAR;

const F_SYSTEM_RESET: u8 = 0;
const F_CONSOLE_IN: u8 = 1;
const F_CONSOLE_OUT: u8 = 2;
const F_DIRECT_IO: u8 = 6;
const F_PRINT_STRING: u8 = 9;
const F_CONSOLE_STATUS: u8 = 11;
const F_VERSION: u8 = 12;
const F_RESET_DISKS: u8 = 13;
const F_SELECT_DISK: u8 = 14;
const F_OPEN_FILE: u8 = 15;
const F_READ_SEQUENTIAL: u8 = 20;
const F_SET_DMA: u8 = 26;

/// Direct console I/O input request marker (function 6, E = 0xFF).
const DIRECT_IO_INPUT: u8 = 0xFF;

/// Strings are '$'-terminated; cap the walk so malformed guest data cannot
/// make the host scan unbounded memory.
const STRING_TERMINATOR: u8 = b'$';
const PRINT_STRING_LIMIT: usize = 1000;

impl Xios {
    /// Service one call to the loader's BDOS entry. C = function number,
    /// DE = parameter; everything runs against console 0, the only console
    /// that exists during boot. Unknown functions are a no-op. Ends with the
    /// synthetic return, like every trapped call.
    pub(crate) fn bdos_call(
        &mut self,
        cpu: &mut dyn Cpu,
        mem: &mut dyn GuestMemory,
        disk: &mut dyn DiskServices,
    ) {
        let func = cpu.c();
        let de = cpu.de();
        trace!(func, de, "loader bdos call");

        match func {
            // Stay in the loader; there is no CCP to reset into yet.
            F_SYSTEM_RESET => {}

            F_CONSOLE_IN => {
                match self.consoles().get(0).and_then(|con| con.read_char()) {
                    Some(ch) => {
                        cpu.set_a(ch);
                        // Echo.
                        if let Some(con) = self.consoles().get(0) {
                            let _ = con.write_char(ch);
                        }
                    }
                    None => cpu.set_a(EOF_CHAR),
                }
            }

            F_CONSOLE_OUT => {
                if let Some(con) = self.consoles().get(0) {
                    let _ = con.write_char((de & 0xFF) as u8);
                }
            }

            F_DIRECT_IO => {
                let param = (de & 0xFF) as u8;
                if param == DIRECT_IO_INPUT {
                    let pending = self
                        .consoles()
                        .get(0)
                        .filter(|con| con.status() != 0)
                        .and_then(|con| con.read_char());
                    cpu.set_a(pending.unwrap_or(0));
                } else if let Some(con) = self.consoles().get(0) {
                    let _ = con.write_char(param);
                }
            }

            F_PRINT_STRING => {
                if let Some(con) = self.consoles().get(0) {
                    let mut addr = de;
                    for _ in 0..PRINT_STRING_LIMIT {
                        let ch = mem.load(addr);
                        if ch == STRING_TERMINATOR {
                            break;
                        }
                        let _ = con.write_char(ch);
                        addr = addr.wrapping_add(1);
                    }
                }
            }

            F_CONSOLE_STATUS => {
                let status = match self.consoles().get(0) {
                    Some(con) => con.status(),
                    None => 0x00,
                };
                cpu.set_a(status);
            }

            F_VERSION => {
                // MP/M II reports BDOS version 2.2's base, 0x21.
                cpu.set_hl(0x0021);
                cpu.set_a(0x21);
            }

            F_RESET_DISKS => {
                disk.select(0);
                self.set_current_disk(0);
            }

            F_SELECT_DISK => {
                let selected = (de & 0x0F) as u8;
                self.set_current_disk(selected);
                disk.select(selected);
                cpu.set_a(0);
            }

            // File-level emulation does not exist yet; the loader sees
            // "not found" / EOF and reports accordingly.
            F_OPEN_FILE => cpu.set_a(0xFF),
            F_READ_SEQUENTIAL => cpu.set_a(1),

            F_SET_DMA => self.set_dma_addr(de),

            other => {
                trace!(func = other, "unhandled loader bdos function");
            }
        }

        self.ret(cpu, mem);
    }
}
