//! MP/M II Extended I/O System (XIOS) bridge.
//!
//! The guest OS expects a fixed-layout jump table of I/O entry points
//! (console, disk, clock, memory-bank, preemption control) at a known
//! address. Real hardware backs each slot with machine code; here the CPU
//! loop hands every program counter to [`Xios::handle`], which either
//! declares "not a trap" or performs the slot's operation in host code and
//! synthesizes the `RET` the guest's caller is waiting for.
//!
//! Two tables coexist: the full XIOS installed by system generation
//! (default base 0xFC00) and the reduced LDRBIOS table the bootstrap loader
//! runs against before the full table exists. The loader's internal BDOS
//! entry is a third, single-address trap serviced by a minimal CP/M
//! system-call emulation (see `bdos.rs`).
//!
//! All guest-facing failures are expressed in the guest's own status-byte
//! conventions; nothing in this crate escalates them to a host error.
#![forbid(unsafe_code)]

mod bdos;
mod clock;
mod dispatch;
mod entry;

pub use clock::ClockFlags;
pub use dispatch::Xios;
pub use entry::EntryPoint;

use thiserror::Error;

/// CP/M end-of-file / "no input" sentinel (^Z).
pub const EOF_CHAR: u8 = 0x1A;

/// Disk-parameter-header table offset from the XIOS base.
pub const DPH_TABLE_OFFSET: u16 = 0x100;

/// Bytes per disk-parameter header.
pub const DPH_STRIDE: u16 = 16;

/// Addresses of the trap windows the dispatcher recognizes.
///
/// `xios_base` is set once by system generation (GENSYS) and never moves
/// during a run; the loader-phase addresses are fixed by the shipped
/// MPMLDR image.
#[derive(Debug, Clone)]
pub struct XiosConfig {
    /// Base of the full 256-byte XIOS entry-point window.
    pub xios_base: u16,
    /// Base of the LDRBIOS entry-point window used during boot.
    pub ldr_bios_base: u16,
    /// MPMLDR's internal BDOS entry; trapped separately, never routed
    /// through the tables.
    pub ldr_bdos_entry: u16,
}

impl Default for XiosConfig {
    fn default() -> Self {
        Self {
            xios_base: 0xFC00,
            ldr_bios_base: 0x1700,
            ldr_bdos_entry: 0x0D06,
        }
    }
}

/// Rejected [`XiosConfig`] shapes.
///
/// The dispatcher's classification relies on a program counter mapping to at
/// most one table, so the two 256-byte windows must be disjoint, stay below
/// the top of the address space, and must not swallow the BDOS entry.
#[derive(Debug, Error)]
pub enum XiosConfigError {
    #[error("entry-point window at {base:#06x} wraps past the top of guest memory")]
    WindowWraps { base: u16 },

    #[error("entry-point windows overlap: xios={xios:#06x} ldr={ldr:#06x}")]
    OverlappingWindows { xios: u16, ldr: u16 },

    #[error("loader BDOS entry {entry:#06x} falls inside an entry-point window")]
    BdosEntryInWindow { entry: u16 },
}
