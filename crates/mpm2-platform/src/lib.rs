//! Seam traits between the XIOS bridge and the engines it drives.
//!
//! The trap dispatcher in `mpm2-xios` never executes guest instructions,
//! addresses raw bank memory, or parses disk images. It only consumes the
//! narrow interfaces defined here; the concrete Z80 core, banked-memory
//! engine and disk-image engine implement them and are composed with the
//! dispatcher by the embedding emulator.
#![forbid(unsafe_code)]

/// Z80 register pairs addressable by the XIOS call convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegPair {
    Af,
    Bc,
    De,
    Hl,
}

/// Register-level access to the emulated CPU.
///
/// The XIOS call convention passes arguments in BC/DE and returns results in
/// A or HL; the provided methods give the byte-sized views the handlers use
/// so implementors only supply whole-pair accessors.
pub trait Cpu {
    fn pc(&self) -> u16;
    fn set_pc(&mut self, pc: u16);
    fn sp(&self) -> u16;
    fn set_sp(&mut self, sp: u16);
    fn pair(&self, pair: RegPair) -> u16;
    fn set_pair(&mut self, pair: RegPair, value: u16);

    /// Drive both interrupt flip-flops (IFF1/IFF2) together. The bridge only
    /// ever sets them as a pair, as `EI`/`DI` would.
    fn set_interrupts_enabled(&mut self, enabled: bool);

    /// Accumulator (high byte of AF).
    fn a(&self) -> u8 {
        (self.pair(RegPair::Af) >> 8) as u8
    }

    fn set_a(&mut self, value: u8) {
        let af = self.pair(RegPair::Af);
        self.set_pair(RegPair::Af, (u16::from(value) << 8) | (af & 0x00FF));
    }

    fn b(&self) -> u8 {
        (self.pair(RegPair::Bc) >> 8) as u8
    }

    fn c(&self) -> u8 {
        (self.pair(RegPair::Bc) & 0x00FF) as u8
    }

    fn d(&self) -> u8 {
        (self.pair(RegPair::De) >> 8) as u8
    }

    fn e(&self) -> u8 {
        (self.pair(RegPair::De) & 0x00FF) as u8
    }

    fn bc(&self) -> u16 {
        self.pair(RegPair::Bc)
    }

    fn de(&self) -> u16 {
        self.pair(RegPair::De)
    }

    fn hl(&self) -> u16 {
        self.pair(RegPair::Hl)
    }

    fn set_hl(&mut self, value: u16) {
        self.set_pair(RegPair::Hl, value);
    }
}

/// Byte-level access to guest memory plus bank selection.
///
/// Addresses are guest addresses in the currently selected bank; which
/// physical page backs them is the banked-memory engine's business.
pub trait GuestMemory {
    fn load(&self, addr: u16) -> u8;
    fn store(&mut self, addr: u16, value: u8);

    /// Switch the active memory bank.
    fn select_bank(&mut self, bank: u8);

    /// Little-endian 16-bit load, wrapping at the top of the address space.
    fn load_word(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.load(addr), self.load(addr.wrapping_add(1))])
    }
}

/// Services of the external disk-image engine.
///
/// `read`/`write` return the guest's status-byte convention: 0 means success,
/// any nonzero value is an engine-defined error that the bridge surfaces to
/// the guest verbatim.
pub trait DiskServices {
    /// Select a drive; false rejects the drive (not mounted / out of range).
    fn select(&mut self, disk: u8) -> bool;
    fn set_track(&mut self, track: u16);
    fn set_sector(&mut self, sector: u16);
    fn set_dma(&mut self, dma: u16);
    fn read(&mut self, mem: &mut dyn GuestMemory) -> u8;
    fn write(&mut self, mem: &mut dyn GuestMemory) -> u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PairCpu {
        af: u16,
        bc: u16,
        de: u16,
        hl: u16,
    }

    impl Cpu for PairCpu {
        fn pc(&self) -> u16 {
            0
        }
        fn set_pc(&mut self, _pc: u16) {}
        fn sp(&self) -> u16 {
            0
        }
        fn set_sp(&mut self, _sp: u16) {}

        fn pair(&self, pair: RegPair) -> u16 {
            match pair {
                RegPair::Af => self.af,
                RegPair::Bc => self.bc,
                RegPair::De => self.de,
                RegPair::Hl => self.hl,
            }
        }

        fn set_pair(&mut self, pair: RegPair, value: u16) {
            match pair {
                RegPair::Af => self.af = value,
                RegPair::Bc => self.bc = value,
                RegPair::De => self.de = value,
                RegPair::Hl => self.hl = value,
            }
        }

        fn set_interrupts_enabled(&mut self, _enabled: bool) {}
    }

    #[test]
    fn byte_views_decompose_pairs() {
        let cpu = PairCpu {
            af: 0x12F0,
            bc: 0x3456,
            de: 0x789A,
            hl: 0xBCDE,
        };
        assert_eq!(cpu.a(), 0x12);
        assert_eq!(cpu.b(), 0x34);
        assert_eq!(cpu.c(), 0x56);
        assert_eq!(cpu.d(), 0x78);
        assert_eq!(cpu.e(), 0x9A);
        assert_eq!(cpu.hl(), 0xBCDE);
    }

    #[test]
    fn set_a_preserves_flags() {
        let mut cpu = PairCpu {
            af: 0x00A5,
            bc: 0,
            de: 0,
            hl: 0,
        };
        cpu.set_a(0x7F);
        assert_eq!(cpu.pair(RegPair::Af), 0x7FA5);
    }

    struct FlatMemory(Vec<u8>);

    impl GuestMemory for FlatMemory {
        fn load(&self, addr: u16) -> u8 {
            self.0[usize::from(addr)]
        }
        fn store(&mut self, addr: u16, value: u8) {
            self.0[usize::from(addr)] = value;
        }
        fn select_bank(&mut self, _bank: u8) {}
    }

    #[test]
    fn load_word_is_little_endian_and_wraps() {
        let mut mem = FlatMemory(vec![0; 0x10000]);
        mem.store(0x1000, 0x34);
        mem.store(0x1001, 0x12);
        assert_eq!(mem.load_word(0x1000), 0x1234);

        mem.store(0xFFFF, 0xCD);
        mem.store(0x0000, 0xAB);
        assert_eq!(mem.load_word(0xFFFF), 0xABCD);
    }
}
