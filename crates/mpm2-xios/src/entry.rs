/// XIOS entry points; each discriminant is the slot's byte offset into the
/// jump table (3 bytes per entry, matching the published MP/M II ordering
/// that GENSYS and the loader compute jump targets from).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum EntryPoint {
    Boot = 0x00,
    Wboot = 0x03,
    ConSt = 0x06,
    ConIn = 0x09,
    ConOut = 0x0C,
    List = 0x0F,
    Punch = 0x12,
    Reader = 0x15,
    Home = 0x18,
    SelDsk = 0x1B,
    SetTrk = 0x1E,
    SetSec = 0x21,
    SetDma = 0x24,
    Read = 0x27,
    Write = 0x2A,
    ListSt = 0x2D,
    SecTran = 0x30,
    SelMemory = 0x33,
    PollDevice = 0x36,
    StartClock = 0x39,
    StopClock = 0x3C,
    ExitRegion = 0x3F,
    MaxConsole = 0x42,
    SystemInit = 0x45,
    Idle = 0x48,
}

impl EntryPoint {
    /// Last slot of the full XIOS table.
    pub const LAST: EntryPoint = EntryPoint::Idle;

    /// Last slot present in the loader-phase (LDRBIOS) table; the extended
    /// entries past SECTRAN only exist once the full XIOS is installed.
    pub const LAST_BOOTSTRAP: EntryPoint = EntryPoint::SecTran;

    pub fn from_offset(offset: u16) -> Option<Self> {
        if offset % 3 != 0 {
            return None;
        }
        Some(match offset {
            0x00 => Self::Boot,
            0x03 => Self::Wboot,
            0x06 => Self::ConSt,
            0x09 => Self::ConIn,
            0x0C => Self::ConOut,
            0x0F => Self::List,
            0x12 => Self::Punch,
            0x15 => Self::Reader,
            0x18 => Self::Home,
            0x1B => Self::SelDsk,
            0x1E => Self::SetTrk,
            0x21 => Self::SetSec,
            0x24 => Self::SetDma,
            0x27 => Self::Read,
            0x2A => Self::Write,
            0x2D => Self::ListSt,
            0x30 => Self::SecTran,
            0x33 => Self::SelMemory,
            0x36 => Self::PollDevice,
            0x39 => Self::StartClock,
            0x3C => Self::StopClock,
            0x3F => Self::ExitRegion,
            0x42 => Self::MaxConsole,
            0x45 => Self::SystemInit,
            0x48 => Self::Idle,
            _ => return None,
        })
    }

    pub fn offset(self) -> u16 {
        self as u16
    }
}
