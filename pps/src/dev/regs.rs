//! Register map of the PPS block inside the FPGA window.
use bitflags::bitflags;

/// 32-bit registers of the PPS block, as byte offsets from the window base.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpsReg {
    /// Free-running timestamp counter, low word :0x100
    TscLsw = 0x100,
    /// Free-running timestamp counter, high word :0x104
    TscMsw = 0x104,
    /// Counter latched at the PPS edge, low word :0x108
    TscIrqLsw = 0x108,
    /// Counter latched at the PPS edge, high word :0x10c
    TscIrqMsw = 0x10c,
    /// PPS interrupt enable (RW) :0x128
    IrqEnable = 0x128,
    /// PPS interrupt status (R, write back to clear) :0x12c
    IrqStatus = 0x12c,
}

impl PpsReg {
    /// First byte past the PPS block; a window must cover at least this much.
    pub const BLOCK_END: usize = PpsReg::IrqStatus.offset() + size_of::<u32>();

    #[inline(always)]
    pub const fn offset(self) -> usize {
        self as usize
    }
}

bitflags! {
    /// Bits shared by [PpsReg::IrqEnable] and [PpsReg::IrqStatus].
    pub struct PpsIrqBits: u32 {
        /// Edge latched by the local timestamp counter
        const TSC   = 0x0000_0001;
        /// Edge from the external GPS receiver
        const GPS   = 0x0000_0002;
        /// Any PPS interrupt pending
        const PPS   = 0x8000_0000;
        /// Source selection field of the enable register
        const SOURCES = Self::TSC.bits() | Self::GPS.bits();
    }
}

impl PpsIrqBits {
    /// Enable value selecting only the local counter source, keeping any
    /// unrelated bits of `current` as they are.
    pub fn select_tsc(current: u32) -> u32 {
        (current & !PpsIrqBits::SOURCES.bits()) | PpsIrqBits::TSC.bits()
    }
}
