//! Drivers built on top of [crate::dev].

pub mod irq;
mod pps_fpga;

pub use irq::{PpsFpgaIrq, PpsIrqStats};
pub use pps_fpga::*;
