//! This module contains the hardware-facing pieces of the driver:
//! register access, the timestamp counter and the interrupt boundary.

pub mod counter;
pub mod handle;
pub mod intc;
pub mod mmio;
pub mod regs;
