//! Error types reported while bringing the PPS source up.

use core::fmt::{Debug, Display, Write};

/// An error that can be printed to a string device
pub trait MessageError: Debug {
    /// Print the error message to a writer
    fn print_to_writer(&self, f: &mut dyn Write) {
        if let Err(err) = f.write_fmt(format_args!("{:?}", self)) {
            let _ = f.write_fmt(format_args!("Error on printing error message: {:?}", err));
        }
    }
}

impl Display for dyn MessageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.print_to_writer(f);
        Ok(())
    }
}

/// Failures of [crate::PpsFpgaModule::init] and [crate::drivers::PpsFpga::probe].
///
/// Every variant is fatal: resources acquired before the failing step have
/// already been released when the error is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpsError {
    /// The register window could not be mapped.
    InvalidAddress { base: usize, cause: MmioError },
    /// The PPS subsystem refused the source.
    RegistrationFailed,
    /// The interrupt line could not be acquired.
    InterruptAttachFailed { irq: usize, cause: IntcError },
}

impl MessageError for PpsError {
    fn print_to_writer(&self, f: &mut dyn Write) {
        let res = match self {
            PpsError::InvalidAddress { base, cause } => {
                f.write_fmt(format_args!("invalid base address: {:#x} ({:?})", base, cause))
            }
            PpsError::RegistrationFailed => f.write_str("failed to register PPS source"),
            PpsError::InterruptAttachFailed { irq, cause } => {
                f.write_fmt(format_args!("failed to acquire IRQ {} ({:?})", irq, cause))
            }
        };
        if let Err(err) = res {
            let _ = f.write_fmt(format_args!("Error on printing error message: {:?}", err));
        }
    }
}

impl Display for PpsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.print_to_writer(f);
        Ok(())
    }
}

/// MMIO mapping failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmioError {
    /// The platform could not map the requested physical range.
    InvalidAddress,
    /// The window is too small for the PPS register block.
    NotEnoughSpace,
}

impl MessageError for MmioError {}

/// Reasons the interrupt subsystem gives for refusing a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntcError {
    /// Another handler owns the line and does not share it.
    LineBusy,
    /// No such interrupt line.
    InvalidLine,
    /// Refused for a platform-specific reason.
    Rejected,
}

impl MessageError for IntcError {}
