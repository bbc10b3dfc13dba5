//! Bring-up and teardown of the PPS FPGA device.
//!
//! Acquisition order is: register window, interrupt configuration, PPS
//! source, interrupt line. Every acquired resource is held by a guard whose
//! `Drop` releases it, and guards are owned so that they drop in reverse
//! acquisition order. An early return from [PpsFpga::probe] therefore unwinds
//! exactly what was acquired so far, and the handler is attached last so it
//! never sees a half-built device.
use crate::{
    Platform,
    config::PpsFpgaConfig,
    debug_ex,
    dev::{
        counter::CounterClock,
        handle::Handle,
        intc::{IrqHandler, IrqRegistration, TriggerMode},
        mmio::RegisterWindow,
        regs::{PpsIrqBits, PpsReg},
    },
    drivers::irq::{PpsFpgaIrq, PpsIrqStats},
    error::PpsError,
    pps::{LatencyCompensator, PpsMode, PpsRegistration, PpsSource, PpsSourceInfo},
};
use alloc::sync::Arc;
use log::{error, info, warn};

/// Capabilities the source registers with.
pub const PPS_FPGA_MODE: PpsMode = PpsMode::from_bits_truncate(
    PpsMode::CAPTUREASSERT.bits()
        | PpsMode::OFFSETASSERT.bits()
        | PpsMode::ECHOASSERT.bits()
        | PpsMode::CANWAIT.bits()
        | PpsMode::TSFMT_TSPEC.bits(),
);

/// Mode active right after registration.
pub const PPS_FPGA_DEFAULT_PARAMS: PpsMode =
    PpsMode::from_bits_truncate(PpsMode::CAPTUREASSERT.bits() | PpsMode::OFFSETASSERT.bits());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevicePhase {
    Uninitialized,
    Mapped,
    IrqConfigured,
    SourceRegistered,
    /// Handler attached; events are being delivered.
    Running,
    Detaching,
    TornDown,
}

fn advance(from: DevicePhase, to: DevicePhase) -> DevicePhase {
    debug_ex!("pps-fpga: {:?} -> {:?}", from, to);
    to
}

/// Select the local counter as the only PPS interrupt source and drop
/// anything left pending from before.
fn configure_irq(window: &RegisterWindow) {
    let enable = window.read32(PpsReg::IrqEnable);
    window.write32(PpsReg::IrqEnable, PpsIrqBits::select_tsc(enable));

    let status = window.read32(PpsReg::IrqStatus);
    window.write32(PpsReg::IrqStatus, status);
}

/// A running PPS FPGA device.
///
/// Dropping it releases everything like [PpsFpga::teardown] does, minus the log line.
pub struct PpsFpga {
    config: PpsFpgaConfig,
    phase: DevicePhase,
    // Must stay ahead of `irq_ctx`: the line is freed before the handler state goes.
    irq: IrqRegistration,
    irq_ctx: Handle<PpsFpgaIrq>,
}

impl PpsFpga {
    pub fn probe(platform: &'static dyn Platform, config: PpsFpgaConfig) -> Result<PpsFpga, PpsError> {
        let phase = DevicePhase::Uninitialized;

        let window = RegisterWindow::map(platform.io(), config.base, config.size).map_err(|cause| {
            error!("invalid base address: {:#x}", config.base);
            PpsError::InvalidAddress {
                base: config.base,
                cause,
            }
        })?;
        let phase = advance(phase, DevicePhase::Mapped);

        configure_irq(&window);
        let phase = advance(phase, DevicePhase::IrqConfigured);

        let info = PpsSourceInfo {
            name: config.source_name(),
            mode: PPS_FPGA_MODE,
        };
        let Some(source) = PpsRegistration::register(platform.pps(), info, PPS_FPGA_DEFAULT_PARAMS)
        else {
            error!("failed to register IRQ {} as PPS source", config.irq);
            drop(window);
            advance(phase, DevicePhase::Uninitialized);
            return Err(PpsError::RegistrationFailed);
        };
        let phase = advance(phase, DevicePhase::SourceRegistered);

        let compensator = LatencyCompensator::new(CounterClock::from_period_ns(config.clk_ns));
        let irq_ctx = Arc::new(PpsFpgaIrq::new(window, source, compensator));
        let handler: Arc<dyn IrqHandler> = irq_ctx.clone();
        let irq = match IrqRegistration::request(
            platform.intc(),
            config.irq,
            TriggerMode::LevelHigh,
            info.name,
            Handle::from_arc(handler),
        ) {
            Ok(irq) => irq,
            Err(cause) => {
                error!("failed to acquire IRQ {}", config.irq);
                drop(irq_ctx);
                advance(phase, DevicePhase::Uninitialized);
                return Err(PpsError::InterruptAttachFailed {
                    irq: config.irq,
                    cause,
                });
            }
        };
        let phase = advance(phase, DevicePhase::Running);

        info!("Registered IRQ {} as PPS source", config.irq);
        Ok(PpsFpga {
            config,
            phase,
            irq,
            irq_ctx: Handle::from_arc(irq_ctx),
        })
    }

    /// Detach the handler, unregister the source and unmap the registers, in that order.
    pub fn teardown(self) {
        let PpsFpga {
            config,
            phase,
            irq,
            irq_ctx,
        } = self;
        let phase = advance(phase, DevicePhase::Detaching);

        drop(irq);
        if Handle::holders(&irq_ctx) != 1 {
            warn!(
                "pps-fpga: handler for IRQ {} still referenced after detach",
                config.irq
            );
        }
        drop(irq_ctx);

        advance(phase, DevicePhase::TornDown);
        info!("removed IRQ {} as PPS source", config.irq);
    }

    pub fn phase(&self) -> DevicePhase {
        self.phase
    }

    pub fn config(&self) -> &PpsFpgaConfig {
        &self.config
    }

    pub fn irq(&self) -> usize {
        self.irq.irq()
    }

    pub fn source(&self) -> &PpsSource {
        self.irq_ctx.source()
    }

    pub fn stats(&self) -> PpsIrqStats {
        self.irq_ctx.stats()
    }
}
