//! Interrupt path of the PPS FPGA.
//!
//! The FPGA latches its timestamp counter at the PPS edge and raises a
//! level interrupt. By the time [PpsFpgaIrq::on_signal] runs, some unknown
//! latency has passed; reading the running counter first thing and
//! subtracting the latched value measures it. The result is published as
//! the source's assert offset before the event is raised, so the PPS
//! subsystem reports the edge time rather than the handler time.
use crate::{
    dev::{
        counter::{TimestampCounter, delta},
        intc::{IrqHandler, IrqVerdict},
        mmio::RegisterWindow,
        regs::{PpsIrqBits, PpsReg},
    },
    pps::{LatencyCompensator, PpsMode, PpsRegistration, PpsSource},
};
use core::sync::atomic::{AtomicU32, Ordering};

/// Event counters of one device.
#[derive(Debug, Default)]
struct IrqCounters {
    handled: AtomicU32,
    spurious: AtomicU32,
    implausible: AtomicU32,
}

/// Snapshot of the interrupt counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PpsIrqStats {
    /// Interrupts that produced a PPS event.
    pub handled: u32,
    /// Interrupts on the line that were not raised by the PPS block.
    pub spurious: u32,
    /// Events whose latency was one second or more. The offset was applied anyway.
    pub implausible: u32,
}

/// Everything the interrupt path touches.
///
/// Field order is release order: the source is unregistered before the
/// register window is unmapped.
pub struct PpsFpgaIrq {
    source: PpsRegistration,
    window: RegisterWindow,
    compensator: LatencyCompensator,
    counters: IrqCounters,
}

impl PpsFpgaIrq {
    pub fn new(
        window: RegisterWindow,
        source: PpsRegistration,
        compensator: LatencyCompensator,
    ) -> PpsFpgaIrq {
        PpsFpgaIrq {
            source,
            window,
            compensator,
            counters: IrqCounters::default(),
        }
    }

    pub fn source(&self) -> &PpsSource {
        self.source.source()
    }

    pub fn window(&self) -> &RegisterWindow {
        &self.window
    }

    pub fn stats(&self) -> PpsIrqStats {
        PpsIrqStats {
            handled: self.counters.handled.load(Ordering::Relaxed),
            spurious: self.counters.spurious.load(Ordering::Relaxed),
            implausible: self.counters.implausible.load(Ordering::Relaxed),
        }
    }
}

impl IrqHandler for PpsFpgaIrq {
    fn on_signal(&self) -> IrqVerdict {
        let counter = TimestampCounter::new(&self.window);

        // Running counter for the latency measurement; must come first.
        let now = counter.sample_now();

        let sink = self.source.sink();
        let ts = sink.get_ts();

        let status = self.window.read32(PpsReg::IrqStatus);
        if !PpsIrqBits::from_bits_truncate(status).contains(PpsIrqBits::PPS) {
            self.counters.spurious.fetch_add(1, Ordering::Relaxed);
            return IrqVerdict::NotOurs;
        }

        // Write back exactly what was seen; bits raised since stay pending.
        self.window.write32(PpsReg::IrqStatus, status);

        let irq_cycle = counter.sample_latched();

        let source = self.source.source();
        let offset = self
            .compensator
            .publish(delta(now, irq_cycle), source.params());
        if !offset.is_plausible() {
            self.counters.implausible.fetch_add(1, Ordering::Relaxed);
        }

        sink.event(source, &ts, PpsMode::CAPTUREASSERT);
        self.counters.handled.fetch_add(1, Ordering::Relaxed);
        IrqVerdict::Handled
    }
}
