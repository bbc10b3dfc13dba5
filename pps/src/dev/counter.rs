//! The FPGA timestamp counter.
//!
//! A 64-bit counter runs at a fixed clock. On a PPS edge the hardware copies
//! it into the latch registers, so the edge instant can be recovered later
//! no matter when software gets around to looking.
//!
//! Latency measurement only needs the low words: a handler runs
//! microseconds after the edge while the low word wraps every ~43 s at 100 MHz,
//! so wrapping subtraction of two low words is always the true distance.
use crate::dev::{mmio::RegisterWindow, regs::PpsReg};
use utils::define_struct;

define_struct!(
    wrapping,
    /// Low word of the timestamp counter, a point on a 2^32 tick circle.
    CounterSample,
    u32
);

define_struct!(
    copy,
    /// A forward distance on the counter, in ticks.
    Ticks,
    u32
);

/// Forward distance from `latched` to `now`, modulo 2^32.
#[inline(always)]
pub fn delta(now: CounterSample, latched: CounterSample) -> Ticks {
    Ticks::from(now - latched)
}

/// Tick-to-time conversion for a counter clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterClock {
    period_ns: u32,
}

impl CounterClock {
    pub const fn from_period_ns(period_ns: u32) -> CounterClock {
        CounterClock { period_ns }
    }

    pub const fn period_ns(&self) -> u32 {
        self.period_ns
    }

    /// `ticks * period`; never overflows since both factors are 32-bit.
    #[inline(always)]
    pub const fn ticks_to_nanoseconds(&self, ticks: Ticks) -> i64 {
        ticks.into_const() as i64 * self.period_ns as i64
    }
}

/// Reads of the counter registers through a borrowed [RegisterWindow].
pub struct TimestampCounter<'a> {
    window: &'a RegisterWindow,
}

impl<'a> TimestampCounter<'a> {
    pub fn new(window: &'a RegisterWindow) -> TimestampCounter<'a> {
        TimestampCounter { window }
    }

    /// Low word of the running counter, i.e. "now".
    #[inline(always)]
    pub fn sample_now(&self) -> CounterSample {
        CounterSample::from(self.window.read32(PpsReg::TscLsw))
    }

    /// Low word frozen at the last PPS edge.
    #[inline(always)]
    pub fn sample_latched(&self) -> CounterSample {
        CounterSample::from(self.window.read32(PpsReg::TscIrqLsw))
    }

    /// Full 64-bit running counter.
    pub fn read_full_now(&self) -> u64 {
        self.read_full(PpsReg::TscMsw, PpsReg::TscLsw)
    }

    /// Full 64-bit latched counter.
    pub fn read_full_latched(&self) -> u64 {
        self.read_full(PpsReg::TscIrqMsw, PpsReg::TscIrqLsw)
    }

    // hi/lo/hi: retry if a carry into the high word happened between the reads
    fn read_full(&self, msw: PpsReg, lsw: PpsReg) -> u64 {
        loop {
            let hi = self.window.read32(msw);
            let lo = self.window.read32(lsw);
            if self.window.read32(msw) == hi {
                return (hi as u64) << 32 | lo as u64;
            }
        }
    }
}
