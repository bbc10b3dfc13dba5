//! Interrupt latency compensation.
use crate::{
    dev::counter::{CounterClock, Ticks},
    pps::{NSEC_PER_SEC, PpsParams},
};

/// Signed correction to add to a reported event time to recover the
/// physical edge time. Produced by [LatencyCompensator], always `<= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatencyOffset {
    pub sec: i64,
    pub nsec: i64,
}

impl LatencyOffset {
    pub const ZERO: LatencyOffset = LatencyOffset { sec: 0, nsec: 0 };

    pub const fn total_nanoseconds(&self) -> i64 {
        self.sec * NSEC_PER_SEC + self.nsec
    }

    /// Whether the magnitude is below one second.
    ///
    /// Larger latencies cannot come from a real interrupt on a one-pulse-per-second
    /// signal; they point at a stale or garbage latch value.
    pub const fn is_plausible(&self) -> bool {
        self.total_nanoseconds() > -NSEC_PER_SEC
    }
}

/// Converts the tick distance between edge and handler into an offset and
/// publishes it as the source's assert offset.
#[derive(Debug, Clone, Copy)]
pub struct LatencyCompensator {
    clock: CounterClock,
}

impl LatencyCompensator {
    pub const fn new(clock: CounterClock) -> LatencyCompensator {
        LatencyCompensator { clock }
    }

    #[inline(always)]
    pub const fn compute_offset(&self, ticks: Ticks) -> LatencyOffset {
        LatencyOffset {
            sec: 0,
            nsec: -self.clock.ticks_to_nanoseconds(ticks),
        }
    }

    /// Compute the offset for `ticks` and store it in `params`.
    ///
    /// Must complete before the event that consumes it is raised.
    #[inline(always)]
    pub fn publish(&self, ticks: Ticks, params: &PpsParams) -> LatencyOffset {
        let offset = self.compute_offset(ticks);
        params.set_assert_offset(offset);
        offset
    }
}
