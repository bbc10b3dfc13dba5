//! Boundary to the host PPS (time discipline) subsystem.
//!
//! The subsystem owns registered sources and turns capture events into
//! timestamps for its consumers. This module defines what the driver hands
//! over: the source description, the parameters it publishes, and the
//! [PpsSink] operations it calls.
use crate::debug_ex;
use crate::dev::handle::Handle;
use bitflags::bitflags;
use core::{
    fmt::Debug,
    sync::atomic::{AtomicI64, AtomicU32, Ordering},
};

pub mod offset;

pub use offset::{LatencyCompensator, LatencyOffset};

pub const NSEC_PER_SEC: i64 = 1_000_000_000;

bitflags! {
    /// Source capabilities and event kinds, with the PPS API bit values.
    pub struct PpsMode: u32 {
        /// Capture assert events
        const CAPTUREASSERT = 0x01;
        /// Capture clear events
        const CAPTURECLEAR  = 0x02;
        const CAPTUREBOTH   = Self::CAPTUREASSERT.bits() | Self::CAPTURECLEAR.bits();
        /// Apply the assert offset to assert timestamps
        const OFFSETASSERT  = 0x10;
        /// Apply the clear offset to clear timestamps
        const OFFSETCLEAR   = 0x20;
        /// Echo assert events
        const ECHOASSERT    = 0x40;
        /// Echo clear events
        const ECHOCLEAR     = 0x80;
        /// Consumers may block waiting for an event
        const CANWAIT       = 0x100;
        /// Consumers may poll
        const CANPOLL       = 0x200;
        /// Timestamps as seconds + nanoseconds
        const TSFMT_TSPEC   = 0x1000;
        /// Timestamps in NTP fixed point
        const TSFMT_NTPFP   = 0x2000;
    }
}

/// A point in time as seconds and nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timespec {
    pub sec: i64,
    pub nsec: i64,
}

impl Timespec {
    pub const fn new(sec: i64, nsec: i64) -> Timespec {
        Timespec { sec, nsec }
    }

    /// Normalize so that `0 <= nsec < NSEC_PER_SEC`.
    pub const fn normalized(self) -> Timespec {
        Timespec {
            sec: self.sec + self.nsec.div_euclid(NSEC_PER_SEC),
            nsec: self.nsec.rem_euclid(NSEC_PER_SEC),
        }
    }

    /// The timestamp moved by `offset`, normalized.
    pub const fn add_offset(self, offset: LatencyOffset) -> Timespec {
        Timespec {
            sec: self.sec + offset.sec,
            nsec: self.nsec + offset.nsec,
        }
        .normalized()
    }
}

/// System time taken when an event is noticed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PpsEventTime {
    pub ts_real: Timespec,
}

/// Description of a source, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PpsSourceInfo {
    pub name: &'static str,
    /// Everything the source is able to do.
    pub mode: PpsMode,
}

impl PpsSourceInfo {
    /// Whether the capabilities describe a usable source: at least one
    /// capture edge and a timestamp format.
    pub fn is_valid(&self) -> bool {
        self.mode.intersects(PpsMode::CAPTUREBOTH)
            && self
                .mode
                .intersects(PpsMode::TSFMT_TSPEC | PpsMode::TSFMT_NTPFP)
    }
}

/// Per-source parameters shared between the driver and the subsystem.
///
/// The assert offset is written by the interrupt handler right before it
/// raises an event and read by the subsystem while handling that event, on
/// the same CPU and in that order, so plain relaxed atomics suffice.
#[derive(Debug)]
pub struct PpsParams {
    mode: AtomicU32,
    assert_off_sec: AtomicI64,
    assert_off_nsec: AtomicI64,
}

impl PpsParams {
    pub const fn new(mode: PpsMode) -> PpsParams {
        PpsParams {
            mode: AtomicU32::new(mode.bits()),
            assert_off_sec: AtomicI64::new(0),
            assert_off_nsec: AtomicI64::new(0),
        }
    }

    /// Currently active mode.
    pub fn mode(&self) -> PpsMode {
        PpsMode::from_bits_truncate(self.mode.load(Ordering::Relaxed))
    }

    pub fn set_mode(&self, mode: PpsMode) {
        self.mode.store(mode.bits(), Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn assert_offset(&self) -> LatencyOffset {
        LatencyOffset {
            sec: self.assert_off_sec.load(Ordering::Relaxed),
            nsec: self.assert_off_nsec.load(Ordering::Relaxed),
        }
    }

    #[inline(always)]
    pub fn set_assert_offset(&self, offset: LatencyOffset) {
        self.assert_off_sec.store(offset.sec, Ordering::Relaxed);
        self.assert_off_nsec.store(offset.nsec, Ordering::Relaxed);
    }
}

/// A source as registered with the subsystem.
#[derive(Debug)]
pub struct PpsSource {
    info: PpsSourceInfo,
    params: PpsParams,
}

impl PpsSource {
    /// Used by [PpsSink] implementations to create the registered object.
    pub fn new(info: PpsSourceInfo, default_params: PpsMode) -> PpsSource {
        PpsSource {
            info,
            params: PpsParams::new(default_params),
        }
    }

    pub fn info(&self) -> &PpsSourceInfo {
        &self.info
    }

    pub fn params(&self) -> &PpsParams {
        &self.params
    }
}

pub type PpsSourceRef = Handle<PpsSource>;

/// The host PPS subsystem.
pub trait PpsSink: Sync {
    /// Register a source with the given capabilities and initially active mode.
    /// Return [None] if the source is refused.
    fn register_source(&self, info: PpsSourceInfo, default_params: PpsMode) -> Option<PpsSourceRef>;

    fn unregister_source(&self, source: PpsSourceRef);

    /// Current system time. Callable from interrupt context.
    fn get_ts(&self) -> PpsEventTime;

    /// Report an event of kind `event` seen at `ts`.
    ///
    /// In [PpsMode::OFFSETASSERT] mode the sink corrects assert timestamps by the
    /// source's current [PpsParams::assert_offset]. Callable from interrupt context.
    fn event(&self, source: &PpsSource, ts: &PpsEventTime, event: PpsMode);
}

/// A registered source; unregistered when dropped.
pub struct PpsRegistration {
    source: PpsSourceRef,
    sink: &'static dyn PpsSink,
}

impl PpsRegistration {
    pub fn register(
        sink: &'static dyn PpsSink,
        info: PpsSourceInfo,
        default_params: PpsMode,
    ) -> Option<PpsRegistration> {
        let source = sink.register_source(info, default_params)?;
        debug_ex!("pps-fpga: source '{}' registered", info.name);
        Some(PpsRegistration { source, sink })
    }

    #[inline(always)]
    pub fn source(&self) -> &PpsSource {
        &self.source
    }

    #[inline(always)]
    pub fn sink(&self) -> &'static dyn PpsSink {
        self.sink
    }
}

impl Drop for PpsRegistration {
    fn drop(&mut self) {
        self.sink.unregister_source(self.source.clone());
        debug_ex!("pps-fpga: source '{}' unregistered", self.source.info().name);
    }
}

impl Debug for PpsRegistration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PpsRegistration")
            .field("source", &self.source.info().name)
            .finish()
    }
}
