//! In-memory platform for unit tests.
//!
//! Register file, PPS subsystem and interrupt controller share one ordered
//! journal of [Event]s so tests can assert the order of acquisitions and releases.
use crate::{
    Platform,
    dev::{
        handle::Handle,
        intc::{IrqController, IrqHandler, IrqToken, IrqVerdict, TriggerMode},
        mmio::{IoMapper, RegisterIo},
        regs::PpsReg,
    },
    error::IntcError,
    pps::{
        LatencyOffset, PpsEventTime, PpsMode, PpsSink, PpsSource, PpsSourceInfo, PpsSourceRef,
        Timespec,
    },
};
use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use spin::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Map(usize, usize),
    Unmap,
    RegWrite(PpsReg, u32),
    Register(&'static str),
    RegisterRefused(&'static str),
    Unregister(&'static str),
    Attach(usize, TriggerMode),
    AttachRefused(usize),
    Detach(usize),
}

/// One event as the PPS subsystem saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    pub ts: PpsEventTime,
    pub kind: PpsMode,
    pub assert_offset: LatencyOffset,
    /// `ts` corrected by the offset when offset-assert mode is active.
    pub edge: Timespec,
}

type EventLog = Arc<Mutex<Vec<Event>>>;

const REGS: [PpsReg; 6] = [
    PpsReg::TscLsw,
    PpsReg::TscMsw,
    PpsReg::TscIrqLsw,
    PpsReg::TscIrqMsw,
    PpsReg::IrqEnable,
    PpsReg::IrqStatus,
];

fn reg_at(offset: usize) -> PpsReg {
    REGS.into_iter()
        .find(|reg| reg.offset() == offset)
        .unwrap_or_else(|| panic!("access outside the PPS block: {:#x}", offset))
}

/// The PPS block of the FPGA. The status register is write-one-to-clear.
pub struct FakeFpga {
    regs: [AtomicU32; PpsReg::BLOCK_END / 4],
    reads: Mutex<Vec<PpsReg>>,
    raise_on_status_read: AtomicU32,
    log: EventLog,
}

impl FakeFpga {
    fn new(log: EventLog) -> FakeFpga {
        FakeFpga {
            regs: core::array::from_fn(|_| AtomicU32::new(0)),
            reads: Mutex::new(Vec::new()),
            raise_on_status_read: AtomicU32::new(0),
            log,
        }
    }

    fn cell(&self, reg: PpsReg) -> &AtomicU32 {
        &self.regs[reg.offset() / 4]
    }

    /// Set a register as the hardware would; not journaled.
    pub fn set(&self, reg: PpsReg, value: u32) {
        self.cell(reg).store(value, Ordering::SeqCst);
    }

    /// Peek at a register; not journaled.
    pub fn get(&self, reg: PpsReg) -> u32 {
        self.cell(reg).load(Ordering::SeqCst)
    }

    /// Registers read by the driver, in order.
    pub fn reads(&self) -> Vec<PpsReg> {
        self.reads.lock().clone()
    }

    pub fn clear_reads(&self) {
        self.reads.lock().clear();
    }

    /// Make `bits` become pending right after the next status read.
    pub fn raise_after_status_read(&self, bits: u32) {
        self.raise_on_status_read.store(bits, Ordering::SeqCst);
    }
}

struct FakeIo {
    fpga: Arc<FakeFpga>,
}

impl RegisterIo for FakeIo {
    fn read32(&self, offset: usize) -> u32 {
        let reg = reg_at(offset);
        self.fpga.reads.lock().push(reg);
        let value = self.fpga.get(reg);
        if reg == PpsReg::IrqStatus {
            let raised = self.fpga.raise_on_status_read.swap(0, Ordering::SeqCst);
            self.fpga.cell(reg).fetch_or(raised, Ordering::SeqCst);
        }
        value
    }

    fn write32(&self, offset: usize, value: u32) {
        let reg = reg_at(offset);
        self.fpga.log.lock().push(Event::RegWrite(reg, value));
        if reg == PpsReg::IrqStatus {
            self.fpga.cell(reg).fetch_and(!value, Ordering::SeqCst);
        } else {
            self.fpga.set(reg, value);
        }
    }
}

struct IrqLine {
    irq: usize,
    token: IrqToken,
    handler: Handle<dyn IrqHandler>,
}

pub struct FakePlatform {
    log: EventLog,
    fpga: Arc<FakeFpga>,
    now: Mutex<Timespec>,
    captures: Mutex<Vec<Capture>>,
    lines: Mutex<Vec<IrqLine>>,
    next_token: AtomicUsize,
    fail_ioremap: AtomicBool,
    fail_register: AtomicBool,
    fail_request_irq: Mutex<Option<IntcError>>,
}

impl FakePlatform {
    pub fn leak() -> &'static FakePlatform {
        let log: EventLog = Arc::new(Mutex::new(Vec::new()));
        Box::leak(Box::new(FakePlatform {
            fpga: Arc::new(FakeFpga::new(log.clone())),
            log,
            now: Mutex::new(Timespec::default()),
            captures: Mutex::new(Vec::new()),
            lines: Mutex::new(Vec::new()),
            next_token: AtomicUsize::new(1),
            fail_ioremap: AtomicBool::new(false),
            fail_register: AtomicBool::new(false),
            fail_request_irq: Mutex::new(None),
        }))
    }

    pub fn fpga(&self) -> &FakeFpga {
        &self.fpga
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.lock().clone()
    }

    pub fn clear_events(&self) {
        self.log.lock().clear();
    }

    pub fn captures(&self) -> Vec<Capture> {
        self.captures.lock().clone()
    }

    pub fn set_time(&self, ts: Timespec) {
        *self.now.lock() = ts;
    }

    pub fn fail_ioremap(&self) {
        self.fail_ioremap.store(true, Ordering::SeqCst);
    }

    pub fn fail_register(&self) {
        self.fail_register.store(true, Ordering::SeqCst);
    }

    pub fn fail_request_irq(&self, err: IntcError) {
        *self.fail_request_irq.lock() = Some(err);
    }

    /// Assert `irq` once. [None] if no handler is attached.
    pub fn fire(&self, irq: usize) -> Option<IrqVerdict> {
        let handler = self
            .lines
            .lock()
            .iter()
            .find(|line| line.irq == irq)
            .map(|line| line.handler.clone())?;
        Some(handler.on_signal())
    }

    fn record(&self, event: Event) {
        self.log.lock().push(event);
    }
}

impl IoMapper for FakePlatform {
    fn ioremap(&self, base: usize, size: usize) -> Option<Box<dyn RegisterIo>> {
        if self.fail_ioremap.load(Ordering::SeqCst) {
            return None;
        }
        self.record(Event::Map(base, size));
        Some(Box::new(FakeIo {
            fpga: self.fpga.clone(),
        }))
    }

    fn iounmap(&self, io: Box<dyn RegisterIo>) {
        drop(io);
        self.record(Event::Unmap);
    }
}

impl PpsSink for FakePlatform {
    fn register_source(&self, info: PpsSourceInfo, default_params: PpsMode) -> Option<PpsSourceRef> {
        if self.fail_register.load(Ordering::SeqCst) || !info.is_valid() {
            self.record(Event::RegisterRefused(info.name));
            return None;
        }
        self.record(Event::Register(info.name));
        Some(Handle::from(PpsSource::new(info, default_params)))
    }

    fn unregister_source(&self, source: PpsSourceRef) {
        self.record(Event::Unregister(source.info().name));
    }

    fn get_ts(&self) -> PpsEventTime {
        PpsEventTime {
            ts_real: *self.now.lock(),
        }
    }

    fn event(&self, source: &PpsSource, ts: &PpsEventTime, event: PpsMode) {
        let params = source.params();
        let assert_offset = params.assert_offset();
        let edge = if event.contains(PpsMode::CAPTUREASSERT)
            && params.mode().contains(PpsMode::OFFSETASSERT)
        {
            ts.ts_real.add_offset(assert_offset)
        } else {
            ts.ts_real
        };
        self.captures.lock().push(Capture {
            ts: *ts,
            kind: event,
            assert_offset,
            edge,
        });
    }
}

impl IrqController for FakePlatform {
    fn request_irq(
        &self,
        irq: usize,
        trigger: TriggerMode,
        _name: &'static str,
        handler: Handle<dyn IrqHandler>,
    ) -> Result<IrqToken, IntcError> {
        let injected = *self.fail_request_irq.lock();
        let mut lines = self.lines.lock();
        let refusal = injected.or(lines
            .iter()
            .any(|line| line.irq == irq)
            .then_some(IntcError::LineBusy));
        if let Some(err) = refusal {
            drop(lines);
            self.record(Event::AttachRefused(irq));
            return Err(err);
        }
        let token = IrqToken(self.next_token.fetch_add(1, Ordering::SeqCst));
        lines.push(IrqLine {
            irq,
            token,
            handler,
        });
        drop(lines);
        self.record(Event::Attach(irq, trigger));
        Ok(token)
    }

    fn free_irq(&self, irq: usize, token: IrqToken) {
        let mut removed = Vec::new();
        {
            let mut lines = self.lines.lock();
            let mut i = 0;
            while i < lines.len() {
                if lines[i].irq == irq && lines[i].token == token {
                    removed.push(lines.remove(i));
                } else {
                    i += 1;
                }
            }
        }
        self.record(Event::Detach(irq));
        drop(removed);
    }
}

impl Platform for FakePlatform {
    fn io(&self) -> &dyn IoMapper {
        self
    }

    fn pps(&self) -> &dyn PpsSink {
        self
    }

    fn intc(&self) -> &dyn IrqController {
        self
    }
}
