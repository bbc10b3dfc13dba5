//! Ordered access to memory-mapped device registers.
//!
//! Raw pointers only appear in [Register] and [MmioRegion]. The driver itself
//! talks to an owned [RegisterWindow], which can only name registers of the
//! PPS block ([PpsReg]) and releases its mapping when dropped.
use crate::{
    dev::regs::PpsReg,
    error::MmioError,
};
use alloc::boxed::Box;
use core::{
    cell::UnsafeCell,
    fmt::Debug,
    mem::ManuallyDrop,
    ops::Range,
    ptr::{NonNull, read_volatile, write_volatile},
};
use utils::impl_basic;

/// A device register. Every access is a single volatile load or store, so the
/// compiler neither caches nor reorders it against other register accesses.
#[repr(transparent)]
pub struct Register<T: Sized + Copy> {
    inner: UnsafeCell<T>,
}

impl<T: Sized + Copy> Register<T> {
    #[inline(always)]
    pub fn read(&self) -> T {
        unsafe { read_volatile(self.inner.get()) }
    }
    #[inline(always)]
    pub fn write(&self, value: T) {
        unsafe {
            write_volatile(self.inner.get(), value);
        }
    }
}

/// 32-bit register access at byte offsets of a mapped range.
///
/// Implementations must perform each call as exactly one ordered device
/// access and must not fail: the mapping is valid for as long as the value lives.
pub trait RegisterIo: Send + Sync {
    fn read32(&self, offset: usize) -> u32;
    fn write32(&self, offset: usize, value: u32);
}

/// Platform service creating and destroying register mappings.
pub trait IoMapper: Sync {
    /// Map `size` bytes of physical address space at `base`.
    /// Return [None] if the range cannot be mapped.
    fn ioremap(&self, base: usize, size: usize) -> Option<Box<dyn RegisterIo>>;
    /// Release a mapping returned by [IoMapper::ioremap].
    fn iounmap(&self, io: Box<dyn RegisterIo>);
}

/// A mapped virtual range accessed through [Register]s.
pub struct MmioRegion {
    base: NonNull<u8>,
    len: usize,
}

unsafe impl Send for MmioRegion {}
unsafe impl Sync for MmioRegion {}

impl MmioRegion {
    /// # Safety
    /// `[virt, virt + len)` must be a live device mapping for the whole lifetime of the
    /// returned value, and must not be accessed as ordinary memory elsewhere.
    pub unsafe fn new(virt: NonNull<u8>, len: usize) -> MmioRegion {
        MmioRegion { base: virt, len }
    }

    #[inline(always)]
    fn reg(&self, offset: usize) -> &Register<u32> {
        debug_assert!(offset % size_of::<u32>() == 0 && offset + size_of::<u32>() <= self.len);
        unsafe { &*(self.base.as_ptr().add(offset) as *const Register<u32>) }
    }
}

impl RegisterIo for MmioRegion {
    #[inline(always)]
    fn read32(&self, offset: usize) -> u32 {
        self.reg(offset).read()
    }
    #[inline(always)]
    fn write32(&self, offset: usize, value: u32) {
        self.reg(offset).write(value)
    }
}

/// A physical address range.
pub struct IoRange {
    inner: Range<usize>,
}

impl_basic!(IoRange, Range<usize>);

impl IoRange {
    /// Build `[base, base + size)`, or [None] if it would wrap the address space.
    pub fn new(base: usize, size: usize) -> Option<IoRange> {
        Some(IoRange::from(base..base.checked_add(size)?))
    }

    pub fn validate(&self, span: usize, val_type: IoRangeValidationType) -> bool {
        let self_size = self.len();
        match val_type {
            IoRangeValidationType::Fit => self_size == span,
            IoRangeValidationType::Compatible => self_size >= span,
        }
    }
}

impl Clone for IoRange {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Debug for IoRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("[{:#x},{:#x})", self.start, self.end))
    }
}

pub enum IoRangeValidationType {
    /// The size of the IO range is exactly the requested span
    Fit,
    /// The size of the IO range is equal to or greater than the requested span
    Compatible,
}

/// The mapped FPGA register block, exclusively owned by one device.
///
/// Valid from [RegisterWindow::map] until it is dropped (or [RegisterWindow::unmap]ped);
/// after that it no longer exists, so no access can follow the unmap.
pub struct RegisterWindow {
    io: ManuallyDrop<Box<dyn RegisterIo>>,
    mapper: &'static dyn IoMapper,
    range: IoRange,
}

impl RegisterWindow {
    pub fn map(
        mapper: &'static dyn IoMapper,
        base: usize,
        size: usize,
    ) -> Result<RegisterWindow, MmioError> {
        let range = IoRange::new(base, size).ok_or(MmioError::InvalidAddress)?;
        if !range.validate(PpsReg::BLOCK_END, IoRangeValidationType::Compatible) {
            return Err(MmioError::NotEnoughSpace);
        }
        let io = mapper.ioremap(base, size).ok_or(MmioError::InvalidAddress)?;
        crate::debug_ex!("pps-fpga: mapped {:?}", range);
        Ok(RegisterWindow {
            io: ManuallyDrop::new(io),
            mapper,
            range,
        })
    }

    #[inline(always)]
    pub fn read32(&self, reg: PpsReg) -> u32 {
        self.io.read32(reg.offset())
    }

    #[inline(always)]
    pub fn write32(&self, reg: PpsReg, value: u32) {
        self.io.write32(reg.offset(), value)
    }

    pub fn range(&self) -> &IoRange {
        &self.range
    }

    /// Release the mapping. Same as dropping the window.
    pub fn unmap(self) {
        drop(self)
    }
}

impl Drop for RegisterWindow {
    fn drop(&mut self) {
        // `io` is never touched again after this point.
        let io = unsafe { ManuallyDrop::take(&mut self.io) };
        self.mapper.iounmap(io);
        crate::debug_ex!("pps-fpga: unmapped {:?}", self.range);
    }
}

impl Debug for RegisterWindow {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisterWindow")
            .field("range", &self.range)
            .finish()
    }
}
