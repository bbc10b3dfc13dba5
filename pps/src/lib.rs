//! PPS client driver for the custom FPGA.
//!
//! The FPGA latches a free-running 100 MHz counter on every PPS edge and
//! raises an interrupt. The driver reports each edge to the host PPS
//! subsystem together with the measured interrupt latency as the assert
//! offset, so consumers see the time of the edge rather than the time the
//! handler happened to run.
//!
//! The host provides the platform services through [Platform] and drives the
//! device through a [PpsFpgaModule]:
//! ```ignore
//! static MODULE: PpsFpgaModule = PpsFpgaModule::new(&BOARD);
//!
//! fn module_init() -> Result<(), PpsError> { MODULE.init() }
//! fn module_exit() { MODULE.exit() }
//! ```
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod logging;
pub mod config;
pub mod dev;
pub mod drivers;
pub mod error;
pub mod pps;

#[cfg(test)]
mod testing;

use crate::{
    config::PpsFpgaConfig,
    dev::{intc::IrqController, mmio::IoMapper},
    drivers::{DevicePhase, PpsFpga, PpsIrqStats},
    error::PpsError,
    pps::PpsSink,
};
use spin::Mutex;

/// Host services the driver depends on.
pub trait Platform: Sync {
    fn io(&self) -> &dyn IoMapper;
    fn pps(&self) -> &dyn PpsSink;
    fn intc(&self) -> &dyn IrqController;
}

/// Module-level owner of the device, backing the host's init/exit hooks.
pub struct PpsFpgaModule {
    platform: &'static dyn Platform,
    config: PpsFpgaConfig,
    device: Mutex<Option<PpsFpga>>,
}

impl PpsFpgaModule {
    pub const fn new(platform: &'static dyn Platform) -> PpsFpgaModule {
        Self::with_config(platform, PpsFpgaConfig::DEFAULT)
    }

    pub const fn with_config(platform: &'static dyn Platform, config: PpsFpgaConfig) -> PpsFpgaModule {
        PpsFpgaModule {
            platform,
            config,
            device: Mutex::new(None),
        }
    }

    /// Bring the device up. Nothing is left acquired on failure.
    pub fn init(&self) -> Result<(), PpsError> {
        let mut device = self.device.lock();
        if device.is_some() {
            crate::debug_ex!("pps-fpga: already running");
            return Ok(());
        }
        *device = Some(PpsFpga::probe(self.platform, self.config)?);
        Ok(())
    }

    /// Release the device if it is up.
    pub fn exit(&self) {
        if let Some(device) = self.device.lock().take() {
            device.teardown();
        }
    }

    pub fn phase(&self) -> DevicePhase {
        self.device
            .lock()
            .as_ref()
            .map_or(DevicePhase::Uninitialized, |dev| dev.phase())
    }

    pub fn stats(&self) -> Option<PpsIrqStats> {
        self.device.lock().as_ref().map(|dev| dev.stats())
    }
}
