//! Interrupt subsystem boundary.
//!
//! The platform adapter is the only code that knows how a hardware line
//! reaches software. It calls [IrqHandler::on_signal] for every assertion of
//! a requested line and never runs two activations of one handler at once.
use crate::{
    debug_ex,
    dev::handle::Handle,
    error::IntcError,
};
use core::fmt::Debug;

/// Outcome of one handler activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqVerdict {
    /// The device raised the interrupt and it has been serviced.
    Handled,
    /// The device did not raise it; another consumer of a shared line did.
    NotOurs,
}

/// Line trigger condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    EdgeRising,
    EdgeFalling,
    LevelHigh,
    LevelLow,
}

/// Code run in interrupt context.
///
/// Implementations must not block, wait on locks or allocate.
pub trait IrqHandler: Send + Sync {
    fn on_signal(&self) -> IrqVerdict;
}

/// Opaque identity of one successful [IrqController::request_irq].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqToken(pub usize);

pub trait IrqController: Sync {
    /// Start delivering `irq` to `handler`.
    fn request_irq(
        &self,
        irq: usize,
        trigger: TriggerMode,
        name: &'static str,
        handler: Handle<dyn IrqHandler>,
    ) -> Result<IrqToken, IntcError>;

    /// Stop delivering `irq` to the handler behind `token`.
    ///
    /// Synchronous: when this returns, no activation is running and none will start,
    /// and the controller has dropped its handle to the handler.
    fn free_irq(&self, irq: usize, token: IrqToken);
}

/// A requested interrupt line; freed when dropped.
pub struct IrqRegistration {
    irq: usize,
    token: IrqToken,
    intc: &'static dyn IrqController,
}

impl IrqRegistration {
    pub fn request(
        intc: &'static dyn IrqController,
        irq: usize,
        trigger: TriggerMode,
        name: &'static str,
        handler: Handle<dyn IrqHandler>,
    ) -> Result<IrqRegistration, IntcError> {
        let token = intc.request_irq(irq, trigger, name, handler)?;
        debug_ex!("pps-fpga: IRQ {} attached ({:?})", irq, trigger);
        Ok(IrqRegistration { irq, token, intc })
    }

    pub fn irq(&self) -> usize {
        self.irq
    }
}

impl Drop for IrqRegistration {
    fn drop(&mut self) {
        self.intc.free_irq(self.irq, self.token);
        debug_ex!("pps-fpga: IRQ {} detached", self.irq);
    }
}

impl Debug for IrqRegistration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IrqRegistration")
            .field("irq", &self.irq)
            .field("token", &self.token)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, FakePlatform};
    use alloc::vec;

    struct Always(IrqVerdict);

    impl IrqHandler for Always {
        fn on_signal(&self) -> IrqVerdict {
            self.0
        }
    }

    #[test]
    fn registration_delivers_until_dropped() {
        let platform = FakePlatform::leak();
        let handler: Handle<dyn IrqHandler> =
            Handle::from_arc(alloc::sync::Arc::new(Always(IrqVerdict::Handled)));
        let reg = IrqRegistration::request(platform, 7, TriggerMode::LevelHigh, "t", handler.clone())
            .unwrap();
        assert_eq!(reg.irq(), 7);
        assert_eq!(platform.fire(7), Some(IrqVerdict::Handled));
        assert_eq!(Handle::holders(&handler), 2);

        drop(reg);
        assert_eq!(platform.fire(7), None);
        assert_eq!(Handle::holders(&handler), 1);
        assert_eq!(
            platform.events(),
            vec![Event::Attach(7, TriggerMode::LevelHigh), Event::Detach(7)]
        );
    }

    #[test]
    fn busy_line_is_reported() {
        let platform = FakePlatform::leak();
        platform.fail_request_irq(IntcError::LineBusy);
        let handler: Handle<dyn IrqHandler> =
            Handle::from_arc(alloc::sync::Arc::new(Always(IrqVerdict::NotOurs)));
        let err = IrqRegistration::request(platform, 7, TriggerMode::LevelHigh, "t", handler)
            .unwrap_err();
        assert_eq!(err, IntcError::LineBusy);
        assert_eq!(platform.events(), vec![Event::AttachRefused(7)]);
    }
}
