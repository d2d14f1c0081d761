//! Driver double that records every command it receives.

use std::{cell::RefCell, rc::Rc};

use crate::error::HardwareError;

use super::driver::{EpdDriver, RefreshMode};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverCall {
    Init,
    Reset,
    Clear(u8),
    Display(Vec<u8>, RefreshMode),
    Sleep,
    Release,
}

pub struct RecordingDriver {
    native_size: [u32; 2],
    calls: Rc<RefCell<Vec<DriverCall>>>,
    fail_init: bool,
    fail_sleep: bool,
    fail_display: bool,
}

impl RecordingDriver {
    pub fn new(native_size: [u32; 2]) -> Self {
        Self {
            native_size,
            calls: Rc::default(),
            fail_init: false,
            fail_sleep: false,
            fail_display: false,
        }
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_sleep(mut self) -> Self {
        self.fail_sleep = true;
        self
    }

    pub fn failing_display(mut self) -> Self {
        self.fail_display = true;
        self
    }

    /// Shared handle to the call log, usable after the driver is moved.
    pub fn calls(&self) -> Rc<RefCell<Vec<DriverCall>>> {
        Rc::clone(&self.calls)
    }

    fn record(&self, call: DriverCall, fail: bool) -> Result<(), HardwareError> {
        self.calls.borrow_mut().push(call);
        if fail {
            Err(HardwareError::Device("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

impl EpdDriver for RecordingDriver {
    fn native_size(&self) -> [u32; 2] {
        self.native_size
    }

    fn init(&mut self) -> Result<(), HardwareError> {
        self.record(DriverCall::Init, self.fail_init)
    }

    fn reset(&mut self) -> Result<(), HardwareError> {
        self.record(DriverCall::Reset, false)
    }

    fn clear(&mut self, color: u8) -> Result<(), HardwareError> {
        self.record(DriverCall::Clear(color), false)
    }

    fn display(&mut self, buffer: &[u8], mode: RefreshMode) -> Result<(), HardwareError> {
        self.record(DriverCall::Display(buffer.to_vec(), mode), self.fail_display)
    }

    fn sleep(&mut self) -> Result<(), HardwareError> {
        self.record(DriverCall::Sleep, self.fail_sleep)
    }

    fn release(&mut self) -> Result<(), HardwareError> {
        self.record(DriverCall::Release, false)
    }
}
