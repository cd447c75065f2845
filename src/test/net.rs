use core::fmt;

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    vec::Vec,
};

use crate::eio::{self, ErrorType, Read, Write};

/// A transport that records every written byte into shared storage so tests
/// can assert on emitted packets after handing the transport to a handler.
/// Writes can be switched to fail. Reading always reports EOF.
#[derive(Clone)]
pub struct RecordingNet {
    written: Rc<RefCell<Vec<u8>>>,
    failing: Rc<Cell<bool>>,
}

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TestNetError;
impl fmt::Display for TestNetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl core::error::Error for TestNetError {}
impl eio::Error for TestNetError {
    fn kind(&self) -> eio::ErrorKind {
        eio::ErrorKind::Other
    }
}

impl ErrorType for RecordingNet {
    type Error = TestNetError;
}
impl Read for RecordingNet {
    async fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(0)
    }
}
impl Write for RecordingNet {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.failing.get() {
            return Err(TestNetError);
        }
        self.written.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        if self.failing.get() {
            return Err(TestNetError);
        }
        Ok(())
    }
}

impl RecordingNet {
    pub fn new() -> Self {
        Self {
            written: Rc::new(RefCell::new(Vec::new())),
            failing: Rc::new(Cell::new(false)),
        }
    }

    /// Returns everything written so far.
    pub fn written(&self) -> Vec<u8> {
        self.written.borrow().clone()
    }

    /// Forgets everything written so far.
    pub fn clear(&self) {
        self.written.borrow_mut().clear();
    }

    /// Makes subsequent writes fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}
