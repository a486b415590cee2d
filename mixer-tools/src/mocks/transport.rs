use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::errors::Error;
use crate::errors::TransportError::{IoException, NotInitialized};
use crate::io::IoTransport;

/// An in-memory [`IoTransport`]: collects written lines, or fails every write when `failing`.
#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    pub opened: bool,
    pub failing: bool,
    pub buffer: Arc<Mutex<Vec<u8>>>,
}

impl MockTransport {
    /// Creates an opened transport.
    pub fn opened() -> Self {
        Self {
            opened: true,
            ..Default::default()
        }
    }

    /// Creates an opened transport whose writes always fail.
    pub fn failing() -> Self {
        Self {
            opened: true,
            failing: true,
            ..Default::default()
        }
    }

    /// Retrieves everything written so far, split by line.
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.buffer.lock())
            .lines()
            .map(String::from)
            .collect()
    }
}

impl Display for MockTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockTransport")
    }
}

impl IoTransport for MockTransport {
    fn open(&mut self) -> Result<(), Error> {
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        self.opened = false;
        Ok(())
    }

    fn set_timeout(&mut self, _: Duration) -> Result<(), Error> {
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), Error> {
        if !self.opened {
            return Err(NotInitialized.into());
        }
        if self.failing {
            return Err(IoException {
                info: String::from("Mock write failure"),
            }
            .into());
        }
        self.buffer.lock().extend_from_slice(buf);
        Ok(())
    }
}
