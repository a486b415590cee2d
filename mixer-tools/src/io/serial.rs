use std::fmt::{Display, Formatter};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use log::trace;
use parking_lot::Mutex;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::errors::Error;
use crate::errors::TransportError::NotInitialized;
use crate::io::IoTransport;

/// Default baud rate of the extra UART.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// A serial port transport (8N1, no flow control).
#[derive(Clone, Debug)]
pub struct Serial {
    /// The connection port.
    port: String,
    /// The connection speed.
    baud_rate: u32,
    /// A Read/Write io object.
    io: Arc<Mutex<Option<Box<dyn SerialPort>>>>,
}

impl Serial {
    /// Constructs a new `Serial` transport for the specified port at [`DEFAULT_BAUD_RATE`].
    ///
    /// # Example
    /// ```no_run
    /// use mixer_tools::io::{IoTransport, Serial};
    ///
    /// let mut uart = Serial::new("/dev/ttyUSB0");
    /// uart.open().unwrap();
    /// uart.write(b"{\"id\":\"sensor-pot0\",\"value\":12}\n").unwrap();
    /// ```
    pub fn new<P: Into<String>>(port: P) -> Self {
        Self::with_baud_rate(port, DEFAULT_BAUD_RATE)
    }

    /// Constructs a new `Serial` transport for the specified port and speed.
    pub fn with_baud_rate<P: Into<String>>(port: P, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            io: Arc::new(Mutex::new(None)),
        }
    }

    /// Retrieves the configured port.
    pub fn get_port(&self) -> String {
        self.port.clone()
    }

    /// Retrieves the configured baud rate.
    pub fn get_baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Whether the port is currently opened.
    pub fn is_open(&self) -> bool {
        self.io.lock().is_some()
    }
}

impl Default for Serial {
    /// Creates a new serial transport with the first available port or an empty string if no ports are available.
    ///
    /// # Notes
    /// The first available port will be used, None otherwise, which will probably lead to an error
    /// during the open phase.
    #[cfg(not(tarpaulin_include))]
    fn default() -> Self {
        let ports = serialport::available_ports().unwrap_or_else(|_| vec![]);
        match ports.first() {
            Some(port) => Self::new(&port.port_name),
            None => Self::new(""),
        }
    }
}

impl Display for Serial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Serial({}@{})", self.port, self.baud_rate)
    }
}

impl IoTransport for Serial {
    fn open(&mut self) -> Result<(), Error> {
        let connexion = serialport::new(self.port.clone(), self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_secs(1))
            .open()?;
        trace!("Serial port is now opened: {:?}", connexion.name());

        *self.io.lock() = Some(connexion);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        *self.io.lock() = None;
        Ok(())
    }

    fn set_timeout(&mut self, duration: Duration) -> Result<(), Error> {
        self.io
            .lock()
            .as_mut()
            .ok_or(NotInitialized)?
            .set_timeout(duration)?;
        Ok(())
    }

    /// Write bytes to the serial port. For more details see [`std::io::Write::write_all`].
    ///
    /// # Errors
    /// * `NotInitialized`: the port has not been opened.
    fn write(&mut self, buf: &[u8]) -> Result<(), Error> {
        let mut lock = self.io.lock();
        let io = lock.as_mut().ok_or(NotInitialized)?;
        io.write_all(buf)?;
        io.flush()?;
        Ok(())
    }
}

impl From<serialport::Error> for Error {
    fn from(value: serialport::Error) -> Self {
        std::io::Error::from(value).into()
    }
}
